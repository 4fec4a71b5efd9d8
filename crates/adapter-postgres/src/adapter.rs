use std::{collections::HashSet, io, time::Duration};

use fallible_iterator::FallibleIterator;
use postgres::{Client, NoTls, Row as PgRow, config::SslMode, types::ToSql};
use sqlit_core::{
    Adapter, AdapterDescriptor, ColumnInfo, ConfigError, Connection, ConnectionConfig, Error,
    IndexInfo, QueryResult, ROW_COUNT_UNKNOWN, RawColumn, Result, SequenceInfo, TableInfo,
    TriggerInfo, catalog, collect_rows, descriptor::builtin, reports_row_count,
};
use tracing::{debug, info};

use crate::{catalog_queries, value};

const DB_TYPE: &str = builtin::POSTGRESQL.db_type;
const DEFAULT_SCHEMA: &str = "public";
const DEFAULT_DATABASE: &str = "postgres";
const CLOSE_SQL: &str = "CLOSE postgresql";
const SSLMODE_OPTION: &str = "sslmode";
const APPLICATION_NAME_OPTION: &str = "application_name";
const CONNECT_TIMEOUT_OPTION: &str = "connect_timeout";

#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresAdapter;

struct PostgresSession {
    client: Client,
}

impl PostgresAdapter {
    fn client<'a>(&self, connection: &'a mut Connection) -> Result<&'a mut Client> {
        connection
            .session_mut::<PostgresSession>(DB_TYPE)
            .map(|session| &mut session.client)
    }
}

impl Adapter for PostgresAdapter {
    fn descriptor(&self) -> &'static AdapterDescriptor {
        &builtin::POSTGRESQL
    }

    fn connect(&self, config: &ConnectionConfig) -> Result<Connection> {
        config.ensure_db_type(&builtin::POSTGRESQL)?;
        let postgres_config = build_postgres_config(config)?;

        let client = postgres_config
            .connect(NoTls)
            .map_err(|source| Error::connect(DB_TYPE, &config.name, source))?;

        info!(
            adapter = DB_TYPE,
            connection = %config.name,
            server = %config.server,
            database = postgres_config.get_dbname().unwrap_or(DEFAULT_DATABASE),
            "connected"
        );
        Ok(Connection::new(
            DB_TYPE,
            config.name.clone(),
            PostgresSession { client },
        ))
    }

    fn close(&self, connection: Connection) -> Result<()> {
        let name = connection.name().to_string();
        let session = connection.into_session::<PostgresSession>(DB_TYPE)?;
        session
            .client
            .close()
            .map_err(|source| Error::query(CLOSE_SQL, source))?;
        info!(adapter = DB_TYPE, connection = %name, "closed");
        Ok(())
    }

    fn get_databases(&self, connection: &mut Connection) -> Result<Vec<String>> {
        let client = self.client(connection)?;
        let rows = run_catalog_query(client, catalog_queries::DATABASES_QUERY, &[])?;
        rows.iter()
            .map(|row| row_value(row, "datname", catalog_queries::DATABASES_QUERY))
            .collect()
    }

    fn get_tables(
        &self,
        connection: &mut Connection,
        database: Option<&str>,
    ) -> Result<Vec<TableInfo>> {
        let client = self.client(connection)?;
        let tables = query_tables(client, catalog_queries::TABLES_QUERY, database)?;
        Ok(catalog::normalize_tables(tables))
    }

    fn get_views(
        &self,
        connection: &mut Connection,
        database: Option<&str>,
    ) -> Result<Vec<TableInfo>> {
        let client = self.client(connection)?;
        let views = query_tables(client, catalog_queries::VIEWS_QUERY, database)?;
        Ok(catalog::normalize_tables(views))
    }

    fn get_columns(
        &self,
        connection: &mut Connection,
        table: &str,
        _database: Option<&str>,
        schema: Option<&str>,
    ) -> Result<Vec<ColumnInfo>> {
        let client = self.client(connection)?;
        let schema = schema.unwrap_or(DEFAULT_SCHEMA);

        let column_rows =
            run_catalog_query(client, catalog_queries::COLUMNS_QUERY, &[&schema, &table])?;
        let columns = column_rows
            .iter()
            .map(|row| {
                Ok(RawColumn::new(
                    row_value::<String>(row, "column_name", catalog_queries::COLUMNS_QUERY)?,
                    row_value::<String>(row, "data_type", catalog_queries::COLUMNS_QUERY)?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        let key_rows = run_catalog_query(
            client,
            catalog_queries::PRIMARY_KEY_COLUMNS_QUERY,
            &[&schema, &table],
        )?;
        let key_columns = key_rows
            .iter()
            .map(|row| {
                row_value::<String>(
                    row,
                    "column_name",
                    catalog_queries::PRIMARY_KEY_COLUMNS_QUERY,
                )
            })
            .collect::<Result<HashSet<_>>>()?;

        Ok(catalog::merge_primary_keys(columns, &key_columns))
    }

    fn get_indexes(
        &self,
        connection: &mut Connection,
        _database: Option<&str>,
    ) -> Result<Vec<IndexInfo>> {
        let client = self.client(connection)?;
        let sql = catalog_queries::INDEXES_QUERY;
        let rows = run_catalog_query(client, sql, &[])?;
        let indexes = rows
            .iter()
            .map(|row| {
                Ok(IndexInfo {
                    name: row_value(row, "index_name", sql)?,
                    table_name: row_value(row, "table_name", sql)?,
                    is_unique: row_value(row, "is_unique", sql)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(catalog::sort_indexes(indexes))
    }

    fn get_triggers(
        &self,
        connection: &mut Connection,
        database: Option<&str>,
    ) -> Result<Vec<TriggerInfo>> {
        let client = self.client(connection)?;
        let sql = catalog_queries::TRIGGERS_QUERY;
        let rows = run_catalog_query(client, sql, &[&database])?;
        let triggers = rows
            .iter()
            .map(|row| {
                Ok(TriggerInfo {
                    name: row_value(row, "trigger_name", sql)?,
                    table_name: row_value(row, "event_object_table", sql)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(catalog::sort_triggers(triggers))
    }

    fn get_sequences(
        &self,
        connection: &mut Connection,
        database: Option<&str>,
    ) -> Result<Vec<SequenceInfo>> {
        let client = self.client(connection)?;
        let sql = catalog_queries::SEQUENCES_QUERY;
        let rows = run_catalog_query(client, sql, &[&database])?;
        let sequences = rows
            .iter()
            .map(|row| {
                Ok(SequenceInfo {
                    name: row_value(row, "sequence_name", sql)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(catalog::sort_sequences(sequences))
    }

    fn get_procedures(
        &self,
        connection: &mut Connection,
        database: Option<&str>,
    ) -> Result<Vec<String>> {
        let client = self.client(connection)?;
        let sql = catalog_queries::PROCEDURES_QUERY;
        let rows = run_catalog_query(client, sql, &[&database])?;
        let names = rows
            .iter()
            .map(|row| row_value::<String>(row, "routine_name", sql))
            .collect::<Result<Vec<_>>>()?;
        Ok(catalog::distinct_sorted(names))
    }

    fn execute_query(
        &self,
        connection: &mut Connection,
        query: &str,
        max_rows: Option<usize>,
    ) -> Result<QueryResult> {
        let client = self.client(connection)?;

        debug!(adapter = DB_TYPE, sql = query, ?max_rows, "executing query");
        let statement = client
            .prepare(query)
            .map_err(|source| Error::query(query, source))?;
        let columns = statement
            .columns()
            .iter()
            .map(|column| column.name().to_string())
            .collect::<Vec<_>>();

        // Dropping the iterator early discards the rest of the stream.
        let rows = client
            .query_raw(&statement, std::iter::empty::<&dyn ToSql>())
            .map_err(|source| Error::query(query, source))?
            .iterator()
            .map(|row| row.and_then(|row| value::decode_row(&row)));
        let (rows, truncated) =
            collect_rows(rows, max_rows).map_err(|source| Error::query(query, source))?;

        Ok(QueryResult {
            columns,
            rows,
            truncated,
        })
    }

    fn execute_non_query(&self, connection: &mut Connection, query: &str) -> Result<i64> {
        let client = self.client(connection)?;

        debug!(adapter = DB_TYPE, sql = query, "executing statement");
        let affected = client
            .execute(query, &[])
            .map_err(|source| Error::query(query, source))?;
        if !reports_row_count(query) {
            return Ok(ROW_COUNT_UNKNOWN);
        }

        i64::try_from(affected).map_err(|_| {
            Error::query(
                query,
                io::Error::other(format!("row count {affected} does not fit in i64")),
            )
        })
    }
}

fn build_postgres_config(config: &ConnectionConfig) -> Result<postgres::Config> {
    let mut postgres_config = postgres::Config::new();

    postgres_config.host(config.require(&builtin::POSTGRESQL, "server", &config.server)?);
    if let Some(port) = config.port {
        postgres_config.port(port);
    }
    if !config.username.is_empty() {
        postgres_config.user(&config.username);
    }
    if !config.password.is_empty() {
        postgres_config.password(&config.password);
    }
    if config.database.is_empty() {
        postgres_config.dbname(DEFAULT_DATABASE);
    } else {
        postgres_config.dbname(&config.database);
    }

    if let Some(mode) = config.option_str(SSLMODE_OPTION) {
        postgres_config.ssl_mode(parse_ssl_mode(&mode)?);
    }
    if let Some(application_name) = config.option_str(APPLICATION_NAME_OPTION) {
        postgres_config.application_name(&application_name);
    }
    if let Some(seconds) = config.option_u64(CONNECT_TIMEOUT_OPTION)? {
        postgres_config.connect_timeout(Duration::from_secs(seconds));
    }

    Ok(postgres_config)
}

// Sessions are opened with `NoTls`, so `prefer` always falls back to a
// plaintext session and modes that demand TLS are refused up front.
fn parse_ssl_mode(raw: &str) -> Result<SslMode> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "disable" => Ok(SslMode::Disable),
        "prefer" => Ok(SslMode::Prefer),
        _ => Err(ConfigError::InvalidOption {
            key: SSLMODE_OPTION.to_string(),
            value: raw.to_string(),
            expected: "disable or prefer (TLS sessions are not supported)",
        }
        .into()),
    }
}

fn query_tables(client: &mut Client, sql: &str, database: Option<&str>) -> Result<Vec<TableInfo>> {
    let rows = run_catalog_query(client, sql, &[&database])?;
    rows.iter()
        .map(|row| {
            Ok(TableInfo::new(
                row_value::<String>(row, "table_schema", sql)?,
                row_value::<String>(row, "table_name", sql)?,
            ))
        })
        .collect()
}

fn run_catalog_query(
    client: &mut Client,
    sql: &str,
    params: &[&(dyn ToSql + Sync)],
) -> Result<Vec<PgRow>> {
    debug!(adapter = DB_TYPE, sql, "executing catalog query");
    client
        .query(sql, params)
        .map_err(|source| Error::query(sql, source))
}

fn row_value<T>(row: &PgRow, column: &str, sql: &str) -> Result<T>
where
    T: for<'a> postgres::types::FromSql<'a>,
{
    row.try_get::<_, T>(column)
        .map_err(|source| Error::query(sql, source))
}
