use std::{collections::HashSet, io};

use futures_util::TryStreamExt;
use sqlit_core::{
    Adapter, AdapterDescriptor, ColumnInfo, ConfigError, Connection, ConnectionConfig, Error,
    IndexInfo, QueryResult, ROW_COUNT_UNKNOWN, RawColumn, Result, RowCollector, SequenceInfo,
    TableInfo, TriggerInfo, catalog, descriptor::builtin, reports_row_count,
};
use tiberius::{AuthMethod, Client, Config, EncryptionLevel, QueryItem, Row as TdsRow, ToSql};
use tokio::{
    net::TcpStream,
    runtime::{Builder, Runtime},
};
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{debug, info};

use crate::{catalog_queries, value};

type TdsClient = Client<Compat<TcpStream>>;

const DB_TYPE: &str = builtin::MSSQL.db_type;
const DEFAULT_MSSQL_PORT: u16 = 1433;
const DEFAULT_MSSQL_SCHEMA: &str = "dbo";
const CLOSE_SQL: &str = "CLOSE mssql";
const TRUST_SERVER_CERTIFICATE_OPTION: &str = "trust_server_certificate";
const ENCRYPT_OPTION: &str = "encrypt";
const APPLICATION_NAME_OPTION: &str = "application_name";

#[derive(Debug, Default, Clone, Copy)]
pub struct MssqlAdapter;

struct MssqlSession {
    runtime: Runtime,
    client: TdsClient,
}

impl MssqlAdapter {
    fn session<'a>(&self, connection: &'a mut Connection) -> Result<&'a mut MssqlSession> {
        connection.session_mut::<MssqlSession>(DB_TYPE)
    }

    fn list_tables(
        &self,
        connection: &mut Connection,
        sql: &str,
    ) -> Result<Vec<TableInfo>> {
        let rows = query_rows(self.session(connection)?, sql, &[])?;
        let tables = rows
            .iter()
            .map(|row| {
                Ok(TableInfo::new(
                    row_string(row, 0, sql, "TABLE_SCHEMA")?,
                    row_string(row, 1, sql, "TABLE_NAME")?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(catalog::normalize_tables(tables))
    }

    fn list_names(&self, connection: &mut Connection, sql: &str) -> Result<Vec<String>> {
        query_rows(self.session(connection)?, sql, &[])?
            .iter()
            .map(|row| row_string(row, 0, sql, "name"))
            .collect()
    }
}

impl Adapter for MssqlAdapter {
    fn descriptor(&self) -> &'static AdapterDescriptor {
        &builtin::MSSQL
    }

    fn connect(&self, config: &ConnectionConfig) -> Result<Connection> {
        config.ensure_db_type(&builtin::MSSQL)?;
        let tds_config = build_tiberius_config(config)?;
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|source| Error::connect(DB_TYPE, &config.name, source))?;
        let client = runtime.block_on(async {
            let tcp = TcpStream::connect(tds_config.get_addr())
                .await
                .map_err(|source| Error::connect(DB_TYPE, &config.name, source))?;
            tcp.set_nodelay(true)
                .map_err(|source| Error::connect(DB_TYPE, &config.name, source))?;

            Client::connect(tds_config, tcp.compat_write())
                .await
                .map_err(|source| Error::connect(DB_TYPE, &config.name, source))
        })?;

        info!(
            adapter = DB_TYPE,
            connection = %config.name,
            server = %config.server,
            database = %config.database,
            "connected"
        );
        Ok(Connection::new(
            DB_TYPE,
            config.name.clone(),
            MssqlSession { runtime, client },
        ))
    }

    fn close(&self, connection: Connection) -> Result<()> {
        let name = connection.name().to_string();
        let MssqlSession { runtime, client } =
            connection.into_session::<MssqlSession>(DB_TYPE)?;
        runtime
            .block_on(client.close())
            .map_err(|source| Error::query(CLOSE_SQL, source))?;
        info!(adapter = DB_TYPE, connection = %name, "closed");
        Ok(())
    }

    fn get_databases(&self, connection: &mut Connection) -> Result<Vec<String>> {
        self.list_names(connection, catalog_queries::DATABASES_QUERY)
    }

    fn get_tables(
        &self,
        connection: &mut Connection,
        database: Option<&str>,
    ) -> Result<Vec<TableInfo>> {
        self.list_tables(connection, &catalog_queries::tables_query(&prefix(database)))
    }

    fn get_views(
        &self,
        connection: &mut Connection,
        database: Option<&str>,
    ) -> Result<Vec<TableInfo>> {
        self.list_tables(connection, &catalog_queries::views_query(&prefix(database)))
    }

    fn get_columns(
        &self,
        connection: &mut Connection,
        table: &str,
        database: Option<&str>,
        schema: Option<&str>,
    ) -> Result<Vec<ColumnInfo>> {
        let session = self.session(connection)?;
        let prefix = prefix(database);
        let schema = schema.unwrap_or(DEFAULT_MSSQL_SCHEMA);

        let sql = catalog_queries::columns_query(&prefix);
        let columns = query_rows(session, &sql, &[&schema, &table])?
            .iter()
            .map(|row| {
                Ok(RawColumn::new(
                    row_string(row, 0, &sql, "COLUMN_NAME")?,
                    row_string(row, 1, &sql, "DATA_TYPE")?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        let sql = catalog_queries::primary_key_columns_query(&prefix);
        let key_columns = query_rows(session, &sql, &[&schema, &table])?
            .iter()
            .map(|row| row_string(row, 0, &sql, "COLUMN_NAME"))
            .collect::<Result<HashSet<_>>>()?;

        Ok(catalog::merge_primary_keys(columns, &key_columns))
    }

    fn get_indexes(
        &self,
        connection: &mut Connection,
        database: Option<&str>,
    ) -> Result<Vec<IndexInfo>> {
        let sql = catalog_queries::indexes_query(&prefix(database));
        let indexes = query_rows(self.session(connection)?, &sql, &[])?
            .iter()
            .map(|row| {
                Ok(IndexInfo {
                    name: row_string(row, 0, &sql, "index name")?,
                    table_name: row_string(row, 1, &sql, "table name")?,
                    is_unique: row
                        .try_get::<bool, _>(2)
                        .map_err(|source| Error::query(sql.as_str(), source))?
                        .unwrap_or(false),
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
        let sql = catalog_queries::triggers_query(&prefix(database));
        let triggers = query_rows(self.session(connection)?, &sql, &[])?
            .iter()
            .map(|row| {
                Ok(TriggerInfo {
                    name: row_string(row, 0, &sql, "trigger name")?,
                    table_name: row_string(row, 1, &sql, "table name")?,
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
        let names =
            self.list_names(connection, &catalog_queries::sequences_query(&prefix(database)))?;
        Ok(catalog::sort_sequences(
            names.into_iter().map(|name| SequenceInfo { name }).collect(),
        ))
    }

    fn get_procedures(
        &self,
        connection: &mut Connection,
        database: Option<&str>,
    ) -> Result<Vec<String>> {
        let names =
            self.list_names(connection, &catalog_queries::procedures_query(&prefix(database)))?;
        Ok(catalog::distinct_sorted(names))
    }

    fn execute_query(
        &self,
        connection: &mut Connection,
        query: &str,
        max_rows: Option<usize>,
    ) -> Result<QueryResult> {
        let MssqlSession { runtime, client } = self.session(connection)?;

        debug!(adapter = DB_TYPE, sql = query, ?max_rows, "executing query");
        runtime.block_on(async {
            let mut stream = client
                .simple_query(query)
                .await
                .map_err(|source| Error::query(query, source))?;
            let mut columns = None;
            let mut collector = RowCollector::new(max_rows);

            // The next request on this client flushes whatever is left of
            // the stream, so stopping early is safe.
            while !collector.is_full() {
                let Some(item) = stream
                    .try_next()
                    .await
                    .map_err(|source| Error::query(query, source))?
                else {
                    break;
                };
                match item {
                    QueryItem::Metadata(metadata) => {
                        if columns.is_some() {
                            break;
                        }
                        columns = Some(
                            metadata
                                .columns()
                                .iter()
                                .map(|column| column.name().to_string())
                                .collect(),
                        );
                    }
                    QueryItem::Row(row) => {
                        let row =
                            value::decode_row(&row).map_err(|source| Error::query(query, source))?;
                        collector.push(row);
                    }
                }
            }

            Ok(collector.finish(columns.unwrap_or_default()))
        })
    }

    fn execute_non_query(&self, connection: &mut Connection, query: &str) -> Result<i64> {
        let MssqlSession { runtime, client } = self.session(connection)?;

        debug!(adapter = DB_TYPE, sql = query, "executing statement");
        let result = runtime
            .block_on(client.execute(query, &[]))
            .map_err(|source| Error::query(query, source))?;
        if !reports_row_count(query) {
            return Ok(ROW_COUNT_UNKNOWN);
        }

        let affected = result.total();
        i64::try_from(affected).map_err(|_| {
            Error::query(
                query,
                io::Error::other(format!("row count {affected} does not fit in i64")),
            )
        })
    }
}

fn build_tiberius_config(config: &ConnectionConfig) -> Result<Config> {
    let server = config.require(&builtin::MSSQL, "server", &config.server)?;
    let username = config.require(&builtin::MSSQL, "username", &config.username)?;

    let mut tds_config = Config::new();
    tds_config.host(server);
    tds_config.port(config.port.unwrap_or(DEFAULT_MSSQL_PORT));
    if !config.database.is_empty() {
        tds_config.database(&config.database);
    }
    tds_config.authentication(AuthMethod::sql_server(username, &config.password));

    if config
        .option_bool(TRUST_SERVER_CERTIFICATE_OPTION)?
        .unwrap_or(true)
    {
        tds_config.trust_cert();
    }
    if let Some(level) = config.option_str(ENCRYPT_OPTION) {
        tds_config.encryption(parse_encryption(&level)?);
    }
    if let Some(application_name) = config.option_str(APPLICATION_NAME_OPTION) {
        tds_config.application_name(application_name);
    }

    Ok(tds_config)
}

fn parse_encryption(raw: &str) -> Result<EncryptionLevel> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "off" => Ok(EncryptionLevel::Off),
        "on" => Ok(EncryptionLevel::On),
        "required" => Ok(EncryptionLevel::Required),
        "not_supported" => Ok(EncryptionLevel::NotSupported),
        _ => Err(ConfigError::InvalidOption {
            key: ENCRYPT_OPTION.to_string(),
            value: raw.to_string(),
            expected: "one of off, on, required, not_supported",
        }
        .into()),
    }
}

/// `[db].` for an explicit database, empty for the current one.
fn prefix(database: Option<&str>) -> String {
    database.map_or_else(String::new, |database| {
        format!("{}.", builtin::MSSQL.quote_style.quote(database))
    })
}

fn query_rows(session: &mut MssqlSession, sql: &str, params: &[&dyn ToSql]) -> Result<Vec<TdsRow>> {
    let MssqlSession { runtime, client } = session;

    debug!(adapter = DB_TYPE, sql, "executing catalog query");
    runtime.block_on(async {
        client
            .query(sql, params)
            .await
            .map_err(|source| Error::query(sql, source))?
            .into_first_result()
            .await
            .map_err(|source| Error::query(sql, source))
    })
}

fn row_string(row: &TdsRow, index: usize, sql: &str, label: &str) -> Result<String> {
    row.try_get::<&str, _>(index)
        .map_err(|source| Error::query(sql, source))?
        .map(str::to_string)
        .ok_or_else(|| {
            Error::query(
                sql,
                io::Error::other(format!("missing column `{label}` in query result")),
            )
        })
}

#[cfg(test)]
mod tests {
    use sqlit_core::{Adapter, ConnectionConfig};
    use tiberius::EncryptionLevel;

    use super::{MssqlAdapter, build_tiberius_config, parse_encryption, prefix};

    fn base_config() -> ConnectionConfig {
        let mut config = ConnectionConfig::new("local", "mssql");
        config.server = "sql.internal".to_string();
        config.username = "sa".to_string();
        config
    }

    #[test]
    fn config_uses_default_port() {
        let tds_config = build_tiberius_config(&base_config()).expect("build config");
        assert_eq!(tds_config.get_addr(), "sql.internal:1433");
    }

    #[test]
    fn username_is_required() {
        let mut config = base_config();
        config.username.clear();
        let error = build_tiberius_config(&config).expect_err("username missing");
        assert!(error.to_string().contains("requires `username`"));
    }

    #[test]
    fn malformed_trust_flag_is_rejected() {
        let config = base_config().with_option("trust_server_certificate", "sometimes");
        assert!(build_tiberius_config(&config).is_err());
    }

    #[test]
    fn encryption_levels_parse() {
        assert!(matches!(
            parse_encryption("Required"),
            Ok(EncryptionLevel::Required)
        ));
        assert!(parse_encryption("maybe").is_err());
    }

    #[test]
    fn catalog_prefix_quotes_the_database() {
        assert_eq!(prefix(None), "");
        assert_eq!(prefix(Some("sales]db")), "[sales]]db].");
    }

    #[test]
    fn preview_uses_top() {
        assert_eq!(
            MssqlAdapter.build_select_query("orders", 5, Some("shop"), None),
            "SELECT TOP 5 * FROM [shop].[dbo].[orders]"
        );
    }
}
