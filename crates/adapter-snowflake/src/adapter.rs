use std::{collections::HashSet, io};

use sqlit_core::{
    Adapter, AdapterDescriptor, ColumnInfo, ConfigError, Connection, ConnectionConfig, Error,
    QueryResult, ROW_COUNT_UNKNOWN, RawColumn, Result, RowCollector, SequenceInfo, TableInfo,
    catalog, descriptor::builtin, quote, reports_row_count,
};
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info};

use crate::{
    api::ResultSet,
    catalog_queries,
    client::{Auth, SessionContext, SnowflakeClient},
    value,
};

const DB_TYPE: &str = builtin::SNOWFLAKE.db_type;
const DEFAULT_SNOWFLAKE_SCHEMA: &str = "PUBLIC";
const CLOSE_SQL: &str = "CLOSE snowflake";
const WAREHOUSE_OPTION: &str = "warehouse";
const SCHEMA_OPTION: &str = "schema";
const ROLE_OPTION: &str = "role";
const AUTHENTICATOR_OPTION: &str = "authenticator";

#[derive(Debug, Default, Clone, Copy)]
pub struct SnowflakeAdapter;

struct SnowflakeSession {
    runtime: Runtime,
    client: SnowflakeClient,
    context: SessionContext,
}

impl SnowflakeSession {
    fn run(&self, sql: &str, bindings: &[&str]) -> Result<ResultSet> {
        self.runtime
            .block_on(self.client.execute(sql, bindings))
            .map_err(|source| Error::query(sql, source))
    }

    fn catalog(&self, sql: &str, bindings: &[&str]) -> Result<ResultSet> {
        debug!(adapter = DB_TYPE, sql, "executing catalog query");
        self.run(sql, bindings)
    }

    fn schema(&self) -> &str {
        self.context
            .schema
            .as_deref()
            .unwrap_or(DEFAULT_SNOWFLAKE_SCHEMA)
    }
}

impl SnowflakeAdapter {
    fn session<'a>(&self, connection: &'a mut Connection) -> Result<&'a mut SnowflakeSession> {
        connection.session_mut::<SnowflakeSession>(DB_TYPE)
    }

    fn list_tables(&self, connection: &mut Connection, sql: &str) -> Result<Vec<TableInfo>> {
        let result = self.session(connection)?.catalog(sql, &[])?;
        let schemas = column_strings(&result, sql, "TABLE_SCHEMA")?;
        let names = column_strings(&result, sql, "TABLE_NAME")?;
        Ok(catalog::normalize_tables(
            schemas
                .into_iter()
                .zip(names)
                .map(|(schema, name)| TableInfo::new(schema, name))
                .collect(),
        ))
    }

    fn list_names(
        &self,
        connection: &mut Connection,
        sql: &str,
        column: &str,
    ) -> Result<Vec<String>> {
        let result = self.session(connection)?.catalog(sql, &[])?;
        column_strings(&result, sql, column)
    }
}

impl Adapter for SnowflakeAdapter {
    fn descriptor(&self) -> &'static AdapterDescriptor {
        &builtin::SNOWFLAKE
    }

    fn connect(&self, config: &ConnectionConfig) -> Result<Connection> {
        config.ensure_db_type(&builtin::SNOWFLAKE)?;
        let account = config.require(&builtin::SNOWFLAKE, "server", &config.server)?;
        let auth = auth(config)?;
        let context = session_context(config);

        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|source| Error::connect(DB_TYPE, &config.name, source))?;
        let client = runtime
            .block_on(SnowflakeClient::open(account, auth, context.clone()))
            .map_err(|source| Error::connect(DB_TYPE, &config.name, source))?;

        info!(
            adapter = DB_TYPE,
            connection = %config.name,
            server = %config.server,
            database = %config.database,
            password_login = matches!(auth, Auth::Password { .. }),
            "connected"
        );
        Ok(Connection::new(
            DB_TYPE,
            config.name.clone(),
            SnowflakeSession {
                runtime,
                client,
                context,
            },
        ))
    }

    fn close(&self, connection: Connection) -> Result<()> {
        let name = connection.name().to_string();
        let session = connection.into_session::<SnowflakeSession>(DB_TYPE)?;
        session
            .runtime
            .block_on(session.client.close())
            .map_err(|source| Error::query(CLOSE_SQL, source))?;
        info!(adapter = DB_TYPE, connection = %name, "closed");
        Ok(())
    }

    fn get_databases(&self, connection: &mut Connection) -> Result<Vec<String>> {
        let names = self.list_names(connection, catalog_queries::DATABASES_QUERY, "name")?;
        Ok(catalog::distinct_sorted(names))
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
        let schema = schema.unwrap_or_else(|| session.schema()).to_string();

        let sql = catalog_queries::columns_query(&prefix(database));
        let result = session.catalog(&sql, &[schema.as_str(), table])?;
        let columns = column_strings(&result, &sql, "COLUMN_NAME")?
            .into_iter()
            .zip(column_strings(&result, &sql, "DATA_TYPE")?)
            .map(|(name, data_type)| RawColumn::new(name, data_type))
            .collect::<Vec<_>>();
        if columns.is_empty() {
            return Ok(Vec::new());
        }

        let target = quote::qualified_name(
            builtin::SNOWFLAKE.quote_style,
            &[
                database.or(session.context.database.as_deref()),
                Some(schema.as_str()),
                Some(table),
            ],
        );
        let sql = catalog_queries::primary_keys_query(&target);
        let key_columns = column_strings(&session.catalog(&sql, &[])?, &sql, "column_name")?
            .into_iter()
            .collect::<HashSet<_>>();

        Ok(catalog::merge_primary_keys(columns, &key_columns))
    }

    fn get_sequences(
        &self,
        connection: &mut Connection,
        database: Option<&str>,
    ) -> Result<Vec<SequenceInfo>> {
        let sql = catalog_queries::sequences_query(&prefix(database));
        let names = self.list_names(connection, &sql, "SEQUENCE_NAME")?;
        Ok(catalog::sort_sequences(
            names.into_iter().map(|name| SequenceInfo { name }).collect(),
        ))
    }

    fn get_procedures(
        &self,
        connection: &mut Connection,
        database: Option<&str>,
    ) -> Result<Vec<String>> {
        let sql = catalog_queries::procedures_query(&prefix(database));
        let names = self.list_names(connection, &sql, "PROCEDURE_NAME")?;
        Ok(catalog::distinct_sorted(names))
    }

    fn execute_query(
        &self,
        connection: &mut Connection,
        query: &str,
        max_rows: Option<usize>,
    ) -> Result<QueryResult> {
        let session = self.session(connection)?;

        debug!(adapter = DB_TYPE, sql = query, ?max_rows, "executing query");
        let mut result = session.run(query, &[])?;
        let row_type = result.row_type().to_vec();
        let columns = row_type.iter().map(|column| column.name.clone()).collect();

        let mut collector = RowCollector::new(max_rows);
        let decode = |cells| value::decode_row(&row_type, cells);
        let first = std::mem::take(&mut result.data);
        let mut wants_more = collector.extend(first.into_iter().map(decode));

        // Later partitions are fetched only while the ceiling is not reached.
        for partition in 1..result.partition_count() {
            if !wants_more {
                break;
            }
            let rows = session
                .runtime
                .block_on(session.client.partition(&result, partition))
                .map_err(|source| Error::query(query, source))?;
            wants_more = collector.extend(rows.into_iter().map(decode));
        }

        Ok(collector.finish(columns))
    }

    fn execute_non_query(&self, connection: &mut Connection, query: &str) -> Result<i64> {
        let session = self.session(connection)?;

        debug!(adapter = DB_TYPE, sql = query, "executing statement");
        let result = session.run(query, &[])?;
        if !reports_row_count(query) {
            return Ok(ROW_COUNT_UNKNOWN);
        }

        Ok(result
            .stats
            .as_ref()
            .map_or(ROW_COUNT_UNKNOWN, |stats| stats.affected()))
    }
}

fn session_context(config: &ConnectionConfig) -> SessionContext {
    SessionContext {
        database: Some(config.database.clone()).filter(|database| !database.is_empty()),
        schema: config.option_str(SCHEMA_OPTION),
        warehouse: config.option_str(WAREHOUSE_OPTION),
        role: config.option_str(ROLE_OPTION),
    }
}

/// Picks the login flow. Without an `authenticator`, a username selects the
/// password login and its absence a programmatic access token.
fn auth(config: &ConnectionConfig) -> Result<Auth<'_>> {
    let password = config.require(&builtin::SNOWFLAKE, "password", &config.password)?;
    let authenticator = config
        .option_str(AUTHENTICATOR_OPTION)
        .map(|raw| raw.trim().to_ascii_lowercase());

    let token_type = match authenticator.as_deref() {
        None if config.username.trim().is_empty() => "PROGRAMMATIC_ACCESS_TOKEN",
        None | Some("snowflake") => {
            return Ok(Auth::Password {
                user: config.require(&builtin::SNOWFLAKE, "username", &config.username)?,
                password,
            });
        }
        Some("programmatic_access_token") => "PROGRAMMATIC_ACCESS_TOKEN",
        Some("oauth") => "OAUTH",
        Some("keypair_jwt") => "KEYPAIR_JWT",
        Some(other) => {
            return Err(ConfigError::InvalidOption {
                key: AUTHENTICATOR_OPTION.to_string(),
                value: other.to_string(),
                expected: "one of snowflake, programmatic_access_token, oauth, keypair_jwt",
            }
            .into());
        }
    };
    Ok(Auth::Token {
        token: password,
        token_type,
    })
}

/// `"db".` for an explicit database, empty for the session one.
fn prefix(database: Option<&str>) -> String {
    database.map_or_else(String::new, |database| {
        format!("{}.", builtin::SNOWFLAKE.quote_style.quote(database))
    })
}

fn column_strings(result: &ResultSet, sql: &str, column: &str) -> Result<Vec<String>> {
    let index = result.column_index(column).ok_or_else(|| {
        Error::query(
            sql,
            io::Error::other(format!("missing column `{column}` in query result")),
        )
    })?;
    Ok(result
        .data
        .iter()
        .filter_map(|row| row.get(index).cloned().flatten())
        .collect())
}
