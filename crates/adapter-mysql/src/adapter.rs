use std::{collections::HashSet, io, time::Duration};

use mysql::{Conn, Opts, OptsBuilder, Row as MysqlRow, prelude::Queryable};
use sqlit_core::{
    Adapter, AdapterDescriptor, ColumnInfo, Connection, ConnectionConfig, Error, IndexInfo,
    QueryResult, ROW_COUNT_UNKNOWN, RawColumn, Result, TableInfo, TriggerInfo, catalog,
    collect_rows, descriptor::builtin, quote::qualified_name, reports_row_count,
};
use tracing::{debug, info};

use crate::{catalog_queries, value};

const DB_TYPE: &str = builtin::MYSQL.db_type;
const DEFAULT_MYSQL_PORT: u16 = 3306;
const SOCKET_OPTION: &str = "socket";
const CONNECT_TIMEOUT_OPTION: &str = "connect_timeout";

#[derive(Debug, Default, Clone, Copy)]
pub struct MysqlAdapter;

struct MysqlSession {
    conn: Conn,
}

impl MysqlAdapter {
    fn conn<'a>(&self, connection: &'a mut Connection) -> Result<&'a mut Conn> {
        connection
            .session_mut::<MysqlSession>(DB_TYPE)
            .map(|session| &mut session.conn)
    }
}

impl Adapter for MysqlAdapter {
    fn descriptor(&self) -> &'static AdapterDescriptor {
        &builtin::MYSQL
    }

    fn connect(&self, config: &ConnectionConfig) -> Result<Connection> {
        config.ensure_db_type(&builtin::MYSQL)?;
        let opts = build_opts(config)?;

        let conn = Conn::new(opts).map_err(|source| Error::connect(DB_TYPE, &config.name, source))?;

        info!(
            adapter = DB_TYPE,
            connection = %config.name,
            server = %config.server,
            database = %config.database,
            "connected"
        );
        Ok(Connection::new(DB_TYPE, config.name.clone(), MysqlSession { conn }))
    }

    fn close(&self, connection: Connection) -> Result<()> {
        let name = connection.name().to_string();
        // Dropping the client sends COM_QUIT.
        drop(connection.into_session::<MysqlSession>(DB_TYPE)?);
        info!(adapter = DB_TYPE, connection = %name, "closed");
        Ok(())
    }

    fn get_databases(&self, connection: &mut Connection) -> Result<Vec<String>> {
        let conn = self.conn(connection)?;
        let sql = catalog_queries::DATABASES_QUERY;
        let rows = run_catalog_query(conn, sql, ())?;
        rows.iter()
            .map(|row| row_string(row, 0, sql, "schema_name"))
            .collect()
    }

    fn get_tables(
        &self,
        connection: &mut Connection,
        database: Option<&str>,
    ) -> Result<Vec<TableInfo>> {
        let conn = self.conn(connection)?;
        let tables = query_tables(conn, catalog_queries::TABLES_QUERY, database)?;
        Ok(catalog::normalize_tables(tables))
    }

    fn get_views(
        &self,
        connection: &mut Connection,
        database: Option<&str>,
    ) -> Result<Vec<TableInfo>> {
        let conn = self.conn(connection)?;
        let views = query_tables(conn, catalog_queries::VIEWS_QUERY, database)?;
        Ok(catalog::normalize_tables(views))
    }

    fn get_columns(
        &self,
        connection: &mut Connection,
        table: &str,
        database: Option<&str>,
        schema: Option<&str>,
    ) -> Result<Vec<ColumnInfo>> {
        let conn = self.conn(connection)?;
        let database = schema.or(database);

        let sql = catalog_queries::COLUMNS_QUERY;
        let columns = run_catalog_query(conn, sql, (database, table))?
            .iter()
            .map(|row| {
                Ok(RawColumn::new(
                    row_string(row, 0, sql, "column_name")?,
                    row_string(row, 1, sql, "data_type")?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        let sql = catalog_queries::PRIMARY_KEY_COLUMNS_QUERY;
        let key_columns = run_catalog_query(conn, sql, (database, table))?
            .iter()
            .map(|row| row_string(row, 0, sql, "column_name"))
            .collect::<Result<HashSet<_>>>()?;

        Ok(catalog::merge_primary_keys(columns, &key_columns))
    }

    fn get_indexes(
        &self,
        connection: &mut Connection,
        database: Option<&str>,
    ) -> Result<Vec<IndexInfo>> {
        let conn = self.conn(connection)?;
        let sql = catalog_queries::INDEXES_QUERY;
        let indexes = run_catalog_query(conn, sql, (database,))?
            .iter()
            .map(|row| {
                Ok(IndexInfo {
                    name: row_string(row, 0, sql, "index_name")?,
                    table_name: row_string(row, 1, sql, "table_name")?,
                    is_unique: row_i64(row, 2, sql, "non_unique")? == 0,
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
        let conn = self.conn(connection)?;
        let sql = catalog_queries::TRIGGERS_QUERY;
        let triggers = run_catalog_query(conn, sql, (database,))?
            .iter()
            .map(|row| {
                Ok(TriggerInfo {
                    name: row_string(row, 0, sql, "trigger_name")?,
                    table_name: row_string(row, 1, sql, "event_object_table")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(catalog::sort_triggers(triggers))
    }

    fn get_procedures(
        &self,
        connection: &mut Connection,
        database: Option<&str>,
    ) -> Result<Vec<String>> {
        let conn = self.conn(connection)?;
        let sql = catalog_queries::PROCEDURES_QUERY;
        let names = run_catalog_query(conn, sql, (database,))?
            .iter()
            .map(|row| row_string(row, 0, sql, "routine_name"))
            .collect::<Result<Vec<_>>>()?;
        Ok(catalog::distinct_sorted(names))
    }

    /// A schema argument is a database here, so at most two parts are
    /// qualified.
    fn build_select_query(
        &self,
        table: &str,
        limit: u64,
        database: Option<&str>,
        schema: Option<&str>,
    ) -> String {
        let descriptor = self.descriptor();
        let target = qualified_name(
            descriptor.quote_style,
            &[schema.or(database), Some(table)],
        );
        descriptor.preview.render(&target, limit)
    }

    fn execute_query(
        &self,
        connection: &mut Connection,
        query: &str,
        max_rows: Option<usize>,
    ) -> Result<QueryResult> {
        let conn = self.conn(connection)?;

        debug!(adapter = DB_TYPE, sql = query, ?max_rows, "executing query");
        let mut result = conn
            .query_iter(query)
            .map_err(|source| Error::query(query, source))?;
        let columns = result
            .columns()
            .as_ref()
            .iter()
            .map(|column| column.name_str().into_owned())
            .collect::<Vec<_>>();

        // The protocol has no cancel: dropping `result` reads and discards
        // whatever the server still sends.
        let rows = result
            .by_ref()
            .map(|row| row.map(|row| value::decode_row(&row)));
        let (rows, truncated) =
            collect_rows(rows, max_rows).map_err(|source| Error::query(query, source))?;

        Ok(QueryResult {
            columns,
            rows,
            truncated,
        })
    }

    fn execute_non_query(&self, connection: &mut Connection, query: &str) -> Result<i64> {
        let conn = self.conn(connection)?;

        debug!(adapter = DB_TYPE, sql = query, "executing statement");
        let mut result = conn
            .query_iter(query)
            .map_err(|source| Error::query(query, source))?;

        if !result.columns().as_ref().is_empty() {
            for row in result.by_ref() {
                row.map_err(|source| Error::query(query, source))?;
            }
            return Ok(ROW_COUNT_UNKNOWN);
        }

        let affected = result.affected_rows();
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

fn build_opts(config: &ConnectionConfig) -> Result<Opts> {
    let socket = config.option_str(SOCKET_OPTION);
    let mut builder = OptsBuilder::new().tcp_port(config.port.unwrap_or(DEFAULT_MYSQL_PORT));

    if socket.is_none() {
        let server = config.require(&builtin::MYSQL, "server", &config.server)?;
        builder = builder.ip_or_hostname(Some(server));
    } else if !config.server.is_empty() {
        builder = builder.ip_or_hostname(Some(&config.server));
    }
    if !config.username.is_empty() {
        builder = builder.user(Some(&config.username));
    }
    if !config.password.is_empty() {
        builder = builder.pass(Some(&config.password));
    }
    if !config.database.is_empty() {
        builder = builder.db_name(Some(&config.database));
    }
    if let Some(socket) = socket {
        builder = builder.socket(Some(socket));
    }
    if let Some(seconds) = config.option_u64(CONNECT_TIMEOUT_OPTION)? {
        builder = builder.tcp_connect_timeout(Some(Duration::from_secs(seconds)));
    }

    Ok(Opts::from(builder))
}

fn query_tables(conn: &mut Conn, sql: &str, database: Option<&str>) -> Result<Vec<TableInfo>> {
    run_catalog_query(conn, sql, (database,))?
        .iter()
        .map(|row| {
            Ok(TableInfo::new(
                row_string(row, 0, sql, "table_schema")?,
                row_string(row, 1, sql, "table_name")?,
            ))
        })
        .collect()
}

fn run_catalog_query<P>(conn: &mut Conn, sql: &str, params: P) -> Result<Vec<MysqlRow>>
where
    P: Into<mysql::Params>,
{
    debug!(adapter = DB_TYPE, sql, "executing catalog query");
    conn.exec::<MysqlRow, _, _>(sql, params)
        .map_err(|source| Error::query(sql, source))
}

fn row_string(row: &MysqlRow, index: usize, sql: &str, label: &str) -> Result<String> {
    row.get::<String, usize>(index)
        .ok_or_else(|| missing_column(sql, label))
}

fn row_i64(row: &MysqlRow, index: usize, sql: &str, label: &str) -> Result<i64> {
    row.get::<i64, usize>(index)
        .ok_or_else(|| missing_column(sql, label))
}

fn missing_column(sql: &str, label: &str) -> Error {
    Error::query(
        sql,
        io::Error::other(format!("missing column `{label}` in query result")),
    )
}

#[cfg(test)]
mod tests {
    use sqlit_core::{Adapter, ConnectionConfig};

    use super::{MysqlAdapter, build_opts};

    #[test]
    fn config_maps_fields_and_options() {
        let mut config =
            ConnectionConfig::new("local", "mysql").with_option("connect_timeout", 3_i64);
        config.server = "db.internal".to_string();
        config.username = "app".to_string();
        config.database = "shop".to_string();

        let opts = build_opts(&config).expect("build opts");

        assert_eq!(opts.get_tcp_port(), 3306);
        assert_eq!(opts.get_user(), Some("app"));
        assert_eq!(opts.get_db_name(), Some("shop"));
        assert_eq!(opts.get_pass(), None);
    }

    #[test]
    fn socket_replaces_the_server_requirement() {
        let config = ConnectionConfig::new("local", "mysql")
            .with_option("socket", "/run/mysqld/mysqld.sock");
        let opts = build_opts(&config).expect("socket is enough");
        assert_eq!(opts.get_socket(), Some("/run/mysqld/mysqld.sock"));

        let error = build_opts(&ConnectionConfig::new("local", "mysql"))
            .expect_err("server missing");
        assert!(error.to_string().contains("requires `server`"));
    }

    #[test]
    fn preview_treats_schema_as_database() {
        let adapter = MysqlAdapter;
        assert_eq!(
            adapter.build_select_query("orders", 10, Some("shop"), None),
            "SELECT * FROM `shop`.`orders` LIMIT 10"
        );
        assert_eq!(
            adapter.build_select_query("orders", 10, Some("shop"), Some("archive")),
            "SELECT * FROM `archive`.`orders` LIMIT 10"
        );
        assert_eq!(
            adapter.build_select_query("orders", 10, None, None),
            "SELECT * FROM `orders` LIMIT 10"
        );
    }
}
