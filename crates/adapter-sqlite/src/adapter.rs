use std::{io, time::Duration};

use rusqlite::{OpenFlags, params};
use sqlit_core::{
    Adapter, AdapterDescriptor, ColumnInfo, Connection, ConnectionConfig, Error, IndexInfo,
    QueryResult, ROW_COUNT_UNKNOWN, Result, Row, TableInfo, TriggerInfo, catalog, collect_rows,
    descriptor::builtin, reports_row_count,
};
use tracing::{debug, info};

use crate::{catalog_queries, value};

const DB_TYPE: &str = builtin::SQLITE.db_type;
const DEFAULT_SCHEMA: &str = "main";
const CLOSE_SQL: &str = "CLOSE sqlite";
const READ_ONLY_OPTION: &str = "read_only";
const BUSY_TIMEOUT_OPTION: &str = "busy_timeout_ms";

#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteAdapter;

struct SqliteSession {
    connection: rusqlite::Connection,
}

impl SqliteAdapter {
    fn session<'a>(&self, connection: &'a mut Connection) -> Result<&'a rusqlite::Connection> {
        connection
            .session_mut::<SqliteSession>(DB_TYPE)
            .map(|session| &session.connection)
    }
}

impl Adapter for SqliteAdapter {
    fn descriptor(&self) -> &'static AdapterDescriptor {
        &builtin::SQLITE
    }

    fn connect(&self, config: &ConnectionConfig) -> Result<Connection> {
        config.ensure_db_type(&builtin::SQLITE)?;
        let path = config.require(&builtin::SQLITE, "database", &config.database)?;

        let read_only = config.option_bool(READ_ONLY_OPTION)?.unwrap_or(false);
        let flags = if read_only {
            OpenFlags::SQLITE_OPEN_READ_ONLY
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX
        } else {
            OpenFlags::default()
        };

        let connection = rusqlite::Connection::open_with_flags(path, flags)
            .map_err(|source| Error::connect(DB_TYPE, &config.name, source))?;
        if let Some(timeout) = config.option_u64(BUSY_TIMEOUT_OPTION)? {
            connection
                .busy_timeout(Duration::from_millis(timeout))
                .map_err(|source| Error::connect(DB_TYPE, &config.name, source))?;
        }

        info!(adapter = DB_TYPE, connection = %config.name, path, read_only, "connected");
        Ok(Connection::new(
            DB_TYPE,
            config.name.clone(),
            SqliteSession { connection },
        ))
    }

    fn close(&self, connection: Connection) -> Result<()> {
        let name = connection.name().to_string();
        let session = connection.into_session::<SqliteSession>(DB_TYPE)?;
        session
            .connection
            .close()
            .map_err(|(_, source)| Error::query(CLOSE_SQL, source))?;
        info!(adapter = DB_TYPE, connection = %name, "closed");
        Ok(())
    }

    fn get_databases(&self, connection: &mut Connection) -> Result<Vec<String>> {
        let connection = self.session(connection)?;
        query_strings(connection, catalog_queries::DATABASES_QUERY)
    }

    fn get_tables(
        &self,
        connection: &mut Connection,
        database: Option<&str>,
    ) -> Result<Vec<TableInfo>> {
        let connection = self.session(connection)?;
        let schema = database.unwrap_or(DEFAULT_SCHEMA);
        let sql = catalog_queries::tables_query(&self.quote_identifier(schema));
        let names = query_strings(connection, &sql)?;
        Ok(catalog::normalize_tables(
            names.into_iter().map(|name| TableInfo::new(schema, name)).collect(),
        ))
    }

    fn get_views(
        &self,
        connection: &mut Connection,
        database: Option<&str>,
    ) -> Result<Vec<TableInfo>> {
        let connection = self.session(connection)?;
        let schema = database.unwrap_or(DEFAULT_SCHEMA);
        let sql = catalog_queries::views_query(&self.quote_identifier(schema));
        let names = query_strings(connection, &sql)?;
        Ok(catalog::normalize_tables(
            names.into_iter().map(|name| TableInfo::new(schema, name)).collect(),
        ))
    }

    fn get_columns(
        &self,
        connection: &mut Connection,
        table: &str,
        database: Option<&str>,
        schema: Option<&str>,
    ) -> Result<Vec<ColumnInfo>> {
        let connection = self.session(connection)?;
        let schema = schema.or(database).unwrap_or(DEFAULT_SCHEMA);
        let sql = catalog_queries::COLUMNS_QUERY;

        debug!(adapter = DB_TYPE, sql, table, schema, "executing catalog query");
        let mut statement = connection
            .prepare(sql)
            .map_err(|source| Error::query(sql, source))?;
        let columns = statement
            .query_map(params![table, schema], |row| {
                Ok(ColumnInfo {
                    name: row.get(0)?,
                    data_type: row.get(1)?,
                    // pk is the 1-based position within the key, 0 for non-key columns.
                    is_primary_key: row.get::<_, i64>(2)? > 0,
                })
            })
            .map_err(|source| Error::query(sql, source))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|source| Error::query(sql, source))?;

        Ok(columns)
    }

    fn get_indexes(
        &self,
        connection: &mut Connection,
        database: Option<&str>,
    ) -> Result<Vec<IndexInfo>> {
        let connection = self.session(connection)?;
        let schema = database.unwrap_or(DEFAULT_SCHEMA);
        let sql = catalog_queries::indexes_query(&self.quote_identifier(schema));

        debug!(adapter = DB_TYPE, sql = %sql, "executing catalog query");
        let mut statement = connection
            .prepare(&sql)
            .map_err(|source| Error::query(&sql, source))?;
        let indexes = statement
            .query_map([schema], |row| {
                Ok(IndexInfo {
                    name: row.get(0)?,
                    table_name: row.get(1)?,
                    is_unique: row.get::<_, i64>(2)? != 0,
                })
            })
            .map_err(|source| Error::query(&sql, source))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|source| Error::query(&sql, source))?;

        Ok(catalog::sort_indexes(indexes))
    }

    fn get_triggers(
        &self,
        connection: &mut Connection,
        database: Option<&str>,
    ) -> Result<Vec<TriggerInfo>> {
        let connection = self.session(connection)?;
        let schema = database.unwrap_or(DEFAULT_SCHEMA);
        let sql = catalog_queries::triggers_query(&self.quote_identifier(schema));

        debug!(adapter = DB_TYPE, sql = %sql, "executing catalog query");
        let mut statement = connection
            .prepare(&sql)
            .map_err(|source| Error::query(&sql, source))?;
        let triggers = statement
            .query_map([], |row| {
                Ok(TriggerInfo {
                    name: row.get(0)?,
                    table_name: row.get(1)?,
                })
            })
            .map_err(|source| Error::query(&sql, source))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|source| Error::query(&sql, source))?;

        Ok(catalog::sort_triggers(triggers))
    }

    fn execute_query(
        &self,
        connection: &mut Connection,
        query: &str,
        max_rows: Option<usize>,
    ) -> Result<QueryResult> {
        let connection = self.session(connection)?;

        debug!(adapter = DB_TYPE, sql = query, ?max_rows, "executing query");
        let mut statement = connection
            .prepare(query)
            .map_err(|source| Error::query(query, source))?;
        let columns = statement
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        let width = columns.len();

        let rows = statement
            .query([])
            .map_err(|source| Error::query(query, source))?
            .mapped(|row| {
                (0..width)
                    .map(|index| row.get_ref(index).map(value::from_sqlite))
                    .collect::<rusqlite::Result<Row>>()
            });
        let (rows, truncated) =
            collect_rows(rows, max_rows).map_err(|source| Error::query(query, source))?;

        Ok(QueryResult {
            columns,
            rows,
            truncated,
        })
    }

    fn execute_non_query(&self, connection: &mut Connection, query: &str) -> Result<i64> {
        let connection = self.session(connection)?;

        debug!(adapter = DB_TYPE, sql = query, "executing statement");
        let mut statement = connection
            .prepare(query)
            .map_err(|source| Error::query(query, source))?;

        if statement.column_count() > 0 {
            let mut rows = statement
                .query([])
                .map_err(|source| Error::query(query, source))?;
            while rows
                .next()
                .map_err(|source| Error::query(query, source))?
                .is_some()
            {}
            return Ok(ROW_COUNT_UNKNOWN);
        }

        let changed = statement
            .execute([])
            .map_err(|source| Error::query(query, source))?;
        if !reports_row_count(query) {
            return Ok(ROW_COUNT_UNKNOWN);
        }

        i64::try_from(changed).map_err(|_| {
            Error::query(
                query,
                io::Error::other(format!("row count {changed} does not fit in i64")),
            )
        })
    }
}

fn query_strings(connection: &rusqlite::Connection, sql: &str) -> Result<Vec<String>> {
    debug!(adapter = DB_TYPE, sql, "executing catalog query");
    let mut statement = connection
        .prepare(sql)
        .map_err(|source| Error::query(sql, source))?;
    statement
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(|source| Error::query(sql, source))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|source| Error::query(sql, source))
}
