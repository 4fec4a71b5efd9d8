#![allow(dead_code)]

use std::sync::Mutex;

use sqlit_core::{
    Adapter, AdapterDescriptor, Capabilities, ColumnInfo, Connection, ConnectionConfig,
    DriverInfo, Error, OptionSpec, PreviewSyntax, QueryResult, QuoteStyle, Result, Row, TableInfo, Value,
    catalog, collect_rows,
};

pub const FAKE_DB_TYPE: &str = "fake";

pub static FAKE: AdapterDescriptor = AdapterDescriptor {
    db_type: FAKE_DB_TYPE,
    display_name: "Fake",
    badge_label: "FAKE",
    driver: DriverInfo {
        package: "sqlit-adapter-fake",
        extra: "fake",
        crates: &["fake-driver"],
    },
    capabilities: Capabilities {
        multiple_databases: false,
        stored_procedures: false,
        indexes: false,
        triggers: false,
        sequences: false,
        transactions: false,
    },
    default_schema: Some("main"),
    quote_style: QuoteStyle::DoubleQuote,
    preview: PreviewSyntax::Limit,
    options: &[OptionSpec {
        key: "mode",
        description: "fake mode",
    }],
};

pub const FAILING_SQL: &str = "SELECT broken";

/// Session state handed out by [`FakeAdapter::connect`].
#[derive(Debug, Default)]
pub struct FakeSession {
    pub executed: Vec<String>,
    pub pulled_rows: usize,
}

/// In-memory backend whose query results are a fixed table of `row_count`
/// integers and whose catalog is configured up front.
#[derive(Debug, Default)]
pub struct FakeAdapter {
    pub row_count: usize,
    pub tables: Vec<TableInfo>,
    pub closed: Mutex<usize>,
}

impl FakeAdapter {
    pub fn with_rows(row_count: usize) -> Self {
        Self {
            row_count,
            ..Self::default()
        }
    }

    pub fn with_tables(tables: Vec<TableInfo>) -> Self {
        Self {
            tables,
            ..Self::default()
        }
    }

    pub fn closed_count(&self) -> usize {
        *self.closed.lock().expect("close counter lock")
    }

    fn session<'a>(&self, connection: &'a mut Connection) -> Result<&'a mut FakeSession> {
        connection.session_mut::<FakeSession>(FAKE_DB_TYPE)
    }
}

impl Adapter for FakeAdapter {
    fn descriptor(&self) -> &'static AdapterDescriptor {
        &FAKE
    }

    fn connect(&self, config: &ConnectionConfig) -> Result<Connection> {
        config.ensure_db_type(&FAKE)?;
        Ok(Connection::new(
            FAKE_DB_TYPE,
            config.name.clone(),
            FakeSession::default(),
        ))
    }

    fn close(&self, connection: Connection) -> Result<()> {
        connection.into_session::<FakeSession>(FAKE_DB_TYPE)?;
        *self.closed.lock().expect("close counter lock") += 1;
        Ok(())
    }

    fn get_databases(&self, _connection: &mut Connection) -> Result<Vec<String>> {
        Ok(vec!["main".to_string()])
    }

    fn get_tables(
        &self,
        connection: &mut Connection,
        _database: Option<&str>,
    ) -> Result<Vec<TableInfo>> {
        self.session(connection)?;
        Ok(catalog::normalize_tables(self.tables.clone()))
    }

    fn get_views(
        &self,
        connection: &mut Connection,
        _database: Option<&str>,
    ) -> Result<Vec<TableInfo>> {
        self.session(connection)?;
        Ok(Vec::new())
    }

    fn get_columns(
        &self,
        connection: &mut Connection,
        _table: &str,
        _database: Option<&str>,
        _schema: Option<&str>,
    ) -> Result<Vec<ColumnInfo>> {
        self.session(connection)?;
        Ok(vec![ColumnInfo {
            name: "n".to_string(),
            data_type: "INTEGER".to_string(),
            is_primary_key: true,
        }])
    }

    fn execute_query(
        &self,
        connection: &mut Connection,
        query: &str,
        max_rows: Option<usize>,
    ) -> Result<QueryResult> {
        let session = self.session(connection)?;
        session.executed.push(query.to_string());
        if query == FAILING_SQL {
            return Err(Error::query(query, "syntax error near \"broken\""));
        }

        let pulled = &mut session.pulled_rows;
        let source = (0..self.row_count).map(|n| {
            *pulled += 1;
            Ok::<Row, Error>(vec![Value::Int(n as i64)])
        });
        let (rows, truncated) = collect_rows(source, max_rows)?;

        Ok(QueryResult {
            columns: vec!["n".to_string()],
            rows,
            truncated,
        })
    }

    fn execute_non_query(&self, connection: &mut Connection, query: &str) -> Result<i64> {
        let session = self.session(connection)?;
        session.executed.push(query.to_string());
        Ok(self.row_count as i64)
    }
}
