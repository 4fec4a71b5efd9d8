use crate::{
    AdapterDescriptor, ColumnInfo, Connection, ConnectionConfig, IndexInfo, QueryResult, Result,
    SequenceInfo, TableInfo, TriggerInfo, quote::qualified_name,
};

/// The contract every backend implements.
///
/// All operations block the calling thread. Metadata kinds a backend lacks
/// resolve to an empty list; `descriptor().capabilities` says which ones
/// those are.
pub trait Adapter: Send + Sync {
    fn descriptor(&self) -> &'static AdapterDescriptor;

    fn db_type(&self) -> &'static str {
        self.descriptor().db_type
    }

    fn connect(&self, config: &ConnectionConfig) -> Result<Connection>;

    /// Releases a session. Dropping the handle has the same effect; this
    /// variant surfaces errors from an orderly shutdown.
    fn close(&self, connection: Connection) -> Result<()> {
        drop(connection);
        Ok(())
    }

    fn get_databases(&self, connection: &mut Connection) -> Result<Vec<String>>;

    fn get_tables(
        &self,
        connection: &mut Connection,
        database: Option<&str>,
    ) -> Result<Vec<TableInfo>>;

    fn get_views(
        &self,
        connection: &mut Connection,
        database: Option<&str>,
    ) -> Result<Vec<TableInfo>>;

    fn get_columns(
        &self,
        connection: &mut Connection,
        table: &str,
        database: Option<&str>,
        schema: Option<&str>,
    ) -> Result<Vec<ColumnInfo>>;

    fn get_indexes(
        &self,
        _connection: &mut Connection,
        _database: Option<&str>,
    ) -> Result<Vec<IndexInfo>> {
        Ok(Vec::new())
    }

    fn get_triggers(
        &self,
        _connection: &mut Connection,
        _database: Option<&str>,
    ) -> Result<Vec<TriggerInfo>> {
        Ok(Vec::new())
    }

    fn get_sequences(
        &self,
        _connection: &mut Connection,
        _database: Option<&str>,
    ) -> Result<Vec<SequenceInfo>> {
        Ok(Vec::new())
    }

    fn get_procedures(
        &self,
        _connection: &mut Connection,
        _database: Option<&str>,
    ) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn quote_identifier(&self, name: &str) -> String {
        self.descriptor().quote_style.quote(name)
    }

    /// Preview query for `<db>.<schema>.<table>` with every part quoted.
    /// `schema` falls back to the default schema.
    fn build_select_query(
        &self,
        table: &str,
        limit: u64,
        database: Option<&str>,
        schema: Option<&str>,
    ) -> String {
        let descriptor = self.descriptor();
        let schema = schema.or(descriptor.default_schema);
        let target = qualified_name(descriptor.quote_style, &[database, schema, Some(table)]);
        descriptor.preview.render(&target, limit)
    }

    fn execute_query(
        &self,
        connection: &mut Connection,
        query: &str,
        max_rows: Option<usize>,
    ) -> Result<QueryResult>;

    /// Affected-row count, or [`crate::ROW_COUNT_UNKNOWN`].
    fn execute_non_query(&self, connection: &mut Connection, query: &str) -> Result<i64>;
}

/// Stand-in registered for a backend whose driver was not compiled in.
/// `connect` always reports `DriverMissing`; every other operation needs a
/// handle that cannot exist, so it reports a handle mismatch.
#[derive(Debug, Clone, Copy)]
pub struct UnavailableAdapter {
    descriptor: &'static AdapterDescriptor,
}

impl UnavailableAdapter {
    #[must_use]
    pub fn new(descriptor: &'static AdapterDescriptor) -> Self {
        Self { descriptor }
    }

    fn foreign(&self, connection: &Connection) -> crate::Error {
        crate::Error::ConnectionMismatch {
            expected: self.descriptor.db_type,
            actual: connection.db_type(),
        }
    }
}

impl Adapter for UnavailableAdapter {
    fn descriptor(&self) -> &'static AdapterDescriptor {
        self.descriptor
    }

    fn connect(&self, config: &ConnectionConfig) -> Result<Connection> {
        config.ensure_db_type(self.descriptor)?;
        Err(crate::DriverMissing::for_descriptor(self.descriptor).into())
    }

    fn get_databases(&self, connection: &mut Connection) -> Result<Vec<String>> {
        Err(self.foreign(connection))
    }

    fn get_tables(
        &self,
        connection: &mut Connection,
        _database: Option<&str>,
    ) -> Result<Vec<TableInfo>> {
        Err(self.foreign(connection))
    }

    fn get_views(
        &self,
        connection: &mut Connection,
        _database: Option<&str>,
    ) -> Result<Vec<TableInfo>> {
        Err(self.foreign(connection))
    }

    fn get_columns(
        &self,
        connection: &mut Connection,
        _table: &str,
        _database: Option<&str>,
        _schema: Option<&str>,
    ) -> Result<Vec<ColumnInfo>> {
        Err(self.foreign(connection))
    }

    fn execute_query(
        &self,
        connection: &mut Connection,
        _query: &str,
        _max_rows: Option<usize>,
    ) -> Result<QueryResult> {
        Err(self.foreign(connection))
    }

    fn execute_non_query(&self, connection: &mut Connection, _query: &str) -> Result<i64> {
        Err(self.foreign(connection))
    }
}
