use std::collections::HashSet;

use sqlit_core::{
    Adapter, AdapterDescriptor, ColumnInfo, ConfigError, Connection, ConnectionConfig, Error,
    QueryResult, ROW_COUNT_UNKNOWN, RawColumn, Result, RowCollector, TableInfo, catalog,
    descriptor::builtin, quote::qualified_name, reports_row_count,
};
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info};

use crate::{
    catalog_queries,
    client::{AthenaClient, Auth, ClientSettings},
    value,
};

const DB_TYPE: &str = builtin::ATHENA.db_type;
const DEFAULT_DATABASE: &str = "default";
const DEFAULT_WORK_GROUP: &str = "primary";
const DEFAULT_CATALOG: &str = "AwsDataCatalog";
/// Upper bound the GetQueryResults API accepts.
const PAGE_SIZE: i32 = 1000;
const REGION_OPTION: &str = "athena_region_name";
const STAGING_DIR_OPTION: &str = "athena_s3_staging_dir";
const WORK_GROUP_OPTION: &str = "athena_work_group";
const AUTH_METHOD_OPTION: &str = "athena_auth_method";
const PROFILE_OPTION: &str = "athena_profile_name";
const CATALOG_OPTION: &str = "athena_catalog";

#[derive(Debug, Default, Clone, Copy)]
pub struct AthenaAdapter;

struct AthenaSession {
    runtime: Runtime,
    client: AthenaClient,
}

impl AthenaSession {
    fn database<'a>(&'a self, database: Option<&'a str>) -> &'a str {
        database.unwrap_or(&self.client.settings().database)
    }

    /// Runs `sql` to completion and pages results until `max_rows` is
    /// decided or the results run out.
    fn fetch(&self, sql: &str, max_rows: Option<usize>) -> Result<QueryResult> {
        self.runtime.block_on(async {
            let execution = self
                .client
                .run(sql)
                .await
                .map_err(|source| Error::query(sql, source))?;

            let mut collector = RowCollector::new(max_rows);
            let mut columns = Vec::new();
            let mut types = Vec::new();
            let mut next_token = None;
            let mut first_page = true;
            loop {
                let page = self
                    .client
                    .page(&execution.id, next_token.take(), PAGE_SIZE)
                    .await
                    .map_err(|source| Error::query(sql, source))?;
                let Some(result_set) = page.result_set() else {
                    break;
                };

                let mut rows = result_set.rows();
                if first_page {
                    if let Some(metadata) = result_set.result_set_metadata() {
                        columns = metadata
                            .column_info()
                            .iter()
                            .map(|column| column.name().to_string())
                            .collect();
                        types = metadata
                            .column_info()
                            .iter()
                            .map(|column| column.r#type().to_string())
                            .collect();
                    }
                    if execution.has_header_row {
                        if let Some((header, rest)) = rows.split_first() {
                            if value::is_header_row(&columns, header.data()) {
                                rows = rest;
                            }
                        }
                    }
                    first_page = false;
                }

                let wants_more = collector
                    .extend(rows.iter().map(|row| value::decode_row(&types, row.data())));
                next_token = page.next_token().map(str::to_string);
                if !wants_more || next_token.is_none() {
                    break;
                }
            }

            Ok(collector.finish(columns))
        })
    }

    fn catalog(&self, sql: &str) -> Result<QueryResult> {
        debug!(adapter = DB_TYPE, sql, "executing catalog query");
        self.fetch(sql, None)
    }
}

impl AthenaAdapter {
    fn session<'a>(&self, connection: &'a mut Connection) -> Result<&'a mut AthenaSession> {
        connection.session_mut::<AthenaSession>(DB_TYPE)
    }

    fn list_tables(&self, connection: &mut Connection, sql: &str) -> Result<Vec<TableInfo>> {
        let result = self.session(connection)?.catalog(sql)?;
        Ok(catalog::normalize_tables(
            result
                .rows
                .iter()
                .filter_map(|row| Some(TableInfo::new(text(row, 0)?, text(row, 1)?)))
                .collect(),
        ))
    }
}

impl Adapter for AthenaAdapter {
    fn descriptor(&self) -> &'static AdapterDescriptor {
        &builtin::ATHENA
    }

    fn connect(&self, config: &ConnectionConfig) -> Result<Connection> {
        config.ensure_db_type(&builtin::ATHENA)?;
        let settings = client_settings(config)?;

        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|source| Error::connect(DB_TYPE, &config.name, source))?;
        let client = runtime.block_on(async {
            let client = AthenaClient::new(settings).await;
            client
                .ping()
                .await
                .map_err(|source| Error::connect(DB_TYPE, &config.name, source))?;
            Ok::<_, Error>(client)
        })?;

        info!(
            adapter = DB_TYPE,
            connection = %config.name,
            region = ?client.settings().region,
            database = %client.settings().database,
            "connected"
        );
        Ok(Connection::new(
            DB_TYPE,
            config.name.clone(),
            AthenaSession { runtime, client },
        ))
    }

    fn get_databases(&self, connection: &mut Connection) -> Result<Vec<String>> {
        let result = self
            .session(connection)?
            .catalog(catalog_queries::DATABASES_QUERY)?;
        Ok(catalog::distinct_sorted(
            result.rows.iter().filter_map(|row| text(row, 0)).collect::<Vec<_>>(),
        ))
    }

    fn get_tables(
        &self,
        connection: &mut Connection,
        database: Option<&str>,
    ) -> Result<Vec<TableInfo>> {
        let sql = catalog_queries::tables_query(self.session(connection)?.database(database));
        self.list_tables(connection, &sql)
    }

    fn get_views(
        &self,
        connection: &mut Connection,
        database: Option<&str>,
    ) -> Result<Vec<TableInfo>> {
        let sql = catalog_queries::views_query(self.session(connection)?.database(database));
        self.list_tables(connection, &sql)
    }

    /// `schema` and `database` name the same level; `database` wins when
    /// both are given. Athena tables have no primary keys.
    fn get_columns(
        &self,
        connection: &mut Connection,
        table: &str,
        database: Option<&str>,
        schema: Option<&str>,
    ) -> Result<Vec<ColumnInfo>> {
        let session = self.session(connection)?;
        let sql = catalog_queries::columns_query(session.database(database.or(schema)), table);
        let columns = session
            .catalog(&sql)?
            .rows
            .iter()
            .filter_map(|row| Some(RawColumn::new(text(row, 0)?, text(row, 1)?)))
            .collect();
        Ok(catalog::merge_primary_keys(columns, &HashSet::<String>::new()))
    }

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
            &[database.or(schema), Some(table)],
        );
        descriptor.preview.render(&target, limit)
    }

    fn execute_query(
        &self,
        connection: &mut Connection,
        query: &str,
        max_rows: Option<usize>,
    ) -> Result<QueryResult> {
        let session = self.session(connection)?;
        debug!(adapter = DB_TYPE, sql = query, ?max_rows, "executing query");
        session.fetch(query, max_rows)
    }

    fn execute_non_query(&self, connection: &mut Connection, query: &str) -> Result<i64> {
        let AthenaSession { runtime, client } = self.session(connection)?;

        debug!(adapter = DB_TYPE, sql = query, "executing statement");
        runtime.block_on(async {
            let execution = client
                .run(query)
                .await
                .map_err(|source| Error::query(query, source))?;
            if !reports_row_count(query) {
                return Ok(ROW_COUNT_UNKNOWN);
            }

            let page = client
                .page(&execution.id, None, 1)
                .await
                .map_err(|source| Error::query(query, source))?;
            Ok(page.update_count().unwrap_or(ROW_COUNT_UNKNOWN))
        })
    }
}

fn client_settings(config: &ConnectionConfig) -> Result<ClientSettings> {
    let auth = match config
        .option_str(AUTH_METHOD_OPTION)
        .map(|raw| raw.trim().to_ascii_lowercase())
        .as_deref()
    {
        None | Some("profile") => Auth::Profile(config.option_str(PROFILE_OPTION)),
        Some("keys") => Auth::Keys {
            access_key_id: config
                .require(&builtin::ATHENA, "username", &config.username)?
                .to_string(),
            secret_access_key: config
                .require(&builtin::ATHENA, "password", &config.password)?
                .to_string(),
        },
        Some(other) => {
            return Err(ConfigError::InvalidOption {
                key: AUTH_METHOD_OPTION.to_string(),
                value: other.to_string(),
                expected: "one of profile, keys",
            }
            .into());
        }
    };

    Ok(ClientSettings {
        region: config.option_str(REGION_OPTION),
        auth,
        work_group: config
            .option_str(WORK_GROUP_OPTION)
            .unwrap_or_else(|| DEFAULT_WORK_GROUP.to_string()),
        output_location: config.option_str(STAGING_DIR_OPTION),
        catalog: config
            .option_str(CATALOG_OPTION)
            .unwrap_or_else(|| DEFAULT_CATALOG.to_string()),
        database: if config.database.trim().is_empty() {
            DEFAULT_DATABASE.to_string()
        } else {
            config.database.clone()
        },
    })
}

fn text(row: &[sqlit_core::Value], index: usize) -> Option<String> {
    row.get(index)
        .filter(|value| !value.is_null())
        .map(ToString::to_string)
}
