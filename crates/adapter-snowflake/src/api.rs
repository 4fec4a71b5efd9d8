//! Wire shapes of the SQL API and of the session (login) protocol. Only the
//! fields sqlit reads are modeled.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct StatementRequest<'a> {
    pub statement: &'a str,
    /// Seconds; 0 lets the account-level limit apply.
    pub timeout: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warehouse: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<&'a str>,
    /// Positional `?` bindings keyed "1", "2", ...
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub bindings: BTreeMap<String, Binding<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct Binding<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub value: &'a str,
}

impl<'a> Binding<'a> {
    pub(crate) fn text(value: &'a str) -> Self {
        Self {
            kind: "TEXT",
            value,
        }
    }
}

/// Body of a statement response, a status poll, a partition fetch, and an
/// error reply alike; absent parts default to empty.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct ResultSet {
    pub code: Option<String>,
    pub sql_state: Option<String>,
    pub message: Option<String>,
    pub statement_handle: Option<String>,
    pub result_set_meta_data: Option<ResultSetMetaData>,
    /// Every cell arrives as a string or null.
    pub data: Vec<Vec<Option<String>>>,
    pub stats: Option<Stats>,
    /// Remaining row chunks of a session-protocol result.
    #[serde(skip)]
    pub chunks: Vec<ChunkInfo>,
    #[serde(skip)]
    pub chunk_headers: BTreeMap<String, String>,
    #[serde(skip)]
    pub qrmk: Option<String>,
}

impl ResultSet {
    pub(crate) fn row_type(&self) -> &[RowType] {
        self.result_set_meta_data
            .as_ref()
            .map_or(&[], |metadata| metadata.row_type.as_slice())
    }

    /// Partitions including the inline first one.
    pub(crate) fn partition_count(&self) -> usize {
        if !self.chunks.is_empty() {
            return self.chunks.len() + 1;
        }
        self.result_set_meta_data
            .as_ref()
            .map_or(0, |metadata| metadata.partition_info.len())
    }

    pub(crate) fn column_index(&self, name: &str) -> Option<usize> {
        self.row_type()
            .iter()
            .position(|column| column.name.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct ResultSetMetaData {
    pub num_rows: u64,
    pub row_type: Vec<RowType>,
    pub partition_info: Vec<PartitionInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RowType {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub scale: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct PartitionInfo {
    pub row_count: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct Stats {
    pub num_rows_inserted: i64,
    pub num_rows_updated: i64,
    pub num_rows_deleted: i64,
}

impl Stats {
    pub(crate) fn affected(&self) -> i64 {
        self.num_rows_inserted + self.num_rows_updated + self.num_rows_deleted
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub data: LoginData<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(crate) struct LoginData<'a> {
    pub client_app_id: &'static str,
    pub client_app_version: &'static str,
    pub account_name: &'a str,
    pub login_name: &'a str,
    pub password: &'a str,
}

/// Outer shape of every session-protocol reply.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub(crate) struct Envelope<T> {
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub success: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct LoginResponseData {
    pub token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QueryRequest<'a> {
    pub sql_text: &'a str,
    pub async_exec: bool,
    pub sequence_id: u64,
    pub is_internal: bool,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub bindings: BTreeMap<String, Binding<'a>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct QueryResponseData {
    pub query_id: Option<String>,
    pub sql_state: Option<String>,
    pub get_result_url: Option<String>,
    pub query_result_format: Option<String>,
    #[serde(rename = "rowtype")]
    pub row_type: Vec<RowType>,
    #[serde(rename = "rowset")]
    pub row_set: Vec<Vec<Option<String>>>,
    pub total: u64,
    pub chunks: Vec<ChunkInfo>,
    pub chunk_headers: BTreeMap<String, String>,
    pub qrmk: Option<String>,
    pub stats: Option<Stats>,
}

impl From<QueryResponseData> for ResultSet {
    fn from(data: QueryResponseData) -> Self {
        Self {
            statement_handle: data.query_id,
            sql_state: data.sql_state,
            result_set_meta_data: Some(ResultSetMetaData {
                num_rows: data.total,
                row_type: data.row_type,
                partition_info: Vec::new(),
            }),
            data: data.row_set,
            stats: data.stats,
            chunks: data.chunks,
            chunk_headers: data.chunk_headers,
            qrmk: data.qrmk,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct ChunkInfo {
    pub url: String,
    pub row_count: u64,
}
