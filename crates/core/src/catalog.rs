//! Record shapes shared by every metadata inspector, plus the ordering and
//! filtering rules applied to them.

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

pub const INFORMATION_SCHEMA: &str = "information_schema";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TableInfo {
    pub schema: String,
    pub name: String,
}

impl TableInfo {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    /// Type label exactly as the backend reports it.
    pub data_type: String,
    pub is_primary_key: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct IndexInfo {
    pub name: String,
    pub table_name: String,
    pub is_unique: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct TriggerInfo {
    pub name: String,
    pub table_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct SequenceInfo {
    pub name: String,
}

/// Column as fetched from a column catalog, before key membership is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawColumn {
    pub name: String,
    pub data_type: String,
}

impl RawColumn {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

#[must_use]
pub fn is_information_schema(schema: &str) -> bool {
    schema.eq_ignore_ascii_case(INFORMATION_SCHEMA)
}

/// Drops information-schema entries and orders by (schema, name).
#[must_use]
pub fn normalize_tables(mut tables: Vec<TableInfo>) -> Vec<TableInfo> {
    tables.retain(|table| !is_information_schema(&table.schema));
    tables.sort();
    tables.dedup();
    tables
}

/// Merges a column listing (already in ordinal order) with the key-column
/// set returned by a separate constraint query.
#[must_use]
pub fn merge_primary_keys<S>(columns: Vec<RawColumn>, key_columns: &HashSet<S>) -> Vec<ColumnInfo>
where
    S: std::borrow::Borrow<str> + std::hash::Hash + Eq,
{
    columns
        .into_iter()
        .map(|column| {
            let is_primary_key = key_columns.contains(column.name.as_str());
            ColumnInfo {
                name: column.name,
                data_type: column.data_type,
                is_primary_key,
            }
        })
        .collect()
}

/// Sorted, de-duplicated names (procedure overloads collapse to one entry).
#[must_use]
pub fn distinct_sorted(names: impl IntoIterator<Item = String>) -> Vec<String> {
    names.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}

#[must_use]
pub fn sort_indexes(mut indexes: Vec<IndexInfo>) -> Vec<IndexInfo> {
    indexes.sort();
    indexes.dedup();
    indexes
}

#[must_use]
pub fn sort_triggers(mut triggers: Vec<TriggerInfo>) -> Vec<TriggerInfo> {
    triggers.sort();
    triggers.dedup();
    triggers
}

#[must_use]
pub fn sort_sequences(mut sequences: Vec<SequenceInfo>) -> Vec<SequenceInfo> {
    sequences.sort();
    sequences.dedup();
    sequences
}
