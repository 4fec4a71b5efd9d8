//! Catalog SQL. Object catalogs are per database, so every query except
//! `SHOW DATABASES` is built against a `<db>.information_schema` prefix;
//! an empty prefix targets the session database.

pub(crate) const DATABASES_QUERY: &str = "SHOW DATABASES";

pub(crate) fn tables_query(prefix: &str) -> String {
    format!(
        "SELECT table_schema, table_name
FROM {prefix}information_schema.tables
WHERE table_type = 'BASE TABLE'
  AND table_schema <> 'INFORMATION_SCHEMA'
ORDER BY table_schema, table_name"
    )
}

pub(crate) fn views_query(prefix: &str) -> String {
    format!(
        "SELECT table_schema, table_name
FROM {prefix}information_schema.views
WHERE table_schema <> 'INFORMATION_SCHEMA'
ORDER BY table_schema, table_name"
    )
}

pub(crate) fn columns_query(prefix: &str) -> String {
    format!(
        "SELECT column_name, data_type
FROM {prefix}information_schema.columns
WHERE table_schema = ? AND table_name = ?
ORDER BY ordinal_position"
    )
}

/// `target` is an already-quoted, possibly qualified table name.
pub(crate) fn primary_keys_query(target: &str) -> String {
    format!("SHOW PRIMARY KEYS IN TABLE {target}")
}

pub(crate) fn sequences_query(prefix: &str) -> String {
    format!(
        "SELECT sequence_name
FROM {prefix}information_schema.sequences
WHERE sequence_schema <> 'INFORMATION_SCHEMA'
ORDER BY sequence_name"
    )
}

pub(crate) fn procedures_query(prefix: &str) -> String {
    format!(
        "SELECT procedure_name
FROM {prefix}information_schema.procedures
WHERE procedure_schema <> 'INFORMATION_SCHEMA'
ORDER BY procedure_name"
    )
}
