//! Catalog views are per database. Queries against a database other than the
//! current one go through a `[db].` prefix on every catalog object.

pub(crate) const DATABASES_QUERY: &str = "SELECT name FROM sys.databases ORDER BY name ASC;";

pub(crate) fn tables_query(prefix: &str) -> String {
    format!(
        "SELECT TABLE_SCHEMA, TABLE_NAME \
         FROM {prefix}INFORMATION_SCHEMA.TABLES \
         WHERE TABLE_TYPE = 'BASE TABLE' \
         ORDER BY TABLE_SCHEMA ASC, TABLE_NAME ASC;"
    )
}

pub(crate) fn views_query(prefix: &str) -> String {
    format!(
        "SELECT TABLE_SCHEMA, TABLE_NAME \
         FROM {prefix}INFORMATION_SCHEMA.VIEWS \
         ORDER BY TABLE_SCHEMA ASC, TABLE_NAME ASC;"
    )
}

pub(crate) fn columns_query(prefix: &str) -> String {
    format!(
        "SELECT COLUMN_NAME, DATA_TYPE \
         FROM {prefix}INFORMATION_SCHEMA.COLUMNS \
         WHERE TABLE_SCHEMA = @P1 AND TABLE_NAME = @P2 \
         ORDER BY ORDINAL_POSITION ASC;"
    )
}

pub(crate) fn primary_key_columns_query(prefix: &str) -> String {
    format!(
        "SELECT kcu.COLUMN_NAME \
         FROM {prefix}INFORMATION_SCHEMA.TABLE_CONSTRAINTS AS tc \
         JOIN {prefix}INFORMATION_SCHEMA.KEY_COLUMN_USAGE AS kcu \
           ON tc.CONSTRAINT_NAME = kcu.CONSTRAINT_NAME \
          AND tc.TABLE_SCHEMA = kcu.TABLE_SCHEMA \
          AND tc.TABLE_NAME = kcu.TABLE_NAME \
         WHERE tc.CONSTRAINT_TYPE = 'PRIMARY KEY' \
           AND tc.TABLE_SCHEMA = @P1 AND tc.TABLE_NAME = @P2;"
    )
}

// Heaps carry an unnamed sys.indexes row.
pub(crate) fn indexes_query(prefix: &str) -> String {
    format!(
        "SELECT i.name, t.name, i.is_unique \
         FROM {prefix}sys.indexes AS i \
         JOIN {prefix}sys.tables AS t ON t.object_id = i.object_id \
         WHERE i.name IS NOT NULL AND t.is_ms_shipped = 0 \
         ORDER BY i.name ASC;"
    )
}

pub(crate) fn triggers_query(prefix: &str) -> String {
    format!(
        "SELECT tr.name, t.name \
         FROM {prefix}sys.triggers AS tr \
         JOIN {prefix}sys.tables AS t ON t.object_id = tr.parent_id \
         ORDER BY tr.name ASC;"
    )
}

pub(crate) fn sequences_query(prefix: &str) -> String {
    format!("SELECT name FROM {prefix}sys.sequences ORDER BY name ASC;")
}

pub(crate) fn procedures_query(prefix: &str) -> String {
    format!(
        "SELECT name FROM {prefix}sys.procedures \
         WHERE is_ms_shipped = 0 \
         ORDER BY name ASC;"
    )
}
