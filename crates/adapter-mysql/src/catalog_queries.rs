// `?` placeholders holding a database default to DATABASE(). With no database
// selected on the session the listings are empty.

pub(crate) const DATABASES_QUERY: &str = r#"
SELECT schema_name AS schema_name
FROM information_schema.schemata
WHERE schema_name NOT IN ('information_schema', 'performance_schema', 'mysql', 'sys')
ORDER BY schema_name ASC;
"#;

pub(crate) const TABLES_QUERY: &str = r#"
SELECT table_schema AS table_schema, table_name AS table_name
FROM information_schema.tables
WHERE table_type = 'BASE TABLE'
  AND table_schema = COALESCE(?, DATABASE())
ORDER BY table_schema ASC, table_name ASC;
"#;

pub(crate) const VIEWS_QUERY: &str = r#"
SELECT table_schema AS table_schema, table_name AS table_name
FROM information_schema.views
WHERE table_schema = COALESCE(?, DATABASE())
ORDER BY table_schema ASC, table_name ASC;
"#;

pub(crate) const COLUMNS_QUERY: &str = r#"
SELECT column_name AS column_name, data_type AS data_type
FROM information_schema.columns
WHERE table_schema = COALESCE(?, DATABASE()) AND table_name = ?
ORDER BY ordinal_position ASC;
"#;

// COLUMN_KEY = 'PRI' also marks a promoted UNIQUE NOT NULL key on tables
// without a primary key, so membership comes from the PRIMARY constraint.
pub(crate) const PRIMARY_KEY_COLUMNS_QUERY: &str = r#"
SELECT column_name AS column_name
FROM information_schema.key_column_usage
WHERE constraint_name = 'PRIMARY'
  AND table_schema = COALESCE(?, DATABASE())
  AND table_name = ?;
"#;

pub(crate) const INDEXES_QUERY: &str = r#"
SELECT DISTINCT index_name AS index_name, table_name AS table_name, non_unique AS non_unique
FROM information_schema.statistics
WHERE table_schema = COALESCE(?, DATABASE())
ORDER BY index_name ASC;
"#;

pub(crate) const TRIGGERS_QUERY: &str = r#"
SELECT trigger_name AS trigger_name, event_object_table AS event_object_table
FROM information_schema.triggers
WHERE trigger_schema = COALESCE(?, DATABASE())
ORDER BY trigger_name ASC;
"#;

pub(crate) const PROCEDURES_QUERY: &str = r#"
SELECT routine_name AS routine_name
FROM information_schema.routines
WHERE routine_schema = COALESCE(?, DATABASE())
  AND routine_type = 'PROCEDURE'
ORDER BY routine_name ASC;
"#;

#[cfg(test)]
mod tests {
    use super::DATABASES_QUERY;

    #[test]
    fn databases_skip_system_schemas() {
        for system in ["information_schema", "performance_schema", "mysql", "sys"] {
            assert!(DATABASES_QUERY.contains(&format!("'{system}'")), "{system}");
        }
        assert!(DATABASES_QUERY.contains("NOT IN"));
    }
}
