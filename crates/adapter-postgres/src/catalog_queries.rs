// Catalog scope is the connected database: PostgreSQL sessions cannot read
// another database's catalog, so `$1` narrows the result to empty when it
// names a different one.

pub(crate) const DATABASES_QUERY: &str = r#"
SELECT datname
FROM pg_catalog.pg_database
WHERE datistemplate = false AND datallowconn
ORDER BY datname ASC;
"#;

pub(crate) const TABLES_QUERY: &str = r#"
SELECT table_schema, table_name
FROM information_schema.tables
WHERE table_type = 'BASE TABLE'
  AND table_catalog = COALESCE($1::text, current_database())
  AND table_schema NOT IN ('pg_catalog', 'information_schema')
  AND table_schema NOT LIKE 'pg\_toast%'
  AND table_schema NOT LIKE 'pg\_temp\_%'
ORDER BY table_schema ASC, table_name ASC;
"#;

pub(crate) const VIEWS_QUERY: &str = r#"
SELECT table_schema, table_name
FROM information_schema.views
WHERE table_catalog = COALESCE($1::text, current_database())
  AND table_schema NOT IN ('pg_catalog', 'information_schema')
ORDER BY table_schema ASC, table_name ASC;
"#;

pub(crate) const COLUMNS_QUERY: &str = r#"
SELECT column_name, data_type
FROM information_schema.columns
WHERE table_schema = $1 AND table_name = $2
ORDER BY ordinal_position ASC;
"#;

pub(crate) const PRIMARY_KEY_COLUMNS_QUERY: &str = r#"
SELECT kcu.column_name
FROM information_schema.table_constraints AS tc
JOIN information_schema.key_column_usage AS kcu
  ON tc.constraint_name = kcu.constraint_name
 AND tc.table_schema = kcu.table_schema
 AND tc.table_name = kcu.table_name
WHERE tc.constraint_type = 'PRIMARY KEY'
  AND tc.table_schema = $1
  AND tc.table_name = $2;
"#;

// information_schema has no index view.
pub(crate) const INDEXES_QUERY: &str = r#"
SELECT i.relname AS index_name, t.relname AS table_name, ix.indisunique AS is_unique
FROM pg_catalog.pg_index AS ix
JOIN pg_catalog.pg_class AS i ON i.oid = ix.indexrelid
JOIN pg_catalog.pg_class AS t ON t.oid = ix.indrelid
JOIN pg_catalog.pg_namespace AS n ON n.oid = t.relnamespace
WHERE n.nspname NOT IN ('pg_catalog', 'information_schema')
  AND n.nspname NOT LIKE 'pg\_toast%'
ORDER BY i.relname ASC;
"#;

pub(crate) const TRIGGERS_QUERY: &str = r#"
SELECT DISTINCT trigger_name, event_object_table
FROM information_schema.triggers
WHERE trigger_catalog = COALESCE($1::text, current_database())
ORDER BY trigger_name ASC;
"#;

pub(crate) const SEQUENCES_QUERY: &str = r#"
SELECT sequence_name
FROM information_schema.sequences
WHERE sequence_catalog = COALESCE($1::text, current_database())
ORDER BY sequence_name ASC;
"#;

pub(crate) const PROCEDURES_QUERY: &str = r#"
SELECT DISTINCT routine_name
FROM information_schema.routines
WHERE routine_catalog = COALESCE($1::text, current_database())
  AND routine_schema NOT IN ('pg_catalog', 'information_schema')
  AND routine_type IN ('PROCEDURE', 'FUNCTION')
ORDER BY routine_name ASC;
"#;
