// Catalog queries against sqlite_master and the pragma table-valued
// functions. Queries that read sqlite_master take the schema as a quoted
// prefix because the table name cannot be bound as a parameter.

pub(crate) const DATABASES_QUERY: &str = r#"
SELECT name
FROM pragma_database_list
WHERE name <> 'temp'
ORDER BY seq ASC;
"#;

pub(crate) fn tables_query(quoted_schema: &str) -> String {
    format!(
        r#"
SELECT name
FROM {quoted_schema}.sqlite_master
WHERE type = 'table' AND substr(name, 1, 7) <> 'sqlite_'
ORDER BY name ASC;
"#
    )
}

pub(crate) fn views_query(quoted_schema: &str) -> String {
    format!(
        r#"
SELECT name
FROM {quoted_schema}.sqlite_master
WHERE type = 'view'
ORDER BY name ASC;
"#
    )
}

pub(crate) const COLUMNS_QUERY: &str = r#"
SELECT name, type, pk
FROM pragma_table_info(?1, ?2)
ORDER BY cid ASC;
"#;

// origin = 'c' keeps indexes created by CREATE INDEX and drops the automatic
// ones backing PRIMARY KEY and UNIQUE constraints.
pub(crate) fn indexes_query(quoted_schema: &str) -> String {
    format!(
        r#"
SELECT il.name, m.name, il."unique"
FROM {quoted_schema}.sqlite_master AS m
JOIN pragma_index_list(m.name, ?1) AS il
WHERE m.type = 'table' AND substr(m.name, 1, 7) <> 'sqlite_' AND il.origin = 'c'
ORDER BY il.name ASC;
"#
    )
}

pub(crate) fn triggers_query(quoted_schema: &str) -> String {
    format!(
        r#"
SELECT name, tbl_name
FROM {quoted_schema}.sqlite_master
WHERE type = 'trigger'
ORDER BY name ASC;
"#
    )
}
