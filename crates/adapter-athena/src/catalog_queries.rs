//! Query executions take no bind parameters, so catalog filters are inlined
//! as escaped literals.

use sqlit_core::quote::quote_literal;

pub(crate) const DATABASES_QUERY: &str = "SELECT schema_name
FROM information_schema.schemata
WHERE schema_name <> 'information_schema'
ORDER BY schema_name";

pub(crate) fn tables_query(database: &str) -> String {
    format!(
        "SELECT table_schema, table_name
FROM information_schema.tables
WHERE table_schema = {}
  AND table_type = 'BASE TABLE'
ORDER BY table_name",
        quote_literal(database)
    )
}

pub(crate) fn views_query(database: &str) -> String {
    format!(
        "SELECT table_schema, table_name
FROM information_schema.tables
WHERE table_schema = {}
  AND table_type = 'VIEW'
ORDER BY table_name",
        quote_literal(database)
    )
}

pub(crate) fn columns_query(database: &str, table: &str) -> String {
    format!(
        "SELECT column_name, data_type
FROM information_schema.columns
WHERE table_schema = {}
  AND table_name = {}
ORDER BY ordinal_position",
        quote_literal(database),
        quote_literal(table)
    )
}

#[cfg(test)]
mod tests {
    use super::columns_query;

    #[test]
    fn filters_are_escaped_literals() {
        let sql = columns_query("sales", "o'brien");
        assert!(sql.contains("table_schema = 'sales'"));
        assert!(sql.contains("table_name = 'o''brien'"));
    }
}
