//! Property checks that hold for every adapter regardless of backend.
//!
//! Each check runs against a live connection and reports a readable failure
//! instead of panicking, so a harness can collect every violation at once.

use sqlit_core::{Adapter, Connection, catalog::is_information_schema};

pub type CheckResult = Result<(), String>;

/// Identifiers that need quoting on at least one backend.
const AWKWARD_IDENTIFIERS: &[&str] = &["plain", "with space", "order", "MixedCase", "odd\"name"];

const TRUNCATION_SOURCE_ROWS: usize = 3;

pub fn check_select_one(adapter: &dyn Adapter, connection: &mut Connection) -> CheckResult {
    let result = adapter
        .execute_query(connection, "SELECT 1", None)
        .map_err(|error| format!("SELECT 1 failed: {error}"))?;

    if result.truncated {
        return Err("SELECT 1 reported a truncated result".to_string());
    }
    match result.rows.as_slice() {
        [row] if row.len() == 1 && row[0].to_string() == "1" => Ok(()),
        rows => Err(format!("SELECT 1 returned {rows:?}")),
    }
}

/// A quoted alias comes back as the exact original name.
pub fn check_quote_round_trip(adapter: &dyn Adapter, connection: &mut Connection) -> CheckResult {
    for name in AWKWARD_IDENTIFIERS {
        let query = format!("SELECT 1 AS {}", adapter.quote_identifier(name));
        let result = adapter
            .execute_query(connection, &query, None)
            .map_err(|error| format!("`{query}` failed: {error}"))?;
        if result.columns != [*name] {
            return Err(format!(
                "`{query}` named its column {:?}, expected [{name:?}]",
                result.columns
            ));
        }
    }
    Ok(())
}

/// For a source of `n` rows and a ceiling `k`, exactly `min(n, k)` rows come
/// back and `truncated` is `n > k`.
pub fn check_truncation_law(adapter: &dyn Adapter, connection: &mut Connection) -> CheckResult {
    let n = TRUNCATION_SOURCE_ROWS;
    let query = (1..=n)
        .map(|value| {
            if value == 1 {
                format!("SELECT {value} AS n")
            } else {
                format!("SELECT {value}")
            }
        })
        .collect::<Vec<_>>()
        .join(" UNION ALL ");

    for ceiling in [0, n - 1, n, n + 1] {
        let result = adapter
            .execute_query(connection, &query, Some(ceiling))
            .map_err(|error| format!("ceiling {ceiling}: query failed: {error}"))?;

        let expected_rows = n.min(ceiling);
        if result.rows.len() != expected_rows {
            return Err(format!(
                "ceiling {ceiling}: expected {expected_rows} rows, got {}",
                result.rows.len()
            ));
        }
        if result.truncated != (n > ceiling) {
            return Err(format!(
                "ceiling {ceiling}: expected truncated={}, got {}",
                n > ceiling,
                result.truncated
            ));
        }
    }
    Ok(())
}

pub fn check_tables_exclude_information_schema(
    adapter: &dyn Adapter,
    connection: &mut Connection,
) -> CheckResult {
    let tables = adapter
        .get_tables(connection, None)
        .map_err(|error| format!("get_tables failed: {error}"))?;

    if let Some(table) = tables.iter().find(|table| is_information_schema(&table.schema)) {
        return Err(format!("get_tables listed {}.{}", table.schema, table.name));
    }
    if !tables.is_sorted() {
        return Err("get_tables is not ordered by (schema, name)".to_string());
    }
    Ok(())
}

/// Metadata kinds the descriptor marks unsupported list nothing.
pub fn check_absent_kinds_are_empty(
    adapter: &dyn Adapter,
    connection: &mut Connection,
) -> CheckResult {
    let capabilities = adapter.descriptor().capabilities;
    let mut populated = Vec::new();

    if !capabilities.indexes && !listing("indexes", adapter.get_indexes(connection, None))? {
        populated.push("indexes");
    }
    if !capabilities.triggers && !listing("triggers", adapter.get_triggers(connection, None))? {
        populated.push("triggers");
    }
    if !capabilities.sequences && !listing("sequences", adapter.get_sequences(connection, None))?
    {
        populated.push("sequences");
    }
    if !capabilities.stored_procedures
        && !listing("procedures", adapter.get_procedures(connection, None))?
    {
        populated.push("procedures");
    }

    if populated.is_empty() {
        Ok(())
    } else {
        Err(format!(
            "unsupported kinds returned entries: {}",
            populated.join(", ")
        ))
    }
}

fn listing<T>(kind: &str, outcome: sqlit_core::Result<Vec<T>>) -> Result<bool, String> {
    outcome
        .map(|entries| entries.is_empty())
        .map_err(|error| format!("listing {kind} failed: {error}"))
}

/// The columns flagged as primary key are exactly `expected`, in column order.
pub fn check_primary_keys(
    adapter: &dyn Adapter,
    connection: &mut Connection,
    table: &str,
    schema: Option<&str>,
    expected: &[&str],
) -> CheckResult {
    let columns = adapter
        .get_columns(connection, table, None, schema)
        .map_err(|error| format!("get_columns({table}) failed: {error}"))?;

    let keys = columns
        .iter()
        .filter(|column| column.is_primary_key)
        .map(|column| column.name.as_str())
        .collect::<Vec<_>>();

    if keys == expected {
        Ok(())
    } else {
        Err(format!(
            "{table}: expected primary key {expected:?}, got {keys:?}"
        ))
    }
}

/// Runs every check that needs no fixture tables.
pub fn run_contract_checks(
    adapter: &dyn Adapter,
    connection: &mut Connection,
) -> Vec<(&'static str, CheckResult)> {
    type Check = fn(&dyn Adapter, &mut Connection) -> CheckResult;
    let checks: [(&'static str, Check); 5] = [
        ("select_one", check_select_one),
        ("quote_round_trip", check_quote_round_trip),
        ("truncation_law", check_truncation_law),
        (
            "tables_exclude_information_schema",
            check_tables_exclude_information_schema,
        ),
        ("absent_kinds_are_empty", check_absent_kinds_are_empty),
    ];

    checks
        .into_iter()
        .map(|(name, check)| (name, check(adapter, connection)))
        .collect()
}
