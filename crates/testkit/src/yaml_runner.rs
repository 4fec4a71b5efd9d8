use std::collections::BTreeMap;

use serde::Deserialize;
use sqlit_core::{Adapter, Connection, QueryResult, Value};

/// Cases every adapter is expected to pass, keyed by case name.
pub const CONTRACT_CASES_YAML: &str = include_str!("../cases/contract.yml");

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TestCase {
    /// Statements run through `execute_non_query` before the case.
    pub setup: Vec<String>,
    /// Statement run through `execute_query`.
    pub query: Option<String>,
    /// Statement run through `execute_non_query`.
    pub exec: Option<String>,
    pub max_rows: Option<usize>,
    pub expect: Expectation,
    /// Substring of the expected error message, matched case-insensitively.
    /// The case passes only if the statement fails with it.
    pub error: Option<String>,
    /// Backends the case runs on, see [`matches_flavor`].
    pub flavor: Option<String>,
    /// Statements run after the case whether it passed or not. Failures are
    /// ignored.
    pub teardown: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Expectation {
    pub columns: Option<Vec<String>>,
    /// Compared by rendered text so drivers that report `1` as an integer,
    /// a decimal or a string agree.
    pub rows: Option<Vec<Vec<Value>>>,
    pub row_count: Option<usize>,
    pub truncated: Option<bool>,
    pub affected: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestResult {
    Passed,
    Skipped(String),
    Failed(String),
}

pub fn load_test_cases_from_str(
    yaml: &str,
) -> Result<BTreeMap<String, TestCase>, serde_yaml::Error> {
    serde_yaml::from_str(yaml)
}

pub fn load_contract_cases() -> Result<BTreeMap<String, TestCase>, serde_yaml::Error> {
    load_test_cases_from_str(CONTRACT_CASES_YAML)
}

/// `requirement` is a comma-separated list of flavors. Plain entries allow
/// only the listed flavors, `!`-prefixed entries exclude one.
pub fn matches_flavor(requirement: Option<&str>, current_flavor: &str) -> bool {
    let Some(requirement) = requirement.map(str::trim).filter(|value| !value.is_empty()) else {
        return true;
    };

    let mut allowed = Vec::new();
    for entry in requirement.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
        if let Some(excluded_flavor) = entry.strip_prefix('!') {
            if excluded_flavor == current_flavor {
                return false;
            }
        } else {
            allowed.push(entry);
        }
    }

    allowed.is_empty() || allowed.contains(&current_flavor)
}

pub fn run_test(adapter: &dyn Adapter, connection: &mut Connection, test: &TestCase) -> TestResult {
    let flavor = adapter.db_type();
    if !matches_flavor(test.flavor.as_deref(), flavor) {
        return TestResult::Skipped(format!(
            "requires flavor '{}', running on '{flavor}'",
            test.flavor.as_deref().unwrap_or_default()
        ));
    }

    let outcome = run_test_flow(adapter, connection, test);
    for statement in &test.teardown {
        let _ = adapter.execute_non_query(connection, statement);
    }

    match outcome {
        Ok(()) => TestResult::Passed,
        Err(message) => TestResult::Failed(message),
    }
}

/// Runs every case in name order and returns the results by name.
pub fn run_test_cases(
    adapter: &dyn Adapter,
    connection: &mut Connection,
    cases: &BTreeMap<String, TestCase>,
) -> BTreeMap<String, TestResult> {
    cases
        .iter()
        .map(|(name, case)| (name.clone(), run_test(adapter, connection, case)))
        .collect()
}

fn run_test_flow(
    adapter: &dyn Adapter,
    connection: &mut Connection,
    test: &TestCase,
) -> Result<(), String> {
    validate_case(test)?;

    for statement in &test.setup {
        adapter
            .execute_non_query(connection, statement)
            .map_err(|error| format!("setup `{statement}` failed: {error}"))?;
    }

    if let Some(query) = &test.query {
        let outcome = adapter.execute_query(connection, query, test.max_rows);
        return match (outcome, &test.error) {
            (Ok(result), None) => assert_query_result(&test.expect, &result),
            (Err(error), Some(expected)) => assert_error_message(expected, &error.to_string()),
            (Ok(_), Some(expected)) => Err(format!(
                "expected error containing `{expected}` but the query succeeded"
            )),
            (Err(error), None) => Err(format!("query failed: {error}")),
        };
    }

    if let Some(statement) = &test.exec {
        let outcome = adapter.execute_non_query(connection, statement);
        return match (outcome, &test.error) {
            (Ok(affected), None) => assert_affected(test.expect.affected, affected),
            (Err(error), Some(expected)) => assert_error_message(expected, &error.to_string()),
            (Ok(_), Some(expected)) => Err(format!(
                "expected error containing `{expected}` but the statement succeeded"
            )),
            (Err(error), None) => Err(format!("statement failed: {error}")),
        };
    }

    Ok(())
}

fn validate_case(test: &TestCase) -> Result<(), String> {
    match (&test.query, &test.exec) {
        (Some(_), Some(_)) => Err("a case sets either `query` or `exec`, not both".to_string()),
        (None, None) => Err("a case needs `query` or `exec`".to_string()),
        _ => Ok(()),
    }
}

fn assert_query_result(expect: &Expectation, result: &QueryResult) -> Result<(), String> {
    if let Some(columns) = &expect.columns
        && columns != &result.columns
    {
        return Err(format!(
            "columns mismatch: expected {columns:?}, got {:?}",
            result.columns
        ));
    }

    if let Some(rows) = &expect.rows {
        let expected = render_rows(rows);
        let actual = render_rows(&result.rows);
        if expected != actual {
            return Err(format!("rows mismatch: expected {expected:?}, got {actual:?}"));
        }
    }

    if let Some(row_count) = expect.row_count
        && row_count != result.rows.len()
    {
        return Err(format!(
            "row count mismatch: expected {row_count}, got {}",
            result.rows.len()
        ));
    }

    if let Some(truncated) = expect.truncated
        && truncated != result.truncated
    {
        return Err(format!(
            "truncated flag mismatch: expected {truncated}, got {}",
            result.truncated
        ));
    }

    Ok(())
}

fn assert_affected(expected: Option<i64>, actual: i64) -> Result<(), String> {
    match expected {
        Some(expected) if expected != actual => Err(format!(
            "affected row count mismatch: expected {expected}, got {actual}"
        )),
        _ => Ok(()),
    }
}

/// Case-insensitive: backends differ in how they fold unquoted identifiers.
fn assert_error_message(expected: &str, actual: &str) -> Result<(), String> {
    if actual.to_lowercase().contains(&expected.to_lowercase()) {
        Ok(())
    } else {
        Err(format!(
            "error message mismatch: expected it to contain `{expected}`, got `{actual}`"
        ))
    }
}

fn render_rows(rows: &[Vec<Value>]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| row.iter().map(ToString::to_string).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{TestCase, load_contract_cases, load_test_cases_from_str, matches_flavor};

    #[test]
    fn flavor_requirement_supports_negation() {
        assert!(matches_flavor(None, "sqlite"));
        assert!(matches_flavor(Some(" "), "sqlite"));
        assert!(matches_flavor(Some("sqlite"), "sqlite"));
        assert!(!matches_flavor(Some("mysql"), "sqlite"));
        assert!(!matches_flavor(Some("!sqlite"), "sqlite"));
        assert!(matches_flavor(Some("!athena"), "sqlite"));
        assert!(matches_flavor(Some("postgresql, sqlite"), "sqlite"));
        assert!(!matches_flavor(Some("!athena, !sqlite"), "sqlite"));
    }

    #[test]
    fn builtin_contract_cases_parse() {
        let cases = load_contract_cases().expect("contract cases parse");
        assert!(cases.contains_key("select_one"));
        assert!(cases.values().all(|case| case.query.is_some() != case.exec.is_some()));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let error = load_test_cases_from_str("broken:\n  qurey: SELECT 1\n")
            .expect_err("typo in field name");
        assert!(error.to_string().contains("qurey"));
    }

    #[test]
    fn defaults_fill_missing_fields() {
        let cases = load_test_cases_from_str("only_query:\n  query: SELECT 1\n")
            .expect("minimal case");
        assert_eq!(
            cases["only_query"],
            TestCase {
                query: Some("SELECT 1".to_string()),
                ..TestCase::default()
            }
        );
    }
}
