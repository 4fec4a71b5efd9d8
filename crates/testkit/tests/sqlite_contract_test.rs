use sqlit_adapter_sqlite::SqliteAdapter;
use sqlit_core::{Adapter, Connection, ConnectionConfig};
use sqlit_testkit::{
    TestResult, check_absent_kinds_are_empty, check_primary_keys, load_contract_cases,
    load_test_cases_from_str, run_contract_checks, run_test_cases,
};

fn connect() -> (SqliteAdapter, Connection) {
    let mut config = ConnectionConfig::new("contract", "sqlite");
    config.database = ":memory:".to_string();
    let adapter = SqliteAdapter;
    let connection = adapter.connect(&config).expect("open in-memory sqlite");
    (adapter, connection)
}

#[test]
fn sqlite_passes_every_contract_case() {
    let (adapter, mut connection) = connect();
    let cases = load_contract_cases().expect("contract cases parse");

    let results = run_test_cases(&adapter, &mut connection, &cases);

    let failures = results
        .iter()
        .filter(|(_, result)| !matches!(result, TestResult::Passed))
        .collect::<Vec<_>>();
    assert!(failures.is_empty(), "contract failures: {failures:#?}");
}

#[test]
fn sqlite_passes_property_checks() {
    let (adapter, mut connection) = connect();

    for (name, result) in run_contract_checks(&adapter, &mut connection) {
        assert_eq!(result, Ok(()), "check {name} failed");
    }
}

#[test]
fn composite_primary_key_is_reported_in_column_order() {
    let (adapter, mut connection) = connect();
    adapter
        .execute_non_query(
            &mut connection,
            "CREATE TABLE grants (role TEXT, tenant INTEGER, scope TEXT, PRIMARY KEY (tenant, role))",
        )
        .expect("create table");

    check_primary_keys(&adapter, &mut connection, "grants", None, &["role", "tenant"])
        .expect("primary keys match");
    let mismatch = check_primary_keys(&adapter, &mut connection, "grants", None, &["tenant"]);
    assert!(mismatch.is_err_and(|message| message.contains("grants")));
}

#[test]
fn unsupported_kinds_stay_empty_with_objects_present() {
    let (adapter, mut connection) = connect();
    adapter
        .execute_non_query(&mut connection, "CREATE TABLE items (id INTEGER PRIMARY KEY AUTOINCREMENT)")
        .expect("create table");

    assert_eq!(check_absent_kinds_are_empty(&adapter, &mut connection), Ok(()));
}

#[test]
fn failing_case_reports_the_mismatch() {
    let (adapter, mut connection) = connect();
    let cases = load_test_cases_from_str(
        r"
wrong_value:
  query: SELECT 2
  expect:
    rows:
      - [1]
wrong_flavor:
  flavor: postgresql
  query: SELECT 1
unexpected_success:
  query: SELECT 1
  error: no such table
",
    )
    .expect("cases parse");

    let results = run_test_cases(&adapter, &mut connection, &cases);

    assert!(
        matches!(&results["wrong_value"], TestResult::Failed(message) if message.contains("rows mismatch"))
    );
    assert!(matches!(&results["wrong_flavor"], TestResult::Skipped(_)));
    assert!(
        matches!(&results["unexpected_success"], TestResult::Failed(message) if message.contains("succeeded"))
    );
}

#[test]
fn teardown_runs_after_a_failed_case() {
    let (adapter, mut connection) = connect();
    let cases = load_test_cases_from_str(
        r"
leaves_table_behind:
  setup:
    - CREATE TABLE scratch (id INTEGER)
  query: SELECT count(*) FROM scratch
  expect:
    rows:
      - [99]
  teardown:
    - DROP TABLE scratch
",
    )
    .expect("cases parse");

    let results = run_test_cases(&adapter, &mut connection, &cases);
    assert!(matches!(results["leaves_table_behind"], TestResult::Failed(_)));

    let tables = adapter.get_tables(&mut connection, None).expect("list tables");
    assert!(tables.is_empty(), "teardown left {tables:?}");
}
