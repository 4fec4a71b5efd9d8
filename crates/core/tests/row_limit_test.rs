use sqlit_core::{
    Adapter, ConnectionConfig, RowCollector, Value, apply_row_limit, reports_row_count,
};

#[path = "support/fake_adapter.rs"]
mod fake_adapter;

use fake_adapter::{FAKE_DB_TYPE, FakeAdapter, FakeSession};

fn run(available: usize, max_rows: Option<usize>) -> (usize, bool, usize) {
    let adapter = FakeAdapter::with_rows(available);
    let mut connection = adapter
        .connect(&ConnectionConfig::new("local", FAKE_DB_TYPE))
        .expect("connect");

    let result = adapter
        .execute_query(&mut connection, "SELECT n", max_rows)
        .expect("query");
    let pulled = connection
        .session_mut::<FakeSession>(FAKE_DB_TYPE)
        .expect("session")
        .pulled_rows;

    (result.rows.len(), result.truncated, pulled)
}

#[test]
fn truncation_law_holds_around_the_ceiling() {
    let (rows, truncated, _) = run(5, Some(10));
    assert_eq!(rows, 5);
    assert!(!truncated);

    let (rows, truncated, _) = run(10, Some(10));
    assert_eq!(rows, 10);
    assert!(!truncated, "exactly max_rows rows is not truncation");

    let (rows, truncated, _) = run(11, Some(10));
    assert_eq!(rows, 10);
    assert!(truncated);
}

#[test]
fn at_most_one_extra_row_is_pulled_from_the_backend() {
    let (rows, truncated, pulled) = run(1_000, Some(3));
    assert_eq!(rows, 3);
    assert!(truncated);
    assert_eq!(pulled, 4);
}

#[test]
fn no_ceiling_returns_everything() {
    let (rows, truncated, pulled) = run(250, None);
    assert_eq!(rows, 250);
    assert!(!truncated);
    assert_eq!(pulled, 250);
}

#[test]
fn zero_ceiling_reports_truncation_when_any_row_exists() {
    assert_eq!(run(0, Some(0)), (0, false, 0));
    let (rows, truncated, pulled) = run(2, Some(0));
    assert_eq!(rows, 0);
    assert!(truncated);
    assert_eq!(pulled, 1);
}

#[test]
fn collector_spans_several_pages() {
    let mut collector = RowCollector::new(Some(3));
    assert!(collector.extend([vec![Value::Int(1)], vec![Value::Int(2)]]));
    assert!(!collector.extend([vec![Value::Int(3)], vec![Value::Int(4)], vec![Value::Int(5)]]));
    assert!(collector.is_full());

    let result = collector.finish(vec!["n".to_string()]);
    assert_eq!(result.rows.len(), 3);
    assert!(result.truncated);
    assert_eq!(result.columns, vec!["n".to_string()]);
}

#[test]
fn apply_row_limit_leaves_short_batches_alone() {
    let rows = vec![vec![Value::Null]];
    assert_eq!(apply_row_limit(rows.clone(), Some(1)), (rows, false));
}

#[test]
fn only_data_changing_statements_report_row_counts() {
    for counted in [
        "UPDATE users SET name = 'x'",
        "  insert into users values (1)",
        "WITH stale AS (SELECT id FROM users) DELETE FROM users",
        "MERGE INTO users USING staged ON users.id = staged.id WHEN MATCHED THEN DELETE",
        "REPLACE INTO users VALUES (1, 'a')",
        "COPY users FROM STDIN",
    ] {
        assert!(reports_row_count(counted), "{counted}");
    }

    for uncounted in [
        "CREATE TABLE t (id INTEGER)",
        "drop table t",
        "\nALTER TABLE t ADD COLUMN c INT",
        "TRUNCATE TABLE t",
        "GRANT SELECT ON t TO reader",
        "SET search_path = sales",
        "USE shop",
        "BEGIN",
        "commit",
        "PRAGMA user_version = 3",
    ] {
        assert!(!reports_row_count(uncounted), "{uncounted}");
    }
}
