//! Runs against a live server described by `SQLIT_POSTGRES_*` variables:
//! `HOST` (required), `PORT`, `USER`, `PASSWORD`, `DATABASE`.

use std::env;

use sqlit_adapter_postgres::PostgresAdapter;
use sqlit_core::{Adapter, Connection, ConnectionConfig, ROW_COUNT_UNKNOWN, TableInfo, Value};
use sqlit_testkit::{
    TestResult, check_primary_keys, load_contract_cases, run_contract_checks, run_test_cases,
};

const FIXTURE_SCHEMA: &str = "sqlit_live";

fn live_config() -> ConnectionConfig {
    let variable = |name: &str| env::var(format!("SQLIT_POSTGRES_{name}")).unwrap_or_default();

    let mut config = ConnectionConfig::new("live", "postgresql").with_option("sslmode", "disable");
    config.server = variable("HOST");
    assert!(!config.server.is_empty(), "SQLIT_POSTGRES_HOST is not set");
    config.port = variable("PORT").parse().ok();
    config.username = variable("USER");
    config.password = variable("PASSWORD");
    config.database = variable("DATABASE");
    config
}

fn connect() -> (PostgresAdapter, Connection) {
    let adapter = PostgresAdapter;
    let connection = adapter.connect(&live_config()).expect("connect to postgres");
    (adapter, connection)
}

fn create_fixture(adapter: &PostgresAdapter, connection: &mut Connection) {
    for sql in [
        format!("DROP SCHEMA IF EXISTS {FIXTURE_SCHEMA} CASCADE"),
        format!("CREATE SCHEMA {FIXTURE_SCHEMA}"),
        format!(
            "CREATE TABLE {FIXTURE_SCHEMA}.grants (role text, tenant int, scope text, \
             PRIMARY KEY (tenant, role))"
        ),
        format!("CREATE UNIQUE INDEX grants_scope ON {FIXTURE_SCHEMA}.grants (scope)"),
        format!("CREATE SEQUENCE {FIXTURE_SCHEMA}.ticket_numbers"),
        format!("CREATE VIEW {FIXTURE_SCHEMA}.admin_grants AS SELECT * FROM {FIXTURE_SCHEMA}.grants"),
        format!(
            "CREATE FUNCTION {FIXTURE_SCHEMA}.grant_count() RETURNS bigint \
             LANGUAGE sql AS 'SELECT count(*) FROM {FIXTURE_SCHEMA}.grants'"
        ),
    ] {
        adapter
            .execute_non_query(connection, &sql)
            .unwrap_or_else(|error| panic!("fixture `{sql}` failed: {error}"));
    }
}

#[test]
#[ignore = "requires a postgres server"]
fn live_server_passes_contract_cases_and_checks() {
    let (adapter, mut connection) = connect();

    let cases = load_contract_cases().expect("contract cases parse");
    for (name, result) in run_test_cases(&adapter, &mut connection, &cases) {
        assert!(
            !matches!(result, TestResult::Failed(_)),
            "case {name}: {result:?}"
        );
    }
    for (name, result) in run_contract_checks(&adapter, &mut connection) {
        assert_eq!(result, Ok(()), "check {name} failed");
    }

    adapter.close(connection).expect("close");
}

#[test]
#[ignore = "requires a postgres server"]
fn live_server_metadata_matches_fixture() {
    let (adapter, mut connection) = connect();
    create_fixture(&adapter, &mut connection);

    let tables = adapter.get_tables(&mut connection, None).expect("tables");
    assert!(tables.contains(&TableInfo::new(FIXTURE_SCHEMA, "grants")));
    let views = adapter.get_views(&mut connection, None).expect("views");
    assert!(views.contains(&TableInfo::new(FIXTURE_SCHEMA, "admin_grants")));

    check_primary_keys(
        &adapter,
        &mut connection,
        "grants",
        Some(FIXTURE_SCHEMA),
        &["role", "tenant"],
    )
    .expect("composite primary key");

    let indexes = adapter.get_indexes(&mut connection, None).expect("indexes");
    assert!(
        indexes
            .iter()
            .any(|index| index.name == "grants_scope" && index.is_unique)
    );
    let sequences = adapter.get_sequences(&mut connection, None).expect("sequences");
    assert!(sequences.iter().any(|sequence| sequence.name == "ticket_numbers"));
    let procedures = adapter.get_procedures(&mut connection, None).expect("procedures");
    assert!(procedures.iter().any(|name| name == "grant_count"));

    let other_database = adapter
        .get_tables(&mut connection, Some("sqlit_no_such_database"))
        .expect("tables of another database");
    assert!(other_database.is_empty());

    adapter
        .execute_non_query(&mut connection, &format!("DROP SCHEMA {FIXTURE_SCHEMA} CASCADE"))
        .expect("drop fixture");
}

#[test]
#[ignore = "requires a postgres server"]
fn live_server_decodes_native_types() {
    let (adapter, mut connection) = connect();

    let result = adapter
        .execute_query(
            &mut connection,
            "SELECT true AS flag, 12.50::numeric AS amount, 'a'::text AS label, \
             '\\x0aff'::bytea AS raw, DATE '2024-02-29' AS day, NULL::int AS missing",
            None,
        )
        .expect("typed query");

    assert_eq!(
        result.rows,
        vec![vec![
            Value::Bool(true),
            Value::Text("12.50".to_string()),
            Value::Text("a".to_string()),
            Value::Bytes(vec![0x0a, 0xff]),
            Value::Text("2024-02-29".to_string()),
            Value::Null,
        ]]
    );
}

#[test]
#[ignore = "requires a postgres server"]
fn live_server_renders_arrays_and_intervals_as_text() {
    let (adapter, mut connection) = connect();

    let result = adapter
        .execute_query(
            &mut connection,
            "SELECT ARRAY[1, NULL, 3] AS ids, ARRAY['a b', 'c'] AS labels, \
             INTERVAL '1 year 2 months 3 days 04:05:06.5' AS span",
            None,
        )
        .expect("array query");

    assert_eq!(
        result.rows,
        vec![vec![
            Value::Text("{1,NULL,3}".to_string()),
            Value::Text("{\"a b\",c}".to_string()),
            Value::Text("1 year 2 mons 3 days 04:05:06.5".to_string()),
        ]]
    );
}

#[test]
#[ignore = "requires a postgres server"]
fn live_server_reports_unknown_counts_for_ddl() {
    let (adapter, mut connection) = connect();
    let table = format!("{FIXTURE_SCHEMA}_counts");

    let created = adapter
        .execute_non_query(&mut connection, &format!("CREATE TABLE {table} (id int)"))
        .expect("create");
    let inserted = adapter
        .execute_non_query(&mut connection, &format!("INSERT INTO {table} VALUES (1), (2)"))
        .expect("insert");
    let dropped = adapter
        .execute_non_query(&mut connection, &format!("DROP TABLE {table}"))
        .expect("drop");

    assert_eq!((created, inserted, dropped), (ROW_COUNT_UNKNOWN, 2, ROW_COUNT_UNKNOWN));
}
