//! Runs against a live account described by `SQLIT_SNOWFLAKE_*` variables:
//! `ACCOUNT` and `DATABASE` (required), either `USER` + `PASSWORD` or
//! `TOKEN`, and optionally `WAREHOUSE`, `ROLE`, `AUTHENTICATOR`.

use std::env;

use sqlit_adapter_snowflake::SnowflakeAdapter;
use sqlit_core::{Adapter, Connection, ConnectionConfig, TableInfo, Value};
use sqlit_testkit::{
    TestResult, check_primary_keys, load_contract_cases, run_contract_checks, run_test_cases,
};

const FIXTURE_SCHEMA: &str = "SQLIT_LIVE";

fn live_config() -> ConnectionConfig {
    let variable = |name: &str| env::var(format!("SQLIT_SNOWFLAKE_{name}")).unwrap_or_default();

    let mut config = ConnectionConfig::new("live", "snowflake");
    config.server = variable("ACCOUNT");
    assert!(!config.server.is_empty(), "SQLIT_SNOWFLAKE_ACCOUNT is not set");
    config.username = variable("USER");
    config.password = if config.username.is_empty() {
        variable("TOKEN")
    } else {
        variable("PASSWORD")
    };
    config.database = variable("DATABASE");
    assert!(!config.database.is_empty(), "SQLIT_SNOWFLAKE_DATABASE is not set");
    for (key, name) in [
        ("warehouse", "WAREHOUSE"),
        ("role", "ROLE"),
        ("authenticator", "AUTHENTICATOR"),
    ] {
        let value = variable(name);
        if !value.is_empty() {
            config = config.with_option(key, value);
        }
    }
    config
}

fn connect() -> (SnowflakeAdapter, Connection) {
    let adapter = SnowflakeAdapter;
    let connection = adapter.connect(&live_config()).expect("connect to snowflake");
    (adapter, connection)
}

fn run_all(adapter: &SnowflakeAdapter, connection: &mut Connection, statements: &[&str]) {
    for sql in statements {
        adapter
            .execute_non_query(connection, sql)
            .unwrap_or_else(|error| panic!("`{sql}` failed: {error}"));
    }
}

#[test]
#[ignore = "requires a snowflake account"]
fn live_account_passes_contract_cases_and_checks() {
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
}

#[test]
#[ignore = "requires a snowflake account"]
fn live_account_metadata_matches_fixture() {
    let (adapter, mut connection) = connect();
    run_all(
        &adapter,
        &mut connection,
        &[
            "CREATE OR REPLACE SCHEMA SQLIT_LIVE",
            "CREATE TABLE SQLIT_LIVE.GRANTS (ROLE VARCHAR NOT NULL, TENANT INT NOT NULL, \
             SCOPE VARCHAR, PRIMARY KEY (TENANT, ROLE))",
            "CREATE VIEW SQLIT_LIVE.ADMIN_GRANTS AS SELECT ROLE, TENANT FROM SQLIT_LIVE.GRANTS",
            "CREATE SEQUENCE SQLIT_LIVE.TICKET_NUMBERS",
        ],
    );

    let tables = adapter.get_tables(&mut connection, None).expect("tables");
    assert!(tables.contains(&TableInfo::new(FIXTURE_SCHEMA, "GRANTS")));
    let views = adapter.get_views(&mut connection, None).expect("views");
    assert!(views.contains(&TableInfo::new(FIXTURE_SCHEMA, "ADMIN_GRANTS")));

    check_primary_keys(
        &adapter,
        &mut connection,
        "GRANTS",
        Some(FIXTURE_SCHEMA),
        &["ROLE", "TENANT"],
    )
    .expect("composite primary key");

    let sequences = adapter.get_sequences(&mut connection, None).expect("sequences");
    assert!(sequences.iter().any(|sequence| sequence.name == "TICKET_NUMBERS"));
    assert!(adapter.get_indexes(&mut connection, None).expect("indexes").is_empty());

    run_all(&adapter, &mut connection, &["DROP SCHEMA SQLIT_LIVE CASCADE"]);
}

#[test]
#[ignore = "requires a snowflake account"]
fn live_account_decodes_native_types() {
    let (adapter, mut connection) = connect();

    let result = adapter
        .execute_query(
            &mut connection,
            "SELECT 1 AS n, 12.50::NUMBER(6,2) AS amount, TRUE AS flag, \
             TO_BINARY('0AFF', 'HEX') AS raw, '2024-02-29'::DATE AS day, NULL AS missing",
            None,
        )
        .expect("typed query");

    assert_eq!(
        result.rows,
        vec![vec![
            Value::Int(1),
            Value::Text("12.50".to_string()),
            Value::Bool(true),
            Value::Bytes(vec![0x0a, 0xff]),
            Value::Text("2024-02-29".to_string()),
            Value::Null,
        ]]
    );
}
