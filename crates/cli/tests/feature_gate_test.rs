#[path = "support/sqlit_process.rs"]
mod sqlit_process;

use sqlit_process::{run_sqlit, stderr, stdout};

#[test]
fn adapters_lists_every_builtin_backend() {
    let output = run_sqlit(&["adapters"]);

    assert_eq!(output.status.code(), Some(0));

    let stdout = stdout(&output);
    for db_type in ["athena", "mssql", "mysql", "postgresql", "snowflake", "sqlite"] {
        assert!(
            stdout.lines().any(|line| line.starts_with(&format!("{db_type}\t"))),
            "{db_type} missing from: {stdout}"
        );
    }
}

#[cfg(feature = "sqlite")]
#[test]
fn compiled_backends_are_reported_available() {
    let stdout = stdout(&run_sqlit(&["adapters"]));
    assert!(stdout.contains("sqlite\tSQLite\tavailable"), "{stdout}");
}

#[cfg(not(feature = "mssql"))]
#[test]
fn backend_without_driver_reports_install_command() {
    let output = run_sqlit(&["mssql", "--server", "sql.internal", "-u", "sa", "databases"]);

    assert_eq!(output.status.code(), Some(1));

    let stderr = stderr(&output);
    assert!(stderr.contains("[driver]"), "{stderr}");
    assert!(
        stderr.contains("cargo install sqlit-cli --features mssql"),
        "{stderr}"
    );
}

#[cfg(not(feature = "athena"))]
#[test]
fn adapters_json_marks_missing_drivers() {
    let output = run_sqlit(&["adapters", "--json"]);
    assert_eq!(output.status.code(), Some(0));

    let adapters: serde_json::Value =
        serde_json::from_str(&stdout(&output)).expect("adapters json");
    let athena = adapters
        .as_array()
        .and_then(|adapters| {
            adapters
                .iter()
                .find(|adapter| adapter["db_type"] == "athena")
        })
        .expect("athena entry");

    assert_eq!(athena["available"], false);
    assert_eq!(
        athena["install_command"],
        "cargo install sqlit-cli --features athena"
    );
}
