#[path = "support/sqlit_process.rs"]
mod sqlit_process;

use sqlit_process::{run_sqlit, stderr, stdout};

#[test]
fn usage_lists_commands_for_every_backend() {
    let output = run_sqlit(&[]);

    assert_eq!(output.status.code(), Some(2));

    let stderr = stderr(&output);
    assert!(stderr.contains("Usage: sqlit"));
    for command in [
        "adapters",
        "saved",
        "sqlite",
        "postgresql",
        "mysql",
        "mssql",
        "snowflake",
        "athena",
    ] {
        assert!(stderr.contains(command), "usage is missing {command}: {stderr}");
    }
}

#[test]
fn backend_help_lists_connection_flags_and_actions() {
    let output = run_sqlit(&["postgresql", "--help"]);

    assert_eq!(output.status.code(), Some(0));

    let stdout = stdout(&output);
    for flag in ["--server", "--port", "--user", "--password", "--database", "--option"] {
        assert!(stdout.contains(flag), "help is missing {flag}: {stdout}");
    }
    for action in ["databases", "tables", "columns", "preview", "query", "exec"] {
        assert!(stdout.contains(action), "help is missing {action}: {stdout}");
    }
}

#[test]
fn malformed_option_flag_is_a_usage_error() {
    let output = run_sqlit(&["sqlite", "-d", ":memory:", "-o", "read_only", "databases"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("expected KEY=VALUE"));
}

#[test]
fn unknown_backend_subcommand_is_rejected() {
    let output = run_sqlit(&["oracle", "databases"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("unrecognized subcommand 'oracle'"));
}
