#![allow(dead_code)]

use sqlit_adapter_sqlite::SqliteAdapter;
use sqlit_core::{Adapter, Connection, ConnectionConfig};

pub const SCHEMA_SQL: &[&str] = &[
    "CREATE TABLE users (id INTEGER PRIMARY KEY, email TEXT NOT NULL UNIQUE, name TEXT)",
    "CREATE TABLE memberships (user_id INTEGER, team_id INTEGER, role TEXT, PRIMARY KEY (user_id, team_id))",
    "CREATE TABLE audit_log (id INTEGER PRIMARY KEY AUTOINCREMENT, message BLOB)",
    "CREATE VIEW active_users AS SELECT id, name FROM users WHERE name IS NOT NULL",
    "CREATE INDEX idx_users_name ON users(name)",
    "CREATE UNIQUE INDEX idx_memberships_role ON memberships(team_id, role)",
    "CREATE TRIGGER users_audit AFTER INSERT ON users BEGIN INSERT INTO audit_log(message) VALUES (NEW.email); END",
];

pub fn in_memory_config() -> ConnectionConfig {
    let mut config = ConnectionConfig::new("scratch", "sqlite");
    config.database = ":memory:".to_string();
    config
}

pub fn connect_with_schema() -> (SqliteAdapter, Connection) {
    let adapter = SqliteAdapter;
    let mut connection = adapter
        .connect(&in_memory_config())
        .expect("open in-memory sqlite");
    for sql in SCHEMA_SQL {
        adapter
            .execute_non_query(&mut connection, sql)
            .expect("apply fixture schema");
    }
    (adapter, connection)
}
