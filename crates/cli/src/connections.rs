//! Named connections file.
//!
//! ```yaml
//! local:
//!   db_type: sqlite
//!   database: ./app.db
//! warehouse:
//!   db_type: snowflake
//!   server: xy12345.us-east-1
//!   password: pat-token
//!   options:
//!     warehouse: COMPUTE_WH
//! ```
//!
//! The mapping key becomes the connection name.

use std::{collections::BTreeMap, fs, path::Path};

use sqlit_core::ConnectionConfig;

use crate::error_presentation::{CliError, CliResult};

pub(crate) fn load(path: &Path) -> CliResult<BTreeMap<String, ConnectionConfig>> {
    let raw = fs::read_to_string(path).map_err(|source| CliError::ReadConnections {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&raw).map_err(|source| CliError::ParseConnections {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn find(path: &Path, name: &str) -> CliResult<ConnectionConfig> {
    let mut connections = load(path)?;
    connections
        .remove(name)
        .ok_or_else(|| CliError::UnknownConnection {
            name: name.to_string(),
            path: path.to_path_buf(),
            known: connections.into_keys().collect(),
        })
}

fn parse(raw: &str) -> Result<BTreeMap<String, ConnectionConfig>, serde_yaml::Error> {
    let mut connections = serde_yaml::from_str::<BTreeMap<String, ConnectionConfig>>(raw)?;
    for (name, config) in &mut connections {
        config.name.clone_from(name);
    }
    Ok(connections)
}

#[cfg(test)]
mod tests {
    use sqlit_core::OptionValue;

    use super::parse;

    #[test]
    fn keys_become_connection_names() {
        let connections = parse(
            "local:\n  db_type: sqlite\n  database: app.db\n\
             replica:\n  db_type: postgresql\n  server: db.internal\n  port: 5433\n  \
             options:\n    sslmode: prefer\n    connect_timeout: 5\n",
        )
        .expect("parse");

        let local = &connections["local"];
        assert_eq!(local.name, "local");
        assert_eq!(local.database, "app.db");

        let replica = &connections["replica"];
        assert_eq!(replica.port, Some(5433));
        assert_eq!(
            replica.options.get("connect_timeout"),
            Some(&OptionValue::Integer(5))
        );
    }

    #[test]
    fn malformed_files_are_rejected() {
        assert!(parse("local: [1, 2]").is_err());
    }
}
