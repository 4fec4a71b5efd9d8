use std::error::Error as StdError;

use thiserror::Error;

use crate::descriptor::AdapterDescriptor;

pub type BoxError = Box<dyn StdError + Send + Sync>;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    DriverMissing(#[from] DriverMissing),
    #[error("failed to connect to {adapter} (connection `{connection}`): {source}")]
    Connect {
        adapter: &'static str,
        connection: String,
        #[source]
        source: BoxError,
    },
    /// Backend failure while running a statement. Renders the backend's own
    /// diagnostic text unchanged.
    #[error("{source}")]
    Query {
        sql: String,
        #[source]
        source: BoxError,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("unknown database type `{db_type}`; known types: {}", .known.join(", "))]
    UnknownBackend {
        db_type: String,
        known: Vec<&'static str>,
    },
    #[error("connection handle belongs to `{actual}` but was passed to the `{expected}` adapter")]
    ConnectionMismatch {
        expected: &'static str,
        actual: &'static str,
    },
}

impl Error {
    pub fn query<E>(sql: impl Into<String>, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Query {
            sql: sql.into(),
            source: source.into(),
        }
    }

    pub fn connect<E>(adapter: &'static str, connection: impl Into<String>, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Connect {
            adapter,
            connection: connection.into(),
            source: source.into(),
        }
    }

    #[must_use]
    pub fn sql(&self) -> Option<&str> {
        match self {
            Self::Query { sql, .. } => Some(sql.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "{driver} driver is not available in this build: install it with `{install_command}` \
     (package `{package}`, extra `{extra}`; none of the driver crates [{}] were compiled in)",
    .crates.join(", ")
)]
pub struct DriverMissing {
    pub driver: &'static str,
    pub package: &'static str,
    pub extra: &'static str,
    pub crates: &'static [&'static str],
    pub install_command: String,
}

impl DriverMissing {
    #[must_use]
    pub fn for_descriptor(descriptor: &AdapterDescriptor) -> Self {
        let driver = &descriptor.driver;
        Self {
            driver: descriptor.display_name,
            package: driver.package,
            extra: driver.extra,
            crates: driver.crates,
            install_command: driver.install_command(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("connection `{connection}` has db_type `{actual}` but was passed to the `{expected}` adapter")]
    DbTypeMismatch {
        connection: String,
        expected: &'static str,
        actual: String,
    },
    #[error("{adapter} connection `{connection}` requires `{field}`")]
    MissingField {
        adapter: &'static str,
        connection: String,
        field: &'static str,
    },
    #[error("option `{key}` has invalid value `{value}`: expected {expected}")]
    InvalidOption {
        key: String,
        value: String,
        expected: &'static str,
    },
}
