//! Static identity and capability metadata for each adapter.
//!
//! Descriptors are declared as constants and never derived from a live
//! connection, so callers can decide what to offer before connecting.

use crate::quote::QuoteStyle;

/// Name of the binary crate whose cargo features select compiled backends.
pub const CLI_PACKAGE: &str = "sqlit-cli";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdapterDescriptor {
    /// Discriminator stored in `ConnectionConfig::db_type`.
    pub db_type: &'static str,
    pub display_name: &'static str,
    /// Short tag shown next to a connection in a UI.
    pub badge_label: &'static str,
    pub driver: DriverInfo,
    pub capabilities: Capabilities,
    /// Schema used when a caller omits one. `None` when the backend has no
    /// schema level separate from the database.
    pub default_schema: Option<&'static str>,
    pub quote_style: QuoteStyle,
    pub preview: PreviewSyntax,
    pub options: &'static [OptionSpec],
}

/// How a row-limited preview query is spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewSyntax {
    /// `SELECT * FROM t LIMIT n`
    Limit,
    /// `SELECT TOP n * FROM t`
    Top,
}

impl PreviewSyntax {
    #[must_use]
    pub fn render(self, target: &str, limit: u64) -> String {
        match self {
            Self::Limit => format!("SELECT * FROM {target} LIMIT {limit}"),
            Self::Top => format!("SELECT TOP {limit} * FROM {target}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverInfo {
    /// Crate that provides the adapter.
    pub package: &'static str,
    /// Cargo feature of the CLI that compiles the adapter in.
    pub extra: &'static str,
    /// Native driver crates the adapter links against.
    pub crates: &'static [&'static str],
}

impl DriverInfo {
    #[must_use]
    pub fn install_command(&self) -> String {
        format!("cargo install {CLI_PACKAGE} --features {}", self.extra)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub multiple_databases: bool,
    pub stored_procedures: bool,
    pub indexes: bool,
    pub triggers: bool,
    pub sequences: bool,
    pub transactions: bool,
}

/// A recognized backend-specific option key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionSpec {
    pub key: &'static str,
    pub description: &'static str,
}

impl AdapterDescriptor {
    #[must_use]
    pub fn supports_multiple_databases(&self) -> bool {
        self.capabilities.multiple_databases
    }

    #[must_use]
    pub fn supports_stored_procedures(&self) -> bool {
        self.capabilities.stored_procedures
    }

    #[must_use]
    pub fn recognizes_option(&self, key: &str) -> bool {
        self.options.iter().any(|option| option.key == key)
    }
}

pub mod builtin {
    //! Descriptors for the backends shipped with sqlit.

    use super::{AdapterDescriptor, Capabilities, DriverInfo, OptionSpec, PreviewSyntax};
    use crate::quote::QuoteStyle;

    pub const SQLITE: AdapterDescriptor = AdapterDescriptor {
        db_type: "sqlite",
        display_name: "SQLite",
        badge_label: "SQLITE",
        driver: DriverInfo {
            package: "sqlit-adapter-sqlite",
            extra: "sqlite",
            crates: &["rusqlite"],
        },
        capabilities: Capabilities {
            multiple_databases: false,
            stored_procedures: false,
            indexes: true,
            triggers: true,
            sequences: false,
            transactions: true,
        },
        default_schema: Some("main"),
        quote_style: QuoteStyle::DoubleQuote,
        preview: PreviewSyntax::Limit,
        options: &[
            OptionSpec {
                key: "read_only",
                description: "open the database file read-only (bool)",
            },
            OptionSpec {
                key: "busy_timeout_ms",
                description: "milliseconds to wait on a locked database",
            },
        ],
    };

    pub const POSTGRESQL: AdapterDescriptor = AdapterDescriptor {
        db_type: "postgresql",
        display_name: "PostgreSQL",
        badge_label: "PG",
        driver: DriverInfo {
            package: "sqlit-adapter-postgres",
            extra: "postgresql",
            crates: &["postgres"],
        },
        capabilities: Capabilities {
            multiple_databases: true,
            stored_procedures: true,
            indexes: true,
            triggers: true,
            sequences: true,
            transactions: true,
        },
        default_schema: Some("public"),
        quote_style: QuoteStyle::DoubleQuote,
        preview: PreviewSyntax::Limit,
        options: &[
            OptionSpec {
                key: "sslmode",
                description: "disable | prefer (plaintext only; TLS modes are rejected)",
            },
            OptionSpec {
                key: "application_name",
                description: "application_name reported to the server",
            },
            OptionSpec {
                key: "connect_timeout",
                description: "connect timeout in seconds",
            },
        ],
    };

    pub const MYSQL: AdapterDescriptor = AdapterDescriptor {
        db_type: "mysql",
        display_name: "MySQL",
        badge_label: "MYSQL",
        driver: DriverInfo {
            package: "sqlit-adapter-mysql",
            extra: "mysql",
            crates: &["mysql"],
        },
        capabilities: Capabilities {
            multiple_databases: true,
            stored_procedures: true,
            indexes: true,
            triggers: true,
            sequences: false,
            transactions: true,
        },
        default_schema: None,
        quote_style: QuoteStyle::Backtick,
        preview: PreviewSyntax::Limit,
        options: &[
            OptionSpec {
                key: "socket",
                description: "unix socket path used instead of TCP",
            },
            OptionSpec {
                key: "connect_timeout",
                description: "connect timeout in seconds",
            },
        ],
    };

    pub const MSSQL: AdapterDescriptor = AdapterDescriptor {
        db_type: "mssql",
        display_name: "SQL Server",
        badge_label: "MSSQL",
        driver: DriverInfo {
            package: "sqlit-adapter-mssql",
            extra: "mssql",
            crates: &["tiberius"],
        },
        capabilities: Capabilities {
            multiple_databases: true,
            stored_procedures: true,
            indexes: true,
            triggers: true,
            sequences: true,
            transactions: true,
        },
        default_schema: Some("dbo"),
        quote_style: QuoteStyle::Bracket,
        preview: PreviewSyntax::Top,
        options: &[
            OptionSpec {
                key: "trust_server_certificate",
                description: "accept any server certificate (bool, default true)",
            },
            OptionSpec {
                key: "encrypt",
                description: "off | on | required | not_supported",
            },
            OptionSpec {
                key: "application_name",
                description: "application name reported to the server",
            },
        ],
    };

    pub const SNOWFLAKE: AdapterDescriptor = AdapterDescriptor {
        db_type: "snowflake",
        display_name: "Snowflake",
        badge_label: "SNOW",
        driver: DriverInfo {
            package: "sqlit-adapter-snowflake",
            extra: "snowflake",
            crates: &["reqwest"],
        },
        capabilities: Capabilities {
            multiple_databases: true,
            stored_procedures: true,
            indexes: false,
            triggers: false,
            sequences: true,
            transactions: true,
        },
        default_schema: Some("PUBLIC"),
        quote_style: QuoteStyle::DoubleQuote,
        preview: PreviewSyntax::Limit,
        options: &[
            OptionSpec {
                key: "warehouse",
                description: "virtual warehouse used to run statements",
            },
            OptionSpec {
                key: "schema",
                description: "session schema",
            },
            OptionSpec {
                key: "role",
                description: "session role",
            },
            OptionSpec {
                key: "authenticator",
                description: "snowflake (username + password) | programmatic_access_token | oauth | keypair_jwt (password carries the token)",
            },
        ],
    };

    pub const ATHENA: AdapterDescriptor = AdapterDescriptor {
        db_type: "athena",
        display_name: "AWS Athena",
        badge_label: "ATH",
        driver: DriverInfo {
            package: "sqlit-adapter-athena",
            extra: "athena",
            crates: &["aws-sdk-athena", "aws-config"],
        },
        capabilities: Capabilities {
            multiple_databases: true,
            stored_procedures: false,
            indexes: false,
            triggers: false,
            sequences: false,
            transactions: false,
        },
        default_schema: Some("default"),
        quote_style: QuoteStyle::DoubleQuote,
        preview: PreviewSyntax::Limit,
        options: &[
            OptionSpec {
                key: "athena_region_name",
                description: "AWS region of the Athena endpoint",
            },
            OptionSpec {
                key: "athena_s3_staging_dir",
                description: "s3:// location that receives query results",
            },
            OptionSpec {
                key: "athena_work_group",
                description: "Athena work group (default `primary`)",
            },
            OptionSpec {
                key: "athena_auth_method",
                description: "profile | keys; with keys, username/password are the access key pair",
            },
            OptionSpec {
                key: "athena_profile_name",
                description: "shared-config profile used with the profile auth method",
            },
            OptionSpec {
                key: "athena_catalog",
                description: "data catalog (default `AwsDataCatalog`)",
            },
        ],
    };

    pub const ALL: &[&AdapterDescriptor] = &[&SQLITE, &POSTGRESQL, &MYSQL, &MSSQL, &SNOWFLAKE, &ATHENA];
}
