use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use sqlit_core::{ConnectionConfig, OptionValue};

#[derive(Debug, Parser)]
#[command(name = "sqlit", version, about = "Inspect and query databases through sqlit adapters")]
pub(crate) struct Cli {
    /// Raise log verbosity (-v info, -vv debug). `SQLIT_LOG` overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Print results as JSON.
    #[arg(long, global = true)]
    pub json: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// List known backends and whether their driver is compiled in.
    Adapters,
    /// Use a named connection from a YAML connections file.
    Saved(SavedArgs),
    Sqlite(ConnectArgs),
    Postgresql(ConnectArgs),
    Mysql(ConnectArgs),
    Mssql(ConnectArgs),
    Snowflake(ConnectArgs),
    Athena(ConnectArgs),
}

/// A parsed command with the backend subcommands folded into one case.
#[derive(Debug)]
pub(crate) enum Target {
    Adapters,
    Saved(SavedArgs),
    Backend(&'static str, ConnectArgs),
}

impl Command {
    pub(crate) fn into_target(self) -> Target {
        match self {
            Self::Adapters => Target::Adapters,
            Self::Saved(args) => Target::Saved(args),
            Self::Sqlite(args) => Target::Backend("sqlite", args),
            Self::Postgresql(args) => Target::Backend("postgresql", args),
            Self::Mysql(args) => Target::Backend("mysql", args),
            Self::Mssql(args) => Target::Backend("mssql", args),
            Self::Snowflake(args) => Target::Backend("snowflake", args),
            Self::Athena(args) => Target::Backend("athena", args),
        }
    }
}

#[derive(Debug, Args)]
pub(crate) struct ConnectArgs {
    /// Host name, or the account identifier for snowflake.
    #[arg(long, visible_alias = "host")]
    pub server: Option<String>,
    #[arg(long)]
    pub port: Option<u16>,
    #[arg(short, long)]
    pub user: Option<String>,
    #[arg(long)]
    pub password: Option<String>,
    /// Database name, or the file path for sqlite.
    #[arg(short, long)]
    pub database: Option<String>,
    /// Backend-specific option, repeatable.
    #[arg(
        short = 'o',
        long = "option",
        value_name = "KEY=VALUE",
        value_parser = parse_option
    )]
    pub options: Vec<(String, String)>,
    #[command(subcommand)]
    pub action: Action,
}

impl ConnectArgs {
    pub(crate) fn into_config(self, db_type: &str) -> (ConnectionConfig, Action) {
        let mut config = ConnectionConfig::new(db_type, db_type);
        config.server = self.server.unwrap_or_default();
        config.port = self.port;
        config.username = self.user.unwrap_or_default();
        config.password = self.password.unwrap_or_default();
        config.database = self.database.unwrap_or_default();
        config.options = self
            .options
            .into_iter()
            .map(|(key, value)| (key, OptionValue::from(value)))
            .collect();
        (config, self.action)
    }
}

#[derive(Debug, Args)]
pub(crate) struct SavedArgs {
    /// Connections file: a YAML mapping from name to connection settings.
    #[arg(long, env = "SQLIT_CONNECTIONS", default_value = "connections.yml")]
    pub file: PathBuf,
    pub name: String,
    #[command(subcommand)]
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub(crate) enum Action {
    Databases,
    Tables {
        #[arg(long)]
        database: Option<String>,
    },
    Views {
        #[arg(long)]
        database: Option<String>,
    },
    Columns {
        table: String,
        #[arg(long)]
        database: Option<String>,
        #[arg(long)]
        schema: Option<String>,
    },
    Indexes {
        #[arg(long)]
        database: Option<String>,
    },
    Triggers {
        #[arg(long)]
        database: Option<String>,
    },
    Sequences {
        #[arg(long)]
        database: Option<String>,
    },
    Procedures {
        #[arg(long)]
        database: Option<String>,
    },
    /// Show the first rows of a table.
    Preview {
        table: String,
        #[arg(long, default_value_t = 100)]
        limit: u64,
        #[arg(long)]
        database: Option<String>,
        #[arg(long)]
        schema: Option<String>,
    },
    /// Run a statement that returns rows.
    Query {
        sql: String,
        #[arg(long)]
        max_rows: Option<usize>,
    },
    /// Run a statement and report affected rows.
    Exec { sql: String },
}

fn parse_option(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("option key is empty in `{raw}`"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use sqlit_core::OptionValue;

    use super::{Action, Cli, Target, parse_option};

    #[test]
    fn option_flags_split_on_the_first_equals() {
        assert_eq!(
            parse_option("search_path=a=b"),
            Ok(("search_path".to_string(), "a=b".to_string()))
        );
        assert!(parse_option("novalue").is_err());
        assert!(parse_option("=x").is_err());
    }

    #[test]
    fn backend_flags_build_a_config() {
        let cli = Cli::try_parse_from([
            "sqlit",
            "postgresql",
            "--host",
            "db.internal",
            "--port",
            "5433",
            "-u",
            "reader",
            "-d",
            "shop",
            "-o",
            "sslmode=prefer",
            "columns",
            "orders",
            "--schema",
            "sales",
        ])
        .expect("parse");

        let Target::Backend(db_type, args) = cli.command.into_target() else {
            panic!("expected a backend command");
        };
        let (config, action) = args.into_config(db_type);
        assert_eq!(config.db_type, "postgresql");
        assert_eq!(config.server, "db.internal");
        assert_eq!(config.port, Some(5433));
        assert_eq!(config.username, "reader");
        assert_eq!(config.database, "shop");
        assert_eq!(
            config.options.get("sslmode"),
            Some(&OptionValue::String("prefer".to_string()))
        );
        assert_eq!(
            action,
            Action::Columns {
                table: "orders".to_string(),
                database: None,
                schema: Some("sales".to_string()),
            }
        );
    }

    #[test]
    fn global_flags_follow_the_action() {
        let cli = Cli::try_parse_from([
            "sqlit", "sqlite", "-d", ":memory:", "databases", "--json", "-vv",
        ])
        .expect("parse");
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
    }
}
