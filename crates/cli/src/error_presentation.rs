use std::{io, path::PathBuf};

use miette::Report;

const CONNECTIONS_READ_CONTEXT: &str = "while reading connections file";
const CONNECTIONS_PARSE_CONTEXT: &str = "while parsing connections file";
const CONNECT_CONTEXT: &str = "while opening connection";
const OUTPUT_CONTEXT: &str = "while writing results";

pub(crate) type CliResult<T> = std::result::Result<T, CliError>;

#[derive(Debug)]
pub(crate) enum CliError {
    ReadConnections {
        path: PathBuf,
        source: io::Error,
    },
    ParseConnections {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    UnknownConnection {
        name: String,
        path: PathBuf,
        known: Vec<String>,
    },
    Output(io::Error),
    Core(sqlit_core::Error),
}

impl From<sqlit_core::Error> for CliError {
    fn from(value: sqlit_core::Error) -> Self {
        Self::Core(value)
    }
}

impl From<io::Error> for CliError {
    fn from(value: io::Error) -> Self {
        Self::Output(value)
    }
}

pub(crate) fn render_runtime_error(error: CliError) -> String {
    match error {
        CliError::ReadConnections { path, source } => {
            let context = format!("{CONNECTIONS_READ_CONTEXT} `{}`", path.display());
            format!("[io] {}", report_with_context(source, context))
        }
        CliError::ParseConnections { path, source } => {
            let context = format!("{CONNECTIONS_PARSE_CONTEXT} `{}`", path.display());
            format!("[config] {}", report_with_context(source, context))
        }
        CliError::UnknownConnection { name, path, known } => {
            let known = if known.is_empty() {
                "none".to_string()
            } else {
                known.join(", ")
            };
            format!(
                "[config] no connection named `{name}` in `{}` (known: {known})",
                path.display()
            )
        }
        CliError::Output(source) => format!("[io] {}", report_with_context(source, OUTPUT_CONTEXT)),
        CliError::Core(source) => {
            let category = core_category(&source);
            let context = core_context(&source);
            format!("[{category}] {}", report_with_context(source, context))
        }
    }
}

fn report_with_context<E, C>(source: E, context: C) -> Report
where
    E: std::error::Error + Send + Sync + 'static,
    C: Into<String>,
{
    let anyhow_error = anyhow::Error::new(source).context(context.into());
    miette::miette!("{anyhow_error:#}")
}

fn core_category(error: &sqlit_core::Error) -> &'static str {
    match error {
        sqlit_core::Error::DriverMissing(_) => "driver",
        sqlit_core::Error::Connect { .. } => "connect",
        sqlit_core::Error::Query { .. } | sqlit_core::Error::ConnectionMismatch { .. } => "query",
        sqlit_core::Error::Config(_) | sqlit_core::Error::UnknownBackend { .. } => "config",
    }
}

fn core_context(error: &sqlit_core::Error) -> String {
    match error.sql() {
        Some(sql) => format!("while running `{}`", first_line(sql)),
        None => CONNECT_CONTEXT.to_string(),
    }
}

fn first_line(sql: &str) -> &str {
    sql.trim().lines().next().unwrap_or_default()
}
