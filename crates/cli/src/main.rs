mod args;
mod connections;
mod error_presentation;
mod logging;
mod output;
mod registry;

use std::{
    io::{self, Write},
    process::ExitCode,
};

use clap::Parser;
use sqlit_core::{Adapter, AdapterRegistry, Connection, ConnectionConfig};
use tracing::debug;

use crate::{
    args::{Action, Cli, Target},
    error_presentation::{CliResult, render_runtime_error},
    output::{AdapterSummary, Format, Output},
};

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{}", render_runtime_error(error));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let format = if cli.json { Format::Json } else { Format::Text };
    let registry = registry::build_registry();

    let output = match cli.command.into_target() {
        Target::Adapters => Output::Adapters(
            registry
                .descriptors()
                .map(|descriptor| {
                    AdapterSummary::new(descriptor, registry::is_compiled(descriptor.db_type))
                })
                .collect(),
        ),
        Target::Saved(saved) => {
            let config = connections::find(&saved.file, &saved.name)?;
            run_action(&registry, &config, saved.action)?
        }
        Target::Backend(db_type, connect) => {
            let (config, action) = connect.into_config(db_type);
            run_action(&registry, &config, action)?
        }
    };

    let rendered = output::render(&output, format).map_err(io::Error::from)?;
    let mut stdout = io::stdout().lock();
    stdout.write_all(rendered.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

fn run_action(
    registry: &AdapterRegistry,
    config: &ConnectionConfig,
    action: Action,
) -> CliResult<Output> {
    let (adapter, mut connection) = registry.connect(config)?;
    debug!(connection = %config.name, ?action, "running action");
    let output = dispatch(adapter, &mut connection, action)?;
    adapter.close(connection)?;
    Ok(output)
}

fn dispatch(
    adapter: &dyn Adapter,
    connection: &mut Connection,
    action: Action,
) -> sqlit_core::Result<Output> {
    let output = match action {
        Action::Databases => Output::Names(adapter.get_databases(connection)?),
        Action::Tables { database } => {
            Output::Tables(adapter.get_tables(connection, database.as_deref())?)
        }
        Action::Views { database } => {
            Output::Tables(adapter.get_views(connection, database.as_deref())?)
        }
        Action::Columns {
            table,
            database,
            schema,
        } => Output::Columns(adapter.get_columns(
            connection,
            &table,
            database.as_deref(),
            schema.as_deref(),
        )?),
        Action::Indexes { database } => {
            Output::Indexes(adapter.get_indexes(connection, database.as_deref())?)
        }
        Action::Triggers { database } => {
            Output::Triggers(adapter.get_triggers(connection, database.as_deref())?)
        }
        Action::Sequences { database } => {
            Output::Sequences(adapter.get_sequences(connection, database.as_deref())?)
        }
        Action::Procedures { database } => {
            Output::Names(adapter.get_procedures(connection, database.as_deref())?)
        }
        Action::Preview {
            table,
            limit,
            database,
            schema,
        } => {
            let sql =
                adapter.build_select_query(&table, limit, database.as_deref(), schema.as_deref());
            Output::Rows(adapter.execute_query(connection, &sql, None)?)
        }
        Action::Query { sql, max_rows } => {
            Output::Rows(adapter.execute_query(connection, &sql, max_rows)?)
        }
        Action::Exec { sql } => Output::affected(adapter.execute_non_query(connection, &sql)?),
    };
    Ok(output)
}
