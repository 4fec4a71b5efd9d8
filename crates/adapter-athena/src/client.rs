use std::{error::Error as StdError, time::Duration};

use aws_config::{BehaviorVersion, Region};
use aws_sdk_athena::{
    Client,
    config::Credentials,
    error::DisplayErrorContext,
    operation::get_query_results::GetQueryResultsOutput,
    types::{QueryExecutionContext, QueryExecutionState, ResultConfiguration, StatementType},
};
use thiserror::Error;
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(500);
const CREDENTIALS_PROVIDER: &str = "sqlit-connection";

#[derive(Debug, Error)]
pub enum AthenaError {
    /// An API call failed; the message includes the full error chain.
    #[error("{operation} failed: {message}")]
    Api {
        operation: &'static str,
        message: String,
    },
    #[error("query {state}: {reason}")]
    QueryFailed { state: String, reason: String },
    #[error("{operation} response did not include {field}")]
    MissingField {
        operation: &'static str,
        field: &'static str,
    },
}

fn api_error<E>(operation: &'static str) -> impl FnOnce(E) -> AthenaError
where
    E: StdError,
{
    move |error| AthenaError::Api {
        operation,
        message: DisplayErrorContext(&error).to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Auth {
    /// Default provider chain, optionally pinned to a shared-config profile.
    Profile(Option<String>),
    Keys {
        access_key_id: String,
        secret_access_key: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ClientSettings {
    pub region: Option<String>,
    pub auth: Auth,
    pub work_group: String,
    pub output_location: Option<String>,
    pub catalog: String,
    pub database: String,
}

/// A query execution that reached `SUCCEEDED`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Execution {
    pub id: String,
    /// SELECT-like results repeat the column labels as their first row.
    pub has_header_row: bool,
}

pub(crate) struct AthenaClient {
    sdk: Client,
    settings: ClientSettings,
}

impl AthenaClient {
    pub(crate) async fn new(settings: ClientSettings) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &settings.region {
            loader = loader.region(Region::new(region.clone()));
        }
        loader = match &settings.auth {
            Auth::Profile(Some(profile)) => loader.profile_name(profile),
            Auth::Profile(None) => loader,
            Auth::Keys {
                access_key_id,
                secret_access_key,
            } => loader.credentials_provider(Credentials::new(
                access_key_id,
                secret_access_key,
                None,
                None,
                CREDENTIALS_PROVIDER,
            )),
        };
        let sdk = Client::new(&loader.load().await);
        Self { sdk, settings }
    }

    pub(crate) fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Cheap authenticated call that runs no query.
    pub(crate) async fn ping(&self) -> Result<(), AthenaError> {
        self.sdk
            .list_databases()
            .catalog_name(&self.settings.catalog)
            .max_results(1)
            .send()
            .await
            .map_err(api_error("ListDatabases"))?;
        Ok(())
    }

    /// Starts `sql` and polls until it reaches a terminal state.
    pub(crate) async fn run(&self, sql: &str) -> Result<Execution, AthenaError> {
        let context = QueryExecutionContext::builder()
            .catalog(&self.settings.catalog)
            .database(&self.settings.database)
            .build();
        let result_configuration = ResultConfiguration::builder()
            .set_output_location(self.settings.output_location.clone())
            .build();

        let started = self
            .sdk
            .start_query_execution()
            .query_string(sql)
            .query_execution_context(context)
            .result_configuration(result_configuration)
            .work_group(&self.settings.work_group)
            .send()
            .await
            .map_err(api_error("StartQueryExecution"))?;
        let execution_id = started
            .query_execution_id()
            .ok_or(AthenaError::MissingField {
                operation: "StartQueryExecution",
                field: "QueryExecutionId",
            })?
            .to_string();

        loop {
            let response = self
                .sdk
                .get_query_execution()
                .query_execution_id(&execution_id)
                .send()
                .await
                .map_err(api_error("GetQueryExecution"))?;
            let execution = response.query_execution();
            let status = execution.and_then(|execution| execution.status());
            match status.and_then(|status| status.state()) {
                Some(QueryExecutionState::Succeeded) => {
                    return Ok(Execution {
                        has_header_row: execution
                            .and_then(|execution| execution.statement_type())
                            == Some(&StatementType::Dml),
                        id: execution_id,
                    });
                }
                Some(state @ (QueryExecutionState::Failed | QueryExecutionState::Cancelled)) => {
                    return Err(AthenaError::QueryFailed {
                        state: state.as_str().to_ascii_lowercase(),
                        reason: status
                            .and_then(|status| status.state_change_reason())
                            .unwrap_or("no reason given")
                            .to_string(),
                    });
                }
                _ => {
                    debug!(execution_id = %execution_id, "query still running");
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
            }
        }
    }

    pub(crate) async fn page(
        &self,
        execution_id: &str,
        next_token: Option<String>,
        max_results: i32,
    ) -> Result<GetQueryResultsOutput, AthenaError> {
        self.sdk
            .get_query_results()
            .query_execution_id(execution_id)
            .set_next_token(next_token)
            .max_results(max_results)
            .send()
            .await
            .map_err(api_error("GetQueryResults"))
    }
}
