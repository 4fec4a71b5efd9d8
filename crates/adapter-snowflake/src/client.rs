use std::{collections::BTreeMap, time::Duration};

use reqwest::{
    RequestBuilder, StatusCode,
    header::{ACCEPT, USER_AGENT},
};
use thiserror::Error;
use tracing::debug;

use crate::{
    api::{Binding, ResultSet, StatementRequest},
    session::SessionClient,
};

const STATEMENTS_PATH: &str = "/api/v2/statements";
const TOKEN_TYPE_HEADER: &str = "X-Snowflake-Authorization-Token-Type";
const VALIDATION_QUERY: &str = "SELECT 1";
pub(crate) const POLL_INTERVAL: Duration = Duration::from_millis(500);
pub(crate) const SQLIT_USER_AGENT: &str = concat!("sqlit/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    /// A statement error reported by Snowflake. Renders its message
    /// unchanged.
    #[error("{message}")]
    Statement {
        status: u16,
        code: String,
        sql_state: String,
        message: String,
    },
    #[error("snowflake returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("statement still running but the response carried no statement handle")]
    MissingHandle,
    #[error("unsupported result format `{0}`")]
    UnsupportedFormat(String),
}

/// How a connection proves its identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Auth<'a> {
    /// Bearer token for the SQL API; `token_type` fills the token-type header.
    Token {
        token: &'a str,
        token_type: &'static str,
    },
    /// Login name and password exchanged for a session token.
    Password { user: &'a str, password: &'a str },
}

pub(crate) enum SnowflakeClient {
    SqlApi(SqlApiClient),
    Session(SessionClient),
}

impl SnowflakeClient {
    /// Opens a client and proves the credentials are usable.
    pub(crate) async fn open(
        server: &str,
        auth: Auth<'_>,
        context: SessionContext,
    ) -> Result<Self, ApiError> {
        let url = account_url(server);
        match auth {
            Auth::Token { token, token_type } => {
                let client = SqlApiClient::new(&url, token.to_string(), token_type, context)?;
                // The SQL API is stateless; a trivial statement proves the
                // token, account, and warehouse are usable.
                client.execute(VALIDATION_QUERY, &[]).await?;
                Ok(Self::SqlApi(client))
            }
            Auth::Password { user, password } => {
                SessionClient::login(&url, &account_name(server), user, password, &context)
                    .await
                    .map(Self::Session)
            }
        }
    }

    pub(crate) async fn execute(
        &self,
        statement: &str,
        bindings: &[&str],
    ) -> Result<ResultSet, ApiError> {
        match self {
            Self::SqlApi(client) => client.execute(statement, bindings).await,
            Self::Session(client) => client.execute(statement, bindings).await,
        }
    }

    /// Rows of partition `index` (> 0) of `result`.
    pub(crate) async fn partition(
        &self,
        result: &ResultSet,
        index: usize,
    ) -> Result<Vec<Vec<Option<String>>>, ApiError> {
        match self {
            Self::SqlApi(client) => {
                let handle = result
                    .statement_handle
                    .as_deref()
                    .ok_or(ApiError::MissingHandle)?;
                client.partition(handle, index).await
            }
            Self::Session(client) => client.chunk(result, index).await,
        }
    }

    pub(crate) async fn close(&self) -> Result<(), ApiError> {
        match self {
            Self::SqlApi(_) => Ok(()),
            Self::Session(client) => client.logout().await,
        }
    }
}

/// Session context sent with every statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SessionContext {
    pub database: Option<String>,
    pub schema: Option<String>,
    pub warehouse: Option<String>,
    pub role: Option<String>,
}

pub(crate) struct SqlApiClient {
    http: reqwest::Client,
    statements_url: String,
    token: String,
    token_type: &'static str,
    context: SessionContext,
}

impl SqlApiClient {
    pub(crate) fn new(
        account_url: &str,
        token: String,
        token_type: &'static str,
        context: SessionContext,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            statements_url: format!("{account_url}{STATEMENTS_PATH}"),
            token,
            token_type,
            context,
        })
    }

    /// Submits `statement` and waits until it finishes. The returned result
    /// holds the first partition of rows.
    pub(crate) async fn execute(
        &self,
        statement: &str,
        bindings: &[&str],
    ) -> Result<ResultSet, ApiError> {
        let request = StatementRequest {
            statement,
            timeout: 0,
            database: self.context.database.as_deref(),
            schema: self.context.schema.as_deref(),
            warehouse: self.context.warehouse.as_deref(),
            role: self.context.role.as_deref(),
            bindings: bindings
                .iter()
                .enumerate()
                .map(|(index, value)| ((index + 1).to_string(), Binding::text(value)))
                .collect::<BTreeMap<_, _>>(),
        };

        let (mut status, mut result) = self
            .send(self.http.post(&self.statements_url).json(&request))
            .await?;
        while status == StatusCode::ACCEPTED {
            let handle = result.statement_handle.clone().ok_or(ApiError::MissingHandle)?;
            debug!(statement_handle = %handle, "statement still running");
            tokio::time::sleep(POLL_INTERVAL).await;
            (status, result) = self
                .send(self.http.get(format!("{}/{handle}", self.statements_url)))
                .await?;
        }
        Ok(result)
    }

    /// Rows of partition `index` (> 0) of a finished statement.
    pub(crate) async fn partition(
        &self,
        handle: &str,
        index: usize,
    ) -> Result<Vec<Vec<Option<String>>>, ApiError> {
        let url = format!("{}/{handle}", self.statements_url);
        let (_, result) = self
            .send(self.http.get(url).query(&[("partition", index)]))
            .await?;
        Ok(result.data)
    }

    async fn send(&self, request: RequestBuilder) -> Result<(StatusCode, ResultSet), ApiError> {
        let response = request
            .bearer_auth(&self.token)
            .header(TOKEN_TYPE_HEADER, self.token_type)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, SQLIT_USER_AGENT)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::OK || status == StatusCode::ACCEPTED {
            return Ok((status, serde_json::from_str(&body)?));
        }
        Err(error_from_body(status, body))
    }
}

fn error_from_body(status: StatusCode, body: String) -> ApiError {
    match serde_json::from_str::<ResultSet>(&body) {
        Ok(ResultSet {
            code: Some(code),
            message: Some(message),
            sql_state,
            ..
        }) => ApiError::Statement {
            status: status.as_u16(),
            code,
            sql_state: sql_state.unwrap_or_default(),
            message,
        },
        _ => ApiError::Http {
            status: status.as_u16(),
            body,
        },
    }
}

/// Account name sent at login: the first label of the account identifier or
/// host name.
pub(crate) fn account_name(server: &str) -> String {
    let server = server.trim();
    let host = server
        .split_once("://")
        .map_or(server, |(_, rest)| rest)
        .trim_end_matches('/');
    host.split(['.', ':']).next().unwrap_or(host).to_string()
}

/// Base URL for an account identifier, a full host name, or an explicit URL.
pub(crate) fn account_url(server: &str) -> String {
    let server = server.trim().trim_end_matches('/');
    if server.starts_with("https://") || server.starts_with("http://") {
        server.to_string()
    } else if server.contains(".snowflakecomputing.") {
        format!("https://{server}")
    } else {
        format!("https://{server}.snowflakecomputing.com")
    }
}
