//! Username/password sessions. A login request trades the credentials for a
//! session token, and statements then run through the query-request
//! endpoint. Unlike the SQL API this session is stateful: `USE` persists.

use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicU64, Ordering},
};

use reqwest::{
    RequestBuilder, Response, StatusCode,
    header::{ACCEPT, AUTHORIZATION, USER_AGENT},
};
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use crate::{
    api::{
        Binding, Envelope, LoginData, LoginRequest, LoginResponseData, QueryRequest,
        QueryResponseData, ResultSet,
    },
    client::{ApiError, POLL_INTERVAL, SQLIT_USER_AGENT, SessionContext},
};

const LOGIN_PATH: &str = "/session/v1/login-request";
const QUERY_PATH: &str = "/queries/v1/query-request";
const LOGOUT_PATH: &str = "/session";
const SNOWFLAKE_ACCEPT: &str = "application/snowflake";
const CLIENT_APP_ID: &str = "sqlit";
const QUERY_IN_PROGRESS_CODES: &[&str] = &["333333", "333334"];
// Chunks are only decoded as JSON; arrow results are switched off per session.
const JSON_RESULTS_STATEMENT: &str = "ALTER SESSION SET QUERY_RESULT_FORMAT = 'JSON'";
const SSE_ALGORITHM_HEADER: &str = "x-amz-server-side-encryption-customer-algorithm";
const SSE_KEY_HEADER: &str = "x-amz-server-side-encryption-customer-key";

pub(crate) struct SessionClient {
    http: reqwest::Client,
    account_url: String,
    token: String,
    sequence: AtomicU64,
}

impl SessionClient {
    pub(crate) async fn login(
        account_url: &str,
        account_name: &str,
        user: &str,
        password: &str,
        context: &SessionContext,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().gzip(true).build()?;
        let request = LoginRequest {
            data: LoginData {
                client_app_id: CLIENT_APP_ID,
                client_app_version: env!("CARGO_PKG_VERSION"),
                account_name,
                login_name: user,
                password,
            },
        };

        let response = http
            .post(format!("{account_url}{LOGIN_PATH}"))
            .query(&login_parameters(context))
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, SQLIT_USER_AGENT)
            .json(&request)
            .send()
            .await?;
        let (status, envelope) = read_envelope::<LoginResponseData>(response).await?;
        let token = into_data(status, envelope)?.token;

        let client = Self {
            http,
            account_url: account_url.to_string(),
            token,
            sequence: AtomicU64::new(0),
        };
        client.execute(JSON_RESULTS_STATEMENT, &[]).await?;
        Ok(client)
    }

    pub(crate) async fn execute(
        &self,
        statement: &str,
        bindings: &[&str],
    ) -> Result<ResultSet, ApiError> {
        let request = QueryRequest {
            sql_text: statement,
            async_exec: false,
            sequence_id: self.sequence.fetch_add(1, Ordering::Relaxed) + 1,
            is_internal: false,
            bindings: bindings
                .iter()
                .enumerate()
                .map(|(index, value)| ((index + 1).to_string(), Binding::text(value)))
                .collect::<BTreeMap<_, _>>(),
        };

        let (mut status, mut envelope) = self
            .send(
                self.http
                    .post(format!("{}{QUERY_PATH}", self.account_url))
                    .query(&[("requestId", Uuid::new_v4().to_string())])
                    .json(&request),
            )
            .await?;
        while is_in_progress(&envelope) {
            let result_url = envelope
                .data
                .as_ref()
                .and_then(|data| data.get_result_url.clone())
                .ok_or(ApiError::MissingHandle)?;
            debug!(%result_url, "statement still running");
            tokio::time::sleep(POLL_INTERVAL).await;
            (status, envelope) = self
                .send(self.http.get(format!("{}{result_url}", self.account_url)))
                .await?;
        }

        let data = into_data(status, envelope)?;
        match data.query_result_format.as_deref() {
            None | Some("json") => Ok(ResultSet::from(data)),
            Some(other) => Err(ApiError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Rows of chunk `index` (> 0) of a finished statement.
    pub(crate) async fn chunk(
        &self,
        result: &ResultSet,
        index: usize,
    ) -> Result<Vec<Vec<Option<String>>>, ApiError> {
        let Some(chunk) = index.checked_sub(1).and_then(|index| result.chunks.get(index)) else {
            return Ok(Vec::new());
        };

        let mut request = self.http.get(&chunk.url);
        if result.chunk_headers.is_empty() {
            if let Some(qrmk) = result.qrmk.as_deref() {
                request = request
                    .header(SSE_ALGORITHM_HEADER, "AES256")
                    .header(SSE_KEY_HEADER, qrmk);
            }
        }
        for (name, value) in &result.chunk_headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Http {
                status: status.as_u16(),
                body,
            });
        }
        parse_chunk(&body)
    }

    pub(crate) async fn logout(&self) -> Result<(), ApiError> {
        let response = self
            .authorized(
                self.http
                    .post(format!("{}{LOGOUT_PATH}", self.account_url))
                    .query(&[("delete", "true")]),
            )
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(ApiError::Http {
            status: status.as_u16(),
            body: response.text().await?,
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(AUTHORIZATION, format!("Snowflake Token=\"{}\"", self.token))
            .header(ACCEPT, SNOWFLAKE_ACCEPT)
            .header(USER_AGENT, SQLIT_USER_AGENT)
    }

    async fn send(
        &self,
        request: RequestBuilder,
    ) -> Result<(StatusCode, Envelope<QueryResponseData>), ApiError> {
        let response = self.authorized(request).send().await?;
        read_envelope(response).await
    }
}

fn login_parameters(context: &SessionContext) -> Vec<(&'static str, String)> {
    let mut parameters = vec![("request_id", Uuid::new_v4().to_string())];
    for (key, value) in [
        ("databaseName", &context.database),
        ("schemaName", &context.schema),
        ("warehouse", &context.warehouse),
        ("roleName", &context.role),
    ] {
        if let Some(value) = value {
            parameters.push((key, value.clone()));
        }
    }
    parameters
}

fn is_in_progress<T>(envelope: &Envelope<T>) -> bool {
    envelope
        .code
        .as_deref()
        .is_some_and(|code| QUERY_IN_PROGRESS_CODES.contains(&code))
}

async fn read_envelope<T>(response: Response) -> Result<(StatusCode, Envelope<T>), ApiError>
where
    T: DeserializeOwned,
{
    let status = response.status();
    let body = response.text().await?;
    match serde_json::from_str(&body) {
        Ok(envelope) => Ok((status, envelope)),
        Err(_) if !status.is_success() => Err(ApiError::Http {
            status: status.as_u16(),
            body,
        }),
        Err(error) => Err(error.into()),
    }
}

fn into_data<T>(status: StatusCode, envelope: Envelope<T>) -> Result<T, ApiError> {
    match envelope {
        Envelope {
            success: true,
            data: Some(data),
            ..
        } => Ok(data),
        Envelope { code, message, .. } => Err(ApiError::Statement {
            status: status.as_u16(),
            code: code.unwrap_or_default(),
            sql_state: String::new(),
            message: message.unwrap_or_else(|| format!("snowflake request failed with HTTP {status}")),
        }),
    }
}

/// Chunk bodies are comma-separated row arrays without the enclosing brackets.
fn parse_chunk(body: &str) -> Result<Vec<Vec<Option<String>>>, ApiError> {
    Ok(serde_json::from_str(&format!("[{body}]"))?)
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use serde_json::json;

    use super::{into_data, is_in_progress, login_parameters, parse_chunk};
    use crate::{
        api::{Envelope, LoginResponseData, QueryResponseData},
        client::{ApiError, SessionContext},
    };

    #[test]
    fn login_parameters_carry_the_session_context() {
        let parameters = login_parameters(&SessionContext {
            database: Some("ANALYTICS".to_string()),
            schema: None,
            warehouse: Some("COMPUTE_WH".to_string()),
            role: Some("ANALYST".to_string()),
        });

        let keys = parameters.iter().map(|(key, _)| *key).collect::<Vec<_>>();
        assert_eq!(keys, vec!["request_id", "databaseName", "warehouse", "roleName"]);
        assert_eq!(parameters[1].1, "ANALYTICS");
    }

    #[test]
    fn failed_login_keeps_the_backend_message() {
        let envelope: Envelope<LoginResponseData> = serde_json::from_value(json!({
            "data": null,
            "code": "390100",
            "message": "Incorrect username or password was specified.",
            "success": false
        }))
        .expect("parse");

        let error = into_data(StatusCode::OK, envelope).expect_err("login failed");

        assert_eq!(error.to_string(), "Incorrect username or password was specified.");
        assert!(matches!(error, ApiError::Statement { ref code, .. } if code == "390100"));
    }

    #[test]
    fn in_progress_codes_keep_polling() {
        let running: Envelope<QueryResponseData> = serde_json::from_value(json!({
            "data": { "getResultUrl": "/queries/01b3/result" },
            "code": "333334",
            "success": true
        }))
        .expect("parse");
        let done: Envelope<QueryResponseData> =
            serde_json::from_value(json!({ "data": {}, "success": true })).expect("parse");

        assert!(is_in_progress(&running));
        assert!(!is_in_progress(&done));
    }

    #[test]
    fn chunks_parse_as_bare_row_lists() {
        assert_eq!(
            parse_chunk(r#"["1","a"],["2",null]"#).expect("chunk"),
            vec![
                vec![Some("1".to_string()), Some("a".to_string())],
                vec![Some("2".to_string()), None],
            ]
        );
    }
}
