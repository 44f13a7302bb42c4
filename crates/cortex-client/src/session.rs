//! Authenticated warehouse session.
//!
//! A [`Session`] starts unauthenticated. [`Session::login`] exchanges
//! credentials for a session token, after which statements can be run and the
//! agent endpoint called. [`Session::logout`] drops the token.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use cortex_core::{AssistantConfig, CortexError, SemanticModel, TabularResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::RemoteError;

const LOGIN_PATH: &str = "/session/v1/login-request";
const QUERY_PATH: &str = "/queries/v1/query-request";
const LOGOUT_PATH: &str = "/session/logout-request";
const CLIENT_APP_ID: &str = "cortex-assist";

/// Username and password for one login attempt.
#[derive(Clone)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

/// Per-user state shared by every remote call.
pub struct Session {
    config: AssistantConfig,
    client: Client,
    token: Option<String>,
    user: Option<String>,
    debug: bool,
    model: SemanticModel,
    sequence: AtomicU64,
}

impl Session {
    /// Create an unauthenticated session.
    ///
    /// The HTTP client carries no overall timeout; only agent calls are
    /// bounded, per request.
    pub fn new(config: AssistantConfig) -> cortex_core::Result<Self> {
        let model = config.semantic_models.default_model()?.clone();
        let client = Client::builder()
            .build()
            .map_err(|e| CortexError::Config(format!("failed to build HTTP client: {}", e)))?;
        let debug = config.ui.debug;

        Ok(Self {
            config,
            client,
            token: None,
            user: None,
            debug,
            model,
            sequence: AtomicU64::new(1),
        })
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    pub fn base_url(&self) -> String {
        self.config.account.base_url()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Name of the logged-in user, if any.
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub(crate) fn token(&self) -> Result<&str, RemoteError> {
        self.token.as_deref().ok_or(RemoteError::NotAuthenticated)
    }

    /// Value of the `Authorization` header for the current token.
    pub(crate) fn auth_header(&self) -> Result<String, RemoteError> {
        Ok(format!("Snowflake Token=\"{}\"", self.token()?))
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn set_debug(&mut self, on: bool) {
        self.debug = on;
    }

    /// The semantic model structured queries are answered against.
    pub fn semantic_model(&self) -> &SemanticModel {
        &self.model
    }

    /// Switch to the configured semantic model called `name`.
    pub fn select_model(&mut self, name: &str) -> cortex_core::Result<&SemanticModel> {
        let model = self
            .config
            .semantic_models
            .find(name)
            .cloned()
            .ok_or_else(|| CortexError::Config(format!("unknown semantic model: {}", name)))?;
        info!(model = %model.name, "Semantic model selected");
        self.model = model;
        Ok(&self.model)
    }

    /// Authenticate and prepare the session.
    ///
    /// On success the session uses the configured database and schema, with
    /// UTC timestamps and case-insensitive quoted identifiers. On any failure
    /// the session stays unauthenticated.
    pub async fn login(&mut self, credentials: &Credentials) -> Result<(), RemoteError> {
        let account = &self.config.account;
        let url = format!("{}{}", self.base_url(), LOGIN_PATH);
        let request_id = Uuid::new_v4().to_string();
        let body = LoginRequest {
            data: LoginData {
                account_name: &account.account,
                login_name: &credentials.user,
                password: &credentials.password,
                client_app_id: CLIENT_APP_ID,
                client_app_version: env!("CARGO_PKG_VERSION"),
            },
        };

        debug!(user = %credentials.user, account = %account.account, "Logging in");
        let response = self
            .client
            .post(&url)
            .query(&[
                ("databaseName", account.database.as_str()),
                ("schemaName", account.schema.as_str()),
                ("warehouse", account.warehouse.as_str()),
                ("roleName", account.role.as_str()),
                ("request_id", request_id.as_str()),
            ])
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.map_transport(e))?;
        if !status.is_success() {
            return Err(RemoteError::Authentication(format!(
                "login request returned status {}: {}",
                status.as_u16(),
                text
            )));
        }

        let parsed: LoginResponse =
            serde_json::from_str(&text).map_err(|e| RemoteError::Decode(e.to_string()))?;
        if !parsed.success {
            return Err(RemoteError::Authentication(
                parsed
                    .message
                    .unwrap_or_else(|| "login rejected".to_string()),
            ));
        }
        let token = parsed
            .data
            .and_then(|d| d.token)
            .ok_or_else(|| RemoteError::Decode("login response has no token".to_string()))?;

        self.token = Some(token);
        if let Err(e) = self.prepare().await {
            warn!(error = %e, "Session setup failed");
            self.token = None;
            return Err(e);
        }

        self.user = Some(credentials.user.clone());
        info!(user = %credentials.user, "Logged in");
        Ok(())
    }

    async fn prepare(&self) -> Result<(), RemoteError> {
        let account = &self.config.account;
        let setup = [
            format!("USE DATABASE {}", account.database),
            format!("USE SCHEMA {}", account.schema),
            "ALTER SESSION SET TIMEZONE = 'UTC'".to_string(),
            "ALTER SESSION SET QUOTED_IDENTIFIERS_IGNORE_CASE = TRUE".to_string(),
        ];
        for sql in &setup {
            self.run_statement(sql, &[]).await?;
        }
        Ok(())
    }

    /// End the session. The local token is always dropped, even when the
    /// remote call fails.
    pub async fn logout(&mut self) -> Result<(), RemoteError> {
        let Some(token) = self.token.take() else {
            return Ok(());
        };
        let user = self.user.take();

        let url = format!("{}{}", self.base_url(), LOGOUT_PATH);
        let result = self
            .client
            .post(&url)
            .query(&[("delete", "true")])
            .header("Authorization", format!("Snowflake Token=\"{}\"", token))
            .header("Accept", "application/json")
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => {
                info!(user = ?user, "Logged out");
                Ok(())
            }
            Ok(resp) => {
                let status = resp.status().as_u16();
                let body = resp.text().await.unwrap_or_default();
                warn!(status, "Logout request failed");
                Err(RemoteError::Http { status, body })
            }
            Err(e) => Err(self.map_transport(e)),
        }
    }

    /// Run one SQL statement, binding each of `bindings` as a TEXT value for
    /// the `?` placeholders in order.
    pub async fn run_statement(
        &self,
        sql: &str,
        bindings: &[&str],
    ) -> Result<TabularResult, RemoteError> {
        let auth = self.auth_header()?;
        let url = format!("{}{}", self.base_url(), QUERY_PATH);
        let request_id = Uuid::new_v4().to_string();
        let body = StatementRequest {
            sql_text: sql,
            async_exec: false,
            sequence_id: self.sequence.fetch_add(1, Ordering::Relaxed),
            query_submission_time: chrono::Utc::now().timestamp_millis(),
            bindings: bind_map(bindings),
        };

        debug!(sql, bindings = bindings.len(), "Running statement");
        let response = self
            .client
            .post(&url)
            .query(&[("requestId", request_id.as_str())])
            .header("Authorization", &auth)
            .header("Accept", "application/snowflake")
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let mut outcome = decode_statement(&self.read_body(response).await?)?;
        let mut polls = 0;
        loop {
            let (result_url, query_id) = match outcome {
                StatementOutcome::Done(table) => return Ok(table),
                StatementOutcome::Pending {
                    result_url,
                    query_id,
                } => (result_url, query_id),
            };
            if polls == MAX_RESULT_POLLS {
                warn!(query_id = ?query_id, polls, "Statement result not ready");
                return Err(RemoteError::Statement(format!(
                    "query {} still running after {} result polls",
                    query_id.as_deref().unwrap_or("(unknown)"),
                    polls
                )));
            }
            polls += 1;
            tokio::time::sleep(RESULT_POLL_INTERVAL).await;

            debug!(query_id = ?query_id, polls, "Polling statement result");
            let response = self
                .client
                .get(self.result_url(&result_url))
                .header("Authorization", &auth)
                .header("Accept", "application/snowflake")
                .send()
                .await
                .map_err(|e| self.map_transport(e))?;
            outcome = decode_statement(&self.read_body(response).await?)?;
        }
    }

    /// Body of a successful response; any other status becomes `Http`.
    async fn read_body(&self, response: reqwest::Response) -> Result<String, RemoteError> {
        let status = response.status();
        let text = response.text().await.map_err(|e| self.map_transport(e))?;
        if !status.is_success() {
            return Err(RemoteError::Http {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(text)
    }

    /// Result URLs are usually relative to the base URL.
    fn result_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("{}{}", self.base_url(), url)
        }
    }

    fn map_transport(&self, err: reqwest::Error) -> RemoteError {
        RemoteError::from_reqwest(err, self.config.agent.timeout_secs)
    }
}

/// Error code the warehouse returns for an expired session token.
const SESSION_EXPIRED_CODE: &str = "390112";

/// Codes for a statement still executing when the synchronous wait ended.
const QUERY_IN_PROGRESS_CODES: [&str; 2] = ["333333", "333334"];

const RESULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
const MAX_RESULT_POLLS: u32 = 120;

#[derive(Debug)]
enum StatementOutcome {
    Done(TabularResult),
    Pending {
        result_url: String,
        query_id: Option<String>,
    },
}

/// Decode a statement (or result poll) response.
///
/// A success without a result set is only accepted while the query is still
/// running and a result URL is given; it is never read as zero rows.
fn decode_statement(text: &str) -> Result<StatementOutcome, RemoteError> {
    let parsed: StatementResponse =
        serde_json::from_str(text).map_err(|e| RemoteError::Decode(e.to_string()))?;
    if !parsed.success {
        let message = parsed
            .message
            .unwrap_or_else(|| "statement rejected".to_string());
        return Err(match parsed.code.as_deref() {
            Some(SESSION_EXPIRED_CODE) => RemoteError::NotAuthenticated,
            _ => RemoteError::Statement(message),
        });
    }

    let data = parsed
        .data
        .ok_or_else(|| RemoteError::Decode("statement response has no data".to_string()))?;
    if let Some(rowtype) = data.rowtype {
        let columns = rowtype.into_iter().map(|c| c.name).collect();
        return Ok(StatementOutcome::Done(TabularResult::new(columns, data.rowset)));
    }

    match (parsed.code.as_deref(), data.get_result_url) {
        (Some(code), Some(result_url)) if QUERY_IN_PROGRESS_CODES.contains(&code) => {
            Ok(StatementOutcome::Pending {
                result_url,
                query_id: data.query_id,
            })
        }
        (code, _) => Err(RemoteError::Statement(format!(
            "statement returned no result set (code {})",
            code.unwrap_or("none")
        ))),
    }
}

fn bind_map(values: &[&str]) -> Option<BTreeMap<String, Binding>> {
    if values.is_empty() {
        return None;
    }
    Some(
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                (
                    (i + 1).to_string(),
                    Binding {
                        kind: "TEXT",
                        value: (*v).to_string(),
                    },
                )
            })
            .collect(),
    )
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    data: LoginData<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct LoginData<'a> {
    account_name: &'a str,
    login_name: &'a str,
    password: &'a str,
    client_app_id: &'a str,
    client_app_version: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    #[serde(default)]
    success: bool,
    message: Option<String>,
    data: Option<LoginResponseData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponseData {
    token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatementRequest<'a> {
    sql_text: &'a str,
    async_exec: bool,
    sequence_id: u64,
    query_submission_time: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    bindings: Option<BTreeMap<String, Binding>>,
}

#[derive(Debug, Serialize, PartialEq)]
struct Binding {
    #[serde(rename = "type")]
    kind: &'static str,
    value: String,
}

#[derive(Deserialize)]
struct StatementResponse {
    #[serde(default)]
    success: bool,
    message: Option<String>,
    code: Option<String>,
    data: Option<StatementData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatementData {
    rowtype: Option<Vec<ColumnType>>,
    #[serde(default)]
    rowset: Vec<Vec<Value>>,
    get_result_url: Option<String>,
    query_id: Option<String>,
}

#[derive(Deserialize)]
struct ColumnType {
    name: String,
}
