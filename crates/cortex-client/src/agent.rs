//! Client for the Cortex agent endpoint.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::RemoteError;
use crate::session::Session;
use crate::sse::{parse_sse, SseStream};

const ANALYST_TOOL: &str = "cortex_analyst_text_to_sql";
const ANALYST_NAME: &str = "analyst1";
const SEARCH_TOOL: &str = "cortex_search";
const SEARCH_NAME: &str = "search1";

/// Which single tool the agent may use for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolChoice {
    /// Text-to-SQL over the session's semantic model.
    Analyst,
    /// Semantic search over the configured search service.
    Search,
}

impl ToolChoice {
    pub fn for_structured(structured: bool) -> Self {
        if structured {
            ToolChoice::Analyst
        } else {
            ToolChoice::Search
        }
    }
}

/// A successful agent response: the raw exchange plus the parsed events.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentReply {
    pub status: u16,
    pub body: String,
    pub stream: SseStream,
}

/// Remote analytics agent.
#[async_trait]
pub trait AgentService: Send + Sync {
    /// Ask the agent `query`, allowing only `tool`.
    async fn invoke(
        &self,
        session: &Session,
        query: &str,
        tool: ToolChoice,
    ) -> Result<AgentReply, RemoteError>;
}

/// HTTP implementation of [`AgentService`].
#[derive(Debug, Default, Clone, Copy)]
pub struct AgentClient;

impl AgentClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AgentService for AgentClient {
    async fn invoke(
        &self,
        session: &Session,
        query: &str,
        tool: ToolChoice,
    ) -> Result<AgentReply, RemoteError> {
        let auth = session.auth_header()?;
        let agent = &session.config().agent;
        let url = format!("{}{}", session.base_url(), agent.endpoint);
        let payload = build_request(session, query, tool);

        debug!(?tool, model = %agent.model, "Invoking agent");
        let response = session
            .client()
            .post(&url)
            .header("Authorization", auth)
            .header("Content-Type", "application/json")
            .timeout(Duration::from_secs(agent.timeout_secs))
            .json(&payload)
            .send()
            .await
            .map_err(|e| RemoteError::from_reqwest(e, agent.timeout_secs))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| RemoteError::from_reqwest(e, agent.timeout_secs))?;

        if status >= 400 {
            warn!(status, "Agent request failed");
            return Err(RemoteError::Http { status, body });
        }
        if body.trim().is_empty() {
            warn!(status, "Agent returned an empty body");
            return Err(RemoteError::EmptyBody);
        }

        let stream = parse_sse(&body);
        debug!(
            events = stream.events.len(),
            malformed = stream.malformed.len(),
            "Agent response parsed"
        );
        Ok(AgentReply {
            status,
            body,
            stream,
        })
    }
}

#[derive(Debug, Serialize)]
struct AgentRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    tools: Vec<Tool>,
    tool_resources: BTreeMap<&'static str, ToolResource<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: Vec<TextContent<'a>>,
}

#[derive(Debug, Serialize)]
struct TextContent<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct Tool {
    tool_spec: ToolSpec,
}

#[derive(Debug, Serialize)]
struct ToolSpec {
    #[serde(rename = "type")]
    kind: &'static str,
    name: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ToolResource<'a> {
    Analyst {
        semantic_model_file: &'a str,
    },
    Search {
        name: &'a str,
        max_results: u32,
    },
}

fn build_request<'a>(session: &'a Session, query: &'a str, tool: ToolChoice) -> AgentRequest<'a> {
    let agent = &session.config().agent;
    let (spec, name, resource) = match tool {
        ToolChoice::Analyst => (
            ANALYST_TOOL,
            ANALYST_NAME,
            ToolResource::Analyst {
                semantic_model_file: &session.semantic_model().file,
            },
        ),
        ToolChoice::Search => (
            SEARCH_TOOL,
            SEARCH_NAME,
            ToolResource::Search {
                name: &agent.search_service,
                max_results: agent.max_results,
            },
        ),
    };

    AgentRequest {
        model: &agent.model,
        messages: vec![Message {
            role: "user",
            content: vec![TextContent {
                kind: "text",
                text: query,
            }],
        }],
        tools: vec![Tool {
            tool_spec: ToolSpec { kind: spec, name },
        }],
        tool_resources: BTreeMap::from([(name, resource)]),
    }
}
