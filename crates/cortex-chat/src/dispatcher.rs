//! Query dispatcher: classify, call the remote collaborators, build a reply.
//!
//! Every remote failure along the way becomes a notice in the reply; only
//! input validation and state-machine misuse are returned as errors.

use std::sync::{Mutex, PoisonError};

use cortex_client::{
    extract, AgentClient, AgentService, CortexFunctions, QueryExecutor, RemoteError, Session,
    SqlRunner, TextFunctions, ToolChoice,
};
use cortex_core::{display_value, Extraction, QueryIntent, TabularResult};
use tracing::{debug, warn};

use crate::classifier::{IntentClassifier, KeywordClassifier};
use crate::error::ChatError;
use crate::reply::{
    Reply, EXPLANATION_UNAVAILABLE, NO_DATA_FOUND, NO_SEARCH_RESULTS, NO_SQL_GENERATED,
    RESPONSE_FAILED, SUMMARY_FAILED,
};
use crate::state::{validate_transition, DispatchState};
use crate::summarizer::SentenceSummarizer;

/// Maximum query length in characters.
pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// Routes one query at a time to the strategy its intent calls for.
pub struct Dispatcher {
    classifier: Box<dyn IntentClassifier>,
    agent: Box<dyn AgentService>,
    sql: Box<dyn SqlRunner>,
    text: Box<dyn TextFunctions>,
    fallback: SentenceSummarizer,
    state: Mutex<DispatchState>,
}

impl Dispatcher {
    pub fn new(
        classifier: Box<dyn IntentClassifier>,
        agent: Box<dyn AgentService>,
        sql: Box<dyn SqlRunner>,
        text: Box<dyn TextFunctions>,
    ) -> Self {
        Self {
            classifier,
            agent,
            sql,
            text,
            fallback: SentenceSummarizer::default(),
            state: Mutex::new(DispatchState::Idle),
        }
    }

    /// Dispatcher wired to the keyword classifier and the HTTP clients.
    pub fn remote() -> Self {
        Self::new(
            Box::new(KeywordClassifier::new()),
            Box::new(AgentClient::new()),
            Box::new(QueryExecutor::new()),
            Box::new(CortexFunctions::new()),
        )
    }

    /// Current state; anything but `Idle` means a query is in flight.
    pub fn state(&self) -> DispatchState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn classify(&self, query: &str) -> QueryIntent {
        self.classifier.classify(query)
    }

    /// Answer `query`.
    pub async fn handle(&self, session: &Session, query: &str) -> Result<Reply, ChatError> {
        if query.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if query.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(ChatError::MessageTooLong(MAX_MESSAGE_LENGTH));
        }

        self.advance(DispatchState::Classifying)?;
        let intent = self.classifier.classify(query);
        debug!(%intent, "Query classified");

        let mut reply = Reply {
            intent: Some(intent),
            ..Reply::default()
        };
        let result = match intent {
            QueryIntent::Generative => self.generate(session, query, &mut reply).await,
            QueryIntent::Summarization => self.summarize(session, query, &mut reply).await,
            QueryIntent::Structured => self.analyze(session, query, &mut reply).await,
            QueryIntent::Search => self.search(session, query, &mut reply).await,
        };
        self.reset();

        result.map(|()| reply)
    }

    fn advance(&self, to: DispatchState) -> Result<(), ChatError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        validate_transition(*state, to)?;
        *state = to;
        Ok(())
    }

    fn reset(&self) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = DispatchState::Idle;
    }

    // -----------------------------------------------------------------
    // Strategies
    // -----------------------------------------------------------------

    async fn generate(
        &self,
        session: &Session,
        query: &str,
        reply: &mut Reply,
    ) -> Result<(), ChatError> {
        self.advance(DispatchState::AwaitingRemote)?;
        let model = &session.config().llm.completion_model;
        let result = self.text.complete(session, query, model).await;
        self.advance(DispatchState::Rendering)?;

        match non_empty(result) {
            Ok(Some(text)) => {
                reply.heading("Generated Response").text(text);
            }
            Ok(None) => {
                reply.warning(RESPONSE_FAILED);
            }
            Err(e) => {
                warn!(error = %e, "Completion failed");
                reply
                    .error(format!("COMPLETE Function Error: {}", e))
                    .warning(RESPONSE_FAILED);
            }
        }
        Ok(())
    }

    async fn summarize(
        &self,
        session: &Session,
        query: &str,
        reply: &mut Reply,
    ) -> Result<(), ChatError> {
        self.advance(DispatchState::AwaitingRemote)?;
        let result = self.text.summarize(session, query).await;
        self.advance(DispatchState::Rendering)?;

        match non_empty(result) {
            Ok(Some(summary)) => {
                reply.heading("Summary").text(summary);
            }
            Ok(None) => {
                reply.warning(SUMMARY_FAILED);
            }
            Err(e) => {
                warn!(error = %e, "Summarization failed");
                reply
                    .error(format!("SUMMARIZE Function Error: {}", e))
                    .warning(SUMMARY_FAILED);
            }
        }
        Ok(())
    }

    async fn analyze(
        &self,
        session: &Session,
        query: &str,
        reply: &mut Reply,
    ) -> Result<(), ChatError> {
        self.advance(DispatchState::AwaitingRemote)?;
        let extraction = self
            .ask_agent(session, query, ToolChoice::Analyst, reply)
            .await;

        if !extraction.has_sql() {
            self.advance(DispatchState::Rendering)?;
            reply.warning(NO_SQL_GENERATED);
            return Ok(());
        }
        let sql = extraction.sql;

        self.advance(DispatchState::AwaitingRemote)?;
        let table = match self.sql.execute(session, &sql).await {
            Ok(table) if !table.is_empty() => table,
            Ok(_) => {
                self.advance(DispatchState::Rendering)?;
                reply.warning(NO_DATA_FOUND);
                return Ok(());
            }
            Err(e) => {
                self.advance(DispatchState::Rendering)?;
                reply
                    .error(format!("SQL Execution Error: {}", e))
                    .warning(NO_DATA_FOUND);
                return Ok(());
            }
        };
        debug!(rows = table.row_count(), "Query returned rows");

        let explanation = self.explain(session, &sql, &table, reply).await;
        self.advance(DispatchState::Rendering)?;
        reply
            .heading("Generated SQL Query")
            .code("sql", sql)
            .heading("Summary of Query Results")
            .text(explanation)
            .heading(format!("Query Results ({} rows)", table.row_count()))
            .table(table);
        Ok(())
    }

    async fn search(
        &self,
        session: &Session,
        query: &str,
        reply: &mut Reply,
    ) -> Result<(), ChatError> {
        self.advance(DispatchState::AwaitingRemote)?;
        let extraction = self
            .ask_agent(session, query, ToolChoice::Search, reply)
            .await;

        let Some(raw) = extraction.search_results.first() else {
            self.advance(DispatchState::Rendering)?;
            reply.warning(NO_SEARCH_RESULTS);
            return Ok(());
        };

        self.advance(DispatchState::AwaitingRemote)?;
        let result = self.text.summarize(session, raw).await;
        self.advance(DispatchState::Rendering)?;

        match non_empty(result) {
            Ok(Some(summary)) => {
                let insight = key_insight(&summary).to_string();
                reply
                    .heading("Here is the Answer to your query")
                    .text(summary)
                    .success(format!("Key Insight: {}", insight));
            }
            other => {
                if let Err(e) = other {
                    warn!(error = %e, "Summarizing search result failed, using local summary");
                    reply.error(format!("SUMMARIZE Function Error: {}", e));
                }
                reply
                    .heading("Key Information (Unsummarized)")
                    .text(self.fallback.summarize(raw));
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------
    // Steps
    // -----------------------------------------------------------------

    /// Call the agent and extract its tool output. Failures are reported in
    /// `reply` and yield an empty extraction.
    async fn ask_agent(
        &self,
        session: &Session,
        query: &str,
        tool: ToolChoice,
        reply: &mut Reply,
    ) -> Extraction {
        match self.agent.invoke(session, query, tool).await {
            Ok(agent_reply) => {
                if session.debug() {
                    echo_raw(reply, agent_reply.status, &agent_reply.body);
                }
                for line in &agent_reply.stream.malformed {
                    reply.error(line.to_string());
                }
                let extraction = extract(&agent_reply.stream.events, tool);
                if let Some(ref warning) = extraction.warning {
                    reply.error(warning.clone());
                }
                debug!(
                    ?tool,
                    has_sql = extraction.has_sql(),
                    results = extraction.search_results.len(),
                    "Agent output extracted"
                );
                extraction
            }
            Err(e) => {
                if let (true, RemoteError::Http { status, body }) = (session.debug(), &e) {
                    echo_raw(reply, *status, body);
                }
                warn!(error = %e, ?tool, "Agent request failed");
                reply.error(format!("API Request Failed: {}", e));
                Extraction::default()
            }
        }
    }

    /// Short plain-language explanation of `table`, or a fixed fallback.
    async fn explain(
        &self,
        session: &Session,
        sql: &str,
        table: &TabularResult,
        reply: &mut Reply,
    ) -> String {
        let llm = &session.config().llm;
        let prompt = explanation_prompt(sql, table);
        match non_empty(self.text.complete(session, &prompt, &llm.completion_model).await) {
            Ok(Some(summary)) => first_lines(&summary, llm.summary_lines),
            Ok(None) => EXPLANATION_UNAVAILABLE.to_string(),
            Err(e) => {
                warn!(error = %e, "Explanatory summary failed");
                reply.error(format!("COMPLETE Function Error: {}", e));
                EXPLANATION_UNAVAILABLE.to_string()
            }
        }
    }
}

fn echo_raw(reply: &mut Reply, status: u16, body: &str) {
    reply
        .text(format!("API Response Status: {}", status))
        .text(format!("API Raw Response: {}", body));
}

/// Treat a blank remote answer the same as no answer.
fn non_empty(result: Result<String, RemoteError>) -> Result<Option<String>, RemoteError> {
    result.map(|s| if s.trim().is_empty() { None } else { Some(s) })
}

/// Prompt asking for a non-technical summary of query results.
pub fn explanation_prompt(sql: &str, table: &TabularResult) -> String {
    let rows = table
        .rows
        .iter()
        .map(|row| {
            table
                .columns
                .iter()
                .zip(row)
                .map(|(col, value)| format!("{}={}", col, display_value(value)))
                .collect::<Vec<_>>()
                .join(", ")
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Provide a brief, 5-6 line non-technical summary of this result: {} based on SQL query: {}.",
        rows, sql
    )
}

fn first_lines(text: &str, n: usize) -> String {
    text.split('\n').take(n).collect::<Vec<_>>().join("\n")
}

/// The second-to-last `.`-separated segment of `summary`, trimmed, or the
/// whole summary when it has no `.`.
pub fn key_insight(summary: &str) -> &str {
    let parts: Vec<&str> = summary.split('.').collect();
    if parts.len() >= 2 {
        parts[parts.len() - 2].trim()
    } else {
        summary.trim()
    }
}
