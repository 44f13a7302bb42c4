//! Cortex LLM functions invoked through SQL.

use async_trait::async_trait;
use cortex_core::{display_value, TabularResult};
use tracing::{debug, warn};

use crate::error::RemoteError;
use crate::escape::quote_literal;
use crate::session::Session;

const RESPONSE_COLUMN: &str = "RESPONSE";
const SUMMARY_COLUMN: &str = "SUMMARY";

/// Free-form completion and summarization.
#[async_trait]
pub trait TextFunctions: Send + Sync {
    /// Generate text for `prompt` with `model`.
    async fn complete(
        &self,
        session: &Session,
        prompt: &str,
        model: &str,
    ) -> Result<String, RemoteError>;

    /// Summarize `text`.
    async fn summarize(&self, session: &Session, text: &str) -> Result<String, RemoteError>;
}

/// [`TextFunctions`] backed by `SNOWFLAKE.CORTEX.COMPLETE` and
/// `SNOWFLAKE.CORTEX.SUMMARIZE`.
#[derive(Debug, Default, Clone, Copy)]
pub struct CortexFunctions;

impl CortexFunctions {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextFunctions for CortexFunctions {
    async fn complete(
        &self,
        session: &Session,
        prompt: &str,
        model: &str,
    ) -> Result<String, RemoteError> {
        debug!(model, prompt_len = prompt.len(), "Calling COMPLETE");
        let table = if session.config().llm.bind_parameters {
            session
                .run_statement(&complete_sql(None), &[model, prompt])
                .await
        } else {
            session
                .run_statement(&complete_sql(Some((model, prompt))), &[])
                .await
        }
        .inspect_err(|e| warn!(error = %e, "COMPLETE failed"))?;
        first_value(&table, RESPONSE_COLUMN)
    }

    async fn summarize(&self, session: &Session, text: &str) -> Result<String, RemoteError> {
        debug!(text_len = text.len(), "Calling SUMMARIZE");
        let table = if session.config().llm.bind_parameters {
            session.run_statement(&summarize_sql(None), &[text]).await
        } else {
            session.run_statement(&summarize_sql(Some(text)), &[]).await
        }
        .inspect_err(|e| warn!(error = %e, "SUMMARIZE failed"))?;
        first_value(&table, SUMMARY_COLUMN)
    }
}

/// `inline` carries the model and prompt to embed as literals; `None` uses
/// placeholders.
fn complete_sql(inline: Option<(&str, &str)>) -> String {
    match inline {
        Some((model, prompt)) => format!(
            "SELECT SNOWFLAKE.CORTEX.COMPLETE({}, {}) AS {}",
            quote_literal(model),
            quote_literal(prompt),
            RESPONSE_COLUMN
        ),
        None => format!("SELECT SNOWFLAKE.CORTEX.COMPLETE(?, ?) AS {}", RESPONSE_COLUMN),
    }
}

fn summarize_sql(inline: Option<&str>) -> String {
    match inline {
        Some(text) => format!(
            "SELECT SNOWFLAKE.CORTEX.SUMMARIZE({}) AS {}",
            quote_literal(text),
            SUMMARY_COLUMN
        ),
        None => format!("SELECT SNOWFLAKE.CORTEX.SUMMARIZE(?) AS {}", SUMMARY_COLUMN),
    }
}

fn first_value(table: &TabularResult, column: &str) -> Result<String, RemoteError> {
    if table.column_index(column).is_none() {
        return Err(RemoteError::MissingColumn(column.to_string()));
    }
    match table.cell(0, column) {
        Some(value) if !value.is_null() => Ok(display_value(value)),
        _ => Err(RemoteError::Statement(format!("{} returned no value", column))),
    }
}
