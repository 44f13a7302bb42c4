//! Pull generated SQL or search hits out of agent events.
//!
//! The agent reports tool output inside `message.delta` events:
//!
//! ```text
//! data.delta.content[*]            { type: "tool_results", tool_results: {...} }
//!   tool_results.content[*]        { type: "json", json: { sql | searchResults } }
//! ```

use cortex_core::{Extraction, SseEvent};
use serde_json::{Map, Value};

use crate::agent::ToolChoice;

/// Name of the events that carry tool output.
pub const MESSAGE_DELTA: &str = "message.delta";

/// Walk `events` and capture the SQL (for [`ToolChoice::Analyst`]) or the
/// search-hit texts (for [`ToolChoice::Search`]). Later captures replace
/// earlier ones.
///
/// A payload with an unexpected shape stops the walk; the result captured up
/// to that point is returned with [`Extraction::warning`] set.
pub fn extract(events: &[SseEvent], tool: ToolChoice) -> Extraction {
    let mut out = Extraction::default();
    if let Err(reason) = walk(events, tool, &mut out) {
        tracing::warn!(%reason, "Error processing agent response");
        out.warning = Some(format!("Error Processing Response: {}", reason));
    }
    out.sql = out.sql.trim().to_string();
    out
}

fn walk(events: &[SseEvent], tool: ToolChoice, out: &mut Extraction) -> Result<(), String> {
    for event in events.iter().filter(|e| e.is(MESSAGE_DELTA)) {
        let data = as_object(&event.data, "event data")?;
        let content = match data.get("delta") {
            Some(delta) => match as_object(delta, "delta")?.get("content") {
                Some(content) => as_array(content, "delta.content")?,
                None => continue,
            },
            None => continue,
        };

        for item in content {
            let item = as_object(item, "content item")?;
            if item.get("type").and_then(Value::as_str) != Some("tool_results") {
                continue;
            }
            let tool_results = match item.get("tool_results") {
                Some(tr) => as_object(tr, "tool_results")?,
                None => continue,
            };
            let Some(results) = tool_results.get("content") else {
                continue;
            };

            for result in as_array(results, "tool_results.content")? {
                let result = as_object(result, "tool result")?;
                if result.get("type").and_then(Value::as_str) != Some("json") {
                    continue;
                }
                let Some(payload) = result.get("json") else {
                    continue;
                };
                let payload = as_object(payload, "json payload")?;
                capture(payload, tool, out)?;
            }
        }
    }
    Ok(())
}

fn capture(payload: &Map<String, Value>, tool: ToolChoice, out: &mut Extraction) -> Result<(), String> {
    match tool {
        ToolChoice::Analyst => {
            if let Some(sql) = payload.get("sql") {
                out.sql = sql
                    .as_str()
                    .ok_or_else(|| "sql is not a string".to_string())?
                    .to_string();
            }
        }
        ToolChoice::Search => {
            if let Some(hits) = payload.get("searchResults") {
                // Build the full list before replacing the previous capture.
                let texts = as_array(hits, "searchResults")?
                    .iter()
                    .map(|hit| {
                        hit.get("text")
                            .and_then(Value::as_str)
                            .map(str::to_string)
                            .ok_or_else(|| "search result has no text".to_string())
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                out.search_results = texts;
            }
        }
    }
    Ok(())
}

fn as_object<'a>(value: &'a Value, what: &str) -> Result<&'a Map<String, Value>, String> {
    value
        .as_object()
        .ok_or_else(|| format!("{} is not an object", what))
}

fn as_array<'a>(value: &'a Value, what: &str) -> Result<&'a Vec<Value>, String> {
    value
        .as_array()
        .ok_or_else(|| format!("{} is not an array", what))
}
