//! What the dispatcher hands to a display surface.

use cortex_core::{QueryIntent, TabularResult};
use serde::Serialize;

pub const NO_SQL_GENERATED: &str = "no SQL generated";
pub const NO_DATA_FOUND: &str = "no data found";
pub const NO_SEARCH_RESULTS: &str = "no relevant search results found.";
pub const RESPONSE_FAILED: &str = "Failed to generate a response.";
pub const SUMMARY_FAILED: &str = "Failed to generate a summary.";
pub const EXPLANATION_UNAVAILABLE: &str = "Unable to generate a concise summary.";

/// Severity of a [`Block::Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

/// One renderable piece of a reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Block {
    Heading(String),
    Text(String),
    Code { language: String, source: String },
    Table(TabularResult),
    Notice { level: NoticeLevel, message: String },
}

/// Ordered blocks answering one query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Reply {
    /// How the query was routed; `None` until classified.
    pub intent: Option<QueryIntent>,
    pub blocks: Vec<Block>,
}

impl Reply {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn heading(&mut self, text: impl Into<String>) -> &mut Self {
        self.blocks.push(Block::Heading(text.into()));
        self
    }

    pub fn text(&mut self, text: impl Into<String>) -> &mut Self {
        self.blocks.push(Block::Text(text.into()));
        self
    }

    pub fn code(&mut self, language: &str, source: impl Into<String>) -> &mut Self {
        self.blocks.push(Block::Code {
            language: language.to_string(),
            source: source.into(),
        });
        self
    }

    pub fn table(&mut self, table: TabularResult) -> &mut Self {
        self.blocks.push(Block::Table(table));
        self
    }

    pub fn notice(&mut self, level: NoticeLevel, message: impl Into<String>) -> &mut Self {
        self.blocks.push(Block::Notice {
            level,
            message: message.into(),
        });
        self
    }

    pub fn success(&mut self, message: impl Into<String>) -> &mut Self {
        self.notice(NoticeLevel::Success, message)
    }

    pub fn warning(&mut self, message: impl Into<String>) -> &mut Self {
        self.notice(NoticeLevel::Warning, message)
    }

    pub fn error(&mut self, message: impl Into<String>) -> &mut Self {
        self.notice(NoticeLevel::Error, message)
    }

    /// Messages of all notices at `level`, in order.
    pub fn notices(&self, level: NoticeLevel) -> Vec<&str> {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                Block::Notice { level: l, message } if *l == level => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn warnings(&self) -> Vec<&str> {
        self.notices(NoticeLevel::Warning)
    }

    pub fn errors(&self) -> Vec<&str> {
        self.notices(NoticeLevel::Error)
    }

    pub fn headings(&self) -> Vec<&str> {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                Block::Heading(h) => Some(h.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_keeps_order() {
        let mut reply = Reply::new();
        reply
            .heading("Summary")
            .text("body")
            .warning(NO_DATA_FOUND)
            .error("boom");

        assert_eq!(reply.blocks.len(), 4);
        assert_eq!(reply.headings(), vec!["Summary"]);
        assert_eq!(reply.warnings(), vec!["no data found"]);
        assert_eq!(reply.errors(), vec!["boom"]);
        assert!(reply.notices(NoticeLevel::Success).is_empty());
    }

    #[test]
    fn test_empty_reply() {
        assert!(Reply::new().is_empty());
    }

    #[test]
    fn test_block_serialization() {
        let mut reply = Reply::new();
        reply.code("sql", "SELECT 1").success("Key Insight: done");
        let value = serde_json::to_value(&reply).unwrap();
        assert_eq!(
            value["blocks"][0],
            json!({"kind": "code", "value": {"language": "sql", "source": "SELECT 1"}})
        );
        assert_eq!(
            value["blocks"][1],
            json!({"kind": "notice", "value": {"level": "success", "message": "Key Insight: done"}})
        );
    }
}
