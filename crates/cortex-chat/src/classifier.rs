//! Keyword-based intent classification.
//!
//! Each intent owns a list of case-insensitive, word-bounded patterns. Rules
//! are checked in policy order and the first match wins; a query matching no
//! rule falls back to search.

use std::sync::LazyLock;

use cortex_core::QueryIntent;
use regex::Regex;

/// Maps a query to the strategy that should answer it.
pub trait IntentClassifier: Send + Sync {
    fn classify(&self, query: &str) -> QueryIntent;
}

/// One entry of the classification policy.
#[derive(Debug, Clone)]
pub struct PolicyRule {
    pub intent: QueryIntent,
    pub patterns: Vec<Regex>,
}

impl PolicyRule {
    pub fn matches(&self, query: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(query))
    }
}

// Compiled once, reused across calls.
static DEFAULT_POLICY: LazyLock<Vec<PolicyRule>> = LazyLock::new(|| {
    let mk = |intent: QueryIntent, pats: &[&str]| PolicyRule {
        intent,
        patterns: pats
            .iter()
            .map(|p| Regex::new(p).expect("Invalid intent regex"))
            .collect(),
    };

    vec![
        // Generative first, so "create a report of total sales" is not SQL
        mk(
            QueryIntent::Generative,
            &[r"(?i)\b(generate|write|create|describe|explain)\b"],
        ),
        mk(
            QueryIntent::Summarization,
            &[r"(?i)\b(summarize|summary|condense)\b"],
        ),
        mk(
            QueryIntent::Structured,
            &[
                r"(?i)\b(select|from|where|group by|order by|join|sum|count|avg|max|min)\b",
                r"(?i)\b(total|revenue|sales|profit|projects|county|jurisdiction|month|year|energy savings)\b",
            ],
        ),
    ]
});

/// Default [`IntentClassifier`] driven by an ordered [`PolicyRule`] table.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    policy: Vec<PolicyRule>,
}

impl KeywordClassifier {
    /// Classifier with the built-in policy:
    /// generative, summarization, structured, then search.
    pub fn new() -> Self {
        Self {
            policy: DEFAULT_POLICY.clone(),
        }
    }

    /// Classifier with a custom ordered policy.
    pub fn with_policy(policy: Vec<PolicyRule>) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &[PolicyRule] {
        &self.policy
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentClassifier for KeywordClassifier {
    fn classify(&self, query: &str) -> QueryIntent {
        self.policy
            .iter()
            .find(|rule| rule.matches(query))
            .map(|rule| rule.intent)
            .unwrap_or(QueryIntent::Search)
    }
}
