use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Enums
// =============================================================================

/// The response strategy a query is routed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryIntent {
    /// Text-to-SQL analytics against the warehouse.
    Structured,
    /// Free-form text generation.
    Generative,
    /// Summarization of the query text itself.
    Summarization,
    /// Semantic search over indexed documents (fallback).
    Search,
}

impl std::fmt::Display for QueryIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            QueryIntent::Structured => "structured",
            QueryIntent::Generative => "generative",
            QueryIntent::Summarization => "summarization",
            QueryIntent::Search => "search",
        };
        write!(f, "{}", s)
    }
}

// =============================================================================
// Semantic models
// =============================================================================

/// A named semantic model: a staged YAML file the text-to-SQL tool reasons over.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticModel {
    /// Short display name, e.g. `CC`.
    pub name: String,
    /// Stage file reference passed verbatim to the analytics tool.
    pub file: String,
}

impl SemanticModel {
    pub fn new(name: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
        }
    }

    /// The file name portion of the stage reference (after the last `/`).
    pub fn file_name(&self) -> &str {
        self.file.rsplit('/').next().unwrap_or(&self.file)
    }
}

// =============================================================================
// Stream events
// =============================================================================

/// One decoded server-sent event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SseEvent {
    /// Value of the `event:` field, if the record carried one.
    pub event: Option<String>,
    /// Decoded JSON payload of the `data:` field.
    pub data: Value,
}

impl SseEvent {
    pub fn new(event: Option<&str>, data: Value) -> Self {
        Self {
            event: event.map(str::to_string),
            data,
        }
    }

    /// Whether this event carries the given name.
    pub fn is(&self, name: &str) -> bool {
        self.event.as_deref() == Some(name)
    }
}

// =============================================================================
// Extraction
// =============================================================================

/// What the analytics agent produced for one query.
///
/// Only one of `sql` / `search_results` is populated, depending on which tool
/// the request selected.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    /// Generated SQL (trimmed; empty when none was produced).
    pub sql: String,
    /// Text of each search hit, in service order.
    pub search_results: Vec<String>,
    /// Set when the payload did not have the expected shape. Whatever was
    /// captured before the mismatch is still returned.
    pub warning: Option<String>,
}

impl Extraction {
    pub fn has_sql(&self) -> bool {
        !self.sql.is_empty()
    }

    pub fn has_results(&self) -> bool {
        !self.search_results.is_empty()
    }
}

// =============================================================================
// Tabular results
// =============================================================================

/// Rows returned by a warehouse statement.
///
/// Columns are whatever the statement declares; cell values are kept as raw
/// JSON (the warehouse returns most scalars as strings, NULL as `null`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TabularResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl TabularResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by name (case-insensitive).
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
    }

    /// Look up a cell by row index and column name.
    pub fn cell(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)
    }
}

/// Render a cell value for display: strings unquoted, `null` as `NULL`.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_intent_display() {
        assert_eq!(QueryIntent::Structured.to_string(), "structured");
        assert_eq!(QueryIntent::Generative.to_string(), "generative");
        assert_eq!(QueryIntent::Summarization.to_string(), "summarization");
        assert_eq!(QueryIntent::Search.to_string(), "search");
    }

    #[test]
    fn test_intent_serde_snake_case() {
        let json = serde_json::to_string(&QueryIntent::Summarization).unwrap();
        assert_eq!(json, "\"summarization\"");
        let back: QueryIntent = serde_json::from_str("\"generative\"").unwrap();
        assert_eq!(back, QueryIntent::Generative);
    }

    #[test]
    fn test_semantic_model_file_name() {
        let model = SemanticModel::new(
            "CC",
            r#"@"CORTEX_SEARCH_TUTORIAL_DB"."PUBLIC"."CC_STAGE"/Climate_Career_Final_SM_Draft.yaml"#,
        );
        assert_eq!(model.file_name(), "Climate_Career_Final_SM_Draft.yaml");
    }

    #[test]
    fn test_semantic_model_file_name_with_space() {
        let model = SemanticModel::new("CMP", r#"@"DB"."PUBLIC"."CMP_STAGE"/cmp 1 copy.yaml"#);
        assert_eq!(model.file_name(), "cmp 1 copy.yaml");
    }

    #[test]
    fn test_semantic_model_file_name_without_slash() {
        let model = SemanticModel::new("X", "model.yaml");
        assert_eq!(model.file_name(), "model.yaml");
    }

    #[test]
    fn test_sse_event_is() {
        let event = SseEvent::new(Some("message.delta"), json!({}));
        assert!(event.is("message.delta"));
        assert!(!event.is("done"));

        let unnamed = SseEvent::new(None, json!({}));
        assert!(!unnamed.is("message.delta"));
    }

    #[test]
    fn test_extraction_default_is_empty() {
        let ex = Extraction::default();
        assert!(!ex.has_sql());
        assert!(!ex.has_results());
        assert!(ex.warning.is_none());
    }

    #[test]
    fn test_tabular_cell_lookup_case_insensitive() {
        let table = TabularResult::new(
            vec!["COUNTY".to_string(), "TOTAL".to_string()],
            vec![
                vec![json!("Alameda"), json!("1200")],
                vec![json!("Marin"), Value::Null],
            ],
        );
        assert_eq!(table.row_count(), 2);
        assert!(!table.is_empty());
        assert_eq!(table.cell(0, "county"), Some(&json!("Alameda")));
        assert_eq!(table.cell(1, "Total"), Some(&Value::Null));
        assert_eq!(table.cell(2, "TOTAL"), None);
        assert_eq!(table.cell(0, "missing"), None);
    }

    #[test]
    fn test_tabular_empty() {
        let table = TabularResult::new(vec!["A".to_string()], vec![]);
        assert!(table.is_empty());
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&Value::Null), "NULL");
        assert_eq!(display_value(&json!("text")), "text");
        assert_eq!(display_value(&json!(42)), "42");
        assert_eq!(display_value(&json!(true)), "true");
    }
}
