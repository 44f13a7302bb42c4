//! Server-sent-events body parser.
//!
//! The agent endpoint answers with a complete `text/event-stream` body. Each
//! record is an optional `event:` line followed by a `data:` line holding one
//! JSON document. A `data: [DONE]` line closes the stream.

use cortex_core::SseEvent;
use serde_json::Value;

/// Sentinel payload marking the end of the stream.
const DONE_MARKER: &str = "[DONE]";

/// A `data:` line whose payload was not valid JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedLine {
    /// 1-based line number within the body.
    pub line_number: usize,
    /// The raw payload after `data:`.
    pub data: String,
    /// Decoder error message.
    pub reason: String,
}

impl std::fmt::Display for MalformedLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Failed to parse SSE data on line {}: {} - Data: {}",
            self.line_number, self.reason, self.data
        )
    }
}

/// Parsed events plus any lines that were skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SseStream {
    pub events: Vec<SseEvent>,
    pub malformed: Vec<MalformedLine>,
}

impl SseStream {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Parse an event-stream body into events, in order received.
///
/// Never fails: malformed `data:` lines are collected in
/// [`SseStream::malformed`] and skipped. The pending event name survives a
/// malformed line, so the next good `data:` line still picks it up.
pub fn parse_sse(raw: &str) -> SseStream {
    let mut stream = SseStream::default();
    let mut pending_name: Option<String> = None;

    for (idx, line) in raw.lines().enumerate() {
        if let Some(rest) = line.strip_prefix("event:") {
            pending_name = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("data:") {
            let payload = rest.trim();
            if payload == DONE_MARKER {
                pending_name = None;
                continue;
            }
            match serde_json::from_str::<Value>(payload) {
                Ok(data) => stream.events.push(SseEvent {
                    event: pending_name.take(),
                    data,
                }),
                Err(e) => {
                    let malformed = MalformedLine {
                        line_number: idx + 1,
                        data: payload.to_string(),
                        reason: e.to_string(),
                    };
                    tracing::warn!(line = malformed.line_number, error = %e, "Skipping malformed SSE data");
                    stream.malformed.push(malformed);
                }
            }
        }
        // id:, retry:, comments and blank separators carry nothing we use.
    }

    stream
}

/// Parse an optional body; `None` yields an empty stream.
pub fn parse_sse_opt(raw: Option<&str>) -> SseStream {
    raw.map(parse_sse).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_input_yields_no_events() {
        let stream = parse_sse("");
        assert!(stream.is_empty());
        assert!(stream.malformed.is_empty());
    }

    #[test]
    fn test_absent_input_yields_no_events() {
        let stream = parse_sse_opt(None);
        assert!(stream.events.is_empty());
        assert!(stream.malformed.is_empty());
    }

    #[test]
    fn test_whitespace_only_input() {
        assert!(parse_sse("   \n\n  ").is_empty());
    }

    #[test]
    fn test_single_event_then_done() {
        let raw = "event: message.delta\ndata: {\"id\": 1}\n\ndata: [DONE]\n";
        let stream = parse_sse(raw);
        assert_eq!(stream.events.len(), 1);
        assert_eq!(stream.events[0].event.as_deref(), Some("message.delta"));
        assert_eq!(stream.events[0].data, json!({"id": 1}));
        assert!(stream.malformed.is_empty());
    }

    #[test]
    fn test_malformed_line_between_good_ones() {
        let raw = concat!(
            "event: a\n",
            "data: {\"n\": 1}\n",
            "\n",
            "event: b\n",
            "data: {not json\n",
            "\n",
            "event: c\n",
            "data: {\"n\": 3}\n",
        );
        let stream = parse_sse(raw);
        assert_eq!(stream.events.len(), 2);
        assert_eq!(stream.events[0].data, json!({"n": 1}));
        assert_eq!(stream.events[1].event.as_deref(), Some("c"));
        assert_eq!(stream.malformed.len(), 1);
        assert_eq!(stream.malformed[0].line_number, 5);
        assert_eq!(stream.malformed[0].data, "{not json");
    }

    #[test]
    fn test_malformed_line_keeps_pending_name() {
        let raw = "event: message.delta\ndata: oops\ndata: {\"ok\": true}\n";
        let stream = parse_sse(raw);
        assert_eq!(stream.events.len(), 1);
        assert_eq!(stream.events[0].event.as_deref(), Some("message.delta"));
    }

    #[test]
    fn test_done_discards_pending_name() {
        let raw = "event: done\ndata: [DONE]\ndata: {\"late\": 1}\n";
        let stream = parse_sse(raw);
        assert_eq!(stream.events.len(), 1);
        assert_eq!(stream.events[0].event, None);
    }

    #[test]
    fn test_data_without_event_name() {
        let stream = parse_sse("data: [1, 2, 3]");
        assert_eq!(stream.events.len(), 1);
        assert_eq!(stream.events[0].event, None);
        assert_eq!(stream.events[0].data, json!([1, 2, 3]));
    }

    #[test]
    fn test_data_without_space_after_colon() {
        let stream = parse_sse("event:x\ndata:{\"a\":1}");
        assert_eq!(stream.events.len(), 1);
        assert_eq!(stream.events[0].event.as_deref(), Some("x"));
    }

    #[test]
    fn test_crlf_line_endings() {
        let raw = "event: message.delta\r\ndata: {\"a\": 1}\r\n\r\ndata: [DONE]\r\n";
        let stream = parse_sse(raw);
        assert_eq!(stream.events.len(), 1);
        assert_eq!(stream.events[0].event.as_deref(), Some("message.delta"));
    }

    #[test]
    fn test_ignores_id_retry_and_comments() {
        let raw = ": keep-alive\nid: 7\nretry: 1000\nevent: e\ndata: {}\n";
        let stream = parse_sse(raw);
        assert_eq!(stream.events.len(), 1);
        assert_eq!(stream.events[0].data, json!({}));
    }

    #[test]
    fn test_second_event_line_overrides_first() {
        let stream = parse_sse("event: first\nevent: second\ndata: 1");
        assert_eq!(stream.events[0].event.as_deref(), Some("second"));
    }

    #[test]
    fn test_events_preserve_order() {
        let raw = (0..5)
            .map(|i| format!("event: e{}\ndata: {{\"i\": {}}}\n", i, i))
            .collect::<String>();
        let stream = parse_sse(&raw);
        let names: Vec<_> = stream
            .events
            .iter()
            .map(|e| e.event.clone().unwrap())
            .collect();
        assert_eq!(names, vec!["e0", "e1", "e2", "e3", "e4"]);
    }

    #[test]
    fn test_only_malformed_lines() {
        let stream = parse_sse("data: nope\ndata: still nope");
        assert!(stream.events.is_empty());
        assert_eq!(stream.malformed.len(), 2);
    }

    #[test]
    fn test_malformed_line_display() {
        let stream = parse_sse("data: {bad");
        let msg = stream.malformed[0].to_string();
        assert!(msg.starts_with("Failed to parse SSE data on line 1"));
        assert!(msg.ends_with("Data: {bad"));
    }
}
