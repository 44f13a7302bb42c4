//! Local fallback summarizer.
//!
//! Used when the remote SUMMARIZE call fails: the raw text is cut into
//! sentences and the leading ones are shown as bullet points.

/// Default number of sentences kept.
pub const DEFAULT_MAX_SENTENCES: usize = 6;

/// Extractive summarizer that keeps the first few sentences.
#[derive(Debug, Clone)]
pub struct SentenceSummarizer {
    max_sentences: usize,
}

impl SentenceSummarizer {
    pub fn new(max_sentences: usize) -> Self {
        Self { max_sentences }
    }

    /// Render the first `max_sentences` sentences of `text`, one per line,
    /// each prefixed with `• `.
    pub fn summarize(&self, text: &str) -> String {
        split_sentences(text)
            .into_iter()
            .take(self.max_sentences)
            .map(|s| format!("• {}", s.trim()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for SentenceSummarizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SENTENCES)
    }
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Split `text` at single whitespace characters that follow a `.` or `"`.
///
/// No split happens after an initialism like `e.g.` (word, dot, word, any)
/// or after a short title like `Mr.` (upper, lower, dot). The whitespace at a
/// split point is dropped; all other text is kept.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut pieces = Vec::new();
    let mut start = 0;

    for (i, &(pos, c)) in chars.iter().enumerate() {
        if i == 0 || !c.is_whitespace() {
            continue;
        }
        let prev = chars[i - 1].1;
        if prev != '.' && prev != '"' {
            continue;
        }
        if i >= 4 && is_word(chars[i - 4].1) && chars[i - 3].1 == '.' && is_word(chars[i - 2].1) {
            continue;
        }
        if i >= 3
            && chars[i - 3].1.is_ascii_uppercase()
            && chars[i - 2].1.is_ascii_lowercase()
            && prev == '.'
        {
            continue;
        }
        pieces.push(&text[start..pos]);
        start = pos + c.len_utf8();
    }

    pieces.push(&text[start..]);
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_simple() {
        assert_eq!(
            split_sentences("One fact. Two facts. Three facts."),
            vec!["One fact.", "Two facts.", "Three facts."]
        );
    }

    #[test]
    fn test_split_keeps_title_abbreviation() {
        assert_eq!(
            split_sentences("Mr. Smith went home. He left early."),
            vec!["Mr. Smith went home.", "He left early."]
        );
    }

    #[test]
    fn test_split_keeps_initialism() {
        assert_eq!(
            split_sentences("Use rebates, e.g. heat pumps. Apply online."),
            vec!["Use rebates, e.g. heat pumps.", "Apply online."]
        );
    }

    #[test]
    fn test_split_after_quote_mark() {
        assert_eq!(
            split_sentences(r#"The motto is "save more" today."#),
            vec![r#"The motto is "save more""#, "today."]
        );
    }

    #[test]
    fn test_split_ignores_question_mark() {
        assert_eq!(
            split_sentences("Is it open? Yes. It is."),
            vec!["Is it open? Yes.", "It is."]
        );
    }

    #[test]
    fn test_split_no_terminator() {
        assert_eq!(split_sentences("no full stop here"), vec!["no full stop here"]);
    }

    #[test]
    fn test_split_empty() {
        assert_eq!(split_sentences(""), vec![""]);
    }

    #[test]
    fn test_split_newline_is_whitespace() {
        assert_eq!(
            split_sentences("First line.\nSecond line."),
            vec!["First line.", "Second line."]
        );
    }

    #[test]
    fn test_summarize_ten_sentences_keeps_six() {
        let text = (1..=10)
            .map(|i| format!("Sentence number {} is here.", i))
            .collect::<Vec<_>>()
            .join(" ");
        let summary = SentenceSummarizer::default().summarize(&text);
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines.iter().all(|l| l.starts_with("• ")));
        assert_eq!(lines[0], "• Sentence number 1 is here.");
        assert_eq!(lines[5], "• Sentence number 6 is here.");
    }

    #[test]
    fn test_summarize_fewer_sentences_than_limit() {
        let summary = SentenceSummarizer::default().summarize("Only one sentence here.");
        assert_eq!(summary, "• Only one sentence here.");
    }

    #[test]
    fn test_summarize_custom_limit() {
        let summary = SentenceSummarizer::new(2).summarize("A one. B two. C three.");
        assert_eq!(summary, "• A one.\n• B two.");
    }

    #[test]
    fn test_summarize_trims_pieces() {
        let summary = SentenceSummarizer::default().summarize("  Leading space.  Double gap.");
        assert_eq!(summary, "• Leading space.\n• Double gap.");
    }
}
