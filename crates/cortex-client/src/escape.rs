//! SQL string literal quoting.
//!
//! Only used when `llm.bind_parameters` is off. Any user text that reaches SQL
//! without a bind parameter must go through [`quote_literal`]; this is the one
//! place an injection bug can live.

/// Wrap `text` in single quotes, escaping backslashes and single quotes.
pub fn quote_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text() {
        assert_eq!(quote_literal("hello"), "'hello'");
        assert_eq!(quote_literal(""), "''");
    }

    #[test]
    fn test_escapes_single_quote() {
        assert_eq!(quote_literal("it's"), r"'it\'s'");
    }

    #[test]
    fn test_escapes_backslash_before_quote() {
        // A trailing backslash must not swallow the closing quote.
        assert_eq!(quote_literal(r"C:\"), r"'C:\\'");
        assert_eq!(quote_literal(r"\'"), r"'\\\''");
    }

    #[test]
    fn test_injection_attempt_stays_inside_literal() {
        let quoted = quote_literal("x'); DROP TABLE t; --");
        assert_eq!(quoted, r"'x\'); DROP TABLE t; --'");
    }

    #[test]
    fn test_unicode_and_newlines_pass_through() {
        assert_eq!(quote_literal("café\nline"), "'café\nline'");
    }
}
