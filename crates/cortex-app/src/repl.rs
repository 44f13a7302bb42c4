//! REPL command parsing.

/// One line of REPL input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Samples,
    /// Ask the Nth (1-based) sample question.
    Sample(usize),
    /// Show the current model, or switch to the named one.
    Model(Option<String>),
    Debug(bool),
    Logout,
    Quit,
    Ask(String),
    Invalid(String),
}

pub const HELP: &str = "\
Type a question (start it with `::` to ask something beginning with `:`), or one of:
  :help            show this help
  :samples         list sample questions
  :sample N        ask sample question N
  :model [NAME]    show or switch the semantic model
  :debug on|off    echo raw agent responses
  :logout          log out and log in again
  :quit            exit";

/// Parse a line of input; `None` for a blank line.
pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if let Some(question) = line.strip_prefix("::") {
        return Some(Command::Ask(format!(":{}", question)));
    }
    let Some(rest) = line.strip_prefix(':') else {
        return Some(Command::Ask(line.to_string()));
    };

    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let arg = parts.next();
    if parts.next().is_some() {
        return Some(Command::Invalid(format!("too many arguments: {}", line)));
    }

    let cmd = match (name, arg) {
        ("help" | "h", None) => Command::Help,
        ("samples", None) => Command::Samples,
        ("sample", Some(n)) => match n.parse::<usize>() {
            Ok(n) if n > 0 => Command::Sample(n),
            _ => Command::Invalid(format!("not a sample number: {}", n)),
        },
        ("model", arg) => Command::Model(arg.map(str::to_string)),
        ("debug", Some("on")) => Command::Debug(true),
        ("debug", Some("off")) => Command::Debug(false),
        ("logout", None) => Command::Logout,
        ("quit" | "q" | "exit", None) => Command::Quit,
        _ => Command::Invalid(format!("unknown command: {}", line)),
    };
    Some(cmd)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_line() {
        assert_eq!(parse_command("   "), None);
    }

    #[test]
    fn test_question() {
        assert_eq!(
            parse_command("  What is BayREN?  "),
            Some(Command::Ask("What is BayREN?".to_string()))
        );
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(parse_command(":help"), Some(Command::Help));
        assert_eq!(parse_command(":samples"), Some(Command::Samples));
        assert_eq!(parse_command(":logout"), Some(Command::Logout));
        assert_eq!(parse_command(":quit"), Some(Command::Quit));
        assert_eq!(parse_command(":q"), Some(Command::Quit));
    }

    #[test]
    fn test_sample_number() {
        assert_eq!(parse_command(":sample 4"), Some(Command::Sample(4)));
        assert!(matches!(
            parse_command(":sample 0"),
            Some(Command::Invalid(_))
        ));
        assert!(matches!(
            parse_command(":sample x"),
            Some(Command::Invalid(_))
        ));
        assert!(matches!(parse_command(":sample"), Some(Command::Invalid(_))));
    }

    #[test]
    fn test_model() {
        assert_eq!(parse_command(":model"), Some(Command::Model(None)));
        assert_eq!(
            parse_command(":model MFP"),
            Some(Command::Model(Some("MFP".to_string())))
        );
    }

    #[test]
    fn test_debug_toggle() {
        assert_eq!(parse_command(":debug on"), Some(Command::Debug(true)));
        assert_eq!(parse_command(":debug off"), Some(Command::Debug(false)));
        assert!(matches!(
            parse_command(":debug maybe"),
            Some(Command::Invalid(_))
        ));
    }

    #[test]
    fn test_extra_arguments_rejected() {
        assert_eq!(
            parse_command(":model A B"),
            Some(Command::Invalid("too many arguments: :model A B".to_string()))
        );
        assert!(matches!(
            parse_command(":sample 1 2"),
            Some(Command::Invalid(_))
        ));
        assert!(matches!(parse_command(":quit now"), Some(Command::Invalid(_))));
    }

    #[test]
    fn test_double_colon_asks_literal_question() {
        assert_eq!(
            parse_command("::) is a smiley?"),
            Some(Command::Ask(":) is a smiley?".to_string()))
        );
        assert_eq!(
            parse_command("::model"),
            Some(Command::Ask(":model".to_string()))
        );
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            parse_command(":frobnicate"),
            Some(Command::Invalid("unknown command: :frobnicate".to_string()))
        );
    }
}
