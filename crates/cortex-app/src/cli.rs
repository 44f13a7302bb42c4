//! CLI argument definitions for the Cortex Assist binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Cortex Assist: ask questions of Snowflake Cortex from the terminal.
#[derive(Parser, Debug)]
#[command(name = "cortex-assist", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Login name.
    #[arg(short = 'u', long = "user")]
    pub user: Option<String>,

    /// Semantic model to start with (e.g. CC, MFP).
    #[arg(short = 'm', long = "model")]
    pub model: Option<String>,

    /// Echo raw agent responses.
    #[arg(long = "debug")]
    pub debug: bool,

    /// Answer a single question and exit.
    #[arg(short = 'q', long = "query")]
    pub query: Option<String>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > CORTEX_CONFIG env var > ~/.cortex-assist/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("CORTEX_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }

    /// Resolve the login name, if known without prompting.
    ///
    /// Priority: --user flag > CORTEX_USER env var.
    pub fn resolve_user(&self) -> Option<String> {
        self.user
            .clone()
            .or_else(|| std::env::var("CORTEX_USER").ok())
            .filter(|u| !u.trim().is_empty())
    }
}

/// Password from the environment, if set.
pub fn env_password() -> Option<String> {
    std::env::var("CORTEX_PASSWORD")
        .ok()
        .filter(|p| !p.is_empty())
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".cortex-assist").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".cortex-assist").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_flags() {
        let args = CliArgs::try_parse_from([
            "cortex-assist",
            "--config",
            "/tmp/c.toml",
            "--log-level",
            "debug",
            "--user",
            "alice",
            "--model",
            "MFP",
            "--debug",
            "--query",
            "What is BayREN?",
        ])
        .unwrap();
        assert_eq!(args.resolve_config_path(), PathBuf::from("/tmp/c.toml"));
        assert_eq!(args.resolve_log_level("info"), "debug");
        assert_eq!(args.resolve_user().as_deref(), Some("alice"));
        assert_eq!(args.model.as_deref(), Some("MFP"));
        assert!(args.debug);
        assert_eq!(args.query.as_deref(), Some("What is BayREN?"));
    }

    #[test]
    fn test_defaults() {
        let args = CliArgs::try_parse_from(["cortex-assist"]).unwrap();
        assert!(!args.debug);
        assert!(args.query.is_none());
        assert_eq!(args.resolve_log_level("warn"), "warn");
    }

    #[test]
    fn test_short_flags() {
        let args = CliArgs::try_parse_from(["cortex-assist", "-u", "bob", "-q", "hi"]).unwrap();
        assert_eq!(args.user.as_deref(), Some("bob"));
        assert_eq!(args.query.as_deref(), Some("hi"));
    }

    #[test]
    fn test_default_config_path_file_name() {
        let path = default_config_path();
        assert!(path.ends_with("config.toml"));
    }
}
