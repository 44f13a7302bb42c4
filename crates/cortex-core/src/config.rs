use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{CortexError, Result};
use crate::types::SemanticModel;

/// Top-level configuration for Cortex Assist.
///
/// Loaded from `~/.cortex-assist/config.toml` by default. Each section
/// corresponds to one remote collaborator or cross-cutting concern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub account: AccountConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub semantic_models: SemanticModelConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

impl AssistantConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AssistantConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| CortexError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Warehouse account and session parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    /// Account locator sent as `ACCOUNT_NAME` at login.
    pub account: String,
    /// Account host name.
    pub host: String,
    pub port: u16,
    pub warehouse: String,
    pub role: String,
    pub database: String,
    pub schema: String,
    /// Full base URL override (scheme + host + port). When unset the URL is
    /// `https://{host}:{port}`.
    pub base_url: Option<String>,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            account: "GNB14769".to_string(),
            host: "GNB14769.snowflakecomputing.com".to_string(),
            port: 443,
            warehouse: "CORTEX_SEARCH_TUTORIAL_WH".to_string(),
            role: "DEV_BR_CORTEX_AI_ROLE".to_string(),
            database: "CORTEX_SEARCH_TUTORIAL_DB".to_string(),
            schema: "PUBLIC".to_string(),
            base_url: None,
        }
    }
}

impl AccountConfig {
    /// Resolve the base URL for all REST calls, without a trailing slash.
    pub fn base_url(&self) -> String {
        match self.base_url {
            Some(ref url) => url.trim_end_matches('/').to_string(),
            None if self.port == 443 => format!("https://{}", self.host),
            None => format!("https://{}:{}", self.host, self.port),
        }
    }
}

/// Cortex agent endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Path of the agent endpoint, relative to the base URL.
    pub endpoint: String,
    /// Model the agent orchestrates tools with.
    pub model: String,
    /// Agent call timeout in seconds. Other requests are unbounded.
    pub timeout_secs: u64,
    /// Fully-qualified Cortex Search service name.
    pub search_service: String,
    /// Maximum number of search hits requested.
    pub max_results: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            endpoint: "/api/v2/cortex/agent:run".to_string(),
            model: "mistral-large".to_string(),
            timeout_secs: 50,
            search_service: "CORTEX_SEARCH_TUTORIAL_DB.PUBLIC.BAYREN2".to_string(),
            max_results: 1,
        }
    }
}

/// Settings for the COMPLETE / SUMMARIZE functions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Model used for free-form completions.
    pub completion_model: String,
    /// Number of lines kept from the explanatory summary of query results.
    pub summary_lines: usize,
    /// Pass text as bind parameters. When false, text is embedded as an
    /// escaped SQL string literal.
    pub bind_parameters: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            completion_model: "mistral-large".to_string(),
            summary_lines: 3,
            bind_parameters: true,
        }
    }
}

/// The enumerated set of semantic models a session may pick from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticModelConfig {
    pub options: Vec<SemanticModel>,
    /// Index into `options` selected when a session starts.
    pub default_index: usize,
}

impl Default for SemanticModelConfig {
    fn default() -> Self {
        Self {
            options: vec![
                SemanticModel::new(
                    "CMP",
                    r#"@"CORTEX_SEARCH_TUTORIAL_DB"."PUBLIC"."CMP_STAGE"/cmp 1 copy.yaml"#,
                ),
                SemanticModel::new(
                    "MFP",
                    r#"@"CORTEX_SEARCH_TUTORIAL_DB"."PUBLIC"."MULTIFAMILYSTAGE"/multifamily.yaml"#,
                ),
                SemanticModel::new(
                    "CC",
                    r#"@"CORTEX_SEARCH_TUTORIAL_DB"."PUBLIC"."CC_STAGE"/Climate_Career_Final_SM_Draft.yaml"#,
                ),
                SemanticModel::new(
                    "WUSaves",
                    r#"@"CORTEX_SEARCH_TUTORIAL_DB"."PUBLIC"."WUSAVE_STAGE"/water_upgrades_save.yaml"#,
                ),
                SemanticModel::new(
                    "SF",
                    r#"@"CORTEX_SEARCH_TUTORIAL_DB"."PUBLIC"."SF_STAGE"/single_family_sm.yaml"#,
                ),
                SemanticModel::new(
                    "GL",
                    r#"@"CORTEX_TUTORIAL_DB"."PUBLIC"."GL_STAGE"/gl_projects.yaml"#,
                ),
            ],
            default_index: 2,
        }
    }
}

impl SemanticModelConfig {
    /// Look up a model by name (case-insensitive).
    pub fn find(&self, name: &str) -> Option<&SemanticModel> {
        self.options.iter().find(|m| m.name.eq_ignore_ascii_case(name))
    }

    /// The model selected at session start. Falls back to the first option
    /// when `default_index` is out of range.
    pub fn default_model(&self) -> Result<&SemanticModel> {
        self.options
            .get(self.default_index)
            .or_else(|| self.options.first())
            .ok_or_else(|| CortexError::Config("no semantic models configured".to_string()))
    }
}

/// Display surface settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Echo raw agent HTTP status and body.
    pub debug: bool,
    pub sample_questions: Vec<String>,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            debug: false,
            sample_questions: vec![
                "What is BayREN?".to_string(),
                "what is codes and standards program".to_string(),
                "Give me all 6 programs names".to_string(),
                "Show total energy savings by county.".to_string(),
                "how many active projects are there in multi family program".to_string(),
            ],
        }
    }
}
