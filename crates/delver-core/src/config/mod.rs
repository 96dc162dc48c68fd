//! Configuration management for Delver.
//!
//! Configuration is loaded from multiple sources with the following priority:
//! 1. Environment variables (highest priority)
//! 2. Project-local `delver.toml` file
//! 3. User config `~/.config/delver/config.toml`
//! 4. Built-in defaults (lowest priority)

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

mod defaults;

pub use defaults::*;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM provider configuration.
    pub llm: LlmConfig,

    /// Research pipeline configuration.
    pub research: ResearchConfig,

    /// Per-role model overrides.
    pub roles: RolesConfig,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// Searches for config in order:
    /// 1. `./delver.toml` (project local)
    /// 2. `~/.config/delver/config.toml` (user config)
    /// 3. Falls back to defaults
    pub fn load() -> Result<Self, ConfigError> {
        // Try project-local config first
        if Path::new("delver.toml").exists() {
            return Self::from_file("delver.toml");
        }

        // Try user config
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("delver").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        // Use defaults
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;

        // Apply environment variable overrides
        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(provider) = std::env::var("DELVER_LLM_PROVIDER") {
            self.llm.provider = provider;
        }
        if let Ok(model) = std::env::var("DELVER_LLM_MODEL") {
            self.llm.model = Some(model);
        }
        if let Ok(base_url) = std::env::var("DELVER_LLM_BASE_URL") {
            self.llm.base_url = Some(base_url);
        }
        if let Ok(api_key) = std::env::var("DELVER_LLM_API_KEY") {
            self.llm.api_key = Some(api_key);
        }
        if let Ok(rounds) = std::env::var("DELVER_MAX_CLARIFICATION_ROUNDS") {
            if let Ok(rounds) = rounds.parse() {
                self.research.max_clarification_rounds = rounds;
            }
        }
        if let Ok(timeout) = std::env::var("DELVER_SEARCH_TIMEOUT_SECS") {
            if let Ok(timeout) = timeout.parse() {
                self.research.search_timeout_secs = timeout;
            }
        }
    }

    /// Validate cross-field constraints.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.research.min_searches == 0 {
            return Err(ConfigError::Invalid(
                "research.min_searches must be at least 1".to_string(),
            ));
        }
        if self.research.min_searches > self.research.max_searches {
            return Err(ConfigError::Invalid(format!(
                "research.min_searches ({}) exceeds research.max_searches ({})",
                self.research.min_searches, self.research.max_searches
            )));
        }
        if self.research.search_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "research.search_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// LLM provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name: "openai", "anthropic", or "ollama".
    pub provider: String,
    /// Model name (provider default when unset).
    pub model: Option<String>,
    /// API base URL override.
    pub base_url: Option<String>,
    /// API key (environment variables take precedence).
    pub api_key: Option<String>,
    /// Maximum tokens for responses.
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: None,
            base_url: None,
            api_key: None,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// Research pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchConfig {
    /// Maximum clarification rounds before proceeding with the
    /// best-available query.
    pub max_clarification_rounds: u32,
    /// Minimum directives a valid search plan must contain.
    pub min_searches: usize,
    /// Maximum directives a valid search plan may contain.
    pub max_searches: usize,
    /// Per-search timeout in seconds.
    pub search_timeout_secs: u64,
    /// Retries per LLM call site on transient failures.
    pub max_retries: u32,
    /// Base backoff delay in milliseconds; doubles per retry.
    pub retry_base_delay_ms: u64,
    /// Prior report summaries carried into follow-up runs.
    pub context_summaries: usize,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            max_clarification_rounds: DEFAULT_MAX_CLARIFICATION_ROUNDS,
            min_searches: DEFAULT_MIN_SEARCHES,
            max_searches: DEFAULT_MAX_SEARCHES,
            search_timeout_secs: DEFAULT_SEARCH_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            context_summaries: DEFAULT_CONTEXT_SUMMARIES,
        }
    }
}

/// Per-role model overrides.
///
/// Lets a deployment run clarification on a fast model while keeping
/// a stronger model for report writing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RolesConfig {
    pub clarifier_model: Option<String>,
    pub planner_model: Option<String>,
    pub searcher_model: Option<String>,
    pub writer_model: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.research.max_clarification_rounds, 5);
        assert_eq!(config.research.min_searches, 5);
        assert_eq!(config.research.max_searches, 20);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[llm]
provider = "ollama"
model = "llama3"

[research]
max_clarification_rounds = 3
search_timeout_secs = 30

[roles]
writer_model = "gpt-4o"
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.llm.provider, "ollama");
        assert_eq!(config.llm.model.as_deref(), Some("llama3"));
        assert_eq!(config.research.max_clarification_rounds, 3);
        assert_eq!(config.research.search_timeout_secs, 30);
        // Unset fields keep defaults
        assert_eq!(config.research.min_searches, DEFAULT_MIN_SEARCHES);
        assert_eq!(config.roles.writer_model.as_deref(), Some("gpt-4o"));
        assert!(config.roles.clarifier_model.is_none());
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[research]
min_searches = 30
max_searches = 20
"#
        )
        .unwrap();

        let result = Config::from_file(file.path());
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
