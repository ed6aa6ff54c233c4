//! Configuration loading and validation for Reagent.
//!
//! Loads configuration from a TOML file with environment variable
//! overrides. Retry counts, timeouts, and loop budgets are configuration
//! parameters rather than fixed constants, and the model id / API key are
//! passed explicitly into constructors instead of being read from ambient
//! state.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// The root configuration structure.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the LLM provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible endpoint.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Default model id.
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Max tokens per completion.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Agent loop budgets and timeouts.
    #[serde(default, rename = "loop")]
    pub loop_config: LoopConfig,

    /// Built-in tool settings.
    #[serde(default)]
    pub tools: ToolsConfig,
}

/// Budgets and timeouts for the agent loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopConfig {
    /// Maximum model cycles before the run fails with StepBudgetExceeded.
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,

    /// Retries allowed for malformed model responses before the run fails.
    #[serde(default = "default_max_parse_retries")]
    pub max_parse_retries: u32,

    /// Timeout for a single model call, in seconds.
    #[serde(default = "default_llm_timeout_secs")]
    pub llm_timeout_secs: u64,

    /// Timeout for a single tool execution, in seconds.
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            max_parse_retries: default_max_parse_retries(),
            llm_timeout_secs: default_llm_timeout_secs(),
            tool_timeout_secs: default_tool_timeout_secs(),
        }
    }
}

/// Settings for the built-in tools.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Endpoint of the external retrieval service, if any. When unset the
    /// knowledge_search tool is not registered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrieval_url: Option<String>,

    /// How many snippets to request from the retrieval service.
    #[serde(default = "default_retrieval_top_k")]
    pub retrieval_top_k: u32,
}

fn default_api_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_max_steps() -> u32 {
    8
}
fn default_max_parse_retries() -> u32 {
    2
}
fn default_llm_timeout_secs() -> u64 {
    60
}
fn default_tool_timeout_secs() -> u64 {
    30
}
fn default_retrieval_top_k() -> u32 {
    3
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("loop_config", &self.loop_config)
            .field("tools", &self.tools)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            loop_config: LoopConfig::default(),
            tools: ToolsConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file, then apply environment
    /// variable overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let mut config: AppConfig = toml::from_str(&text)?;
        config.apply_env_overrides();
        config.validate()?;
        debug!(path = %path.as_ref().display(), "Loaded configuration");
        Ok(config)
    }

    /// Defaults plus environment variable overrides — used when no config
    /// file exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = AppConfig::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Environment variables take precedence over file values:
    /// `REAGENT_API_KEY`, `REAGENT_API_URL`, `REAGENT_MODEL`.
    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("REAGENT_API_KEY") {
            if !key.is_empty() {
                self.api_key = Some(key);
            }
        }
        if let Ok(url) = std::env::var("REAGENT_API_URL") {
            if !url.is_empty() {
                self.api_url = url;
            }
        }
        if let Ok(model) = std::env::var("REAGENT_MODEL") {
            if !model.is_empty() {
                self.model = model;
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.model.is_empty() {
            return Err(ConfigError::Invalid("model must not be empty".into()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Invalid(format!(
                "temperature {} out of range [0.0, 2.0]",
                self.temperature
            )));
        }
        if self.loop_config.max_steps == 0 {
            return Err(ConfigError::Invalid("loop.max_steps must be > 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_sane() {
        let config = AppConfig::default();
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.loop_config.max_steps, 8);
        assert_eq!(config.loop_config.max_parse_retries, 2);
        assert_eq!(config.loop_config.llm_timeout_secs, 60);
        assert_eq!(config.loop_config.tool_timeout_secs, 30);
        assert!(config.api_key.is_none());
        assert!(config.tools.retrieval_url.is_none());
    }

    #[test]
    fn load_from_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
api_key = "sk-test"
model = "qwen2.5:7b"
api_url = "http://localhost:11434/v1"

[loop]
max_steps = 5
max_parse_retries = 1

[tools]
retrieval_url = "http://localhost:9200/search"
retrieval_top_k = 5
"#
        )
        .unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.model, "qwen2.5:7b");
        assert_eq!(config.loop_config.max_steps, 5);
        assert_eq!(config.loop_config.max_parse_retries, 1);
        // Unset fields keep their defaults
        assert_eq!(config.loop_config.llm_timeout_secs, 60);
        assert_eq!(
            config.tools.retrieval_url.as_deref(),
            Some("http://localhost:9200/search")
        );
        assert_eq!(config.tools.retrieval_top_k, 5);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "temperature = 3.5").unwrap();
        let err = AppConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn zero_max_steps_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[loop]\nmax_steps = 0").unwrap();
        let err = AppConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = AppConfig {
            api_key: Some("sk-secret-value".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret-value"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn malformed_toml_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "model = [not valid").unwrap();
        let err = AppConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
