//! Project configuration file support for llm-router.
//!
//! Loads configuration from `llm-router.toml` in the working directory.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use llm_router_core::MAX_ATTEMPTS;
use llm_router_oracle::{OracleConfig, DEFAULT_MODEL};

/// Project-level configuration loaded from `llm-router.toml`
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Bound on generate/evaluate attempts per request
    pub max_attempts: Option<usize>,
    /// Oracle connection settings
    #[serde(default)]
    pub oracle: OracleSection,
}

/// The `[oracle]` table
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct OracleSection {
    /// `provider/model` identifier, e.g. `openai/gpt-4o-mini`
    pub model: Option<String>,
    pub base_url: Option<String>,
    /// Name of the environment variable holding the API key
    pub api_key_env: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// Values given on the command line; these win over the file
#[derive(Debug, Default)]
pub struct Overrides<'a> {
    pub model: Option<&'a str>,
    pub base_url: Option<&'a str>,
    pub max_attempts: Option<usize>,
}

/// The config file name
pub const CONFIG_FILE_NAME: &str = "llm-router.toml";

impl ProjectConfig {
    /// Load configuration from the working directory.
    ///
    /// Returns:
    /// - `Ok(Some(config))` if file exists and parses successfully
    /// - `Ok(None)` if file does not exist
    /// - `Err(...)` if file exists but fails to parse (hard error)
    pub fn load(working_dir: &Path) -> Result<Option<Self>> {
        let config_path = working_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let config: ProjectConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        Ok(Some(config))
    }

    /// Effective attempt bound.
    /// Priority: CLI flag > config file > default
    pub fn max_attempts(&self, overrides: &Overrides<'_>) -> Result<usize> {
        let max_attempts = overrides
            .max_attempts
            .or(self.max_attempts)
            .unwrap_or(MAX_ATTEMPTS);
        if max_attempts == 0 {
            bail!("max_attempts must be at least 1");
        }
        Ok(max_attempts)
    }

    /// Build the oracle settings, reading the API key through `env`.
    /// Priority: CLI flag > config file > provider default
    pub fn oracle_config<F>(&self, overrides: &Overrides<'_>, env: F) -> Result<OracleConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let section = &self.oracle;
        let model_id = overrides
            .model
            .or(section.model.as_deref())
            .unwrap_or(DEFAULT_MODEL);

        let mut config = OracleConfig::from_model_id(model_id)
            .with_context(|| format!("Invalid model '{}'", model_id))?;

        if let Some(base_url) = overrides.base_url.or(section.base_url.as_deref()) {
            config = config.with_base_url(base_url.to_string());
        }

        let key_var = section
            .api_key_env
            .as_deref()
            .unwrap_or_else(|| config.provider.default_api_key_env());
        if let Some(key) = env(key_var).filter(|key| !key.trim().is_empty()) {
            config = config.with_api_key(key);
        }

        if let Some(secs) = section.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Some(max_tokens) = section.max_tokens {
            config = config.with_max_tokens(max_tokens);
        }
        if let Some(temperature) = section.temperature {
            config = config.with_temperature(temperature);
        }

        Ok(config)
    }
}
