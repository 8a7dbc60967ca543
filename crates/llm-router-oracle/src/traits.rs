use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::{Instruction, OracleFields};

/// Default model used when neither the config file nor the CLI names one
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";

/// Default completion budget per oracle call
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Errors that can occur while talking to the oracle
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("Oracle '{provider}' is not configured: missing API key (set {env_var})")]
    NotConfigured { provider: String, env_var: String },

    #[error("Oracle transport error: {0}")]
    Transport(String),

    #[error("Oracle returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Oracle rate limited the request")]
    RateLimited,

    #[error("Malformed oracle response: {0}")]
    MalformedResponse(String),

    #[error("Oracle response for '{operation}' is missing field '{field}'")]
    MissingField { operation: String, field: String },

    #[error("Invalid instruction: {0}")]
    InvalidInstruction(String),

    #[error("Oracle configuration error: {0}")]
    ConfigError(String),

    #[error("No scripted response left for '{0}'")]
    Unscripted(String),
}

/// Supported oracle providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OracleProvider {
    Anthropic,
    OpenAi,
}

impl OracleProvider {
    /// Base URL used when the config does not override it
    pub fn default_base_url(&self) -> &'static str {
        match self {
            OracleProvider::Anthropic => "https://api.anthropic.com",
            OracleProvider::OpenAi => "https://api.openai.com",
        }
    }

    /// Environment variable conventionally holding the API key
    pub fn default_api_key_env(&self) -> &'static str {
        match self {
            OracleProvider::Anthropic => "ANTHROPIC_API_KEY",
            OracleProvider::OpenAi => "OPENAI_API_KEY",
        }
    }
}

impl std::fmt::Display for OracleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OracleProvider::Anthropic => write!(f, "anthropic"),
            OracleProvider::OpenAi => write!(f, "openai"),
        }
    }
}

impl std::str::FromStr for OracleProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(OracleProvider::Anthropic),
            "openai" | "open-ai" => Ok(OracleProvider::OpenAi),
            _ => Err(format!("Unknown oracle provider: {}", s)),
        }
    }
}

/// Connection settings for an oracle, passed explicitly at construction
#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub provider: OracleProvider,
    /// Provider-local model name (without the `provider/` prefix)
    pub model: String,
    /// Override for the provider's API base URL
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    /// Request timeout (None = client default)
    pub timeout: Option<Duration>,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            provider: OracleProvider::Anthropic,
            model: DEFAULT_MODEL.to_string(),
            base_url: None,
            api_key: None,
            timeout: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
        }
    }
}

impl OracleConfig {
    pub fn new(provider: OracleProvider, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            ..Default::default()
        }
    }

    /// Build a config from a `provider/model` identifier.
    ///
    /// An identifier without a recognised provider prefix is taken as an
    /// Anthropic model name.
    pub fn from_model_id(model_id: &str) -> Result<Self, OracleError> {
        let model_id = model_id.trim();
        let (provider, model) = match model_id.split_once('/') {
            Some((prefix, rest)) => match prefix.parse::<OracleProvider>() {
                Ok(provider) => (provider, rest),
                Err(_) => (OracleProvider::Anthropic, model_id),
            },
            None => (OracleProvider::Anthropic, model_id),
        };

        if model.is_empty() {
            return Err(OracleError::ConfigError(format!(
                "Model identifier '{}' has no model name",
                model_id
            )));
        }

        Ok(Self::new(provider, model))
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }

    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.api_key = Some(api_key);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// The `provider/model` identifier for display and run records
    pub fn model_id(&self) -> String {
        format!("{}/{}", self.provider, self.model)
    }

    /// Effective API base URL, without a trailing slash
    pub fn endpoint(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url())
            .trim_end_matches('/')
    }

    pub(crate) fn require_api_key(&self) -> Result<&str, OracleError> {
        self.api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| OracleError::NotConfigured {
                provider: self.provider.to_string(),
                env_var: self.provider.default_api_key_env().to_string(),
            })
    }
}

/// The external inference service, seen as an opaque structured oracle
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Human-readable name of the oracle (e.g., "Anthropic")
    fn name(&self) -> &str;

    /// Model identifier the oracle sends requests to
    fn model(&self) -> &str;

    /// Send one structured instruction and return its named output fields
    async fn predict(&self, instruction: &Instruction) -> Result<OracleFields, OracleError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_id_with_provider_prefix() {
        let config = OracleConfig::from_model_id("anthropic/claude-3-5-sonnet-20241022").unwrap();
        assert_eq!(config.provider, OracleProvider::Anthropic);
        assert_eq!(config.model, "claude-3-5-sonnet-20241022");
        assert_eq!(config.model_id(), "anthropic/claude-3-5-sonnet-20241022");
    }

    #[test]
    fn test_model_id_openai() {
        let config = OracleConfig::from_model_id("openai/gpt-4o-mini").unwrap();
        assert_eq!(config.provider, OracleProvider::OpenAi);
        assert_eq!(config.model, "gpt-4o-mini");
    }

    #[test]
    fn test_model_id_without_prefix_defaults_to_anthropic() {
        let config = OracleConfig::from_model_id("claude-sonnet-4-20250514").unwrap();
        assert_eq!(config.provider, OracleProvider::Anthropic);
        assert_eq!(config.model, "claude-sonnet-4-20250514");
    }

    #[test]
    fn test_model_id_empty_model_rejected() {
        let result = OracleConfig::from_model_id("openai/");
        assert!(matches!(result, Err(OracleError::ConfigError(_))));
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let config = OracleConfig::default().with_base_url("http://localhost:8080/".into());
        assert_eq!(config.endpoint(), "http://localhost:8080");
        assert_eq!(
            OracleConfig::default().endpoint(),
            "https://api.anthropic.com"
        );
    }

    #[test]
    fn test_missing_api_key_is_not_configured() {
        let config = OracleConfig::default();
        assert!(matches!(
            config.require_api_key(),
            Err(OracleError::NotConfigured { .. })
        ));
        let config = config.with_api_key("sk-test".into());
        assert_eq!(config.require_api_key().unwrap(), "sk-test");
    }
}
