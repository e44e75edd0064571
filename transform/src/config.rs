//! Settings for the OpenAI-compatible provider.

use std::time::Duration;

use crate::error::{Result, TransformError};

/// Environment variable holding the API base URL (including `/v1` or equivalent).
pub const OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";

/// Environment variable holding the API key.
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";

/// Environment variable holding the model or deployment name.
pub const OPENAI_MODEL: &str = "OPENAI_MODEL";

/// Configuration for [`OpenAIProvider`](crate::OpenAIProvider).
#[derive(Clone)]
pub struct OpenAIConfig {
    /// API base URL without trailing slash.
    pub base_url: String,

    /// API key sent as a bearer token.
    pub api_key: String,

    /// Model identifier sent with every request.
    pub model: String,

    /// Sampling temperature.
    pub temperature: f32,

    /// Per-request timeout. Generation of long pages can take minutes.
    pub timeout: Duration,
}

impl OpenAIConfig {
    /// Create a configuration with deterministic sampling.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            temperature: 0.0,
            timeout: Duration::from_secs(300),
        }
    }

    /// Read `OPENAI_BASE_URL`, `OPENAI_API_KEY` and `OPENAI_MODEL` from the environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`. Blank values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &'static str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(TransformError::MissingSetting(key))
        };
        Ok(Self::new(
            get(OPENAI_BASE_URL)?,
            get(OPENAI_API_KEY)?,
            get(OPENAI_MODEL)?,
        ))
    }
}

impl std::fmt::Debug for OpenAIConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_model_is_required() {
        let err = OpenAIConfig::from_lookup(|key| match key {
            OPENAI_BASE_URL => Some("https://ai.example.com/openai/v1/".to_string()),
            OPENAI_API_KEY => Some("k".to_string()),
            _ => None,
        })
        .unwrap_err();

        assert!(matches!(err, TransformError::MissingSetting(OPENAI_MODEL)));
    }

    #[test]
    fn test_from_lookup() {
        let config = OpenAIConfig::from_lookup(|key| match key {
            OPENAI_BASE_URL => Some("https://ai.example.com/openai/v1/".to_string()),
            OPENAI_API_KEY => Some("k".to_string()),
            OPENAI_MODEL => Some("gpt-4.1".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.base_url, "https://ai.example.com/openai/v1");
        assert_eq!(config.model, "gpt-4.1");
        assert_eq!(config.temperature, 0.0);
    }
}
