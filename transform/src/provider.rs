//! Transformation providers.
//!
//! A provider takes one compiled prompt and returns generated text. The
//! pipeline treats it as opaque; everything it does wrong surfaces as a
//! [`TransformError`].

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::OpenAIConfig;
use crate::error::{Result, TransformError};

/// Trait for transformation providers.
#[async_trait]
pub trait TransformProvider: Send + Sync {
    /// Get the name of this provider.
    fn name(&self) -> &str;

    /// Get the model identifier sent with each call.
    fn model(&self) -> &str;

    /// Run one transformation.
    async fn transform(&self, payload: &str) -> Result<String>;
}

/// OpenAI-compatible chat completions provider.
///
/// Works against api.openai.com as well as Azure AI Foundry style endpoints
/// that expose the same `/chat/completions` route.
pub struct OpenAIProvider {
    config: OpenAIConfig,
    client: reqwest::Client,
}

impl OpenAIProvider {
    /// Create a new provider.
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    /// Create a provider from `OPENAI_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(OpenAIConfig::from_env()?)
    }
}

#[async_trait]
impl TransformProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn transform(&self, payload: &str) -> Result<String> {
        debug!(
            "Requesting completion from {} ({} chars)",
            self.config.model,
            payload.chars().count()
        );

        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [{"role": "user", "content": payload}],
            "temperature": self.config.temperature,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);

            return Err(TransformError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TransformError::ApiRequest { status, body });
        }

        let text = response.text().await?;
        let result: ChatCompletionResponse = serde_json::from_str(&text)?;

        let content = result
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| TransformError::InvalidResponse("no choices in response".to_string()))?
            .message
            .content
            .unwrap_or_default();

        if let Some(usage) = result.usage {
            info!("Completion used {} tokens", usage.total_tokens);
        }

        Ok(content.trim().to_string())
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    total_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> OpenAIProvider {
        OpenAIProvider::new(OpenAIConfig::new(
            format!("{}/openai/v1", server.uri()),
            "key",
            "gpt-test",
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn test_transform_returns_trimmed_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/v1/chat/completions"))
            .and(header("authorization", "Bearer key"))
            .and(body_partial_json(json!({
                "model": "gpt-test",
                "messages": [{"role": "user", "content": "rewrite me"}],
                "temperature": 0.0
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "\n <p>done</p> \n"}}],
                "usage": {"prompt_tokens": 3, "completion_tokens": 2, "total_tokens": 5}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let out = provider_for(&server).transform("rewrite me").await.unwrap();
        assert_eq!(out, "<p>done</p>");
    }

    #[tokio::test]
    async fn test_null_content_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": null}}]
            })))
            .mount(&server)
            .await;

        let out = provider_for(&server).transform("x").await.unwrap();
        assert_eq!(out, "");
    }

    #[tokio::test]
    async fn test_rate_limit_reports_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "12"))
            .mount(&server)
            .await;

        let err = provider_for(&server).transform("x").await.unwrap_err();
        assert!(matches!(
            err,
            TransformError::RateLimited {
                retry_after_secs: 12
            }
        ));
    }

    #[tokio::test]
    async fn test_server_error_is_api_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("deployment not found"))
            .mount(&server)
            .await;

        let err = provider_for(&server).transform("x").await.unwrap_err();
        match err {
            TransformError::ApiRequest { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "deployment not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_choices_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let err = provider_for(&server).transform("x").await.unwrap_err();
        assert!(matches!(err, TransformError::InvalidResponse(_)));
    }
}
