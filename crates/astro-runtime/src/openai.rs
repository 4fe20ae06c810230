//! OpenAI Completion Provider
//!
//! Implementation of `CompletionProvider` against the OpenAI
//! chat-completions API. Works with any wire-compatible endpoint via
//! `OPENAI_BASE_URL`.

use std::time::Duration;

use astro_core::{
    error::{CoreError, Result},
    message::Message,
    provider::{Completion, CompletionProvider, GenerationOptions, TokenUsage},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// OpenAI provider configuration
#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    /// API key (bearer token)
    pub api_key: String,

    /// API base URL
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl OpenAiConfig {
    /// Read configuration from environment variables.
    ///
    /// Returns `None` when `OPENAI_API_KEY` is not set; the caller decides
    /// whether that means demo mode or a hard error.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty())?;
        let base_url = std::env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".into());
        let timeout_secs = std::env::var("OPENAI_TIMEOUT_SECS")
            .ok()
            .and_then(|t| t.parse().ok())
            .unwrap_or(120);

        Some(Self {
            api_key,
            base_url,
            timeout_secs,
        })
    }
}

/// OpenAI chat-completions provider
pub struct OpenAiProvider {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiProvider {
    /// Create from configuration
    pub fn from_config(config: OpenAiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CoreError::Config(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Create from environment variables, `None` if no key is configured
    pub fn from_env() -> Result<Option<Self>> {
        match OpenAiConfig::from_env() {
            Some(config) => Ok(Some(Self::from_config(config)?)),
            None => Ok(None),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Convert messages to the OpenAI wire format
    fn convert_messages(messages: &[Message]) -> Vec<WireMessage> {
        messages
            .iter()
            .map(|m| WireMessage {
                role: m.role.to_string(),
                content: m.content.clone(),
            })
            .collect()
    }

    fn map_status(status: reqwest::StatusCode, body: String) -> CoreError {
        match status.as_u16() {
            401 | 403 => CoreError::Auth(body),
            429 => CoreError::RateLimited(body),
            500..=599 => CoreError::ProviderUnavailable(body),
            _ => CoreError::Provider(body),
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "OpenAI"
    }

    async fn health_check(&self) -> Result<bool> {
        let response = self
            .client
            .get(self.endpoint("models"))
            .bearer_auth(&self.config.api_key)
            .send()
            .await;

        match response {
            Ok(r) => Ok(r.status().is_success()),
            Err(e) => {
                tracing::warn!("OpenAI health check failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        let request = ChatRequest {
            model: options.model.clone(),
            messages: Self::convert_messages(messages),
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        };

        let response = self
            .client
            .post(self.endpoint("chat/completions"))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    CoreError::ProviderUnavailable(e.to_string())
                } else {
                    CoreError::Provider(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::map_status(status, body));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| CoreError::Provider(e.to_string()))?;

        let model = chat.model.unwrap_or_else(|| options.model.clone());
        let content = chat
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| CoreError::EmptyCompletion(model.clone()))?;

        Ok(Completion {
            content,
            model,
            usage: chat.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
        })
    }
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    model: Option<String>,
    choices: Vec<ChatChoice>,
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: WireMessage,
}

#[derive(Deserialize)]
struct WireUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use astro_core::message::Message;

    #[test]
    fn test_message_conversion() {
        let messages = vec![Message::system("You are helpful."), Message::user("Hello")];

        let converted = OpenAiProvider::convert_messages(&messages);
        assert_eq!(converted.len(), 2);
        assert_eq!(converted[0].role, "system");
        assert_eq!(converted[1].role, "user");
    }

    #[test]
    fn test_response_parsing() {
        let raw = r#"{
            "model": "gpt-4o",
            "choices": [{"message": {"role": "assistant", "content": "hello"}}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }"#;

        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices.len(), 1);
        assert_eq!(parsed.usage.unwrap().total_tokens, 15);
    }

    #[test]
    fn test_status_mapping() {
        let err = OpenAiProvider::map_status(reqwest::StatusCode::UNAUTHORIZED, "no".into());
        assert!(matches!(err, CoreError::Auth(_)));

        let err = OpenAiProvider::map_status(reqwest::StatusCode::BAD_GATEWAY, "down".into());
        assert!(err.is_retryable());
    }
}
