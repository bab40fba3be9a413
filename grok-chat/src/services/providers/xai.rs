//! xAI chat-completions client.
//!
//! Speaks the OpenAI-compatible `/chat/completions` endpoint without streaming.

use super::{ChatCompletion, ChatProvider, ChatRequest, ProviderError, Usage};
use crate::config::XaiSettings;
use crate::models::ChatMessage;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// xAI provider configuration.
#[derive(Clone)]
pub struct XaiConfig {
    pub base_url: String,
    pub api_key: Option<Secret<String>>,
    pub timeout: Duration,
}

impl From<&XaiSettings> for XaiConfig {
    fn from(settings: &XaiSettings) -> Self {
        Self {
            base_url: settings.base_url.clone(),
            api_key: settings.api_key.clone(),
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }
}

pub struct XaiChatProvider {
    config: XaiConfig,
    client: Client,
}

impl XaiChatProvider {
    pub fn new(config: XaiConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn api_key(&self) -> Result<&str, ProviderError> {
        self.config
            .api_key
            .as_ref()
            .map(|key| key.expose_secret().as_str())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                ProviderError::NotConfigured(format!(
                    "{} is not set",
                    crate::config::API_KEY_ENV
                ))
            })
    }
}

#[async_trait]
impl ChatProvider for XaiChatProvider {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatCompletion, ProviderError> {
        let api_key = self.api_key()?;

        let body = CompletionRequest {
            model: &request.model,
            messages: &request.messages,
            stream: false,
        };

        tracing::debug!(
            model = %request.model,
            message_count = request.messages.len(),
            "Sending request to xAI API"
        );

        let response = self
            .client
            .post(self.api_url("chat/completions"))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            if status == StatusCode::TOO_MANY_REQUESTS {
                return Err(ProviderError::RateLimited);
            }

            return Err(ProviderError::ApiError(format!(
                "xAI API error {}: {}",
                status, error_text
            )));
        }

        let api_response: CompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ApiError(format!("Failed to parse response: {}", e)))?;

        let content = api_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| ProviderError::ApiError("Response contained no choices".to_string()))?;

        let usage = api_response.usage.unwrap_or_default();

        Ok(ChatCompletion {
            content,
            model: api_response.model.unwrap_or_else(|| request.model.clone()),
            usage: Usage {
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
            },
        })
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        self.api_key().map(|_| ())
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<UsageBody>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize, Default)]
struct UsageBody {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}
