//! Chat-completion provider abstraction.
//!
//! The page handler only sees [`ChatProvider`]; the xAI client and the mock
//! used in tests sit behind it.

pub mod mock;
pub mod xai;

use crate::models::ChatMessage;
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Network error: {0}")]
    NetworkError(String),
}

/// A single non-streaming completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

/// Token accounting reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// The complete reply to a [`ChatRequest`].
#[derive(Debug, Clone)]
pub struct ChatCompletion {
    pub content: String,
    /// Model that actually served the request, as reported back.
    pub model: String,
    pub usage: Usage,
}

#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Send the message sequence and wait for the whole reply.
    async fn complete(&self, request: &ChatRequest) -> Result<ChatCompletion, ProviderError>;

    /// Cheap readiness probe; must not spend tokens.
    async fn health_check(&self) -> Result<(), ProviderError>;
}
