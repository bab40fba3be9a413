//! Mock provider for testing.

use super::{ChatCompletion, ChatProvider, ChatRequest, ProviderError, Usage};
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};

/// Replies with a canned answer (or error) and records every request.
pub struct MockChatProvider {
    outcome: Result<String, ProviderError>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockChatProvider {
    pub fn replying(content: impl Into<String>) -> Self {
        Self {
            outcome: Ok(content.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        Self {
            outcome: Err(error),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.log().clone()
    }

    pub fn call_count(&self) -> usize {
        self.log().len()
    }

    fn log(&self) -> MutexGuard<'_, Vec<ChatRequest>> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ChatProvider for MockChatProvider {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatCompletion, ProviderError> {
        self.log().push(request.clone());

        let content = self.outcome.clone()?;
        let input_tokens = request
            .messages
            .iter()
            .map(|m| m.content.len() as u32 / 4)
            .sum();

        Ok(ChatCompletion {
            content,
            model: request.model.clone(),
            usage: Usage {
                input_tokens,
                output_tokens: 10,
            },
        })
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}
