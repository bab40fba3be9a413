//! Submission processing: validate, ask the provider once, shape the reply.

use crate::config::ChatSettings;
use crate::models::{ChatSubmission, Reply};
use crate::services::prompt;
use crate::services::providers::{ChatProvider, ChatRequest, ProviderError};
use crate::services::render::render_markdown;
use metrics::{counter, histogram};
use std::string::FromUtf8Error;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Everything that can end a submission without a reply. `Display` is the
/// message shown on the page.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Please enter a prompt.")]
    EmptyPrompt,

    #[error("Unsupported file type. Only .txt files are supported.")]
    UnsupportedFileType,

    #[error("Chat error: {0}")]
    Decode(#[source] FromUtf8Error),

    #[error("Chat error: {0}")]
    Provider(#[from] ProviderError),
}

impl ChatError {
    fn outcome(&self) -> &'static str {
        match self {
            ChatError::EmptyPrompt | ChatError::UnsupportedFileType => "rejected",
            ChatError::Decode(_) | ChatError::Provider(_) => "failed",
        }
    }
}

/// Built once at startup and shared read-only by all requests.
pub struct ChatService {
    provider: Arc<dyn ChatProvider>,
    settings: ChatSettings,
}

impl ChatService {
    pub fn new(provider: Arc<dyn ChatProvider>, settings: ChatSettings) -> Self {
        Self { provider, settings }
    }

    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    pub async fn health_check(&self) -> Result<(), ProviderError> {
        self.provider.health_check().await
    }

    pub async fn respond(&self, submission: ChatSubmission) -> Result<Reply, ChatError> {
        let result = self.process(submission).await;

        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => e.outcome(),
        };
        counter!("chat_submissions_total", "outcome" => outcome).increment(1);

        result
    }

    /// Record a submission whose form body could not be read, so it never
    /// reached [`ChatService::respond`].
    pub fn record_rejected_form(&self) {
        counter!("chat_submissions_total", "outcome" => "invalid_form").increment(1);
    }

    async fn process(&self, submission: ChatSubmission) -> Result<Reply, ChatError> {
        let ChatSubmission { prompt, file } = submission;

        prompt::validate_prompt(&prompt)?;

        // A file input left empty still posts a part with no filename.
        let file = file.filter(|f| !f.file_name.is_empty());
        let file_name = file.as_ref().map(|f| f.file_name.clone());

        let context = match file {
            Some(file) => Some(prompt::read_context(file).map_err(|e| {
                tracing::warn!(file_name = ?file_name, error = %e, "Rejected uploaded file");
                e
            })?),
            None => None,
        };

        let variant = self.settings.variant;
        let request = ChatRequest {
            model: self.settings.model().to_string(),
            messages: prompt::build_messages(variant, &prompt, context.as_deref()),
        };

        tracing::info!(
            model = %request.model,
            prompt_len = prompt.len(),
            context_len = context.as_ref().map_or(0, |c| c.len()),
            file_name = ?file_name,
            "Forwarding prompt to chat provider"
        );

        let started = Instant::now();
        let completion = self.provider.complete(&request).await.map_err(|e| {
            tracing::error!(model = %request.model, error = %e, "Chat completion failed");
            e
        })?;
        let elapsed = started.elapsed();
        histogram!("chat_completion_duration_seconds").record(elapsed.as_secs_f64());

        tracing::info!(
            model = %completion.model,
            elapsed_ms = elapsed.as_millis() as u64,
            input_tokens = completion.usage.input_tokens,
            output_tokens = completion.usage.output_tokens,
            "Received chat completion"
        );

        if variant.renders_markdown() {
            Ok(Reply::Html(render_markdown(
                &completion.content,
                self.settings.sanitize_html,
            )))
        } else {
            Ok(Reply::Text(completion.content))
        }
    }
}
