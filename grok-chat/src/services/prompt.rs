//! Prompt validation and message construction.

use crate::config::Variant;
use crate::models::{ChatMessage, UploadedFile};
use crate::services::chat::ChatError;

const RICH_SYSTEM_PROMPT: &str = "You are Grok, a highly intelligent, helpful AI assistant. \
Respond using Markdown formatting for better readability: use **bold** for emphasis, \
*italics* for subtle highlights, bullet points or numbered lists for enumerations, \
and code blocks for any code snippets.";

const BASIC_SYSTEM_PROMPT: &str = "You are Grok, a highly intelligent, helpful AI assistant.";

/// Only plain-text uploads are accepted as context.
const SUPPORTED_EXTENSION: &str = ".txt";

pub fn system_prompt(variant: Variant) -> &'static str {
    match variant {
        Variant::Rich => RICH_SYSTEM_PROMPT,
        Variant::Basic => BASIC_SYSTEM_PROMPT,
    }
}

/// Reject missing, empty and whitespace-only prompts.
pub fn validate_prompt(prompt: &str) -> Result<(), ChatError> {
    if prompt.trim().is_empty() {
        return Err(ChatError::EmptyPrompt);
    }
    Ok(())
}

pub fn is_supported_upload(file_name: &str) -> bool {
    file_name
        .to_lowercase()
        .ends_with(SUPPORTED_EXTENSION)
}

/// Check the extension and decode the upload as UTF-8.
pub fn read_context(file: UploadedFile) -> Result<String, ChatError> {
    if !is_supported_upload(&file.file_name) {
        return Err(ChatError::UnsupportedFileType);
    }
    String::from_utf8(file.bytes).map_err(ChatError::Decode)
}

/// The user turn: the prompt, preceded by the file text when there is any.
pub fn user_content(prompt: &str, context: Option<&str>) -> String {
    match context {
        Some(text) if !text.is_empty() => format!("Context from file: {text}\n\n{prompt}"),
        _ => prompt.to_string(),
    }
}

pub fn build_messages(variant: Variant, prompt: &str, context: Option<&str>) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(system_prompt(variant)),
        ChatMessage::user(user_content(prompt, context)),
    ]
}
