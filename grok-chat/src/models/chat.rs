use serde::{Deserialize, Serialize};

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// File part of a submission, as received.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// One form post: the prompt plus an optional context file.
#[derive(Debug, Clone, Default)]
pub struct ChatSubmission {
    pub prompt: String,
    pub file: Option<UploadedFile>,
}

/// Successful reply, already in the shape the page will show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Rendered HTML, inserted into the page unescaped.
    Html(String),
    /// Plain text, escaped by the template.
    Text(String),
}
