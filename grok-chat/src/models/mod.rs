pub mod chat;

pub use chat::{ChatMessage, ChatSubmission, Reply, Role, UploadedFile};
