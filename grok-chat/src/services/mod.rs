pub mod chat;
pub mod metrics;
pub mod prompt;
pub mod providers;
pub mod render;

pub use chat::{ChatError, ChatService};
