pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;

use services::ChatService;
use std::sync::Arc;

/// Shared application state. Read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatService>,
}

impl AppState {
    pub fn new(chat: Arc<ChatService>) -> Self {
        Self { chat }
    }
}
