use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use service_core::error::AppError;

pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "grok-chat",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Ready once the chat provider has what it needs to serve (an API key).
pub async fn readiness_check(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.chat.health_check().await.map_err(|e| {
        tracing::warn!(error = %e, "Chat provider not ready");
        AppError::ServiceUnavailable
    })?;
    Ok(StatusCode::OK)
}

pub async fn not_found() -> AppError {
    AppError::NotFound(anyhow::anyhow!("Not found"))
}
