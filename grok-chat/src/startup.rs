//! Router assembly and server lifecycle.

use crate::config::Settings;
use crate::handlers::{
    chat::{index, submit},
    health::{health_check, not_found, readiness_check},
    metrics::metrics,
};
use crate::services::providers::xai::{XaiChatProvider, XaiConfig};
use crate::services::providers::ChatProvider;
use crate::services::ChatService;
use crate::AppState;
use axum::{extract::DefaultBodyLimit, middleware::from_fn, routing::get, Router};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware, security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

pub fn build_router(state: AppState) -> Router {
    let max_upload_bytes = state.chat.settings().max_upload_bytes;

    Router::new()
        .route("/", get(index).post(submit))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        // Outermost so the span above already sees the request id
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the provider, chat service and router, and bind the listener.
    pub async fn build(settings: Settings) -> Result<Self, AppError> {
        let xai_config = XaiConfig::from(&settings.xai);
        if xai_config.api_key.is_none() {
            tracing::warn!(
                "{} is not set; submissions will fail until it is configured",
                crate::config::API_KEY_ENV
            );
        }

        let provider: Arc<dyn ChatProvider> = Arc::new(
            XaiChatProvider::new(xai_config).map_err(|e| AppError::ConfigError(e.into()))?,
        );

        tracing::info!(
            variant = ?settings.chat.variant,
            model = %settings.chat.model(),
            base_url = %settings.xai.base_url,
            timeout_secs = settings.xai.timeout_secs,
            sanitize_html = settings.chat.sanitize_html,
            "Initialized xAI chat provider"
        );

        let chat = Arc::new(ChatService::new(provider, settings.chat.clone()));
        let router = build_router(AppState::new(chat));

        let address = settings.server.address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", address, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    /// Port the server is listening on (useful when configured with port 0).
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until Ctrl+C or SIGTERM.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        tracing::info!("Starting grok-chat on port {}", self.port);
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
