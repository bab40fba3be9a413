use crate::config::Variant;
use crate::models::{ChatSubmission, Reply, UploadedFile};
use crate::AppState;
use askama::Template;
use axum::{
    extract::{FromRequest, Multipart, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{Html, IntoResponse, Response},
    Form,
};
use serde::Deserialize;
use service_core::error::AppError;
use thiserror::Error;

#[derive(Template)]
#[template(path = "chat.html")]
pub struct ChatPage<'a> {
    pub label: &'a str,
    pub prompt: &'a str,
    /// Trusted HTML, emitted without escaping.
    pub response_html: Option<String>,
    pub response_text: Option<String>,
    pub error: Option<String>,
}

impl<'a> ChatPage<'a> {
    pub fn empty(variant: Variant) -> Self {
        Self {
            label: variant.display_name(),
            prompt: "",
            response_html: None,
            response_text: None,
            error: None,
        }
    }

    pub fn replied(variant: Variant, prompt: &'a str, reply: Reply) -> Self {
        let (response_html, response_text) = match reply {
            Reply::Html(html) => (Some(html), None),
            Reply::Text(text) => (None, Some(text)),
        };
        Self {
            prompt,
            response_html,
            response_text,
            ..Self::empty(variant)
        }
    }

    pub fn failed(variant: Variant, prompt: &'a str, error: String) -> Self {
        Self {
            prompt,
            error: Some(error),
            ..Self::empty(variant)
        }
    }
}

/// A body that claims to be a form but cannot be read as one.
#[derive(Debug, Error)]
#[error("Invalid form submission: {message}")]
struct FormRejection {
    status: StatusCode,
    message: String,
}

/// Urlencoded posts carry only the prompt.
#[derive(Deserialize)]
struct PromptForm {
    #[serde(default)]
    prompt: Option<String>,
}

pub async fn index(State(state): State<AppState>) -> Response {
    render(ChatPage::empty(state.chat.settings().variant), StatusCode::OK)
}

pub async fn submit(State(state): State<AppState>, request: Request) -> Response {
    let variant = state.chat.settings().variant;

    let submission = match read_submission(request).await {
        Ok(submission) => submission,
        Err(e) => {
            tracing::warn!(error = %e, "Unreadable chat form");
            state.chat.record_rejected_form();
            return render(ChatPage::failed(variant, "", e.to_string()), e.status);
        }
    };

    let prompt = submission.prompt.clone();
    match state.chat.respond(submission).await {
        Ok(reply) => render(ChatPage::replied(variant, &prompt, reply), StatusCode::OK),
        Err(e) => render(ChatPage::failed(variant, &prompt, e.to_string()), StatusCode::OK),
    }
}

fn render(page: ChatPage<'_>, status: StatusCode) -> Response {
    match page.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to render chat page");
            AppError::InternalError(anyhow::Error::new(e)).into_response()
        }
    }
}

/// Accept `multipart/form-data` (prompt and file) or a urlencoded form. Any
/// other body carries no form fields, so it reads as an empty submission.
async fn read_submission(request: Request) -> Result<ChatSubmission, FormRejection> {
    let mime = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|value| value.trim().to_ascii_lowercase())
        .unwrap_or_default();

    match mime.as_str() {
        "multipart/form-data" => read_multipart(request).await,
        "application/x-www-form-urlencoded" => {
            let Form(form) = Form::<PromptForm>::from_request(request, &())
                .await
                .map_err(|rejection| FormRejection {
                    status: rejection.status(),
                    message: rejection.body_text(),
                })?;

            Ok(ChatSubmission {
                prompt: form.prompt.unwrap_or_default(),
                file: None,
            })
        }
        _ => Ok(ChatSubmission::default()),
    }
}

async fn read_multipart(request: Request) -> Result<ChatSubmission, FormRejection> {
    let mut multipart =
        Multipart::from_request(request, &())
            .await
            .map_err(|rejection| FormRejection {
                status: rejection.status(),
                message: rejection.body_text(),
            })?;

    let mut submission = ChatSubmission::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("prompt") => {
                submission.prompt = field.text().await.map_err(multipart_error)?;
            }
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                submission.file = Some(UploadedFile {
                    file_name,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {}
        }
    }

    Ok(submission)
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> FormRejection {
    FormRejection {
        status: e.status(),
        message: e.body_text(),
    }
}
