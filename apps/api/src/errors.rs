use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;
use crate::render::RenderError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Every variant halts the current request. Nothing here is retried.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("The model returned no text")]
    EmptyResponse,

    #[error("The model returned invalid JSON: {message}")]
    InvalidJson { message: String, raw: String },

    #[error("Model output does not match the quotation schema: {0}")]
    SchemaMismatch(String),

    #[error("Template render error: {0}")]
    TemplateRender(String),

    #[error("Upstream call failed: {0}")]
    Upstream(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::EmptyContent => AppError::EmptyResponse,
            LlmError::InvalidJson { raw, source } => AppError::InvalidJson {
                message: source.to_string(),
                raw,
            },
            other => AppError::Upstream(other.to_string()),
        }
    }
}

impl From<RenderError> for AppError {
    fn from(err: RenderError) -> Self {
        AppError::TemplateRender(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut raw_text = None;

        let (status, code, message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
            AppError::EmptyResponse => {
                tracing::error!("Model returned an empty response");
                (
                    StatusCode::BAD_GATEWAY,
                    "EMPTY_RESPONSE",
                    "No text could be extracted from the model response".to_string(),
                )
            }
            AppError::InvalidJson { message, raw } => {
                tracing::error!("Invalid JSON from model: {message}");
                raw_text = Some(raw);
                (
                    StatusCode::BAD_GATEWAY,
                    "INVALID_JSON",
                    format!("The model returned invalid JSON: {message}"),
                )
            }
            AppError::SchemaMismatch(msg) => {
                tracing::error!("Schema mismatch: {msg}");
                (StatusCode::BAD_GATEWAY, "SCHEMA_MISMATCH", msg)
            }
            AppError::TemplateRender(msg) => {
                tracing::error!("Template render error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "TEMPLATE_RENDER_ERROR",
                    format!("Failed to render the Word template: {msg}"),
                )
            }
            AppError::Upstream(msg) => {
                tracing::error!("Upstream error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_ERROR",
                    format!("Error calling the text-generation service: {msg}"),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(raw) = raw_text {
            error["raw"] = json!(raw);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
