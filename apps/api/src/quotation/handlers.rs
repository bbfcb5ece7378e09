//! Axum route handlers for the Quotation API.

use axum::{
    extract::{Multipart, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_client::MODEL;
use crate::quotation::attachment::Attachment;
use crate::quotation::generator::{build_quotation, generate_quotation, QuotationRequest};
use crate::quotation::model::Quotation;
use crate::quotation::schema::quotation_schema;
use crate::render::{DOCX_FILE_NAME, DOCX_MIME};
use crate::state::AppState;

/// Multipart field names of the quotation form.
pub const FIELD_DESCRIPTION: &str = "descripcion";
pub const FIELD_AUTHORS: &str = "autores";
pub const FIELD_DOCUMENT: &str = "documento";

/// POST /api/v1/quotations
///
/// Full pipeline. Returns the rendered Word document as a download.
pub async fn handle_generate(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let request = read_form(multipart).await?;
    let request_id = Uuid::new_v4();

    let document = generate_quotation(
        state.llm.as_ref(),
        state.config.attachment_mode,
        &state.config.template_path,
        &request,
    )
    .instrument(info_span!("quotation", %request_id))
    .await?;

    let headers = [
        (header::CONTENT_TYPE, DOCX_MIME.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{DOCX_FILE_NAME}\""),
        ),
    ];
    Ok((headers, document.into_inner()).into_response())
}

/// POST /api/v1/quotations/preview
///
/// Same form as generate, but returns the normalized quotation as JSON
/// instead of rendering it.
pub async fn handle_preview(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Quotation>, AppError> {
    let request = read_form(multipart).await?;
    let request_id = Uuid::new_v4();

    let quotation = build_quotation(state.llm.as_ref(), state.config.attachment_mode, &request)
        .instrument(info_span!("quotation_preview", %request_id))
        .await?;

    Ok(Json(quotation))
}

/// GET /api/v1/quotations/schema
pub async fn handle_schema() -> Json<Value> {
    Json(quotation_schema())
}

/// GET /api/v1/meta
pub async fn handle_meta() -> Json<Value> {
    Json(json!({
        "model": MODEL,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Reads the quotation form. Unknown fields are ignored; an empty file part
/// counts as no attachment.
async fn read_form(mut multipart: Multipart) -> Result<QuotationRequest, AppError> {
    let mut request = QuotationRequest::default();

    while let Some(field) = multipart.next_field().await.map_err(invalid_form)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            FIELD_DESCRIPTION => request.description = field.text().await.map_err(invalid_form)?,
            FIELD_AUTHORS => request.authors = field.text().await.map_err(invalid_form)?,
            FIELD_DOCUMENT => {
                let file_name = field.file_name().map(String::from);
                let bytes = field.bytes().await.map_err(invalid_form)?;
                if !bytes.is_empty() {
                    request.attachment = Some(Attachment::new(file_name, bytes));
                }
            }
            _ => {}
        }
    }

    Ok(request)
}

fn invalid_form(err: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Validation(format!("Invalid form data: {err}"))
}
