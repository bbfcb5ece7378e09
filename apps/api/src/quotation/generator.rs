//! Quotation Generation: orchestrates the full pipeline for one request.
//!
//! Flow: check input → stage attachment → build prompt → completion call →
//!       extract JSON → normalize → shape-check → render.
//!
//! Every step either succeeds or halts the request. Nothing is retried and no
//! document is produced from a failed step.

use std::io::Cursor;
use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::AttachmentMode;
use crate::errors::AppError;
use crate::llm_client::extract::extract_json;
use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, NO_NULLS_INSTRUCTION};
use crate::llm_client::{CompletionClient, CompletionRequest, ContentPart, InputMessage, Role};
use crate::quotation::attachment::{stage_pdf, Attachment};
use crate::quotation::model::Quotation;
use crate::quotation::normalizer::normalize;
use crate::quotation::prompts::{
    ATTACHMENT_CAPTION, DESCRIPTION_PREFIX, HOURLY_RATE_COP, QUOTATION_INSTRUCTIONS_TEMPLATE,
};
use crate::quotation::schema::response_format;
use crate::render::render_docx;

/// Upper bound on PDF text embedded in the prompt in inline mode.
const MAX_INLINE_CHARS: usize = 40_000;

/// What the user submitted.
#[derive(Debug, Clone, Default)]
pub struct QuotationRequest {
    pub description: String,
    /// Comma-separated author names. Authoritative over anything the model returns.
    pub authors: String,
    pub attachment: Option<Attachment>,
}

/// Runs the pipeline up to (not including) rendering.
pub async fn build_quotation(
    llm: &dyn CompletionClient,
    mode: AttachmentMode,
    request: &QuotationRequest,
) -> Result<Quotation, AppError> {
    if request.description.trim().is_empty() && request.attachment.is_none() {
        return Err(AppError::Validation(
            "Write a ticket description or attach a document before generating a quotation."
                .to_string(),
        ));
    }

    // Staged file is removed when `staged` drops, on every path out of this function.
    let staged = match &request.attachment {
        Some(attachment) => {
            let extract_text = mode == AttachmentMode::Inline;
            Some(stage_pdf(attachment, extract_text).await?)
        }
        None => None,
    };

    let attachment_part = match (&staged, mode) {
        (None, _) => None,
        (Some(pdf), AttachmentMode::Upload) => {
            let file_id = llm.upload_file(pdf.path(), &pdf.file_name).await?;
            info!("Attachment '{}' uploaded as {file_id}", pdf.file_name);
            Some(ContentPart::InputFile { file_id })
        }
        (Some(pdf), AttachmentMode::Inline) => {
            let excerpt = pdf.excerpt(MAX_INLINE_CHARS).trim();
            if excerpt.is_empty() {
                if request.description.trim().is_empty() {
                    return Err(AppError::Validation(format!(
                        "Attachment '{}' has no extractable text and no description was given",
                        pdf.file_name
                    )));
                }
                warn!("Attachment '{}' has no extractable text; skipping", pdf.file_name);
                None
            } else {
                Some(ContentPart::text(excerpt))
            }
        }
    };
    drop(staged);

    let today = chrono::Local::now().date_naive();
    let completion = build_completion_request(request, attachment_part, today);

    info!("Requesting quotation from model");
    let response = llm.complete(&completion).await?;
    let parsed = extract_json(&response)?;

    let quotation = normalize_response(parsed, &request.authors)?;
    quotation.tiempo_inversion.warn_on_inconsistencies();
    info!(
        "Quotation '{}' ready: {} activities, {} hours",
        quotation.nombre_requerimiento,
        quotation.tiempo_inversion.detalle.len(),
        quotation.tiempo_inversion.total_horas
    );

    Ok(quotation)
}

/// Full pipeline: build the quotation and render it into the Word template.
pub async fn generate_quotation(
    llm: &dyn CompletionClient,
    mode: AttachmentMode,
    template_path: &Path,
    request: &QuotationRequest,
) -> Result<Cursor<Vec<u8>>, AppError> {
    let quotation = build_quotation(llm, mode, request).await?;

    // Template read, zip rewrite and Tera rendering are blocking work
    let template_path = template_path.to_path_buf();
    tokio::task::spawn_blocking(move || render_quotation(&quotation, &template_path))
        .await
        .context("Render task failed")?
}

/// Normalizes parsed model output and shape-checks it into a `Quotation`.
pub fn normalize_response(parsed: Value, authors: &str) -> Result<Quotation, AppError> {
    let Value::Object(mut record) = parsed else {
        return Err(AppError::SchemaMismatch(format!(
            "expected a JSON object, got {}",
            json_kind(&parsed)
        )));
    };
    normalize(&mut record, authors);
    Quotation::from_record(record)
}

pub fn render_quotation(
    quotation: &Quotation,
    template_path: &Path,
) -> Result<Cursor<Vec<u8>>, AppError> {
    let data = serde_json::to_value(quotation).context("Failed to serialize quotation")?;
    let document = render_docx(&data, template_path)?;
    info!(
        "Rendered {} ({} bytes)",
        template_path.display(),
        document.get_ref().len()
    );
    Ok(document)
}

/// Builds the completion request: system rules, instructions + description,
/// then the attachment (if any) in its own message.
pub fn build_completion_request(
    request: &QuotationRequest,
    attachment: Option<ContentPart>,
    today: NaiveDate,
) -> CompletionRequest {
    let instructions = QUOTATION_INSTRUCTIONS_TEMPLATE
        .replace("{today}", &today.format("%Y-%m-%d").to_string())
        .replace("{hourly_rate}", &group_thousands(HOURLY_RATE_COP))
        .replace("{no_nulls_instruction}", NO_NULLS_INSTRUCTION)
        .replace("{authors}", request.authors.trim());

    let mut input = vec![
        InputMessage::new(Role::System, vec![ContentPart::text(JSON_ONLY_SYSTEM)]),
        InputMessage::new(
            Role::User,
            vec![
                ContentPart::text(instructions),
                ContentPart::text(format!(
                    "{DESCRIPTION_PREFIX} {}",
                    request.description.trim()
                )),
            ],
        ),
    ];

    if let Some(part) = attachment {
        input.push(InputMessage::new(
            Role::User,
            vec![ContentPart::text(ATTACHMENT_CAPTION), part],
        ));
    }

    CompletionRequest {
        input,
        format: response_format(),
    }
}

/// 93000 → "93.000"
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
