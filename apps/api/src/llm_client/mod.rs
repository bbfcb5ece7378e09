//! LLM Client: the single point of entry for text-generation calls.
//!
//! ARCHITECTURAL RULE: No other module may call the provider API directly.
//! All LLM interactions MUST go through a `CompletionClient`.
//!
//! Model: gpt-5 (hardcoded)
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

pub mod extract;
#[cfg(test)]
pub(crate) mod fake;
pub mod prompts;

/// The model used for all quotation calls.
pub const MODEL: &str = "gpt-5";
const MAX_OUTPUT_TOKENS: u32 = 4096;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const FILE_PURPOSE: &str = "user_data";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("LLM returned invalid JSON: {source}")]
    InvalidJson {
        raw: String,
        #[source]
        source: serde_json::Error,
    },
}

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One part of an input message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    InputText { text: String },
    InputFile { file_id: String },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::InputText { text: text.into() }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InputMessage {
    pub role: Role,
    pub content: Vec<ContentPart>,
}

impl InputMessage {
    pub fn new(role: Role, content: Vec<ContentPart>) -> Self {
        Self { role, content }
    }
}

/// A provider-agnostic completion request.
///
/// `format` is the structured-output format object; see `quotation::schema::response_format`.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub input: Vec<InputMessage>,
    pub format: Value,
}

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: &'a [InputMessage],
    max_output_tokens: u32,
    text: TextConfig<'a>,
}

#[derive(Debug, Serialize)]
struct TextConfig<'a> {
    format: &'a Value,
}

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

/// A completion response. Providers fill either the flattened `output_text`
/// or the nested `output[].content[]` blocks, sometimes both.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub output_text: Option<String>,
    #[serde(default)]
    pub output: Vec<OutputItem>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputItem {
    #[serde(rename = "type", default)]
    pub item_type: String,
    #[serde(default)]
    pub content: Option<Vec<ContentBlock>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub refusal: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct FileObject {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// The text-generation collaborator. Constructed once at startup and carried
/// in `AppState` as `Arc<dyn CompletionClient>`; tests substitute a fake.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Sends one completion request. No retries.
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Uploads a file for use as model context and returns its provider id.
    async fn upload_file(&self, path: &Path, file_name: &str) -> Result<String, LlmError>;
}

/// OpenAI Responses API client.
///
/// NOTE: Do NOT derive `Debug` on this struct; `api_key` would be exposed.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, base_url: impl Into<String>) -> Result<Self, LlmError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            api_key,
            base_url,
        })
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = ResponsesRequest {
            model: MODEL,
            input: &request.input,
            max_output_tokens: MAX_OUTPUT_TOKENS,
            text: TextConfig {
                format: &request.format,
            },
        };

        let response = self
            .client
            .post(format!("{}/responses", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let response = check_status(response).await?;
        let completion: CompletionResponse = response.json().await?;

        if let Some(usage) = &completion.usage {
            debug!(
                "LLM call succeeded: input_tokens={}, output_tokens={}",
                usage.input_tokens, usage.output_tokens
            );
        }

        Ok(completion)
    }

    async fn upload_file(&self, path: &Path, file_name: &str) -> Result<String, LlmError> {
        let bytes = tokio::fs::read(path).await?;
        let part = multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("application/pdf")?;
        let form = multipart::Form::new()
            .text("purpose", FILE_PURPOSE)
            .part("file", part);

        let response = self
            .client
            .post(format!("{}/files", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let response = check_status(response).await?;
        let file: FileObject = response.json().await?;
        debug!("Uploaded attachment '{file_name}' as {}", file.id);
        Ok(file.id)
    }
}

/// Turns a non-success status into `LlmError::Api`, preferring the provider's
/// own `error.message` over the raw body.
async fn check_status(response: Response) -> Result<Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!("LLM API returned {}: {}", status, body);
    let message = serde_json::from_str::<ApiError>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);

    Err(LlmError::Api {
        status: status.as_u16(),
        message,
    })
}
