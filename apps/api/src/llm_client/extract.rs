//! Response extraction: turns a completion response into parsed JSON.
//!
//! Flow: pick the response shape → collect text → strip code fences → parse.
//! Failures are terminal: no default document is ever substituted.

use serde_json::Value;
use tracing::warn;

use crate::llm_client::{CompletionResponse, LlmError, OutputItem};

/// The two response shapes providers return.
#[derive(Debug, Clone, Copy)]
pub enum ResponseBody<'a> {
    /// A single pre-joined text field.
    Flattened(&'a str),
    /// Output items carrying typed content blocks.
    Blocks(&'a [OutputItem]),
}

impl CompletionResponse {
    /// Flattened text wins when it is non-empty; otherwise fall back to the blocks.
    pub fn body(&self) -> ResponseBody<'_> {
        match self.output_text.as_deref() {
            Some(text) if !text.trim().is_empty() => ResponseBody::Flattened(text),
            _ => ResponseBody::Blocks(&self.output),
        }
    }
}

/// Extracts the generated text, or `EmptyContent` if there is none.
pub fn extract_text(response: &CompletionResponse) -> Result<String, LlmError> {
    let text = raw_text(response);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(LlmError::EmptyContent);
    }
    Ok(trimmed.to_string())
}

/// Extracts, unfences and parses the generated JSON.
///
/// On a parse failure the error carries the text exactly as the model
/// returned it, surrounding whitespace included.
pub fn extract_json(response: &CompletionResponse) -> Result<Value, LlmError> {
    let raw = raw_text(response);
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(LlmError::EmptyContent);
    }

    serde_json::from_str(strip_code_fences(trimmed)).map_err(|source| LlmError::InvalidJson {
        raw: raw.clone(),
        source,
    })
}

fn raw_text(response: &CompletionResponse) -> String {
    match response.body() {
        ResponseBody::Flattened(text) => text.to_string(),
        ResponseBody::Blocks(items) => collect_block_text(items),
    }
}

fn collect_block_text(items: &[OutputItem]) -> String {
    let mut text = String::new();
    for block in items.iter().flat_map(|item| item.content.iter().flatten()) {
        match block.block_type.as_str() {
            "output_text" | "text" => {
                if let Some(t) = &block.text {
                    text.push_str(t);
                }
            }
            "refusal" => warn!(
                "Model refused: {}",
                block.refusal.as_deref().unwrap_or("<no reason given>")
            ),
            _ => {}
        }
    }
    text
}

/// Strips a ```lang ... ``` fence wrapping the whole text.
///
/// Only applies when the text starts with a fence. The whole opening line
/// goes, info string included; the closing fence is optional, since
/// truncated output often loses it.
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };

    let rest = match rest.split_once('\n') {
        Some((_, body)) => body,
        // single-line fence: only a bare language tag can precede the body
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-'),
    };
    let rest = rest.trim();
    rest.strip_suffix("```")
        .map(|s| s.trim_end())
        .unwrap_or(rest)
}
