//! Scripted `CompletionClient` for tests. Records every request it sees.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::llm_client::{
    CompletionClient, CompletionRequest, CompletionResponse, ContentBlock, LlmError, OutputItem,
};

pub(crate) enum Reply {
    Flattened(String),
    Blocks(Vec<String>),
    Fail { status: u16, message: String },
}

pub(crate) struct FakeCompletionClient {
    reply: Reply,
    upload_failure: Option<(u16, String)>,
    requests: Mutex<Vec<CompletionRequest>>,
    uploads: Mutex<Vec<(String, PathBuf)>>,
}

impl FakeCompletionClient {
    pub(crate) fn new(reply: Reply) -> Self {
        Self {
            reply,
            upload_failure: None,
            requests: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn text(text: impl Into<String>) -> Self {
        Self::new(Reply::Flattened(text.into()))
    }

    pub(crate) fn json(value: &Value) -> Self {
        Self::text(value.to_string())
    }

    /// Makes every `upload_file` call fail with the given API error.
    pub(crate) fn failing_uploads(mut self, status: u16, message: impl Into<String>) -> Self {
        self.upload_failure = Some((status, message.into()));
        self
    }

    pub(crate) fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn uploads(&self) -> Vec<String> {
        self.uploads.lock().unwrap().iter().map(|(name, _)| name.clone()).collect()
    }

    /// Paths the staged files had when they were uploaded.
    pub(crate) fn upload_paths(&self) -> Vec<PathBuf> {
        self.uploads.lock().unwrap().iter().map(|(_, path)| path.clone()).collect()
    }
}

#[async_trait]
impl CompletionClient for FakeCompletionClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());

        match &self.reply {
            Reply::Flattened(text) => Ok(CompletionResponse {
                output_text: Some(text.clone()),
                ..Default::default()
            }),
            Reply::Blocks(parts) => Ok(CompletionResponse {
                output: vec![OutputItem {
                    item_type: "message".to_string(),
                    content: Some(
                        parts
                            .iter()
                            .map(|p| ContentBlock {
                                block_type: "output_text".to_string(),
                                text: Some(p.clone()),
                                refusal: None,
                            })
                            .collect(),
                    ),
                }],
                ..Default::default()
            }),
            Reply::Fail { status, message } => Err(LlmError::Api {
                status: *status,
                message: message.clone(),
            }),
        }
    }

    async fn upload_file(&self, path: &Path, file_name: &str) -> Result<String, LlmError> {
        assert!(path.exists(), "attachment must be staged on disk during upload");
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push((file_name.to_string(), path.to_path_buf()));

        if let Some((status, message)) = &self.upload_failure {
            return Err(LlmError::Api {
                status: *status,
                message: message.clone(),
            });
        }
        Ok(format!("file-{}", uploads.len()))
    }
}
