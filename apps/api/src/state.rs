use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::CompletionClient;

/// Shared application state injected into all route handlers via Axum extractors.
/// Immutable; nothing is shared between requests beyond these collaborators.
#[derive(Clone)]
pub struct AppState {
    /// Text-generation collaborator. `OpenAiClient` in production, a fake in tests.
    pub llm: Arc<dyn CompletionClient>,
    pub config: Config,
}
