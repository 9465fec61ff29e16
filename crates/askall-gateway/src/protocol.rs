//! JSON bodies of the `/ask-all` endpoint

use serde::{Deserialize, Serialize};

pub use askall_core::AggregatedResponse;

/// Route the aggregated fan-out is served on
pub const ASK_ALL_PATH: &str = "/ask-all";

/// Body of a 400 when no usable prompt was sent
pub const ERR_PROMPT_MISSING: &str = "Prompt is missing";

/// Body of a 500 when the fan-out itself failed
pub const ERR_INTERNAL: &str = "Something went wrong on the server.";

/// Client → server request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

impl AskRequest {
    /// The prompt, if present and non-empty
    pub fn prompt(&self) -> Option<&str> {
        self.prompt.as_deref().filter(|p| !p.is_empty())
    }
}

/// Error body for 4xx/5xx responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
