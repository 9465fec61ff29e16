//! Provider adapters
//!
//! One adapter per external completion service. ChatGPT and DeepSeek speak
//! the OpenAI chat-completions dialect and share [`OpenAiCompatProvider`];
//! Gemini has its own request and response shape in [`GeminiProvider`].

pub mod google;
pub mod openai_compat;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;

use crate::config::ProviderConfig;
use crate::error::ProviderError;

pub use google::GeminiProvider;
pub use openai_compat::OpenAiCompatProvider;
pub use types::{CompletionProvider, ProviderId};

/// Build the adapter for `id` from its configuration.
///
/// Every adapter owns its own HTTP client, credential and endpoint.
pub fn build_provider(
    id: ProviderId,
    config: &ProviderConfig,
) -> Result<Arc<dyn CompletionProvider>> {
    let client = http_client(config.timeout_secs)
        .with_context(|| format!("Failed to build HTTP client for {id}"))?;

    let provider: Arc<dyn CompletionProvider> = match id {
        ProviderId::ChatGpt | ProviderId::DeepSeek => {
            Arc::new(OpenAiCompatProvider::new(id, client, config.clone()))
        }
        ProviderId::Gemini => Arc::new(GeminiProvider::new(client, config.clone())),
    };
    Ok(provider)
}

fn http_client(timeout_secs: Option<u64>) -> reqwest::Result<Client> {
    let mut builder = Client::builder().user_agent(concat!("askall/", env!("CARGO_PKG_VERSION")));
    if let Some(secs) = timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder.build()
}

/// Pass successful responses through; turn anything else into
/// [`ProviderError::Status`] carrying the provider's own error message.
pub(crate) async fn check_status(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::Status {
        status: status.as_u16(),
        message: error_message(status, &body),
    })
}

/// Extract `error.message` from the `{"error": {"message": ...}}` envelope
/// used by OpenAI, DeepSeek and Gemini; fall back to the raw body, then to
/// the status line's reason phrase when the body is blank.
fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(|m| m.trim().to_string())
        })
        .filter(|m| !m.is_empty())
        .or_else(|| Some(body.trim().to_string()).filter(|b| !b.is_empty()))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("no response body").to_string())
}
