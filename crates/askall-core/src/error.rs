//! Error types for provider calls and the fan-out join

use thiserror::Error;

use crate::providers::ProviderId;

/// Failure of a single provider call.
///
/// The `Display` form is what callers see after `"Error calling <Provider>: "`.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("API key is not configured")]
    MissingApiKey,

    #[error("{status} {message}")]
    Status { status: u16, message: String },

    #[error("{}", source_chain(.0))]
    Transport(reqwest::Error),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("response was blocked: {0}")]
    Blocked(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        // Request URLs can carry credentials; never render them.
        Self::Transport(err.without_url())
    }
}

/// Render an error and its causes as `outer: inner: root`.
///
/// reqwest's own `Display` stops at the top-level kind ("error sending
/// request"), which hides whether the connect, DNS lookup or timeout failed.
fn source_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut last = rendered.clone();
    let mut cause = err.source();
    while let Some(inner) = cause {
        let text = inner.to_string();
        // hyper and the OS layer sometimes repeat the same message
        if !text.is_empty() && !last.ends_with(&text) {
            rendered.push_str(": ");
            rendered.push_str(&text);
        }
        last = text;
        cause = inner.source();
    }
    rendered
}

/// Failure of the fan-out/fan-in itself, outside any adapter.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("{provider} task failed to complete: {source}")]
    Join {
        provider: ProviderId,
        #[source]
        source: tokio::task::JoinError,
    },
}
