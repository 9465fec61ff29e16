//! askall-core: ask three LLM providers the same question at once
//!
//! Holds the startup configuration, one adapter per provider behind the
//! [`CompletionProvider`] trait, and the [`Dispatcher`] that fans a prompt
//! out to all three and joins the results.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod providers;

#[cfg(test)]
mod test_support;

pub use config::{AskAllConfig, ProviderConfig, ProvidersConfig, ServerConfig};
pub use dispatch::{AggregatedResponse, Dispatcher, contain};
pub use error::{DispatchError, ProviderError};
pub use providers::{CompletionProvider, ProviderId};
