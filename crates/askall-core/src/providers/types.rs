//! Provider identity and the completion trait every adapter implements

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// The three fixed providers a prompt is fanned out to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    ChatGpt,
    Gemini,
    DeepSeek,
}

impl ProviderId {
    pub const ALL: [ProviderId; 3] = [Self::ChatGpt, Self::Gemini, Self::DeepSeek];

    /// Field name in the aggregated response
    pub fn key(&self) -> &'static str {
        match self {
            Self::ChatGpt => "chatgpt",
            Self::Gemini => "gemini",
            Self::DeepSeek => "deepseek",
        }
    }

    /// Name used in `"Error calling <name>: ..."` strings
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::ChatGpt => "ChatGPT",
            Self::Gemini => "Gemini",
            Self::DeepSeek => "DeepSeek",
        }
    }

    /// Environment variable holding this provider's API key
    pub fn env_var(&self) -> &'static str {
        match self {
            Self::ChatGpt => "OPENAI_API_KEY",
            Self::Gemini => "GEMINI_API_KEY",
            Self::DeepSeek => "DEEPSEEK_API_KEY",
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Trait that all provider adapters implement
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Which of the three providers this adapter talks to
    fn id(&self) -> ProviderId;

    /// Model identifier (e.g. "gpt-3.5-turbo", "deepseek-chat")
    fn model(&self) -> &str;

    /// Send a single-turn prompt and return the trimmed completion text
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;
}
