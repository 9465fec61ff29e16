//! Startup configuration: TOML file layered with environment credentials
//!
//! Read once at startup into an immutable [`AskAllConfig`] that is handed to
//! whoever constructs the adapters. Missing credentials are not an error
//! here; they surface per call as "API key is not configured".

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::providers::ProviderId;

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "askall.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AskAllConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Directory served verbatim for every path other than the API route
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_public_dir() -> PathBuf {
    PathBuf::from("public")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            public_dir: default_public_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default = "default_chatgpt")]
    pub chatgpt: ProviderConfig,
    #[serde(default = "default_gemini")]
    pub gemini: ProviderConfig,
    #[serde(default = "default_deepseek")]
    pub deepseek: ProviderConfig,
}

fn default_chatgpt() -> ProviderConfig {
    ProviderConfig::default_for(ProviderId::ChatGpt)
}
fn default_gemini() -> ProviderConfig {
    ProviderConfig::default_for(ProviderId::Gemini)
}
fn default_deepseek() -> ProviderConfig {
    ProviderConfig::default_for(ProviderId::DeepSeek)
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            chatgpt: default_chatgpt(),
            gemini: default_gemini(),
            deepseek: default_deepseek(),
        }
    }
}

impl ProvidersConfig {
    pub fn get(&self, id: ProviderId) -> &ProviderConfig {
        match id {
            ProviderId::ChatGpt => &self.chatgpt,
            ProviderId::Gemini => &self.gemini,
            ProviderId::DeepSeek => &self.deepseek,
        }
    }

    fn get_mut(&mut self, id: ProviderId) -> &mut ProviderConfig {
        match id {
            ProviderId::ChatGpt => &mut self.chatgpt,
            ProviderId::Gemini => &mut self.gemini,
            ProviderId::DeepSeek => &mut self.deepseek,
        }
    }
}

/// Per-provider endpoint, model and credential.
///
/// Fields left out of a `[providers.<name>]` table fall back to that
/// provider's defaults, not to another provider's.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub model: String,
    /// Whole-request timeout; unset leaves the transport default in place
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ProviderConfig {
    pub fn default_for(id: ProviderId) -> Self {
        let (base_url, model) = match id {
            ProviderId::ChatGpt => ("https://api.openai.com/v1", "gpt-3.5-turbo"),
            ProviderId::Gemini => (
                "https://generativelanguage.googleapis.com/v1beta",
                "gemini-2.5-flash-lite",
            ),
            ProviderId::DeepSeek => ("https://api.deepseek.com/v1", "deepseek-chat"),
        };
        Self {
            api_key: None,
            base_url: base_url.to_string(),
            model: model.to_string(),
            timeout_secs: None,
        }
    }

    fn fill_defaults(&mut self, id: ProviderId) {
        let defaults = Self::default_for(id);
        if self.base_url.trim().is_empty() {
            self.base_url = defaults.base_url;
        }
        if self.model.trim().is_empty() {
            self.model = defaults.model;
        }
        if self.api_key.as_deref().is_some_and(|k| k.trim().is_empty()) {
            self.api_key = None;
        }
    }
}

impl AskAllConfig {
    /// Load configuration for startup.
    ///
    /// An explicit `path` must exist. Without one, `askall.toml` in the
    /// working directory is used when present, otherwise defaults. Provider
    /// keys from the process environment are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    Self::from_file(fallback)?
                } else {
                    debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                    Self::default()
                }
            }
        };
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content).context("Failed to parse TOML")?;
        for id in ProviderId::ALL {
            config.providers.get_mut(id).fill_defaults(id);
        }
        Ok(config)
    }

    /// Override provider keys from the environment. Empty values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for id in ProviderId::ALL {
            let value = lookup(id.env_var())
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty());
            if let Some(key) = value {
                debug!(provider = %id, "API key taken from {}", id.env_var());
                self.providers.get_mut(id).api_key = Some(key);
            }
        }
    }

    /// Providers that will fail every call for lack of a key
    pub fn missing_credentials(&self) -> Vec<ProviderId> {
        ProviderId::ALL
            .into_iter()
            .filter(|id| self.providers.get(*id).api_key.is_none())
            .collect()
    }
}
