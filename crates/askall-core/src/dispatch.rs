//! Fan-out / fan-in over the three providers
//!
//! Each adapter runs as its own task and converts its own failure into a
//! plain `"Error calling <Provider>: <message>"` string, so one provider can
//! never stop the other two from being reported. The only failure left for
//! the caller is the join itself breaking (an adapter task panicking).

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::task::{JoinError, JoinHandle};
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use crate::config::ProvidersConfig;
use crate::error::{DispatchError, ProviderError};
use crate::providers::{CompletionProvider, ProviderId, build_provider};

/// One result per provider. Success text and error strings share the same
/// field; errors are recognisable by their `"Error calling "` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedResponse {
    pub chatgpt: String,
    pub gemini: String,
    pub deepseek: String,
}

impl AggregatedResponse {
    pub fn get(&self, id: ProviderId) -> &str {
        match id {
            ProviderId::ChatGpt => &self.chatgpt,
            ProviderId::Gemini => &self.gemini,
            ProviderId::DeepSeek => &self.deepseek,
        }
    }
}

/// Turn a provider outcome into its response field.
pub fn contain(id: ProviderId, outcome: Result<String, ProviderError>) -> String {
    match outcome {
        Ok(text) => text,
        Err(e) => {
            warn!(provider = %id, error = %e, "Provider call failed");
            format!("Error calling {}: {}", id.display_name(), e)
        }
    }
}

/// Sends one prompt to all three providers concurrently
#[derive(Clone)]
pub struct Dispatcher {
    chatgpt: Arc<dyn CompletionProvider>,
    gemini: Arc<dyn CompletionProvider>,
    deepseek: Arc<dyn CompletionProvider>,
}

impl Dispatcher {
    pub fn new(
        chatgpt: Arc<dyn CompletionProvider>,
        gemini: Arc<dyn CompletionProvider>,
        deepseek: Arc<dyn CompletionProvider>,
    ) -> Self {
        Self {
            chatgpt,
            gemini,
            deepseek,
        }
    }

    /// Build the three real adapters from startup configuration
    pub fn from_config(config: &ProvidersConfig) -> Result<Self> {
        let chatgpt = build_provider(ProviderId::ChatGpt, &config.chatgpt)?;
        let gemini = build_provider(ProviderId::Gemini, &config.gemini)?;
        let deepseek = build_provider(ProviderId::DeepSeek, &config.deepseek)?;
        for provider in [&chatgpt, &gemini, &deepseek] {
            info!(provider = %provider.id(), model = provider.model(), "Provider ready");
        }
        Ok(Self::new(chatgpt, gemini, deepseek))
    }

    pub fn provider(&self, id: ProviderId) -> &Arc<dyn CompletionProvider> {
        match id {
            ProviderId::ChatGpt => &self.chatgpt,
            ProviderId::Gemini => &self.gemini,
            ProviderId::DeepSeek => &self.deepseek,
        }
    }

    /// Ask all three providers and wait until every one has settled.
    ///
    /// Returns `Err` only when an adapter task could not be joined; no
    /// partial response is ever produced.
    pub async fn ask_all(&self, prompt: &str) -> Result<AggregatedResponse, DispatchError> {
        let request_id = Uuid::new_v4();
        let span = info_span!("ask_all", %request_id);
        let prompt: Arc<str> = Arc::from(prompt);
        let started = Instant::now();

        let [chatgpt, gemini, deepseek] =
            ProviderId::ALL.map(|id| self.spawn(id, prompt.clone(), span.clone()));

        // Wait for all three before looking at any outcome.
        let (chatgpt, gemini, deepseek) = tokio::join!(chatgpt, gemini, deepseek);

        let response = AggregatedResponse {
            chatgpt: joined(ProviderId::ChatGpt, chatgpt)?,
            gemini: joined(ProviderId::Gemini, gemini)?,
            deepseek: joined(ProviderId::DeepSeek, deepseek)?,
        };

        info!(
            parent: &span,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "All providers settled"
        );
        Ok(response)
    }

    fn spawn(&self, id: ProviderId, prompt: Arc<str>, span: tracing::Span) -> JoinHandle<String> {
        let provider = Arc::clone(self.provider(id));
        tokio::spawn(
            async move {
                let outcome = provider.complete(&prompt).await;
                contain(id, outcome)
            }
            .instrument(span),
        )
    }
}

fn joined(id: ProviderId, result: Result<String, JoinError>) -> Result<String, DispatchError> {
    result.map_err(|source| {
        error!(provider = %id, error = %source, "Provider task did not complete");
        DispatchError::Join {
            provider: id,
            source,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    enum Behaviour {
        Reply(&'static str),
        Fail(&'static str),
        Panic,
    }

    struct MockProvider {
        id: ProviderId,
        delay: Duration,
        behaviour: Behaviour,
        calls: AtomicUsize,
    }

    impl MockProvider {
        fn new(id: ProviderId, behaviour: Behaviour) -> Arc<Self> {
            Self::delayed(id, behaviour, Duration::ZERO)
        }

        fn delayed(id: ProviderId, behaviour: Behaviour, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                id,
                delay,
                behaviour,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl CompletionProvider for MockProvider {
        fn id(&self) -> ProviderId {
            self.id
        }

        fn model(&self) -> &str {
            "mock"
        }

        async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            match self.behaviour {
                Behaviour::Reply(text) => Ok(text.replace("{prompt}", prompt)),
                Behaviour::Fail(msg) => Err(ProviderError::Malformed(msg.to_string())),
                Behaviour::Panic => panic!("adapter blew up"),
            }
        }
    }

    fn dispatcher(
        chatgpt: Arc<MockProvider>,
        gemini: Arc<MockProvider>,
        deepseek: Arc<MockProvider>,
    ) -> Dispatcher {
        Dispatcher::new(chatgpt, gemini, deepseek)
    }

    #[tokio::test]
    async fn test_all_succeed() {
        let d = dispatcher(
            MockProvider::new(ProviderId::ChatGpt, Behaviour::Reply("4")),
            MockProvider::new(ProviderId::Gemini, Behaviour::Reply("4")),
            MockProvider::new(ProviderId::DeepSeek, Behaviour::Reply("4")),
        );
        let response = d.ask_all("2+2?").await.unwrap();
        assert_eq!(
            response,
            AggregatedResponse {
                chatgpt: "4".to_string(),
                gemini: "4".to_string(),
                deepseek: "4".to_string(),
            }
        );
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            serde_json::json!({"chatgpt": "4", "gemini": "4", "deepseek": "4"})
        );
    }

    #[tokio::test]
    async fn test_every_provider_gets_the_same_prompt() {
        let d = dispatcher(
            MockProvider::new(ProviderId::ChatGpt, Behaviour::Reply("c:{prompt}")),
            MockProvider::new(ProviderId::Gemini, Behaviour::Reply("g:{prompt}")),
            MockProvider::new(ProviderId::DeepSeek, Behaviour::Reply("d:{prompt}")),
        );
        let response = d.ask_all("hello").await.unwrap();
        assert_eq!(response.get(ProviderId::ChatGpt), "c:hello");
        assert_eq!(response.get(ProviderId::Gemini), "g:hello");
        assert_eq!(response.get(ProviderId::DeepSeek), "d:hello");
    }

    #[tokio::test]
    async fn test_one_failure_is_contained() {
        let d = dispatcher(
            MockProvider::new(ProviderId::ChatGpt, Behaviour::Reply("hi there")),
            MockProvider::new(ProviderId::Gemini, Behaviour::Fail("network down")),
            MockProvider::new(ProviderId::DeepSeek, Behaviour::Reply("hello!")),
        );
        let response = d.ask_all("hello").await.unwrap();
        assert_eq!(response.chatgpt, "hi there");
        assert_eq!(
            response.gemini,
            "Error calling Gemini: malformed response: network down"
        );
        assert_eq!(response.deepseek, "hello!");
    }

    #[tokio::test]
    async fn test_all_failures_still_ok() {
        let d = dispatcher(
            MockProvider::new(ProviderId::ChatGpt, Behaviour::Fail("a")),
            MockProvider::new(ProviderId::Gemini, Behaviour::Fail("b")),
            MockProvider::new(ProviderId::DeepSeek, Behaviour::Fail("c")),
        );
        let response = d.ask_all("hello").await.unwrap();
        assert!(response.chatgpt.starts_with("Error calling ChatGPT: "));
        assert!(response.gemini.starts_with("Error calling Gemini: "));
        assert!(response.deepseek.starts_with("Error calling DeepSeek: "));
    }

    #[tokio::test]
    async fn test_latency_is_max_not_sum() {
        let d = dispatcher(
            MockProvider::delayed(
                ProviderId::ChatGpt,
                Behaviour::Reply("a"),
                Duration::from_millis(100),
            ),
            MockProvider::delayed(
                ProviderId::Gemini,
                Behaviour::Reply("b"),
                Duration::from_millis(200),
            ),
            MockProvider::delayed(
                ProviderId::DeepSeek,
                Behaviour::Reply("c"),
                Duration::from_millis(50),
            ),
        );
        let started = Instant::now();
        d.ask_all("hello").await.unwrap();
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(200), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(330), "{elapsed:?}");
    }

    #[tokio::test]
    async fn test_panic_is_coordination_error() {
        let chatgpt = MockProvider::new(ProviderId::ChatGpt, Behaviour::Reply("ok"));
        let deepseek = MockProvider::delayed(
            ProviderId::DeepSeek,
            Behaviour::Reply("ok"),
            Duration::from_millis(50),
        );
        let d = dispatcher(
            chatgpt.clone(),
            MockProvider::new(ProviderId::Gemini, Behaviour::Panic),
            deepseek.clone(),
        );
        let err = d.ask_all("hello").await.unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Join {
                provider: ProviderId::Gemini,
                ..
            }
        ));
        assert_eq!(chatgpt.calls.load(Ordering::SeqCst), 1);
        assert_eq!(deepseek.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_contain_formats_error() {
        let text = contain(ProviderId::DeepSeek, Err(ProviderError::MissingApiKey));
        assert_eq!(text, "Error calling DeepSeek: API key is not configured");
        assert_eq!(contain(ProviderId::ChatGpt, Ok("fine".to_string())), "fine");
    }

    #[test]
    fn test_from_config_builds_all_three() {
        let d = Dispatcher::from_config(&ProvidersConfig::default()).unwrap();
        for id in ProviderId::ALL {
            assert_eq!(d.provider(id).id(), id);
        }
    }

    #[tokio::test]
    async fn test_network_fault_keeps_its_cause() {
        let mut config = ProvidersConfig::default();
        config.gemini.api_key = Some("g-secret".to_string());
        config.gemini.base_url = "http://127.0.0.1:1".to_string();
        let gemini = build_provider(ProviderId::Gemini, &config.gemini).unwrap();

        let text = contain(ProviderId::Gemini, gemini.complete("hello").await);
        assert!(
            text.starts_with("Error calling Gemini: error sending request: "),
            "{text}"
        );
        assert!(text.to_lowercase().contains("refused"), "{text}");
        assert!(!text.contains("g-secret"));
    }

    #[tokio::test]
    async fn test_unconfigured_keys_reported_per_provider() {
        let d = Dispatcher::from_config(&ProvidersConfig::default()).unwrap();
        let response = d.ask_all("hello").await.unwrap();
        for id in ProviderId::ALL {
            assert_eq!(
                response.get(id),
                format!("Error calling {}: API key is not configured", id.display_name())
            );
        }
    }
}
