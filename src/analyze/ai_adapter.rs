//! AI adapter: picks the summarizer, classifier and translator implementations
//! from config and environment.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};

use crate::analyze::gemini::GeminiClient;
use crate::analyze::translator::GoogleTranslator;
use crate::config::ai::AiConfig;
use crate::ingest::types::{Summarizer, TopicClassifier, Translator};

/// Enrichment collaborators handed to the orchestrator.
#[derive(Clone)]
pub struct EnrichmentClients {
    pub summarizer: Arc<dyn Summarizer>,
    pub classifier: Arc<dyn TopicClassifier>,
    pub translator: Arc<dyn Translator>,
    /// Provider name for diagnostics.
    pub provider: &'static str,
}

fn mock_mode() -> bool {
    std::env::var("AI_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
}

/// Factory: build clients according to config and environment variables.
///
/// * If `AI_TEST_MODE=mock` or `provider == "mock"`, returns deterministic mocks.
/// * Else if `config.enabled == false`, returns disabled clients (every item is skipped
///   at summarization, translations mirror).
/// * Else builds the Gemini + Google Translate clients.
pub fn build_clients_from_config(config: &AiConfig) -> Result<EnrichmentClients> {
    if mock_mode() || config.provider == "mock" {
        let m = Arc::new(MockClient);
        return Ok(EnrichmentClients {
            summarizer: m.clone(),
            classifier: m.clone(),
            translator: m,
            provider: "mock",
        });
    }

    if !config.enabled {
        let d = Arc::new(DisabledClient);
        return Ok(EnrichmentClients {
            summarizer: d.clone(),
            classifier: d.clone(),
            translator: d,
            provider: "disabled",
        });
    }

    let timeout = Duration::from_secs(config.timeout_secs.max(1));
    match config.provider.as_str() {
        "gemini" => {
            let gemini = Arc::new(GeminiClient::new(&config.api_url, &config.api_key, timeout)?);
            let translator = Arc::new(GoogleTranslator::new(&config.translator_url, timeout)?);
            Ok(EnrichmentClients {
                summarizer: gemini.clone(),
                classifier: gemini,
                translator,
                provider: "gemini",
            })
        }
        other => bail!("unsupported AI provider: {other}"),
    }
}

/// Fails every call; used when AI is disabled.
pub struct DisabledClient;

#[async_trait::async_trait]
impl Summarizer for DisabledClient {
    async fn summarize(&self, _text: &str, _lang: &str) -> Result<String> {
        bail!("summarizer disabled")
    }
}

#[async_trait::async_trait]
impl TopicClassifier for DisabledClient {
    async fn classify_topics(&self, _text: &str, _lang: &str, _top_k: usize) -> Result<Vec<String>> {
        bail!("classifier disabled")
    }
}

#[async_trait::async_trait]
impl Translator for DisabledClient {
    async fn translate(&self, _text: &str, _s: &str, _t: &str) -> Result<String> {
        bail!("translator disabled")
    }
}

/// Deterministic offline stand-in for local runs.
/// Summary = first sentence; no labels (fallback topics apply); translation = tagged copy.
#[derive(Clone, Copy)]
pub struct MockClient;

#[async_trait::async_trait]
impl Summarizer for MockClient {
    async fn summarize(&self, text: &str, _lang: &str) -> Result<String> {
        let first = text.split('.').map(str::trim).find(|s| !s.is_empty());
        match first {
            Some(s) => Ok(format!("{s}.")),
            None => bail!("nothing to summarize"),
        }
    }
}

#[async_trait::async_trait]
impl TopicClassifier for MockClient {
    async fn classify_topics(&self, _text: &str, _lang: &str, _top_k: usize) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

#[async_trait::async_trait]
impl Translator for MockClient {
    async fn translate(&self, text: &str, _s: &str, target: &str) -> Result<String> {
        Ok(format!("[{target}] {text}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[serial_test::serial]
    #[tokio::test]
    async fn disabled_config_yields_failing_clients() {
        std::env::remove_var("AI_TEST_MODE");
        let c = build_clients_from_config(&AiConfig::default()).unwrap();
        assert_eq!(c.provider, "disabled");
        assert!(c.summarizer.summarize("x", "en").await.is_err());
        assert!(c.translator.translate("x", "en", "am").await.is_err());
    }

    #[serial_test::serial]
    #[tokio::test]
    async fn mock_env_overrides_config() {
        std::env::set_var("AI_TEST_MODE", "mock");
        let c = build_clients_from_config(&AiConfig::default()).unwrap();
        std::env::remove_var("AI_TEST_MODE");
        assert_eq!(c.provider, "mock");
        assert_eq!(c.summarizer.summarize("One. Two.", "en").await.unwrap(), "One.");
        assert_eq!(c.translator.translate("hi", "en", "am").await.unwrap(), "[am] hi");
        assert!(c.classifier.classify_topics("x", "en", 4).await.unwrap().is_empty());
    }

    #[serial_test::serial]
    #[test]
    fn enabled_gemini_requires_url() {
        std::env::remove_var("AI_TEST_MODE");
        let cfg = AiConfig {
            enabled: true,
            ..AiConfig::default()
        };
        assert!(build_clients_from_config(&cfg).is_err());
    }
}
