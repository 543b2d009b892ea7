// tests/common/mod.rs
//
// Hand-written collaborators shared by the integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};

use newsbrief_ingest::ingest::topics::TopicCatalog;
use newsbrief_ingest::ingest::types::{
    IdGenerator, NewsProvider, NewsRecord, ProviderItem, Summarizer, TopicClassifier, Translator,
};
use newsbrief_ingest::store::memory::MemoryStore;
use newsbrief_ingest::store::{NewsStore, StoreError};
use newsbrief_ingest::{IngestionDeps, ProviderIngestion};

/// Marker in item text that makes [`ScriptedSummarizer`] fail.
pub const FAIL_SUMMARY: &str = "#fail-summary";
/// Marker in a title that makes [`FlakyNewsStore`] reject the record.
pub const FAIL_PERSIST: &str = "#fail-persist";

pub fn item(id: &str, title: &str, text: &str, lang: &str) -> ProviderItem {
    ProviderItem {
        id: id.into(),
        title: title.into(),
        text: text.into(),
        source_url: format!("https://example.org/{id}"),
        source_site: "Example Daily".into(),
        source_type: "news".into(),
        published_date: "2024-09-12T08:00:00Z".into(),
        lang: lang.into(),
    }
}

pub struct FakeProvider {
    pub items: Vec<ProviderItem>,
    pub fail: bool,
    /// Simulated latency per search.
    pub delay: Option<Duration>,
}

impl FakeProvider {
    pub fn with(items: Vec<ProviderItem>) -> Self {
        Self {
            items,
            fail: false,
            delay: None,
        }
    }

    pub fn failing() -> Self {
        Self {
            items: Vec::new(),
            fail: true,
            delay: None,
        }
    }
}

#[async_trait::async_trait]
impl NewsProvider for FakeProvider {
    async fn search(&self, _query: &str, top_k: usize) -> Result<Vec<ProviderItem>> {
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
        if self.fail {
            bail!("provider unreachable");
        }
        Ok(self.items.iter().take(top_k).cloned().collect())
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Echoes the text back as its own summary; fails on [`FAIL_SUMMARY`].
pub struct ScriptedSummarizer;

#[async_trait::async_trait]
impl Summarizer for ScriptedSummarizer {
    async fn summarize(&self, text: &str, _lang: &str) -> Result<String> {
        if text.contains(FAIL_SUMMARY) {
            bail!("model refused");
        }
        Ok(text.to_string())
    }
}

/// Echoes like [`ScriptedSummarizer`] after a fixed delay.
pub struct SlowSummarizer(pub Duration);

#[async_trait::async_trait]
impl Summarizer for SlowSummarizer {
    async fn summarize(&self, text: &str, _lang: &str) -> Result<String> {
        tokio::time::sleep(self.0).await;
        Ok(text.to_string())
    }
}

/// Returns the same raw labels for every item.
pub struct FixedClassifier(pub Vec<String>);

impl FixedClassifier {
    pub fn labels(labels: &[&str]) -> Self {
        Self(labels.iter().map(|s| s.to_string()).collect())
    }
}

#[async_trait::async_trait]
impl TopicClassifier for FixedClassifier {
    async fn classify_topics(&self, _text: &str, _lang: &str, top_k: usize) -> Result<Vec<String>> {
        Ok(self.0.iter().take(top_k).cloned().collect())
    }
}

pub struct FailingClassifier;

#[async_trait::async_trait]
impl TopicClassifier for FailingClassifier {
    async fn classify_topics(&self, _text: &str, _lang: &str, _top_k: usize) -> Result<Vec<String>> {
        bail!("classifier unavailable")
    }
}

/// Tags the text with the target language.
pub struct TagTranslator;

#[async_trait::async_trait]
impl Translator for TagTranslator {
    async fn translate(&self, text: &str, _source: &str, target: &str) -> Result<String> {
        Ok(format!("[{target}] {text}"))
    }
}

pub struct BrokenTranslator;

#[async_trait::async_trait]
impl Translator for BrokenTranslator {
    async fn translate(&self, _text: &str, _source: &str, _target: &str) -> Result<String> {
        bail!("quota exceeded")
    }
}

/// Predictable ids: `id-1`, `id-2`, ...
#[derive(Default)]
pub struct SeqIds(AtomicUsize);

impl IdGenerator for SeqIds {
    fn new_id(&self) -> String {
        format!("id-{}", self.0.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

/// Delegates to a [`MemoryStore`] but rejects titles carrying [`FAIL_PERSIST`].
pub struct FlakyNewsStore(pub Arc<MemoryStore>);

#[async_trait::async_trait]
impl NewsStore for FlakyNewsStore {
    async fn save(&self, record: &NewsRecord) -> Result<(), StoreError> {
        if record.title.contains(FAIL_PERSIST) {
            return Err(StoreError::Backend("write rejected".into()));
        }
        self.0.save(record).await
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub ingestion: ProviderIngestion,
}

pub struct HarnessBuilder {
    provider: Arc<dyn NewsProvider>,
    summarizer: Arc<dyn Summarizer>,
    classifier: Arc<dyn TopicClassifier>,
    translator: Arc<dyn Translator>,
    flaky_persist: bool,
}

impl HarnessBuilder {
    pub fn new(provider: FakeProvider) -> Self {
        Self {
            provider: Arc::new(provider),
            summarizer: Arc::new(ScriptedSummarizer),
            classifier: Arc::new(FixedClassifier::labels(&[])),
            translator: Arc::new(TagTranslator),
            flaky_persist: false,
        }
    }

    pub fn summarizer(mut self, s: impl Summarizer + 'static) -> Self {
        self.summarizer = Arc::new(s);
        self
    }

    pub fn classifier(mut self, c: impl TopicClassifier + 'static) -> Self {
        self.classifier = Arc::new(c);
        self
    }

    pub fn translator(mut self, t: impl Translator + 'static) -> Self {
        self.translator = Arc::new(t);
        self
    }

    pub fn flaky_persist(mut self) -> Self {
        self.flaky_persist = true;
        self
    }

    pub fn build(self) -> Harness {
        let store = Arc::new(MemoryStore::new());
        let news: Arc<dyn NewsStore> = if self.flaky_persist {
            Arc::new(FlakyNewsStore(store.clone()))
        } else {
            store.clone()
        };
        let ingestion = ProviderIngestion::new(IngestionDeps {
            provider: self.provider,
            summarizer: self.summarizer,
            classifier: self.classifier,
            translator: self.translator,
            topics: store.clone(),
            sources: store.clone(),
            news,
            ids: Arc::new(SeqIds::default()),
            catalog: Arc::new(TopicCatalog::default_seed()),
        });
        Harness { store, ingestion }
    }
}

/// Slugs of the topics attached to `record`, in attachment order.
pub fn topic_slugs(store: &MemoryStore, record: &NewsRecord) -> Vec<String> {
    record
        .topics
        .iter()
        .filter_map(|id| store.topic_by_id(id))
        .map(|t| t.slug)
        .collect()
}
