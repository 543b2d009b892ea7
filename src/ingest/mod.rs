// src/ingest/mod.rs
pub mod providers;
pub mod reconcile;
pub mod scheduler;
pub mod source;
pub mod summary;
pub mod topics;
pub mod types;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use serde::Serialize;
use tokio::time::Instant;

use crate::ingest::reconcile::reconcile;
use crate::ingest::source::resolve_source;
use crate::ingest::summary::shape_summary;
use crate::ingest::topics::{TopicCatalog, TARGET_TOPICS};
use crate::ingest::types::{
    BilingualField, IdGenerator, Lang, NewsProvider, NewsRecord, ProviderItem, Summarizer, Topic,
    TopicClassifier, Translator,
};
use crate::localization::localized_date_string;
use crate::store::{NewsStore, SourceStore, TopicStore};

/// Batch size used when the caller passes `top_k <= 0`.
pub const DEFAULT_TOP_K: usize = 100;
/// Raw labels requested from the classifier per item.
pub const CLASSIFY_TOP_K: usize = 4;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_runs_total", "Provider ingestion batches started.");
        describe_counter!("ingest_items_total", "Provider items processed.");
        describe_counter!("ingest_accepted_total", "Items enriched and persisted.");
        describe_counter!(
            "ingest_skipped_total",
            "Items skipped, labelled by failing stage."
        );
        describe_counter!(
            "ingest_provider_errors_total",
            "Provider search failures (batch-fatal)."
        );
        describe_counter!(
            "ingest_translation_fallbacks_total",
            "Fields mirrored verbatim because translation failed."
        );
        describe_counter!(
            "ingest_fallback_topics_total",
            "Topics attached by keyword fallback instead of classification."
        );
        describe_counter!(
            "scheduler_runs_total",
            "Scheduled ingestion runs, labelled by outcome."
        );
        describe_histogram!("ingest_item_ms", "Per-item enrichment time in milliseconds.");
        describe_gauge!("ingest_last_run_ts", "Unix ts when the last batch finished.");
    });
}

/// Short, stable, non-reversible id for log lines (never log article text).
pub(crate) fn anon_id(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Drop a leading "News:" marker (any case) and surrounding whitespace.
pub fn clean_title(raw: &str) -> String {
    static RE_PREFIX: OnceCell<regex::Regex> = OnceCell::new();
    let re = RE_PREFIX.get_or_init(|| regex::Regex::new(r"(?i)^news:\s*").unwrap());
    re.replace(raw.trim(), "").trim().to_string()
}

/// Best-effort RFC 3339; missing or malformed dates become `now`.
pub fn parse_published(raw: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or(now)
}

pub fn effective_top_k(top_k: i64) -> usize {
    if top_k <= 0 {
        DEFAULT_TOP_K
    } else {
        usize::try_from(top_k).unwrap_or(DEFAULT_TOP_K)
    }
}

// ------------------------------------------------------------
// Deadline
// ------------------------------------------------------------

/// Optional wall-clock bound shared by every collaborator call of one batch.
/// Once elapsed, calls fail immediately instead of being cancelled mid-item.
#[derive(Debug, Clone, Copy, Default)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    pub fn none() -> Self {
        Self(None)
    }

    pub fn after(d: Duration) -> Self {
        Self(Some(Instant::now() + d))
    }

    /// `None` if the deadline passed before `fut` completed.
    pub async fn run<F: Future>(&self, fut: F) -> Option<F::Output> {
        match self.0 {
            None => Some(fut.await),
            Some(at) => tokio::time::timeout_at(at, fut).await.ok(),
        }
    }
}

/// Translator view that honors the batch deadline.
struct BoundedTranslator<'a> {
    inner: &'a dyn Translator,
    deadline: Deadline,
}

#[async_trait::async_trait]
impl Translator for BoundedTranslator<'_> {
    async fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String> {
        self.deadline
            .run(self.inner.translate(text, source_lang, target_lang))
            .await
            .unwrap_or_else(|| Err(anyhow!("deadline elapsed before translation")))
    }
}

// ------------------------------------------------------------
// Orchestrator
// ------------------------------------------------------------

/// Outcome of one batch. Per-item failures only show up in `skipped`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub accepted_ids: Vec<String>,
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipStage {
    Summarize,
    Persist,
}

impl SkipStage {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipStage::Summarize => "summarize",
            SkipStage::Persist => "persist",
        }
    }
}

#[derive(Debug)]
struct ItemSkip {
    stage: SkipStage,
    error: anyhow::Error,
}

impl ItemSkip {
    fn at(stage: SkipStage, error: anyhow::Error) -> Self {
        Self { stage, error }
    }
}

/// Everything the orchestrator talks to.
#[derive(Clone)]
pub struct IngestionDeps {
    pub provider: Arc<dyn NewsProvider>,
    pub summarizer: Arc<dyn Summarizer>,
    pub classifier: Arc<dyn TopicClassifier>,
    pub translator: Arc<dyn Translator>,
    pub topics: Arc<dyn TopicStore>,
    pub sources: Arc<dyn SourceStore>,
    pub news: Arc<dyn NewsStore>,
    pub ids: Arc<dyn IdGenerator>,
    pub catalog: Arc<TopicCatalog>,
}

/// Turns provider items into enriched bilingual news records.
///
/// Items are processed one after another. Holds no mutable state, so concurrent
/// batches (scheduler + admin trigger) are safe; slug races are settled by the stores.
#[derive(Clone)]
pub struct ProviderIngestion {
    deps: IngestionDeps,
}

impl ProviderIngestion {
    pub fn new(deps: IngestionDeps) -> Self {
        Self { deps }
    }

    pub fn catalog(&self) -> &TopicCatalog {
        &self.deps.catalog
    }

    /// Fetch one batch and ingest every item, bounded only by the caller.
    pub async fn ingest_from_provider(&self, query: &str, top_k: i64) -> Result<IngestReport> {
        self.ingest_with_deadline(query, top_k, Deadline::none())
            .await
    }

    /// Same as [`Self::ingest_from_provider`]; collaborator calls issued after `deadline`
    /// fail fast and are absorbed by the per-item policy.
    pub async fn ingest_with_deadline(
        &self,
        query: &str,
        top_k: i64,
        deadline: Deadline,
    ) -> Result<IngestReport> {
        ensure_metrics_described();
        counter!("ingest_runs_total").increment(1);

        let limit = effective_top_k(top_k);
        let provider = self.deps.provider.name();
        let items = match deadline.run(self.deps.provider.search(query, limit)).await {
            Some(Ok(v)) => v,
            Some(Err(e)) => {
                tracing::warn!(target: "ingest", error = ?e, provider, "provider search failed");
                counter!("ingest_provider_errors_total").increment(1);
                return Err(e.context(format!("provider '{provider}' search failed")));
            }
            None => {
                counter!("ingest_provider_errors_total").increment(1);
                return Err(anyhow!("provider '{provider}' search exceeded deadline"));
            }
        };

        let mut report = IngestReport {
            accepted_ids: Vec::with_capacity(items.len()),
            skipped: 0,
        };
        for item in &items {
            let t0 = std::time::Instant::now();
            counter!("ingest_items_total").increment(1);
            match self.ingest_item(item, deadline).await {
                Ok(id) => {
                    counter!("ingest_accepted_total").increment(1);
                    report.accepted_ids.push(id);
                }
                Err(skip) => {
                    report.skipped += 1;
                    counter!("ingest_skipped_total", "stage" => skip.stage.as_str()).increment(1);
                    tracing::warn!(
                        target: "ingest",
                        item = %anon_id(&format!("{}|{}", item.id, item.title)),
                        stage = skip.stage.as_str(),
                        error = ?skip.error,
                        "item skipped"
                    );
                }
            }
            histogram!("ingest_item_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        }

        gauge!("ingest_last_run_ts").set(Utc::now().timestamp() as f64);
        tracing::info!(
            target: "ingest",
            provider,
            fetched = items.len(),
            accepted = report.accepted_ids.len(),
            skipped = report.skipped,
            "provider ingestion finished"
        );
        Ok(report)
    }

    async fn ingest_item(&self, item: &ProviderItem, deadline: Deadline) -> Result<String, ItemSkip> {
        let d = &self.deps;

        let title = clean_title(&item.title);
        let body = match item.text.trim() {
            "" => title.clone(),
            b => b.to_string(),
        };
        let lang_tag = match item.lang.trim() {
            "" => "en".to_string(),
            l => l.to_lowercase(),
        };
        let lang = Lang::from_tag(&lang_tag);

        // Summary is mandatory: no summary, no record.
        let summary = match deadline.run(d.summarizer.summarize(&body, &lang_tag)).await {
            Some(Ok(s)) => shape_summary(&s),
            Some(Err(e)) => return Err(ItemSkip::at(SkipStage::Summarize, e)),
            None => {
                return Err(ItemSkip::at(
                    SkipStage::Summarize,
                    anyhow!("deadline elapsed before summarization"),
                ))
            }
        };

        let topic_ids = self.assign_topics(&title, &body, &lang_tag, deadline).await;

        let now = Utc::now();
        let published_at = parse_published(&item.published_date, now);

        let source_id = match deadline
            .run(resolve_source(
                d.sources.as_ref(),
                d.ids.as_ref(),
                &item.source_site,
                &item.source_url,
                lang,
            ))
            .await
        {
            Some(Ok(id)) => id,
            Some(Err(e)) => {
                tracing::warn!(target: "ingest", error = %e, "source resolution failed; storing without source");
                String::new()
            }
            None => String::new(),
        };

        let mut record = NewsRecord::blank(d.ids.new_id(), now);
        record.title = title.clone();
        record.body = body.clone();
        record.language = lang_tag;
        record.source_id = source_id;
        record.source_url = item.source_url.clone();
        record.topics = topic_ids;
        record.published_at = published_at;
        record.set_originals(lang, &title, &body, &summary);

        let bounded = BoundedTranslator {
            inner: d.translator.as_ref(),
            deadline,
        };
        reconcile(&mut record, &bounded).await;
        record.published_date_localized = localized_date_string(&record.published_at);

        match deadline.run(d.news.save(&record)).await {
            Some(Ok(())) => Ok(record.id),
            Some(Err(e)) => Err(ItemSkip::at(SkipStage::Persist, e.into())),
            None => Err(ItemSkip::at(
                SkipStage::Persist,
                anyhow!("deadline elapsed before persisting"),
            )),
        }
    }

    /// Classifier labels mapped onto the whitelist, topped up by keyword fallback
    /// when fewer than two topics resolved. Returns topic ids.
    async fn assign_topics(
        &self,
        title: &str,
        body: &str,
        lang: &str,
        deadline: Deadline,
    ) -> Vec<String> {
        let d = &self.deps;

        let labels = match deadline
            .run(d.classifier.classify_topics(body, lang, CLASSIFY_TOP_K))
            .await
        {
            Some(Ok(v)) => v,
            Some(Err(e)) => {
                tracing::debug!(target: "ingest", error = ?e, "classification failed; using fallback");
                Vec::new()
            }
            None => Vec::new(),
        };

        let mut slugs: Vec<String> = Vec::new();
        for label in labels.iter().filter(|l| !l.trim().is_empty()) {
            if let Some(slug) = d.catalog.map_label(label) {
                if !slugs.contains(&slug) {
                    slugs.push(slug);
                }
            }
        }

        let mut ids = Vec::with_capacity(slugs.len().max(TARGET_TOPICS));
        for slug in &slugs {
            if let Some(id) = self.resolve_topic(slug, deadline).await {
                ids.push(id);
            }
        }

        if ids.len() < TARGET_TOPICS {
            for slug in d.catalog.infer_fallback(title, body) {
                if ids.len() >= TARGET_TOPICS {
                    break;
                }
                if slugs.contains(&slug) {
                    continue;
                }
                if let Some(id) = self.resolve_topic(&slug, deadline).await {
                    if !ids.contains(&id) {
                        counter!("ingest_fallback_topics_total").increment(1);
                        ids.push(id);
                    }
                }
                slugs.push(slug);
            }
        }
        ids
    }

    async fn resolve_topic(&self, slug: &str, deadline: Deadline) -> Option<String> {
        let d = &self.deps;
        let label = d.catalog.label_for(slug)?;
        let candidate = Topic {
            id: d.ids.new_id(),
            slug: slug.to_string(),
            label: BilingualField::mirrored(label),
        };
        match deadline.run(d.topics.get_or_create(candidate)).await {
            Some(Ok(t)) => Some(t.id),
            Some(Err(e)) => {
                tracing::warn!(target: "ingest", slug, error = %e, "topic lookup/create failed");
                None
            }
            None => None,
        }
    }
}
