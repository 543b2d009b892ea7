//! news.rs: admin "create one news item" path.
//! Same bilingual guarantee as provider ingestion: originals go into their language
//! slot and the counterpart is translated (or mirrored) before persisting.

use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::Utc;
use serde::Deserialize;

use crate::ingest::reconcile::reconcile;
use crate::ingest::types::{IdGenerator, Lang, NewsRecord, Translator};
use crate::localization::localized_date_string;
use crate::store::NewsStore;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateNews {
    pub title: String,
    #[serde(default)]
    pub body: String,
    /// "en" | "am"; empty defaults to "en"
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub source_id: String,
    #[serde(default)]
    pub topic_ids: Vec<String>,
}

#[derive(Clone)]
pub struct NewsService {
    news: Arc<dyn NewsStore>,
    translator: Arc<dyn Translator>,
    ids: Arc<dyn IdGenerator>,
}

impl NewsService {
    pub fn new(
        news: Arc<dyn NewsStore>,
        translator: Arc<dyn Translator>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            news,
            translator,
            ids,
        }
    }

    pub async fn admin_create(&self, req: CreateNews) -> Result<NewsRecord> {
        let title = req.title.trim();
        let body = req.body.trim();
        if title.is_empty() {
            bail!("title is required");
        }
        let lang_tag = match req.language.trim() {
            "" => "en".to_string(),
            l => l.to_lowercase(),
        };

        let now = Utc::now();
        let mut n = NewsRecord::blank(self.ids.new_id(), now);
        n.title = title.to_string();
        n.body = body.to_string();
        n.language = lang_tag.clone();
        n.source_id = req.source_id;
        n.topics = req.topic_ids;
        n.set_originals(Lang::from_tag(&lang_tag), title, body, "");

        let report = reconcile(&mut n, self.translator.as_ref()).await;
        n.published_date_localized = localized_date_string(&n.published_at);

        self.news.save(&n).await?;
        tracing::info!(
            target: "api",
            id = %n.id,
            translated = report.translated,
            mirrored = report.mirrored,
            "admin news created"
        );
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::ai_adapter::{DisabledClient, MockClient};
    use crate::ingest::reconcile::is_bilingual_complete;
    use crate::ingest::types::UuidGenerator;
    use crate::store::memory::MemoryStore;

    fn req(title: &str, lang: &str) -> CreateNews {
        CreateNews {
            title: title.into(),
            body: "Body text".into(),
            language: lang.into(),
            source_id: "src-1".into(),
            topic_ids: vec!["t-1".into()],
        }
    }

    #[tokio::test]
    async fn amharic_original_is_translated_to_english() {
        let store = Arc::new(MemoryStore::new());
        let svc = NewsService::new(store.clone(), Arc::new(MockClient), Arc::new(UuidGenerator));
        let n = svc.admin_create(req("ዜና", "am")).await.unwrap();
        assert_eq!(n.title_am, "ዜና");
        assert_eq!(n.title_en, "[en] ዜና");
        assert!(n.summary_en.is_empty() && n.summary_am.is_empty());
        assert!(is_bilingual_complete(&n));
        assert_eq!(store.news_snapshot().len(), 1);
    }

    #[tokio::test]
    async fn translator_failure_mirrors() {
        let store = Arc::new(MemoryStore::new());
        let svc = NewsService::new(store, Arc::new(DisabledClient), Arc::new(UuidGenerator));
        let n = svc.admin_create(req("Headline", "")).await.unwrap();
        assert_eq!(n.language, "en");
        assert_eq!(n.title_am, "Headline");
        assert_eq!(n.body_am, "Body text");
        assert!(!n.published_date_localized.is_empty());
    }

    #[test]
    fn body_may_be_omitted() {
        let req: CreateNews = serde_json::from_str(r#"{"title":"t"}"#).unwrap();
        assert!(req.body.is_empty());
        assert!(req.language.is_empty());
    }

    #[tokio::test]
    async fn empty_title_rejected() {
        let store = Arc::new(MemoryStore::new());
        let svc = NewsService::new(store.clone(), Arc::new(MockClient), Arc::new(UuidGenerator));
        assert!(svc.admin_create(req("  ", "en")).await.is_err());
        assert!(store.news_snapshot().is_empty());
    }
}
