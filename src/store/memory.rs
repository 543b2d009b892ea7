//! memory.rs: in-process document store used by the binary and by tests.
//! Slug uniqueness is checked and the insert performed under one lock, so two concurrent
//! batches racing on the same slug see exactly one winner.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::{NewsStore, SourceStore, StoreError, TopicStore};
use crate::ingest::types::{NewsRecord, Source, Topic};

#[derive(Debug, Default)]
struct Inner {
    topics: HashMap<String, Topic>,   // slug -> topic
    sources: HashMap<String, Source>, // slug -> source
    news: Vec<NewsRecord>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Backend("memory store mutex poisoned".into()))
    }

    /// Copy of every persisted news record, in insertion order.
    pub fn news_snapshot(&self) -> Vec<NewsRecord> {
        self.lock().map(|g| g.news.clone()).unwrap_or_default()
    }

    pub fn news_by_id(&self, id: &str) -> Option<NewsRecord> {
        self.lock()
            .ok()
            .and_then(|g| g.news.iter().find(|n| n.id == id).cloned())
    }

    pub fn topic_by_id(&self, id: &str) -> Option<Topic> {
        self.lock()
            .ok()
            .and_then(|g| g.topics.values().find(|t| t.id == id).cloned())
    }

    pub fn topics_snapshot(&self) -> Vec<Topic> {
        let mut v: Vec<Topic> = self
            .lock()
            .map(|g| g.topics.values().cloned().collect())
            .unwrap_or_default();
        v.sort_by(|a, b| a.slug.cmp(&b.slug));
        v
    }

    pub fn sources_snapshot(&self) -> Vec<Source> {
        let mut v: Vec<Source> = self
            .lock()
            .map(|g| g.sources.values().cloned().collect())
            .unwrap_or_default();
        v.sort_by(|a, b| a.slug.cmp(&b.slug));
        v
    }
}

#[async_trait::async_trait]
impl TopicStore for MemoryStore {
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Topic>, StoreError> {
        Ok(self.lock()?.topics.get(slug).cloned())
    }

    async fn create(&self, topic: &Topic) -> Result<(), StoreError> {
        let mut g = self.lock()?;
        if g.topics.contains_key(&topic.slug) {
            return Err(StoreError::Conflict {
                slug: topic.slug.clone(),
            });
        }
        g.topics.insert(topic.slug.clone(), topic.clone());
        Ok(())
    }
}

#[async_trait::async_trait]
impl SourceStore for MemoryStore {
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Source>, StoreError> {
        Ok(self.lock()?.sources.get(slug).cloned())
    }

    async fn create(&self, source: &Source) -> Result<(), StoreError> {
        let mut g = self.lock()?;
        if g.sources.contains_key(&source.slug) {
            return Err(StoreError::Conflict {
                slug: source.slug.clone(),
            });
        }
        g.sources.insert(source.slug.clone(), source.clone());
        Ok(())
    }
}

#[async_trait::async_trait]
impl NewsStore for MemoryStore {
    async fn save(&self, news: &NewsRecord) -> Result<(), StoreError> {
        self.lock()?.news.push(news.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::BilingualField;

    fn topic(id: &str, slug: &str) -> Topic {
        Topic {
            id: id.into(),
            slug: slug.into(),
            label: BilingualField::mirrored(slug),
        }
    }

    #[tokio::test]
    async fn duplicate_topic_slug_is_a_conflict() {
        let s = MemoryStore::new();
        TopicStore::create(&s, &topic("t1", "economy")).await.unwrap();
        let err = TopicStore::create(&s, &topic("t2", "economy"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
    }

    #[tokio::test]
    async fn get_or_create_returns_first_writer() {
        let s = MemoryStore::new();
        let a = TopicStore::get_or_create(&s, topic("t1", "world")).await.unwrap();
        let b = TopicStore::get_or_create(&s, topic("t2", "world")).await.unwrap();
        assert_eq!(a.id, "t1");
        assert_eq!(b.id, "t1");
        assert_eq!(s.topics_snapshot().len(), 1);
    }

    /// Store whose first lookup misses even though the slug exists, emulating a
    /// concurrent batch that created it between our get and our create.
    struct RacyStore {
        inner: MemoryStore,
        missed: std::sync::atomic::AtomicBool,
    }

    #[async_trait::async_trait]
    impl TopicStore for RacyStore {
        async fn get_by_slug(&self, slug: &str) -> Result<Option<Topic>, StoreError> {
            if !self.missed.swap(true, std::sync::atomic::Ordering::SeqCst) {
                return Ok(None);
            }
            TopicStore::get_by_slug(&self.inner, slug).await
        }
        async fn create(&self, t: &Topic) -> Result<(), StoreError> {
            TopicStore::create(&self.inner, t).await
        }
    }

    #[tokio::test]
    async fn lost_race_refetches_winner() {
        let inner = MemoryStore::new();
        TopicStore::create(&inner, &topic("winner", "health")).await.unwrap();
        let racy = RacyStore {
            inner,
            missed: std::sync::atomic::AtomicBool::new(false),
        };
        let got = racy.get_or_create(topic("loser", "health")).await.unwrap();
        assert_eq!(got.id, "winner");
    }
}
