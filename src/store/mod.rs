// src/store/mod.rs
//! Storage contracts consumed by the ingestion pipeline.
//!
//! Topic and source slugs are unique. `create` must reject a second record with the same
//! slug with [`StoreError::Conflict`]; `get_or_create` builds on that to give
//! "first writer wins" semantics without a separate lock.

pub mod memory;

use crate::ingest::types::{NewsRecord, Source, Topic};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("slug '{slug}' already exists")]
    Conflict { slug: String },
    #[error("record not found")]
    NotFound,
    #[error("storage backend error: {0}")]
    Backend(String),
}

#[async_trait::async_trait]
pub trait TopicStore: Send + Sync {
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Topic>, StoreError>;
    async fn create(&self, topic: &Topic) -> Result<(), StoreError>;

    /// Return the stored topic for `candidate.slug`, inserting `candidate` if none exists.
    /// A lost creation race re-reads the winner.
    async fn get_or_create(&self, candidate: Topic) -> Result<Topic, StoreError> {
        if let Some(existing) = self.get_by_slug(&candidate.slug).await? {
            return Ok(existing);
        }
        match self.create(&candidate).await {
            Ok(()) => Ok(candidate),
            Err(StoreError::Conflict { slug }) => {
                self.get_by_slug(&slug).await?.ok_or(StoreError::NotFound)
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait::async_trait]
pub trait SourceStore: Send + Sync {
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Source>, StoreError>;
    async fn create(&self, source: &Source) -> Result<(), StoreError>;

    /// Same contract as [`TopicStore::get_or_create`].
    async fn get_or_create(&self, candidate: Source) -> Result<Source, StoreError> {
        if let Some(existing) = self.get_by_slug(&candidate.slug).await? {
            return Ok(existing);
        }
        match self.create(&candidate).await {
            Ok(()) => Ok(candidate),
            Err(StoreError::Conflict { slug }) => {
                self.get_by_slug(&slug).await?.ok_or(StoreError::NotFound)
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait::async_trait]
pub trait NewsStore: Send + Sync {
    async fn save(&self, news: &NewsRecord) -> Result<(), StoreError>;
}
