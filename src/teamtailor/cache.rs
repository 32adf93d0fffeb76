//! In-memory TTL cache around a [`CandidateSource`].
//!
//! Entries are keyed per cursor (the first page is keyed by `None`) and expire
//! after a fixed TTL. Only successful fetches are stored. Concurrent misses
//! for the same key are not coalesced; each goes upstream.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::error::AppError;
use crate::teamtailor::{CandidateSource, NormalizedDocument, PageCursor, SourceFuture};

struct CacheEntry {
    document: NormalizedDocument,
    stored_at: Instant,
}

/// Caching decorator for a candidate source.
pub struct CachedSource<S> {
    inner: S,
    ttl: Duration,
    entries: RwLock<HashMap<Option<PageCursor>, CacheEntry>>,
}

impl<S: CandidateSource> CachedSource<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Drops every entry and returns how many were removed.
    pub async fn clear(&self) -> usize {
        let mut entries = self.entries.write().await;
        let removed = entries.len();
        entries.clear();
        info!("[CACHE] Cleared {} entries", removed);
        removed
    }

    /// Number of stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn lookup(&self, key: &Option<PageCursor>) -> Option<NormalizedDocument> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.stored_at.elapsed() < self.ttl)
            .map(|entry| entry.document.clone())
    }

    async fn fetch_through(&self, cursor: Option<&PageCursor>) -> Result<NormalizedDocument, AppError> {
        let key = cursor.cloned();

        if let Some(document) = self.lookup(&key).await {
            debug!("[CACHE] Hit (first_page={})", key.is_none());
            return Ok(document);
        }

        debug!("[CACHE] Miss (first_page={})", key.is_none());
        let document = self.inner.fetch(cursor).await?;

        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.stored_at.elapsed() < self.ttl);
        entries.insert(
            key,
            CacheEntry {
                document: document.clone(),
                stored_at: Instant::now(),
            },
        );

        Ok(document)
    }
}

impl<S: CandidateSource> CandidateSource for CachedSource<S> {
    fn fetch<'a>(&'a self, cursor: Option<&'a PageCursor>) -> SourceFuture<'a> {
        Box::pin(self.fetch_through(cursor))
    }
}
