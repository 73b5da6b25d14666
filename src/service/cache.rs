//! In-memory publish cache
//!
//! Holds rendered documents for a limited time so a client can fetch them by
//! id. Entries expire after a fixed TTL; when the cache is full the oldest
//! entry is evicted first.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::debug;

/// Default time to live of a published document
pub const CACHE_TTL: Duration = Duration::from_secs(30 * 60);
/// Default maximum number of documents
pub const MAX_CACHE_ITEMS: usize = 500;
/// Default maximum size of one document
pub const MAX_DOCUMENT_BYTES: usize = 256 * 1024;

// ============================================================================
// Store Interface
// ============================================================================

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PublishError {
    #[error("document is {size} bytes, the limit is {max} bytes")]
    TooLarge { size: usize, max: usize },
    #[error("publish store is unavailable")]
    Unavailable,
}

/// Outcome of a successful `put`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    pub id: String,
    pub expires_in: Duration,
    /// Older entries dropped to make room
    pub evicted: usize,
}

/// Keyed document storage used by the conversion service
pub trait PublishStore: Send + Sync {
    fn put(&self, id: &str, text: &str) -> Result<PublishReceipt, PublishError>;

    /// `None` once the entry expired or was evicted
    fn get(&self, id: &str) -> Option<String>;
}

// ============================================================================
// Publish Cache
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheLimits {
    pub ttl: Duration,
    pub max_items: usize,
    pub max_bytes: usize,
}

impl Default for CacheLimits {
    fn default() -> Self {
        Self {
            ttl: CACHE_TTL,
            max_items: MAX_CACHE_ITEMS,
            max_bytes: MAX_DOCUMENT_BYTES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub items: usize,
    pub max_items: usize,
    pub max_bytes: usize,
    pub ttl: Duration,
    pub total_bytes: usize,
    /// Time until the next entry expires
    pub earliest_expiry: Option<Duration>,
}

#[derive(Debug)]
struct CacheEntry {
    text: String,
    expires_at: Instant,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    /// Insertion order, oldest first
    order: VecDeque<String>,
}

impl CacheState {
    fn remove(&mut self, id: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(id)?;
        self.order.retain(|queued| queued != id);
        Some(entry)
    }

    fn cleanup_expired(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        let entries = &self.entries;
        self.order.retain(|id| entries.contains_key(id));
        before - self.entries.len()
    }

    fn evict_oldest(&mut self) -> bool {
        match self.order.pop_front() {
            Some(id) => {
                self.entries.remove(&id);
                debug!(id = %id, "Evicted oldest published document");
                true
            }
            None => false,
        }
    }
}

/// TTL and size bounded [`PublishStore`]
#[derive(Debug, Default)]
pub struct PublishCache {
    limits: CacheLimits,
    state: Mutex<CacheState>,
}

impl PublishCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: CacheLimits) -> Self {
        Self {
            limits,
            state: Mutex::default(),
        }
    }

    pub fn limits(&self) -> CacheLimits {
        self.limits
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn put_at(&self, id: &str, text: &str, now: Instant) -> Result<PublishReceipt, PublishError> {
        let mut state = self.lock();
        state.cleanup_expired(now);

        if self.limits.max_items == 0 {
            return Err(PublishError::Unavailable);
        }
        let size = text.len();
        if size > self.limits.max_bytes {
            return Err(PublishError::TooLarge {
                size,
                max: self.limits.max_bytes,
            });
        }

        // Re-publishing an id replaces it and moves it to the back
        state.remove(id);

        let mut evicted = 0;
        while state.entries.len() >= self.limits.max_items {
            if !state.evict_oldest() {
                return Err(PublishError::Unavailable);
            }
            evicted += 1;
        }

        state.entries.insert(
            id.to_string(),
            CacheEntry {
                text: text.to_string(),
                expires_at: now + self.limits.ttl,
            },
        );
        state.order.push_back(id.to_string());
        debug!(
            id = %id,
            bytes = size,
            items = state.entries.len(),
            evicted,
            "Published document"
        );

        Ok(PublishReceipt {
            id: id.to_string(),
            expires_in: self.limits.ttl,
            evicted,
        })
    }

    pub fn get_at(&self, id: &str, now: Instant) -> Option<String> {
        let mut state = self.lock();
        state.cleanup_expired(now);
        state.entries.get(id).map(|entry| entry.text.clone())
    }

    /// Drops expired entries, returning how many were removed
    pub fn cleanup_expired_at(&self, now: Instant) -> usize {
        self.lock().cleanup_expired(now)
    }

    pub fn cleanup_expired(&self) -> usize {
        self.cleanup_expired_at(Instant::now())
    }

    pub fn stats_at(&self, now: Instant) -> CacheStats {
        let mut state = self.lock();
        state.cleanup_expired(now);

        CacheStats {
            items: state.entries.len(),
            max_items: self.limits.max_items,
            max_bytes: self.limits.max_bytes,
            ttl: self.limits.ttl,
            total_bytes: state.entries.values().map(|entry| entry.text.len()).sum(),
            earliest_expiry: state
                .entries
                .values()
                .map(|entry| entry.expires_at.saturating_duration_since(now))
                .min(),
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.stats_at(Instant::now())
    }
}

impl PublishStore for PublishCache {
    fn put(&self, id: &str, text: &str) -> Result<PublishReceipt, PublishError> {
        self.put_at(id, text, Instant::now())
    }

    fn get(&self, id: &str) -> Option<String> {
        self.get_at(id, Instant::now())
    }
}
