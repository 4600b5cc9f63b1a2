//! Query cache sitting between the console routes and the LMS backend.
//!
//! Reads are served from memory while younger than the stale time. Writes
//! never touch entries directly: a mutation drops every affected key and the
//! next read goes back to the backend.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::models::SectionType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Courses,
    Chapters,
    /// `None` is the untyped "all sections" listing.
    Sections(Option<SectionType>),
    Lessons,
    Users,
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::Courses => f.write_str("courses"),
            QueryKey::Chapters => f.write_str("chapters"),
            QueryKey::Sections(None) => f.write_str("sections/all"),
            QueryKey::Sections(Some(t)) => write!(f, "sections/{}", t),
            QueryKey::Lessons => f.write_str("lessons"),
            QueryKey::Users => f.write_str("users"),
        }
    }
}

/// Keys dropped after any course/chapter/section/lesson mutation.
pub const CONTENT_KEYS: [QueryKey; 7] = [
    QueryKey::Courses,
    QueryKey::Chapters,
    QueryKey::Lessons,
    QueryKey::Sections(None),
    QueryKey::Sections(Some(SectionType::Grammar)),
    QueryKey::Sections(Some(SectionType::Vocabulary)),
    QueryKey::Sections(Some(SectionType::Kanji)),
];

#[derive(Debug, Clone)]
struct CacheEntry {
    value: serde_json::Value,
    fetched_at: Instant,
    last_access: Instant,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<QueryKey, CacheEntry>,
    /// Bumped on every invalidation of a key. A fetch only stores its result
    /// when the generation it started under is still current.
    generations: HashMap<QueryKey, u64>,
    /// Bumped by `clear`, which invalidates every key at once.
    epoch: u64,
}

impl CacheState {
    fn generation(&self, key: QueryKey) -> (u64, u64) {
        (self.epoch, self.generations.get(&key).copied().unwrap_or(0))
    }

    fn invalidate(&mut self, key: QueryKey) {
        *self.generations.entry(key).or_insert(0) += 1;
        if self.entries.remove(&key).is_some() {
            debug!("invalidated {}", key);
        }
    }
}

#[derive(Clone)]
pub struct QueryCache {
    state: Arc<RwLock<CacheState>>,
    stale_time: Duration,
    gc_time: Duration,
}

impl QueryCache {
    pub fn new(stale_time: Duration, gc_time: Duration) -> Self {
        Self {
            state: Arc::new(RwLock::new(CacheState::default())),
            stale_time,
            gc_time,
        }
    }

    /// Serve `key` from memory if fresh, otherwise run `fetcher`. A transient
    /// failure gets exactly one more attempt. A result whose key was
    /// invalidated while the fetch was in flight is returned but not stored.
    pub async fn fetch<T, F, Fut>(&self, key: QueryKey, fetcher: F) -> Result<T, AppError>
    where
        T: Serialize + DeserializeOwned,
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let generation = match self.fresh_value(key).await {
            (Some(value), generation) => match serde_json::from_value::<T>(value) {
                Ok(data) => {
                    debug!("cache hit: {}", key);
                    return Ok(data);
                }
                Err(e) => {
                    warn!("cached {} no longer decodes, refetching: {}", key, e);
                    generation
                }
            },
            (None, generation) => generation,
        };

        debug!("cache miss: {}", key);
        let data = match fetcher().await {
            Ok(data) => data,
            Err(e) if e.is_transient() => {
                warn!("fetching {} failed ({}), retrying once", key, e);
                fetcher().await?
            }
            Err(e) => return Err(e),
        };

        let value = serde_json::to_value(&data)
            .map_err(|e| AppError::Internal(format!("Failed to cache {}: {}", key, e)))?;

        let mut state = self.state.write().await;
        if state.generation(key) != generation {
            debug!("{} was invalidated mid-fetch, not caching", key);
            return Ok(data);
        }
        let now = Instant::now();
        state.entries.insert(
            key,
            CacheEntry {
                value,
                fetched_at: now,
                last_access: now,
            },
        );

        Ok(data)
    }

    async fn fresh_value(&self, key: QueryKey) -> (Option<serde_json::Value>, (u64, u64)) {
        let mut state = self.state.write().await;
        let generation = state.generation(key);
        let stale_time = self.stale_time;
        let value = state.entries.get_mut(&key).and_then(|entry| {
            entry.last_access = Instant::now();
            (entry.fetched_at.elapsed() < stale_time).then(|| entry.value.clone())
        });
        (value, generation)
    }

    pub async fn invalidate(&self, key: QueryKey) {
        self.state.write().await.invalidate(key);
    }

    pub async fn invalidate_many(&self, keys: &[QueryKey]) {
        let mut state = self.state.write().await;
        for key in keys {
            state.invalidate(*key);
        }
    }

    pub async fn invalidate_content(&self) {
        self.invalidate_many(&CONTENT_KEYS).await;
    }

    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.epoch += 1;
        state.entries.clear();
    }

    /// Evict entries nobody has read for `gc_time`. Returns how many went.
    pub async fn sweep(&self) -> usize {
        let mut state = self.state.write().await;
        let before = state.entries.len();
        state
            .entries
            .retain(|_, entry| entry.last_access.elapsed() < self.gc_time);
        before - state.entries.len()
    }

    pub async fn contains(&self, key: QueryKey) -> bool {
        self.state.read().await.entries.contains_key(&key)
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.entries.is_empty()
    }
}
