//! In-memory snapshot cache.
//!
//! Each [`ResourceKind`] has one [`Slot`]. A slot serves its entry while it
//! is younger than the ttl and otherwise runs the caller's refresh. Only a
//! successful refresh replaces the entry, so a failing origin never evicts
//! data that was good before.
//!
//! Refreshes of one slot are serialized by a gate that also keeps the result
//! of the last refresh. Callers queued behind an in-flight refresh take its
//! result once they get through, success or error, so concurrent misses hit
//! the origin once even when the origin is failing.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::{Display, EnumString, IntoStaticStr};
use tokio::sync::Mutex;
use tracing::{debug, info};

use cpcache_config::CacheConfig;
use cpcache_util::model::{ContestSnapshot, StandingsSnapshot};
use cpcache_util::FetchError;

#[derive(
    Serialize, EnumString, IntoStaticStr, Display, Debug, Copy, Clone, PartialEq, Eq, Hash,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ResourceKind {
    Contest,
    Standings,
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Copy, Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug)]
struct CacheEntry<T> {
    value: Arc<T>,
    fetched_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match chrono::Duration::from_std(ttl) {
            Ok(ttl) => now.signed_duration_since(self.fetched_at) < ttl,
            // ttl too large to represent
            Err(_) => true,
        }
    }
}

/// Result of the most recent refresh, shared with the callers that queued
/// behind it.
#[derive(Debug)]
struct LastRefresh<T, E> {
    generation: u64,
    result: Option<Result<Arc<T>, E>>,
}

#[derive(Debug)]
pub struct Slot<T, E> {
    kind: ResourceKind,
    entry: RwLock<Option<CacheEntry<T>>>,
    generation: AtomicU64,
    gate: Mutex<LastRefresh<T, E>>,
}

impl<T, E: Clone> Slot<T, E> {
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            entry: RwLock::new(None),
            generation: AtomicU64::new(0),
            gate: Mutex::new(LastRefresh {
                generation: 0,
                result: None,
            }),
        }
    }

    /// Returns the cached value when fresh, otherwise refreshes it.
    ///
    /// A caller that had to wait for another refresh gets that refresh's
    /// result instead of starting its own.
    pub async fn get_or_refresh<F, Fut>(
        &self,
        clock: &dyn Clock,
        ttl: Duration,
        refresh: F,
    ) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.fresh(clock, ttl) {
            debug!("Serving {} from cache", self.kind);
            return Ok(value);
        }
        let seen = self.generation.load(Ordering::SeqCst);
        let mut last = self.gate.lock().await;
        if last.generation != seen {
            if let Some(result) = &last.result {
                debug!("Sharing the {} refresh of a concurrent request", self.kind);
                return result.clone();
            }
        }
        if let Some(value) = self.fresh(clock, ttl) {
            debug!("Serving {} refreshed by a concurrent request", self.kind);
            return Ok(value);
        }

        info!("Refreshing {}", self.kind);
        let result = refresh().await.map(Arc::new);
        if let Ok(value) = &result {
            let entry = CacheEntry {
                value: value.clone(),
                fetched_at: clock.now(),
            };
            *self.entry.write().unwrap_or_else(PoisonError::into_inner) = Some(entry);
        }
        last.generation = last.generation.wrapping_add(1);
        last.result = Some(result.clone());
        self.generation.store(last.generation, Ordering::SeqCst);
        result
    }

    /// Last stored value regardless of its age.
    #[cfg(test)]
    pub fn peek(&self) -> Option<Arc<T>> {
        self.entry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|entry| entry.value.clone())
    }

    fn fresh(&self, clock: &dyn Clock, ttl: Duration) -> Option<Arc<T>> {
        let now = clock.now();
        self.entry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .filter(|entry| entry.is_fresh(now, ttl))
            .map(|entry| entry.value.clone())
    }
}

/// Process-wide cache of the two snapshots served to the frontend.
pub struct SnapshotCache {
    contest: Slot<ContestSnapshot, FetchError>,
    standings: Slot<StandingsSnapshot, FetchError>,
    conf: CacheConfig,
    clock: Arc<dyn Clock>,
}

impl SnapshotCache {
    pub fn new(conf: CacheConfig) -> Self {
        Self::with_clock(conf, Arc::new(SystemClock))
    }

    pub fn with_clock(conf: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            contest: Slot::new(ResourceKind::Contest),
            standings: Slot::new(ResourceKind::Standings),
            conf,
            clock,
        }
    }

    pub async fn contest<F, Fut>(&self, refresh: F) -> Result<Arc<ContestSnapshot>, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ContestSnapshot, FetchError>>,
    {
        self.contest
            .get_or_refresh(self.clock.as_ref(), self.conf.contest_ttl(), refresh)
            .await
    }

    pub async fn standings<F, Fut>(
        &self,
        refresh: F,
    ) -> Result<Arc<StandingsSnapshot>, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<StandingsSnapshot, FetchError>>,
    {
        self.standings
            .get_or_refresh(self.clock.as_ref(), self.conf.standings_ttl(), refresh)
            .await
    }

    #[cfg(test)]
    pub fn peek_contest(&self) -> Option<Arc<ContestSnapshot>> {
        self.contest.peek()
    }

    #[cfg(test)]
    pub fn peek_standings(&self) -> Option<Arc<StandingsSnapshot>> {
        self.standings.peek()
    }
}
