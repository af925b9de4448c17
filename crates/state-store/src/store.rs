//! TTL-bounded state table

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Matches the usual authorization-code lifetime at providers.
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

struct Entry {
    pairing_token: String,
    created_at: Instant,
}

/// Concurrency-safe `state -> pairing token` table.
///
/// One mutex guards the map, so insert, take and purge are atomic with
/// respect to each other and no reader sees a half-written entry.
pub struct CorrelationStore {
    entries: Mutex<HashMap<String, Entry>>,
    ttl: Duration,
    max_entries: usize,
}

impl CorrelationStore {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    /// Record that `state` belongs to a desktop login.
    ///
    /// Expired entries are dropped first. If the table is still full the
    /// oldest entry is evicted, so abandoned flows cannot grow it without
    /// bound.
    pub async fn insert(&self, state: impl Into<String>, pairing_token: impl Into<String>) {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let ttl = self.ttl;
        entries.retain(|_, e| now.duration_since(e.created_at) < ttl);

        if entries.len() >= self.max_entries {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.created_at)
                .map(|(k, _)| k.clone());
            if let Some(key) = oldest {
                entries.remove(&key);
                warn!(
                    max_entries = self.max_entries,
                    "state store full, evicted oldest pending login"
                );
            }
        }

        entries.insert(
            state.into(),
            Entry {
                pairing_token: pairing_token.into(),
                created_at: now,
            },
        );
    }

    /// Remove and return the pairing token for `state`.
    ///
    /// `None` when the state was never recorded, was already taken, or has
    /// expired. A second call for the same state always returns `None`.
    pub async fn take(&self, state: &str) -> Option<String> {
        let entry = self.entries.lock().await.remove(state)?;
        if entry.created_at.elapsed() >= self.ttl {
            debug!("pending login state expired");
            return None;
        }
        Some(entry.pairing_token)
    }

    /// Drop every expired entry. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        let now = Instant::now();
        let ttl = self.ttl;
        entries.retain(|_, e| now.duration_since(e.created_at) < ttl);
        before - entries.len()
    }

    /// Entries currently held, including expired ones not yet purged.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for CorrelationStore {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_MAX_ENTRIES)
    }
}
