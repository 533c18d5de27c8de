use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::ai::StructuredPost;

/// What a capture produced, kept until the review surface picks it up.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum CaptureOutcome {
    Ready(StructuredPost),
    Failed(String),
}

#[derive(Debug, Clone)]
struct StoredResult {
    outcome: CaptureOutcome,
    created_at: Instant,
}

/// Results keyed by capture id (a tab id, for example).
///
/// Entries expire after `ttl`; expired entries are invisible even before
/// `evict_expired` physically drops them.
pub struct ResultStore {
    entries: HashMap<String, StoredResult>,
    ttl: Duration,
}

pub type SharedResultStore = Arc<Mutex<ResultStore>>;

impl ResultStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    pub fn shared(ttl: Duration) -> SharedResultStore {
        Arc::new(Mutex::new(Self::new(ttl)))
    }

    pub fn insert(&mut self, capture_id: &str, outcome: CaptureOutcome) {
        self.insert_at(capture_id, outcome, Instant::now());
    }

    fn insert_at(&mut self, capture_id: &str, outcome: CaptureOutcome, now: Instant) {
        self.entries.insert(
            capture_id.to_string(),
            StoredResult {
                outcome,
                created_at: now,
            },
        );
    }

    fn is_live(&self, entry: &StoredResult, now: Instant) -> bool {
        now.saturating_duration_since(entry.created_at) < self.ttl
    }

    pub fn get(&self, capture_id: &str) -> Option<CaptureOutcome> {
        self.get_at(capture_id, Instant::now())
    }

    fn get_at(&self, capture_id: &str, now: Instant) -> Option<CaptureOutcome> {
        self.entries
            .get(capture_id)
            .filter(|e| self.is_live(e, now))
            .map(|e| e.outcome.clone())
    }

    /// Removes and returns the outcome. A result is normally read exactly once.
    pub fn take(&mut self, capture_id: &str) -> Option<CaptureOutcome> {
        let now = Instant::now();
        let entry = self.entries.remove(capture_id)?;
        self.is_live(&entry, now).then_some(entry.outcome)
    }

    /// Drops every expired entry; returns how many went.
    pub fn evict_expired(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries
            .retain(|_, e| now.saturating_duration_since(e.created_at) < ttl);
        let evicted = before - self.entries.len();
        if evicted > 0 {
            log::debug!("Evicted {} expired capture result(s)", evicted);
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
