//! Recorded response store.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::observability::metrics;

/// A captured upstream response. The three fragments are replaced together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedResponse {
    pub payload: Value,
    pub headers: Value,
    pub status_code: Value,
}

/// A thread-safe store of recorded responses keyed by route path.
///
/// Entries live for the process lifetime; a later capture for the same key
/// replaces the earlier one.
#[derive(Debug, Clone, Default)]
pub struct MockStore {
    inner: Arc<DashMap<String, RecordedResponse>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `response` under `path`, replacing any previous entry.
    pub fn capture(&self, path: impl Into<String>, response: RecordedResponse) {
        self.inner.insert(path.into(), response);
        metrics::record_mock_entries(self.inner.len());
    }

    /// Find the entry whose key is the longest prefix of `candidate`.
    pub fn lookup(&self, candidate: &str) -> Option<(String, RecordedResponse)> {
        let mut best: Option<(String, RecordedResponse)> = None;
        for entry in self.inner.iter() {
            let key = entry.key();
            if !candidate.starts_with(key.as_str()) {
                continue;
            }
            let longer = best.as_ref().map_or(true, |(k, _)| key.len() > k.len());
            if longer {
                best = Some((key.clone(), entry.value().clone()));
            }
        }
        best
    }

    /// Exact-key read.
    pub fn get(&self, path: &str) -> Option<RecordedResponse> {
        self.inner.get(path).map(|r| r.value().clone())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// All stored keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.inner.iter().map(|r| r.key().clone()).collect();
        keys.sort();
        keys
    }
}
