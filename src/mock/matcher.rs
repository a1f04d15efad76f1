//! Exact-match lookup of outgoing calls against stored entries

use std::sync::Arc;

use crate::models::RequestLogEntry;
use crate::storage::PersistentLog;

/// Matches an outgoing call against the persistent log.
///
/// Matching is deterministic: entries are scanned in insertion order and the
/// first whose request url and payload are both exactly equal wins. Method
/// and headers are never compared, and there is no fuzzy matching. A payload
/// absent on both sides counts as equal.
pub struct MockMatcher {
    log: Arc<PersistentLog>,
}

impl MockMatcher {
    pub fn new(log: Arc<PersistentLog>) -> Self {
        Self { log }
    }

    /// Find the earliest stored entry matching `url` and `payload`.
    pub fn find(&self, url: &str, payload: Option<&str>) -> Option<RequestLogEntry> {
        self.log
            .read_all()
            .into_iter()
            .find(|entry| entry.request.url == url && entry.request.payload.as_deref() == payload)
    }
}
