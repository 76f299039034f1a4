//! One-shot flash store for import results
//!
//! Cancelled-record lists produced by a reconciling import are held here,
//! keyed by actor, until the client fetches them once via
//! `GET /api/imports/flash`. Reading consumes the entry.

use std::collections::HashMap;
use std::sync::Mutex;

use sitebook_core::models::CancelledRecord;

/// Pending cancelled-record message for one actor
#[derive(Debug, Clone, serde::Serialize)]
pub struct ImportFlash {
    /// "purchases" or "sales"
    pub kind: String,
    pub cancelled: Vec<CancelledRecord>,
}

#[derive(Default)]
pub struct FlashStore {
    inner: Mutex<HashMap<String, ImportFlash>>,
}

impl FlashStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a message for an actor, replacing any unread one
    pub fn put(&self, actor: &str, flash: ImportFlash) {
        if let Ok(mut map) = self.inner.lock() {
            map.insert(actor.to_string(), flash);
        }
    }

    /// Take the pending message for an actor, if any
    pub fn take(&self, actor: &str) -> Option<ImportFlash> {
        self.inner.lock().ok().and_then(|mut map| map.remove(actor))
    }
}
