use std::collections::HashSet;

use tracing::debug;

/// Ids with a locally initiated mutation that has been dispatched but not yet
/// confirmed gone by a refresh. Presence is the whole payload — this is a
/// set, not a map.
///
/// Network completion order is not guaranteed relative to later begin/end
/// pairs on the same id, so every operation converges instead of erroring:
/// re-marking a pending id and ending an absent one are both no-ops.
#[derive(Debug, Default)]
pub struct PendingLedger {
    ids: HashSet<String>,
}

impl PendingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an id as having an in-flight local mutation. Idempotent — a
    /// rapid second toggle before the first confirms just re-marks.
    pub fn begin(&mut self, id: &str) {
        if self.ids.insert(id.to_string()) {
            debug!(id, "mutation pending");
        }
    }

    /// Clear an id. No-op when the id is not pending.
    pub fn end(&mut self, id: &str) {
        if self.ids.remove(id) {
            debug!(id, "mutation settled");
        }
    }

    /// Pure query, safe on every render pass
    pub fn is_pending(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
