use std::collections::HashMap;

use crate::model::task::{Task, TaskPatch};

/// Locally applied, not-yet-confirmed field deltas, keyed by entity id.
/// Written at the moment of an optimistic mutation, pruned only by the
/// reconciler (or a deletion purge).
#[derive(Debug, Default)]
pub struct OptimisticOverlay {
    patches: HashMap<String, TaskPatch>,
}

impl OptimisticOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store or merge a local intent. Repeated applies for the same id are
    /// last-write-wins per field — the newest intent always supersedes an
    /// older one, never a union that could reintroduce a stale field.
    pub fn apply(&mut self, id: &str, patch: &TaskPatch) {
        self.patches
            .entry(id.to_string())
            .or_default()
            .merge_from(patch);
    }

    /// Replace an entry wholesale (mutation-dispatch rollback path)
    pub fn insert(&mut self, id: &str, patch: TaskPatch) {
        self.patches.insert(id.to_string(), patch);
    }

    pub fn get(&self, id: &str) -> Option<&TaskPatch> {
        self.patches.get(id)
    }

    /// The entity with overlay fields substituted in, or unchanged when no
    /// overlay exists. Pure and synchronous — this runs on every render pass.
    pub fn effective(&self, task: &Task) -> Task {
        let mut task = task.clone();
        if let Some(patch) = self.patches.get(&task.id) {
            patch.apply_to(&mut task);
        }
        task
    }

    pub fn clear(&mut self, id: &str) {
        self.patches.remove(id);
    }

    /// Snapshot of overlaid ids, for iteration that mutates the overlay
    pub fn ids(&self) -> Vec<String> {
        self.patches.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.patches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }
}
