use std::sync::mpsc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::io::backend::{Backend, BackendError};
use crate::io::channel::ChannelSource;
use crate::model::event::{ChangeEvent, ChannelOrigin};
use crate::model::task::{Task, TaskKind, TaskPatch, TaskStatus};
use crate::ops::entities::{EntityStore, StoreSet};
use crate::ops::ledger::PendingLedger;
use crate::ops::overlay::OptimisticOverlay;
use crate::ops::reconcile::reconcile;
use crate::ops::router::{RouteAction, route_event};
use crate::parse::{parse_feed_event, parse_push_event};

/// Error type for session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("task not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Session tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Refetch immediately when an event invalidates a store. On for
    /// foreground sessions where a watching user would perceive the gap;
    /// a backgrounded session can turn it off and call `refresh_if_stale`
    /// at its own cadence.
    #[serde(default = "default_true")]
    pub eager_refetch: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig { eager_refetch: true }
    }
}

fn default_true() -> bool {
    true
}

/// Diagnostic counters, cumulative over the session's lifetime
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct SyncStats {
    pub payloads_seen: u64,
    pub payloads_dropped: u64,
    pub suppressed: u64,
    pub refreshes: u64,
    pub refresh_failures: u64,
}

/// One user session's synchronization state: the canonical entity stores,
/// the pending-mutation ledger, the optimistic overlay, both notification
/// channels, and the backend seam. Constructed once per login, dropped on
/// logout; losing it loses only in-flight optimism, never correctness — the
/// next refresh restores canonical truth.
///
/// Every method is synchronous and runs on the owning thread. State reads
/// and their derived writes happen within one call, so an event fired
/// between calls can never observe a half-updated structure.
pub struct SyncSession<B: Backend> {
    backend: B,
    config: SyncConfig,
    stores: StoreSet,
    ledger: PendingLedger,
    overlay: OptimisticOverlay,
    push: Option<ChannelSource>,
    feed: Option<ChannelSource>,
    stats: SyncStats,
}

impl<B: Backend> SyncSession<B> {
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, SyncConfig::default())
    }

    pub fn with_config(backend: B, config: SyncConfig) -> Self {
        SyncSession {
            backend,
            config,
            stores: StoreSet::new(),
            ledger: PendingLedger::new(),
            overlay: OptimisticOverlay::new(),
            push: None,
            feed: None,
            stats: SyncStats::default(),
        }
    }

    // -----------------------------------------------------------------
    // Subscriptions
    // -----------------------------------------------------------------

    /// Install the push-event channel. Any previous source is dropped
    /// before the new one exists, so there is no window where two handlers
    /// are live and events get double-handled.
    pub fn attach_push(&mut self, rx: mpsc::Receiver<Value>) {
        self.push.take();
        self.push = Some(ChannelSource::new(ChannelOrigin::Push, rx));
    }

    /// Install the change-feed channel. Same detach-first contract as
    /// `attach_push`.
    pub fn attach_change_feed(&mut self, rx: mpsc::Receiver<Value>) {
        self.feed.take();
        self.feed = Some(ChannelSource::new(ChannelOrigin::ChangeFeed, rx));
    }

    /// Synchronously detach both channels (component teardown)
    pub fn detach_channels(&mut self) {
        self.push.take();
        self.feed.take();
    }

    // -----------------------------------------------------------------
    // Event pump
    // -----------------------------------------------------------------

    /// Drain both channels and process everything queued. Within a channel
    /// payloads are handled in wire-arrival order; across the two channels
    /// no order is guaranteed on the wire, so none is assumed here either.
    /// Returns the number of payloads handled, malformed ones included.
    pub fn poll(&mut self) -> usize {
        let push_payloads = self.push.as_ref().map(|c| c.drain()).unwrap_or_default();
        let feed_payloads = self.feed.as_ref().map(|c| c.drain()).unwrap_or_default();
        let handled = push_payloads.len() + feed_payloads.len();

        for payload in &push_payloads {
            self.stats.payloads_seen += 1;
            match parse_push_event(payload) {
                Some(event) => self.dispatch(event),
                None => self.stats.payloads_dropped += 1,
            }
        }
        for payload in &feed_payloads {
            self.stats.payloads_seen += 1;
            match parse_feed_event(payload) {
                Some(event) => self.dispatch(event),
                None => self.stats.payloads_dropped += 1,
            }
        }
        handled
    }

    fn dispatch(&mut self, event: ChangeEvent) {
        match route_event(&event, &mut self.stores, &mut self.ledger, &mut self.overlay) {
            RouteAction::Suppressed => self.stats.suppressed += 1,
            RouteAction::Removed => {}
            RouteAction::Refresh(kind) => self.eager_refetch(&[kind]),
            RouteAction::RefreshBoth => self.eager_refetch(&TaskKind::ALL),
        }
    }

    /// The refetch half of invalidate-and-refetch. Failures are already
    /// logged and counted by `refresh`; the store stays stale and the next
    /// `refresh_if_stale` retries.
    fn eager_refetch(&mut self, kinds: &[TaskKind]) {
        if !self.config.eager_refetch {
            return;
        }
        for &kind in kinds {
            let _ = self.refresh(kind);
        }
    }

    // -----------------------------------------------------------------
    // Canonical refresh
    // -----------------------------------------------------------------

    /// Fetch server truth for one sub-kind, swap the snapshot in, and
    /// reconcile overlays against it. On fetch failure nothing changes:
    /// the store keeps its stale flag and the overlay keeps showing the
    /// optimistic value rather than reverting to an unknown state.
    pub fn refresh(&mut self, kind: TaskKind) -> Result<(), BackendError> {
        match self.backend.fetch_canonical(kind) {
            Ok(tasks) => {
                self.stores.get_mut(kind).replace_all(tasks);
                self.stats.refreshes += 1;
                let report = reconcile(self.stores.get(kind), &mut self.ledger, &mut self.overlay);
                if !report.pruned.is_empty() {
                    debug!(kind = kind.as_str(), pruned = report.pruned.len(), "overlays retired");
                }
                Ok(())
            }
            Err(e) => {
                self.stats.refresh_failures += 1;
                warn!(kind = kind.as_str(), error = %e, "canonical refresh failed, keeping optimistic state");
                Err(e)
            }
        }
    }

    /// Refresh both sub-kinds. Attempts both even if the first fails and
    /// reports the first error.
    pub fn refresh_all(&mut self) -> Result<(), BackendError> {
        let mut first_err = None;
        for kind in TaskKind::ALL {
            if let Err(e) = self.refresh(kind)
                && first_err.is_none()
            {
                first_err = Some(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Refresh whichever stores are currently invalidated
    pub fn refresh_if_stale(&mut self) -> Result<(), BackendError> {
        let mut first_err = None;
        for kind in TaskKind::ALL {
            if self.stores.get(kind).is_stale()
                && let Err(e) = self.refresh(kind)
                && first_err.is_none()
            {
                first_err = Some(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    // -----------------------------------------------------------------
    // Local mutations (begin / commit / abort)
    // -----------------------------------------------------------------

    /// Begin a local mutation: apply the intent to the overlay, mark the
    /// id pending, dispatch to the backend. The UI sees the new value
    /// immediately; confirmation arrives later via `mutation_completed`.
    /// A synchronous dispatch failure rolls the intent back and surfaces
    /// the error — nothing was ever in flight.
    pub fn apply_local(&mut self, id: &str, patch: TaskPatch) -> Result<(), SessionError> {
        if patch.is_empty() {
            return Ok(());
        }
        if self.stores.find(id).is_none() {
            return Err(SessionError::NotFound(id.to_string()));
        }

        let prior_patch = self.overlay.get(id).cloned();
        let was_pending = self.ledger.is_pending(id);

        self.overlay.apply(id, &patch);
        self.ledger.begin(id);

        if let Err(e) = self.backend.mutate(id, &patch) {
            match prior_patch {
                Some(prior) => self.overlay.insert(id, prior),
                None => self.overlay.clear(id),
            }
            if !was_pending {
                self.ledger.end(id);
            }
            return Err(e.into());
        }
        Ok(())
    }

    /// Flip a task's status from the user's point of view: whatever the
    /// effective status shows now, move to its toggle target. Returns the
    /// status the UI should render.
    pub fn toggle(&mut self, id: &str) -> Result<TaskStatus, SessionError> {
        let current = {
            let task = self
                .stores
                .find(id)
                .ok_or_else(|| SessionError::NotFound(id.to_string()))?;
            self.overlay.effective(task).status
        };
        let next = current.toggled();
        self.apply_local(id, TaskPatch::status(next))?;
        Ok(next)
    }

    /// Move or clear a task's due date through the same two-phase protocol
    pub fn reschedule(&mut self, id: &str, due: Option<DateTime<Utc>>) -> Result<(), SessionError> {
        self.apply_local(id, TaskPatch::due(due))
    }

    /// The mutation's own completion callback: the server acknowledged the
    /// write. Only the ledger entry ends here — overlay pruning is the
    /// reconciler's job, because pruning before the refetch lands would
    /// re-show stale server data for a frame.
    pub fn mutation_completed(&mut self, id: &str) {
        self.ledger.end(id);
    }

    /// The mutation failed after dispatch. Drop the optimism entirely so
    /// canonical truth re-shows; the server always wins.
    pub fn mutation_failed(&mut self, id: &str) {
        warn!(id, "mutation failed, reverting to canonical state");
        self.ledger.end(id);
        self.overlay.clear(id);
    }

    // -----------------------------------------------------------------
    // Read surface
    // -----------------------------------------------------------------

    /// The entity as the UI should render it — overlay fields substituted
    /// in when a local intent is outstanding. Pure; called per render pass.
    pub fn effective(&self, task: &Task) -> Task {
        self.overlay.effective(task)
    }

    /// Every task of one sub-kind in server order, overlays applied
    pub fn effective_tasks(&self, kind: TaskKind) -> Vec<Task> {
        self.stores
            .get(kind)
            .tasks()
            .map(|t| self.overlay.effective(t))
            .collect()
    }

    /// Canonical entity lookup across both stores
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.stores.find(id)
    }

    /// True while a local mutation of this id awaits confirmation (UI
    /// spinners etc.)
    pub fn is_pending(&self, id: &str) -> bool {
        self.ledger.is_pending(id)
    }

    pub fn store(&self, kind: TaskKind) -> &EntityStore {
        self.stores.get(kind)
    }

    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}
