use serde::Serialize;

use crate::ops::entities::EntityStore;
use crate::ops::ledger::PendingLedger;
use crate::ops::overlay::OptimisticOverlay;

/// What one reconciliation pass did, for diagnostics and tests
#[derive(Debug, Default, Serialize)]
pub struct ReconcileReport {
    pub pruned: Vec<String>,
    pub retained: Vec<String>,
}

/// Retire optimistic overlays that a freshly refreshed store has caught up
/// with. Runs as a pure reaction to "store for sub-kind X was refreshed",
/// never at any other time.
///
/// For each overlaid id:
/// - no matching entity in the store: retain. Absence may itself be the
///   staleness the ledger is protecting against (deleted, or not yet in a
///   stale fetch window) — never prune on absence.
/// - entity present: prune when the ledger no longer lists the id, or when
///   the canonical value already satisfies the patch. Network completion
///   and push confirmation can land in either order, so both signals are
///   checked independently. A value match also ends the ledger entry: the
///   refresh observed the id no longer needs reconciling.
pub fn reconcile(
    store: &EntityStore,
    ledger: &mut PendingLedger,
    overlay: &mut OptimisticOverlay,
) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    for id in overlay.ids() {
        let Some(task) = store.get(&id) else {
            report.retained.push(id);
            continue;
        };
        let Some(patch) = overlay.get(&id) else {
            continue;
        };

        let confirmed = patch.matches(task);
        if confirmed || !ledger.is_pending(&id) {
            overlay.clear(&id);
            if confirmed {
                ledger.end(&id);
            }
            report.pruned.push(id);
        } else {
            report.retained.push(id);
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::{Task, TaskKind, TaskPatch, TaskStatus};

    fn store_with(tasks: Vec<Task>) -> EntityStore {
        let mut store = EntityStore::new(TaskKind::Scheduled);
        store.replace_all(tasks);
        store
    }

    #[test]
    fn absent_entity_retains_overlay() {
        let store = store_with(vec![]);
        let mut ledger = PendingLedger::new();
        let mut overlay = OptimisticOverlay::new();
        overlay.apply("t1", &TaskPatch::status(TaskStatus::Completed));

        let report = reconcile(&store, &mut ledger, &mut overlay);

        assert_eq!(report.retained, vec!["t1"]);
        assert_eq!(overlay.len(), 1);
    }

    #[test]
    fn ledger_clear_alone_prunes() {
        // Mutation completed but the canonical value is still stale — the
        // refresh that just ran is authoritative, so the overlay goes.
        let store = store_with(vec![Task::new("t1", TaskKind::Scheduled, TaskStatus::Pending)]);
        let mut ledger = PendingLedger::new();
        let mut overlay = OptimisticOverlay::new();
        overlay.apply("t1", &TaskPatch::status(TaskStatus::Completed));

        let report = reconcile(&store, &mut ledger, &mut overlay);

        assert_eq!(report.pruned, vec!["t1"]);
        assert!(overlay.is_empty());
    }

    #[test]
    fn value_match_prunes_and_ends_ledger_while_still_pending() {
        // The push confirmation raced ahead of the mutation's own completion
        // callback: the server already shows the intended value.
        let store = store_with(vec![Task::new("t1", TaskKind::Scheduled, TaskStatus::Completed)]);
        let mut ledger = PendingLedger::new();
        let mut overlay = OptimisticOverlay::new();
        ledger.begin("t1");
        overlay.apply("t1", &TaskPatch::status(TaskStatus::Completed));

        let report = reconcile(&store, &mut ledger, &mut overlay);

        assert_eq!(report.pruned, vec!["t1"]);
        assert!(overlay.is_empty());
        assert!(!ledger.is_pending("t1"));
    }

    #[test]
    fn pending_and_unconfirmed_retains() {
        let store = store_with(vec![Task::new("t1", TaskKind::Scheduled, TaskStatus::Pending)]);
        let mut ledger = PendingLedger::new();
        let mut overlay = OptimisticOverlay::new();
        ledger.begin("t1");
        overlay.apply("t1", &TaskPatch::status(TaskStatus::Completed));

        let report = reconcile(&store, &mut ledger, &mut overlay);

        assert_eq!(report.retained, vec!["t1"]);
        assert!(ledger.is_pending("t1"));
        assert_eq!(overlay.len(), 1);
    }
}
