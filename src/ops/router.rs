use tracing::debug;

use crate::model::event::{ChangeEvent, ChangeKind};
use crate::model::task::TaskKind;
use crate::ops::entities::StoreSet;
use crate::ops::ledger::PendingLedger;
use crate::ops::overlay::OptimisticOverlay;

/// What the router decided to do with one normalized event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAction {
    /// Deletion applied: entity removed, overlay and ledger purged
    Removed,
    /// The id has a pending local mutation; the event was dropped so a
    /// staler server snapshot racing ahead on the wire cannot revert a
    /// newer local intent
    Suppressed,
    /// Accepted; the named store was invalidated and wants a refetch
    Refresh(TaskKind),
    /// Accepted but the payload did not identify the sub-kind; both stores
    /// were invalidated
    RefreshBoth,
}

/// Decide what one change event means for the local state. Deletions are
/// applied directly; everything else either gets suppressed against the
/// ledger or invalidates the affected store. The caller performs the eager
/// refetch for `Refresh`/`RefreshBoth`.
pub fn route_event(
    event: &ChangeEvent,
    stores: &mut StoreSet,
    ledger: &mut PendingLedger,
    overlay: &mut OptimisticOverlay,
) -> RouteAction {
    // Deletions first, even for pending ids. An overlay on a deleted entity
    // is a dangling reference and must never resurrect a ghost row.
    if event.kind == ChangeKind::Deleted {
        let removed = match event.task_kind {
            Some(kind) => stores.get_mut(kind).remove(&event.id).is_some(),
            None => stores.remove_everywhere(&event.id),
        };
        overlay.clear(&event.id);
        ledger.end(&event.id);
        debug!(id = %event.id, origin = %event.origin, removed, "deletion applied");
        return RouteAction::Removed;
    }

    if ledger.is_pending(&event.id) {
        debug!(id = %event.id, origin = %event.origin, "suppressing event for pending mutation");
        return RouteAction::Suppressed;
    }

    match event.task_kind {
        Some(kind) => {
            stores.get_mut(kind).mark_stale();
            RouteAction::Refresh(kind)
        }
        None => {
            for kind in TaskKind::ALL {
                stores.get_mut(kind).mark_stale();
            }
            RouteAction::RefreshBoth
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::event::ChannelOrigin;
    use crate::model::task::{Task, TaskPatch, TaskStatus};

    fn event(id: &str, kind: ChangeKind, task_kind: Option<TaskKind>) -> ChangeEvent {
        ChangeEvent {
            id: id.to_string(),
            kind,
            task_kind,
            origin: ChannelOrigin::Push,
        }
    }

    fn seeded_stores() -> StoreSet {
        let mut stores = StoreSet::new();
        stores
            .get_mut(TaskKind::Scheduled)
            .replace_all(vec![Task::new("t1", TaskKind::Scheduled, TaskStatus::Pending)]);
        stores
            .get_mut(TaskKind::QuickTodo)
            .replace_all(vec![Task::new("q1", TaskKind::QuickTodo, TaskStatus::Pending)]);
        stores
    }

    #[test]
    fn pending_id_is_suppressed_without_invalidation() {
        let mut stores = seeded_stores();
        let mut ledger = PendingLedger::new();
        let mut overlay = OptimisticOverlay::new();
        ledger.begin("t1");

        let action = route_event(
            &event("t1", ChangeKind::Updated, Some(TaskKind::Scheduled)),
            &mut stores,
            &mut ledger,
            &mut overlay,
        );

        assert_eq!(action, RouteAction::Suppressed);
        assert!(!stores.get(TaskKind::Scheduled).is_stale());
    }

    #[test]
    fn accepted_event_invalidates_only_its_kind() {
        let mut stores = seeded_stores();
        let mut ledger = PendingLedger::new();
        let mut overlay = OptimisticOverlay::new();

        let action = route_event(
            &event("q1", ChangeKind::Updated, Some(TaskKind::QuickTodo)),
            &mut stores,
            &mut ledger,
            &mut overlay,
        );

        assert_eq!(action, RouteAction::Refresh(TaskKind::QuickTodo));
        assert!(stores.get(TaskKind::QuickTodo).is_stale());
        assert!(!stores.get(TaskKind::Scheduled).is_stale());
    }

    #[test]
    fn unknown_kind_invalidates_both() {
        let mut stores = seeded_stores();
        let mut ledger = PendingLedger::new();
        let mut overlay = OptimisticOverlay::new();

        let action = route_event(
            &event("t9", ChangeKind::Created, None),
            &mut stores,
            &mut ledger,
            &mut overlay,
        );

        assert_eq!(action, RouteAction::RefreshBoth);
        assert!(stores.get(TaskKind::Scheduled).is_stale());
        assert!(stores.get(TaskKind::QuickTodo).is_stale());
    }

    #[test]
    fn deletion_purges_store_overlay_and_ledger_even_while_pending() {
        let mut stores = seeded_stores();
        let mut ledger = PendingLedger::new();
        let mut overlay = OptimisticOverlay::new();
        ledger.begin("t1");
        overlay.apply("t1", &TaskPatch::status(TaskStatus::Completed));

        let action = route_event(
            &event("t1", ChangeKind::Deleted, Some(TaskKind::Scheduled)),
            &mut stores,
            &mut ledger,
            &mut overlay,
        );

        assert_eq!(action, RouteAction::Removed);
        assert!(stores.find("t1").is_none());
        assert!(overlay.is_empty());
        assert!(!ledger.is_pending("t1"));
    }

    #[test]
    fn deletion_without_kind_searches_both_stores() {
        let mut stores = seeded_stores();
        let mut ledger = PendingLedger::new();
        let mut overlay = OptimisticOverlay::new();

        route_event(
            &event("q1", ChangeKind::Deleted, None),
            &mut stores,
            &mut ledger,
            &mut overlay,
        );

        assert!(stores.find("q1").is_none());
        assert!(stores.find("t1").is_some());
    }
}
