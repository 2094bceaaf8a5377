pub mod entities;
pub mod ledger;
pub mod overlay;
pub mod reconcile;
pub mod router;

pub use entities::{EntityStore, StoreSet};
pub use ledger::PendingLedger;
pub use overlay::OptimisticOverlay;
pub use reconcile::{ReconcileReport, reconcile};
pub use router::{RouteAction, route_event};
