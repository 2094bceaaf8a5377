//! Task-state synchronization core for a planner app.
//!
//! Keeps a locally cached task list consistent across three racing sources:
//! optimistic edits the user makes before server confirmation, push events
//! from the server-side bus, and a database change-feed that can report the
//! same mutation independently. The UI must never flicker, double-apply, or
//! revert the user's own pending edit; this crate owns the ledger, overlay,
//! routing, and reconciliation rules that guarantee that.

pub mod io;
pub mod model;
pub mod ops;
pub mod parse;
pub mod session;

pub use io::backend::{Backend, BackendError};
pub use model::event::{ChangeEvent, ChangeKind, ChannelOrigin};
pub use model::task::{Task, TaskKind, TaskPatch, TaskStatus};
pub use session::{SessionError, SyncConfig, SyncSession, SyncStats};
