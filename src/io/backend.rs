use crate::model::task::{Task, TaskKind, TaskPatch};

/// Error type for backend operations
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("backend rejected mutation of {id}: {reason}")]
    Rejected { id: String, reason: String },
}

/// The canonical-state capabilities the hosting app's transport clients
/// provide. The sync core never talks to a socket or a database itself.
pub trait Backend {
    /// Idempotent, side-effect-free read of current server truth for one
    /// sub-kind.
    fn fetch_canonical(&mut self, kind: TaskKind) -> Result<Vec<Task>, BackendError>;

    /// Dispatch a mutation. Fire-and-forget from the caller's perspective:
    /// an `Ok` means dispatched, not confirmed — confirmation arrives later
    /// through the session's completion callback.
    fn mutate(&mut self, id: &str, patch: &TaskPatch) -> Result<(), BackendError>;
}
