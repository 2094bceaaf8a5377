use std::fmt;

use crate::model::task::TaskKind;

/// What a change event says happened to an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

impl ChangeKind {
    /// Parse the wire name used by push producers (`"created"` etc.)
    pub fn parse_kind(s: &str) -> Option<ChangeKind> {
        match s {
            "created" => Some(ChangeKind::Created),
            "updated" => Some(ChangeKind::Updated),
            "deleted" => Some(ChangeKind::Deleted),
            _ => None,
        }
    }
}

/// Which channel delivered an event. Kept for diagnostics only — both
/// origins get equal trust once normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOrigin {
    Push,
    ChangeFeed,
}

impl fmt::Display for ChannelOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelOrigin::Push => write!(f, "push"),
            ChannelOrigin::ChangeFeed => write!(f, "change-feed"),
        }
    }
}

/// A change notification after adapter-level unwrapping, the single shape
/// the router decides on regardless of which channel produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub id: String,
    pub kind: ChangeKind,
    /// `None` when the payload did not identify the sub-kind; the router
    /// then refreshes both stores rather than guessing.
    pub task_kind: Option<TaskKind>,
    pub origin: ChannelOrigin,
}
