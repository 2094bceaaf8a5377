use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Task lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    /// The wire name for this status
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    /// Parse a wire name into a status
    pub fn parse_status(s: &str) -> Option<TaskStatus> {
        match s {
            "pending" => Some(TaskStatus::Pending),
            "in_progress" => Some(TaskStatus::InProgress),
            "completed" => Some(TaskStatus::Completed),
            "cancelled" => Some(TaskStatus::Cancelled),
            _ => None,
        }
    }

    /// The status a one-key toggle moves to: anything not completed goes to
    /// completed, completed goes back to pending.
    pub fn toggled(self) -> TaskStatus {
        match self {
            TaskStatus::Completed => TaskStatus::Pending,
            _ => TaskStatus::Completed,
        }
    }
}

/// Sub-kind discriminator. Each kind is cached in its own entity store and
/// refreshed independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Scheduled,
    QuickTodo,
}

impl TaskKind {
    /// Both sub-kinds, for code that has to touch every store.
    pub const ALL: [TaskKind; 2] = [TaskKind::Scheduled, TaskKind::QuickTodo];

    /// The wire name for this kind
    pub fn as_str(self) -> &'static str {
        match self {
            TaskKind::Scheduled => "scheduled",
            TaskKind::QuickTodo => "quick_todo",
        }
    }

    /// Parse a wire name into a kind
    pub fn parse_kind(s: &str) -> Option<TaskKind> {
        match s {
            "scheduled" => Some(TaskKind::Scheduled),
            "quick_todo" => Some(TaskKind::QuickTodo),
            _ => None,
        }
    }
}

/// A task as the backend reports it. Identity is `id`; every other field is
/// replaceable wholesale on refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TaskKind,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub title: String,
    /// Attributes the sync core carries through untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Task {
    /// Create a task with the given identity fields and nothing else
    pub fn new(id: impl Into<String>, kind: TaskKind, status: TaskStatus) -> Self {
        Task {
            id: id.into(),
            kind,
            status,
            due_date: None,
            title: String::new(),
            extra: serde_json::Map::new(),
        }
    }
}

/// A local field delta the user intends but the server has not confirmed.
/// For `due_date` the outer option is "is this field part of the intent",
/// the inner option is the nullable value itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub status: Option<TaskStatus>,
    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl TaskPatch {
    /// A patch that only changes the status
    pub fn status(status: TaskStatus) -> Self {
        TaskPatch {
            status: Some(status),
            ..Default::default()
        }
    }

    /// A patch that only changes (or clears) the due date
    pub fn due(due_date: Option<DateTime<Utc>>) -> Self {
        TaskPatch {
            due_date: Some(due_date),
            ..Default::default()
        }
    }

    /// True when no field is part of the intent
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.due_date.is_none()
    }

    /// Merge a newer intent over this one. Last write wins per field; fields
    /// the newer patch does not mention keep their older intent.
    pub fn merge_from(&mut self, newer: &TaskPatch) {
        if newer.status.is_some() {
            self.status = newer.status;
        }
        if newer.due_date.is_some() {
            self.due_date = newer.due_date;
        }
    }

    /// Substitute the patched fields into a task
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(due) = self.due_date {
            task.due_date = due;
        }
    }

    /// True when every field this patch sets already equals the canonical
    /// value — the server has caught up with the intent.
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(status) = self.status
            && task.status != status
        {
            return false;
        }
        if let Some(due) = self.due_date
            && task.due_date != due
        {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggled_flips_between_pending_and_completed() {
        assert_eq!(TaskStatus::Pending.toggled(), TaskStatus::Completed);
        assert_eq!(TaskStatus::InProgress.toggled(), TaskStatus::Completed);
        assert_eq!(TaskStatus::Cancelled.toggled(), TaskStatus::Completed);
        assert_eq!(TaskStatus::Completed.toggled(), TaskStatus::Pending);
    }

    #[test]
    fn status_names_round_trip() {
        for status in [
            TaskStatus::Pending,
            TaskStatus::InProgress,
            TaskStatus::Completed,
            TaskStatus::Cancelled,
        ] {
            assert_eq!(TaskStatus::parse_status(status.as_str()), Some(status));
        }
        assert_eq!(TaskStatus::parse_status("done"), None);
    }

    #[test]
    fn task_deserializes_with_extra_fields() {
        let task: Task = serde_json::from_value(serde_json::json!({
            "id": "t1",
            "type": "scheduled",
            "status": "in_progress",
            "title": "write report",
            "assignee": "sam",
            "course": "HIST-201",
        }))
        .unwrap();
        assert_eq!(task.id, "t1");
        assert_eq!(task.kind, TaskKind::Scheduled);
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.due_date, None);
        assert_eq!(task.extra["assignee"], "sam");
    }

    #[test]
    fn patch_merge_is_last_write_wins_per_field() {
        let mut patch = TaskPatch::status(TaskStatus::Completed);
        patch.merge_from(&TaskPatch::due(None));
        // Older status intent survives a due-date-only update
        assert_eq!(patch.status, Some(TaskStatus::Completed));
        assert_eq!(patch.due_date, Some(None));

        patch.merge_from(&TaskPatch::status(TaskStatus::Pending));
        assert_eq!(patch.status, Some(TaskStatus::Pending));
    }

    #[test]
    fn patch_matches_checks_only_set_fields() {
        let mut task = Task::new("t1", TaskKind::Scheduled, TaskStatus::Completed);
        task.due_date = Some("2026-03-01T12:00:00Z".parse().unwrap());

        assert!(TaskPatch::status(TaskStatus::Completed).matches(&task));
        assert!(!TaskPatch::status(TaskStatus::Pending).matches(&task));
        assert!(!TaskPatch::due(None).matches(&task));
        assert!(TaskPatch::default().matches(&task));
    }

    #[test]
    fn patch_apply_substitutes_fields() {
        let mut task = Task::new("t1", TaskKind::QuickTodo, TaskStatus::Pending);
        let mut patch = TaskPatch::status(TaskStatus::Completed);
        patch.merge_from(&TaskPatch::due(Some("2026-04-01T00:00:00Z".parse().unwrap())));
        patch.apply_to(&mut task);
        assert_eq!(task.status, TaskStatus::Completed);
        assert!(task.due_date.is_some());
    }
}
