use serde_json::Value;
use tracing::debug;

use crate::model::event::{ChangeEvent, ChangeKind, ChannelOrigin};
use crate::model::task::TaskKind;

/// Normalize a change-feed row event into a change event. Rows look like
/// `{"type": "UPDATE", "table": "tasks", "record": {…}, "old_record": {…}}`;
/// deletes carry only the prior image in `old_record`.
pub fn parse_feed_event(payload: &Value) -> Option<ChangeEvent> {
    let row_type = payload.get("type").and_then(Value::as_str)?;
    let kind = match row_type {
        "INSERT" => ChangeKind::Created,
        "UPDATE" => ChangeKind::Updated,
        "DELETE" => ChangeKind::Deleted,
        other => {
            debug!(row_type = other, "unrecognized change-feed row type, dropping");
            return None;
        }
    };

    let record = match kind {
        ChangeKind::Deleted => payload.get("old_record").or_else(|| payload.get("record")),
        _ => payload.get("record"),
    }?;

    let id = record.get("id")?.as_str()?;
    if id.is_empty() {
        return None;
    }

    let task_kind = payload
        .get("table")
        .and_then(Value::as_str)
        .and_then(table_kind)
        .or_else(|| {
            record
                .get("type")
                .and_then(Value::as_str)
                .and_then(TaskKind::parse_kind)
        });

    Some(ChangeEvent {
        id: id.to_string(),
        kind,
        task_kind,
        origin: ChannelOrigin::ChangeFeed,
    })
}

/// Map a feed table name to the sub-kind it stores
fn table_kind(table: &str) -> Option<TaskKind> {
    match table {
        "tasks" => Some(TaskKind::Scheduled),
        "quick_todos" => Some(TaskKind::QuickTodo),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_insert_update_delete() {
        let insert = parse_feed_event(&json!({
            "type": "INSERT", "table": "tasks", "record": {"id": "t1"}
        }))
        .unwrap();
        assert_eq!(insert.kind, ChangeKind::Created);
        assert_eq!(insert.task_kind, Some(TaskKind::Scheduled));
        assert_eq!(insert.origin, ChannelOrigin::ChangeFeed);

        let update = parse_feed_event(&json!({
            "type": "UPDATE", "table": "quick_todos", "record": {"id": "q1"}
        }))
        .unwrap();
        assert_eq!(update.kind, ChangeKind::Updated);
        assert_eq!(update.task_kind, Some(TaskKind::QuickTodo));

        let delete = parse_feed_event(&json!({
            "type": "DELETE", "table": "tasks", "old_record": {"id": "t2"}
        }))
        .unwrap();
        assert_eq!(delete.kind, ChangeKind::Deleted);
        assert_eq!(delete.id, "t2");
    }

    #[test]
    fn unknown_table_falls_back_to_record_type() {
        let event = parse_feed_event(&json!({
            "type": "UPDATE",
            "table": "planner_items",
            "record": {"id": "t3", "type": "quick_todo"}
        }))
        .unwrap();
        assert_eq!(event.task_kind, Some(TaskKind::QuickTodo));
    }

    #[test]
    fn malformed_rows_yield_none() {
        assert_eq!(parse_feed_event(&json!({"type": "TRUNCATE", "record": {"id": "x"}})), None);
        assert_eq!(parse_feed_event(&json!({"table": "tasks", "record": {"id": "x"}})), None);
        assert_eq!(parse_feed_event(&json!({"type": "UPDATE", "table": "tasks"})), None);
        assert_eq!(parse_feed_event(&json!({"type": "UPDATE", "record": {"id": ""}})), None);
        assert_eq!(parse_feed_event(&json!(null)), None);
    }
}
