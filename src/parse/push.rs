use serde_json::Value;
use tracing::debug;

use crate::model::event::{ChangeEvent, ChangeKind, ChannelOrigin};
use crate::model::task::TaskKind;

/// One way to unwrap a push envelope down to its entity object. Returns the
/// entity plus the change kind when the envelope itself names one.
type Unwrap = fn(&Value) -> Option<(Option<ChangeKind>, &Value)>;

/// Known envelope shapes, most specific first. Multiple backend producers
/// emit push events independently, so all of these are live traffic; the
/// order is a fixed priority, not a guess.
const UNWRAPS: &[Unwrap] = &[
    unwrap_operation_item,
    unwrap_data_task,
    unwrap_data_direct,
    unwrap_task,
    unwrap_direct,
];

/// Normalize a push payload into a change event, or `None` when no known
/// shape yields an entity. A miss is expected traffic, not a failure.
pub fn parse_push_event(payload: &Value) -> Option<ChangeEvent> {
    for extract in UNWRAPS {
        if let Some((kind_hint, entity)) = extract(payload)
            && let Some(event) = normalize_entity(entity, kind_hint, payload)
        {
            return Some(event);
        }
    }
    debug!("push payload matched no known envelope shape, dropping");
    None
}

/// `{"data": {"updated_item": {"task": {…}}}}` — the operation wrapper names
/// the change kind. `created_item` / `deleted_item` likewise.
fn unwrap_operation_item(payload: &Value) -> Option<(Option<ChangeKind>, &Value)> {
    let data = payload.get("data")?;
    for (key, kind) in [
        ("created_item", ChangeKind::Created),
        ("updated_item", ChangeKind::Updated),
        ("deleted_item", ChangeKind::Deleted),
    ] {
        if let Some(wrapper) = data.get(key) {
            // Some producers wrap the entity under "task", some inline it
            let entity = wrapper.get("task").unwrap_or(wrapper);
            return Some((Some(kind), entity));
        }
    }
    None
}

/// `{"data": {"task": {…}}}`
fn unwrap_data_task(payload: &Value) -> Option<(Option<ChangeKind>, &Value)> {
    payload.get("data")?.get("task").map(|e| (None, e))
}

/// `{"data": {…entity…}}`
fn unwrap_data_direct(payload: &Value) -> Option<(Option<ChangeKind>, &Value)> {
    payload.get("data").filter(|d| d.is_object()).map(|e| (None, e))
}

/// `{"task": {…}}`
fn unwrap_task(payload: &Value) -> Option<(Option<ChangeKind>, &Value)> {
    payload.get("task").map(|e| (None, e))
}

/// `{…entity…}` — the payload is the entity itself
fn unwrap_direct(payload: &Value) -> Option<(Option<ChangeKind>, &Value)> {
    payload.is_object().then_some((None, payload))
}

/// Turn an unwrapped entity object into an event. Requires a non-empty
/// string `id`; an `"event"` field on the entity or the envelope overrides
/// the change kind, otherwise `updated` is assumed.
fn normalize_entity(
    entity: &Value,
    kind_hint: Option<ChangeKind>,
    payload: &Value,
) -> Option<ChangeEvent> {
    let id = entity.get("id")?.as_str()?;
    if id.is_empty() {
        return None;
    }
    let kind = kind_hint
        .or_else(|| event_field(entity))
        .or_else(|| event_field(payload))
        .unwrap_or(ChangeKind::Updated);
    let task_kind = entity
        .get("type")
        .and_then(Value::as_str)
        .and_then(TaskKind::parse_kind);
    Some(ChangeEvent {
        id: id.to_string(),
        kind,
        task_kind,
        origin: ChannelOrigin::Push,
    })
}

fn event_field(value: &Value) -> Option<ChangeKind> {
    value
        .get("event")
        .and_then(Value::as_str)
        .and_then(ChangeKind::parse_kind)
}
