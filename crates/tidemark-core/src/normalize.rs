//! Normalization of raw SPARQL bindings into typed events.
//!
//! The endpoint answers with binding objects of the form
//! `{"field": {"value": ...}}`. Normalization enforces the contract one
//! binding at a time: a timestamp and a value are mandatory, tags are
//! parsed only when the caller asked for them, and a missing tags member
//! is an event with no identity rather than an error. Tag parsing handles
//! the closed bookkeeping vocabulary (`id`, `update`, `deleted`) and drops
//! every other key at the parse site.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tidemark_types::{EntityId, Event, EventTags};

use crate::error::ServiceError;

/// Normalize one binding into an event.
///
/// `with_tags` mirrors whether the caller requested the tags field; when
/// false, tag content is never inspected and the event carries default
/// bookkeeping (no identity, revision zero, live).
///
/// # Errors
///
/// Returns [`ServiceError::Protocol`] when the timestamp or value is
/// missing or unparseable, or when requested tags are malformed.
pub fn event_from_binding(binding: &Value, with_tags: bool) -> Result<Event, ServiceError> {
    let timestamp = require_timestamp(binding)?;
    let value = require_value(binding)?;
    let tags = if with_tags {
        parse_tags(binding)?
    } else {
        EventTags::default()
    };
    Ok(Event {
        timestamp,
        value,
        tags,
    })
}

/// Normalize a whole page of bindings, preserving order.
///
/// One bad binding fails the lot; callers never see partial pages.
///
/// # Errors
///
/// Returns the first [`ServiceError::Protocol`] produced by a binding.
pub fn events_from_bindings(
    bindings: &[Value],
    with_tags: bool,
) -> Result<Vec<Event>, ServiceError> {
    bindings
        .iter()
        .map(|binding| event_from_binding(binding, with_tags))
        .collect()
}

/// Look up `binding.<field>.value`.
fn field_value<'a>(binding: &'a Value, field: &str) -> Option<&'a Value> {
    binding.get(field).and_then(|f| f.get("value"))
}

fn require_timestamp(binding: &Value) -> Result<DateTime<Utc>, ServiceError> {
    field_value(binding, "timestamp")
        .and_then(Value::as_str)
        .ok_or_else(|| ServiceError::Protocol("binding missing timestamp value".to_owned()))?
        .parse::<DateTime<Utc>>()
        .map_err(|e| ServiceError::Protocol(format!("binding timestamp is not an instant: {e}")))
}

fn require_value(binding: &Value) -> Result<f64, ServiceError> {
    let raw = field_value(binding, "value")
        .ok_or_else(|| ServiceError::Protocol("binding missing observed value".to_owned()))?;
    // Endpoints differ on whether numeric literals arrive as JSON numbers
    // or decimal strings; both are accepted.
    raw.as_f64()
        .or_else(|| raw.as_str().and_then(|s| s.parse::<f64>().ok()))
        .ok_or_else(|| ServiceError::Protocol("binding value is not numeric".to_owned()))
}

fn parse_tags(binding: &Value) -> Result<EventTags, ServiceError> {
    let Some(raw) = binding.get("tags") else {
        return Ok(EventTags::default());
    };
    let entries = raw
        .get("value")
        .and_then(Value::as_array)
        .ok_or_else(|| ServiceError::Protocol("binding tags value is not an array".to_owned()))?;

    let mut tags = EventTags::default();
    for entry in entries {
        let entry = entry
            .as_str()
            .ok_or_else(|| ServiceError::Protocol("binding tag entry is not a string".to_owned()))?;
        let (key, value) = entry.split_once('=').ok_or_else(|| {
            ServiceError::Protocol(format!("binding tag entry is not key=value: {entry}"))
        })?;
        match key {
            "id" => tags.identity = Some(EntityId::new(value)),
            "update" => {
                tags.version = value.parse::<u64>().map_err(|e| {
                    ServiceError::Protocol(format!("update tag is not an integer: {e}"))
                })?;
            }
            "deleted" => {
                tags.deleted = value.parse::<bool>().map_err(|e| {
                    ServiceError::Protocol(format!("deleted tag is not a boolean: {e}"))
                })?;
            }
            // Closed vocabulary: anything else is dropped here.
            _ => {}
        }
    }
    Ok(tags)
}
