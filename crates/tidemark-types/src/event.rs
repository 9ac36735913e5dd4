//! Event and observation types for the consumed stream.
//!
//! An [`Event`] is one entry of the append-only log: a timestamped value
//! plus the bookkeeping tags that drive reconciliation. An [`Observation`]
//! is the caller-facing unit with the bookkeeping stripped away.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::EntityId;

/// Reconciliation tags attached to an event.
///
/// The stream encodes these as `key=value` strings; they are parsed once
/// during normalization into this closed set. Keys outside the set are
/// dropped at the parse site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EventTags {
    /// Identity linking revisions of the same observation (`id` tag).
    /// Absent means the event cannot participate in reconciliation.
    pub identity: Option<EntityId>,
    /// Revision counter (`update` tag). Events without the tag count as
    /// revision zero.
    pub version: u64,
    /// Tombstone marker (`deleted` tag). A deleted event removes the
    /// observation its identity points at.
    pub deleted: bool,
}

impl EventTags {
    /// Whether the event carries an identity and can be reconciled.
    pub const fn is_identified(&self) -> bool {
        self.identity.is_some()
    }
}

/// One entry of the event log, as produced by normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Event {
    /// When the observed value was recorded.
    pub timestamp: DateTime<Utc>,
    /// The observed value.
    pub value: f64,
    /// Reconciliation bookkeeping. Defaulted when the caller did not
    /// request tags or the binding carried none.
    pub tags: EventTags,
}

impl Event {
    /// Build an event with default tags (no identity, revision zero).
    pub const fn untagged(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self {
            timestamp,
            value,
            tags: EventTags {
                identity: None,
                version: 0,
                deleted: false,
            },
        }
    }
}

/// A reconciled, caller-facing observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Observation {
    /// When the observed value was recorded.
    pub timestamp: DateTime<Utc>,
    /// The observed value.
    pub value: f64,
}

impl From<&Event> for Observation {
    fn from(event: &Event) -> Self {
        Self {
            timestamp: event.timestamp,
            value: event.value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_timestamp() -> DateTime<Utc> {
        DateTime::from_timestamp_millis(1_678_107_241_915).unwrap_or_default()
    }

    #[test]
    fn default_tags_are_revision_zero_and_live() {
        let tags = EventTags::default();
        assert!(tags.identity.is_none());
        assert_eq!(tags.version, 0);
        assert!(!tags.deleted);
        assert!(!tags.is_identified());
    }

    #[test]
    fn untagged_event_matches_default_tags() {
        let event = Event::untagged(sample_timestamp(), 21.5);
        assert_eq!(event.tags, EventTags::default());
    }

    #[test]
    fn observation_strips_tags() {
        let event = Event {
            timestamp: sample_timestamp(),
            value: 21.5,
            tags: EventTags {
                identity: Some(EntityId::new("a")),
                version: 3,
                deleted: false,
            },
        };
        let observation = Observation::from(&event);
        assert_eq!(observation.timestamp, event.timestamp);
        assert!((observation.value - event.value).abs() < f64::EPSILON);
    }
}
