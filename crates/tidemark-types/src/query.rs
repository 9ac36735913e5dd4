//! Query parameter types shared between the service and transport layers.
//!
//! A [`QueryWindow`] describes one read of the stream: the metric, the
//! optional time bounds, the item cap, and the projection/ordering hints.
//! The enums mirror the field labels and keywords the wire protocol names.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::{MetricId, ThingId};

// ---------------------------------------------------------------------------
// Wire-facing enums
// ---------------------------------------------------------------------------

/// A field of the wire event model that a caller can request.
///
/// Only `Timestamp`, `Value`, and `Tags` affect this consumer's behavior
/// (tags toggle reconciliation bookkeeping during normalization); the rest
/// exist so windows can express the full upstream projection vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub enum EventField {
    /// When the value was observed.
    Timestamp,
    /// The dataset the event belongs to.
    Dataset,
    /// The metric the event measures.
    Metric,
    /// The party that produced the event.
    Producer,
    /// The ingest source of the event.
    Source,
    /// The observed value.
    Value,
    /// The `key=value` bookkeeping tags.
    Tags,
    /// Free-form location name.
    Location,
    /// Geohash of the observation's position.
    Geohash,
    /// Elevation of the observation's position.
    Elevation,
    /// Server-side receipt time.
    TsReceived,
}

impl EventField {
    /// The wire label of this field.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Timestamp => "timestamp",
            Self::Dataset => "dataset",
            Self::Metric => "metric",
            Self::Producer => "producer",
            Self::Source => "source",
            Self::Value => "value",
            Self::Tags => "tags",
            Self::Location => "location",
            Self::Geohash => "geohash",
            Self::Elevation => "elevation",
            Self::TsReceived => "tsReceived",
        }
    }
}

/// Result ordering requested from the endpoint.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub enum EventOrdering {
    /// Oldest first.
    #[serde(rename = "asc")]
    Ascending,
    /// Newest first. The stream is consumed newest-first by default.
    #[default]
    #[serde(rename = "desc")]
    Descending,
}

impl EventOrdering {
    /// The SPARQL `ORDER BY` keyword for this ordering.
    pub const fn sparql_keyword(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// Sub-second digits used when rendering timestamp literals.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "lowercase")]
pub enum TimestampPrecision {
    /// Whole seconds.
    Seconds,
    /// Three sub-second digits.
    #[default]
    Milliseconds,
    /// Six sub-second digits.
    Microseconds,
}

impl TimestampPrecision {
    /// The chrono rendering format for this precision.
    pub const fn seconds_format(self) -> SecondsFormat {
        match self {
            Self::Seconds => SecondsFormat::Secs,
            Self::Milliseconds => SecondsFormat::Millis,
            Self::Microseconds => SecondsFormat::Micros,
        }
    }
}

// ---------------------------------------------------------------------------
// QueryWindow
// ---------------------------------------------------------------------------

/// Parameters of one read against the stream.
///
/// Both time bounds are exclusive. The `limit` caps the total number of
/// items accumulated across pages; it is never rendered into the query
/// text, which stays unbounded except for the no-bounds latest-value shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct QueryWindow {
    /// The thing whose observations are read, when the endpoint serves
    /// more than one.
    pub thing_id: Option<ThingId>,
    /// The metric to read.
    pub metric_id: MetricId,
    /// Exclusive lower time bound.
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper time bound.
    pub to: Option<DateTime<Utc>>,
    /// Total item cap enforced while paging.
    pub limit: Option<usize>,
    /// Fields the caller wants populated. Tag parsing is skipped unless
    /// [`EventField::Tags`] is listed.
    pub fields: Vec<EventField>,
    /// Ordering rendered into the query text.
    pub order: EventOrdering,
    /// Sub-second digits for rendered bound literals.
    pub precision: TimestampPrecision,
}

impl QueryWindow {
    /// A window over `metric_id` with no bounds, no cap, descending order,
    /// and the plain timestamp/value projection.
    pub fn new(metric_id: MetricId) -> Self {
        Self {
            thing_id: None,
            metric_id,
            from: None,
            to: None,
            limit: None,
            fields: vec![EventField::Timestamp, EventField::Value],
            order: EventOrdering::default(),
            precision: TimestampPrecision::default(),
        }
    }

    /// Whether the caller requested the tags field.
    pub fn wants_tags(&self) -> bool {
        self.fields.contains(&EventField::Tags)
    }
}
