//! Shared type definitions for the Tidemark LDES consumer.
//!
//! This crate is the single source of truth for the types used across the
//! Tidemark workspace. Types defined here flow downstream to `TypeScript`
//! via `ts-rs` for dashboard consumption.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe string wrappers for dataset, metric, thing, and
//!   entity identifiers
//! - [`event`] -- The event log entry, its reconciliation tags, and the
//!   caller-facing observation
//! - [`query`] -- The query window parameter object and wire-facing enums

pub mod event;
pub mod ids;
pub mod query;

// Re-export all public types at crate root for convenience.
pub use event::{Event, EventTags, Observation};
pub use ids::{DatasetId, EntityId, MetricId, ThingId};
pub use query::{EventField, EventOrdering, QueryWindow, TimestampPrecision};
