//! Domain logic for the Tidemark LDES consumer.
//!
//! The transport crate hands this one raw JSON bindings; everything that
//! gives them meaning lives here. Bindings become typed events, events
//! fold into live observations, and the query service stitches the read
//! operations together over one endpoint and stream identity.
//!
//! # Modules
//!
//! - [`config`] -- YAML configuration with environment overrides
//! - [`error`] -- The service error taxonomy
//! - [`normalize`] -- Raw binding to typed event conversion
//! - [`reconcile`] -- Last-write-wins folding with tombstone precedence
//! - [`service`] -- The observation query service and its operations

pub mod config;
pub mod error;
pub mod normalize;
pub mod reconcile;
pub mod service;

// Re-export primary types at crate root.
pub use config::{ConfigError, ConsumerConfig};
pub use error::ServiceError;
pub use normalize::{event_from_binding, events_from_bindings};
pub use reconcile::{ReconciliationState, reconcile};
pub use service::ObservationService;
