//! SPARQL transport layer for the Tidemark LDES consumer.
//!
//! Everything that touches the wire lives here: building the SELECT text
//! for a query window, fetching one page per GET round trip, and walking
//! the cursor chain sequentially until the result set is complete. The
//! crate hands raw JSON bindings upward; normalization and reconciliation
//! belong to `tidemark-core`.
//!
//! # Modules
//!
//! - [`sparql`] -- SELECT text construction from a query window
//! - [`page`] -- One-page fetches and the endpoint handle
//! - [`pager`] -- Sequential cursor-chain accumulation with cap truncation
//! - [`cancel`] -- Cooperative cancellation between pages
//! - [`error`] -- Transport error taxonomy

pub mod cancel;
pub mod error;
pub mod page;
pub mod pager;
pub mod sparql;

// Re-export primary types at crate root.
pub use cancel::CancellationToken;
pub use error::ClientError;
pub use page::{Page, SparqlEndpoint};
pub use pager::collect_bindings;
pub use sparql::build_select;
