//! Error types for the transport layer.
//!
//! Uses `thiserror` for typed errors covering the two failure classes the
//! endpoint can produce (the network call itself, and a reply that does not
//! have the promised shape) plus caller-driven cancellation.

/// Errors that can occur while fetching pages from the endpoint.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The network call could not complete: connection failure, timeout,
    /// a non-success status, or a body that is not decodable JSON.
    #[error("transport error: {0}")]
    Transport(String),

    /// The reply decoded but lacks the expected result structure.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The query was abandoned between pages via its cancellation token.
    #[error("query cancelled")]
    Cancelled,
}
