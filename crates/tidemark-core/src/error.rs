//! Error types for the observation query service.
//!
//! Uses `thiserror` for typed errors that surface through the whole read
//! pipeline: transport, reply decoding, configuration, and the operations
//! the stream does not serve. Transport-layer errors map variant-wise so
//! callers keep the original failure class.

use tidemark_client::ClientError;

/// Errors that can occur while serving an observation query.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The endpoint call could not complete.
    #[error("transport error: {0}")]
    Transport(String),

    /// The endpoint answered with an unusable shape, or a binding could
    /// not be normalized into an event.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Configuration is invalid or missing.
    #[error("config error: {0}")]
    Config(String),

    /// The requested operation is not served by the event stream.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// The query was abandoned between pages.
    #[error("query cancelled")]
    Cancelled,
}

impl From<ClientError> for ServiceError {
    fn from(error: ClientError) -> Self {
        match error {
            ClientError::Transport(message) => Self::Transport(message),
            ClientError::Protocol(message) => Self::Protocol(message),
            ClientError::Cancelled => Self::Cancelled,
        }
    }
}
