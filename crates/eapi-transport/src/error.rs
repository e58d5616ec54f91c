//! Transport error types.

use thiserror::Error;

/// A specialized `Result` type for transport operations.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Errors a transport binding can raise while carrying one exchange.
///
/// The connection layer collapses every variant into a single
/// connection-failure classification; the variants exist for diagnostics.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum TransportError {
    /// Failed to open a stream to the destination.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Failed to write the framed request.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Failed to read the framed response.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// The response did not parse as HTTP.
    #[error("invalid HTTP response: {0}")]
    InvalidResponse(String),

    /// A send or receive was attempted with no open stream.
    #[error("transport is not connected")]
    NotConnected,
}
