//! The transport capability boundary.

use async_trait::async_trait;
use std::fmt;

use crate::error::TransportResult;
use crate::http1::{HttpRequest, HttpResponse};

/// A channel that can carry one framed eAPI exchange.
///
/// Bindings differ only in how the underlying stream is opened (TCP, TLS,
/// unix socket); the request/response contract is identical, which keeps
/// the connection layer transport-agnostic. `connect` opens a fresh stream
/// and `disconnect` drops it; a binding never holds a stream across
/// exchanges.
#[async_trait]
pub trait Transport: Send + fmt::Debug {
    /// Human-readable identity, used for diagnostics and error attribution
    /// only - never for equality or routing.
    fn endpoint(&self) -> String;

    /// Open a fresh stream to the destination.
    async fn connect(&mut self) -> TransportResult<()>;

    /// Write one framed request to the open stream.
    async fn send(&mut self, request: &HttpRequest) -> TransportResult<()>;

    /// Read one framed response from the open stream.
    async fn receive(&mut self) -> TransportResult<HttpResponse>;

    /// Drop the stream. A no-op when nothing is open.
    async fn disconnect(&mut self) -> TransportResult<()>;
}
