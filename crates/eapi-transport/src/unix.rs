//! Unix domain socket transport binding.

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::io::{AsyncWriteExt, BufStream};
use tokio::net::UnixStream;
use tracing::debug;

use crate::error::{TransportError, TransportResult};
use crate::http1::{self, HttpRequest, HttpResponse};
use crate::traits::Transport;
use crate::{DEFAULT_HTTP_PATH, DEFAULT_UNIX_SOCKET};

/// Stream-socket binding to a filesystem path, for the on-box case where
/// the management daemon listens on a unix socket instead of a TCP port.
///
/// The HTTP request still targets `/command-api`; the `Host` header is
/// fixed to the loopback placeholder since no real host is involved.
#[derive(Debug)]
pub struct UnixTransport {
    path: PathBuf,
    stream: Option<BufStream<UnixStream>>,
}

impl UnixTransport {
    /// Create a binding to `path`, defaulting to
    /// `/var/run/command-api.sock`.
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path: path.unwrap_or_else(|| PathBuf::from(DEFAULT_UNIX_SOCKET)),
            stream: None,
        }
    }
}

#[async_trait]
impl Transport for UnixTransport {
    fn endpoint(&self) -> String {
        format!("unix:{}", self.path.display())
    }

    async fn connect(&mut self) -> TransportResult<()> {
        debug!(path = %self.path.display(), "opening unix stream");
        let stream = UnixStream::connect(&self.path)
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        self.stream = Some(BufStream::new(stream));
        Ok(())
    }

    async fn send(&mut self, request: &HttpRequest) -> TransportResult<()> {
        let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;
        http1::write_request(stream, DEFAULT_HTTP_PATH, "localhost", request).await
    }

    async fn receive(&mut self) -> TransportResult<HttpResponse> {
        let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;
        http1::read_response(stream).await
    }

    async fn disconnect(&mut self) -> TransportResult<()> {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
        }
        Ok(())
    }
}
