//! Plain HTTP transport binding.

use async_trait::async_trait;
use tokio::io::{AsyncWriteExt, BufStream};
use tokio::net::TcpStream;
use tracing::debug;

use crate::error::{TransportError, TransportResult};
use crate::http1::{self, HttpRequest, HttpResponse};
use crate::traits::Transport;
use crate::{DEFAULT_HTTP_LOCAL_PORT, DEFAULT_HTTP_PATH, DEFAULT_HTTP_PORT};

/// TCP binding to an explicit host, speaking plain HTTP.
#[derive(Debug)]
pub struct HttpTransport {
    host: String,
    port: u16,
    path: String,
    stream: Option<BufStream<TcpStream>>,
}

impl HttpTransport {
    /// Create a binding to `host`. Port defaults to 80, path to
    /// `/command-api`.
    pub fn new(host: impl Into<String>, port: Option<u16>, path: Option<String>) -> Self {
        Self {
            host: host.into(),
            port: port.unwrap_or(DEFAULT_HTTP_PORT),
            path: path.unwrap_or_else(|| DEFAULT_HTTP_PATH.to_string()),
            stream: None,
        }
    }

    /// Loopback convenience binding for the on-box case. Port defaults to
    /// 8080.
    pub fn localhost(port: Option<u16>, path: Option<String>) -> Self {
        Self::new(
            "localhost",
            Some(port.unwrap_or(DEFAULT_HTTP_LOCAL_PORT)),
            path,
        )
    }

    fn host_header(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn endpoint(&self) -> String {
        format!("http://{}:{}{}", self.host, self.port, self.path)
    }

    async fn connect(&mut self) -> TransportResult<()> {
        debug!(host = %self.host, port = self.port, "opening TCP stream");
        let stream = TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        self.stream = Some(BufStream::new(stream));
        Ok(())
    }

    async fn send(&mut self, request: &HttpRequest) -> TransportResult<()> {
        let host = self.host_header();
        let Self { path, stream, .. } = self;
        let stream = stream.as_mut().ok_or(TransportError::NotConnected)?;
        http1::write_request(stream, path, &host, request).await
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
