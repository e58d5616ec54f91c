//! Minimal HTTP/1.1 framing shared by all transport bindings.
//!
//! One exchange is one `POST` with a fully buffered body, so the framing
//! here covers exactly that: a request line plus headers plus body on the
//! way out; a status line, headers, and a `Content-Length`, chunked, or
//! read-to-EOF body on the way back. Every request is sent with
//! `Connection: close` so the peer delimits unsized bodies by closing.

use bytes::Bytes;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{TransportError, TransportResult};

/// A framed request: caller-supplied headers plus body.
///
/// The request line and `Host` header are supplied by the binding that
/// writes it, since only the binding knows its destination.
#[derive(Debug, Clone, Default)]
pub struct HttpRequest {
    /// Headers in send order.
    pub headers: Vec<(String, String)>,
    /// Request body.
    pub body: Bytes,
}

impl HttpRequest {
    /// Create a request with the given body and no headers.
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self {
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Append a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Case-insensitive header lookup; first match wins.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A framed response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Status code from the status line.
    pub status: u16,
    /// Reason phrase from the status line.
    pub reason: String,
    /// Headers in receive order.
    pub headers: Vec<(String, String)>,
    /// Response body.
    pub body: Bytes,
}

impl HttpResponse {
    /// Case-insensitive header lookup; first match wins.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

fn send_failed(err: io::Error) -> TransportError {
    TransportError::SendFailed(err.to_string())
}

fn receive_failed(err: io::Error) -> TransportError {
    TransportError::ReceiveFailed(err.to_string())
}

/// Write one framed `POST` request and flush.
pub(crate) async fn write_request<S>(
    stream: &mut S,
    target: &str,
    host: &str,
    request: &HttpRequest,
) -> TransportResult<()>
where
    S: AsyncWrite + Unpin,
{
    let mut head = String::with_capacity(128);
    head.push_str("POST ");
    head.push_str(target);
    head.push_str(" HTTP/1.1\r\nHost: ");
    head.push_str(host);
    head.push_str("\r\n");
    for (name, value) in &request.headers {
        head.push_str(name);
        head.push_str(": ");
        head.push_str(value);
        head.push_str("\r\n");
    }
    head.push_str("Connection: close\r\n\r\n");

    stream.write_all(head.as_bytes()).await.map_err(send_failed)?;
    stream.write_all(&request.body).await.map_err(send_failed)?;
    stream.flush().await.map_err(send_failed)?;
    Ok(())
}

/// Read one framed response, blocking until the full body is in hand.
pub(crate) async fn read_response<S>(stream: &mut S) -> TransportResult<HttpResponse>
where
    S: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    let read = stream.read_line(&mut line).await.map_err(receive_failed)?;
    if read == 0 {
        return Err(TransportError::ReceiveFailed(
            "connection closed before status line".to_string(),
        ));
    }

    let mut parts = line.trim_end().splitn(3, ' ');
    let version = parts.next().unwrap_or_default();
    if !version.starts_with("HTTP/1.") {
        return Err(TransportError::InvalidResponse(format!(
            "unexpected status line '{}'",
            line.trim_end()
        )));
    }
    let status: u16 = parts
        .next()
        .and_then(|code| code.parse().ok())
        .ok_or_else(|| {
            TransportError::InvalidResponse(format!(
                "unexpected status line '{}'",
                line.trim_end()
            ))
        })?;
    let reason = parts.next().unwrap_or_default().to_string();

    let mut headers = Vec::new();
    let mut content_length: Option<usize> = None;
    let mut chunked = false;
    loop {
        line.clear();
        let read = stream.read_line(&mut line).await.map_err(receive_failed)?;
        if read == 0 {
            return Err(TransportError::ReceiveFailed(
                "connection closed inside headers".to_string(),
            ));
        }
        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            break;
        }
        let Some((name, value)) = trimmed.split_once(':') else {
            return Err(TransportError::InvalidResponse(format!(
                "malformed header line '{trimmed}'"
            )));
        };
        let name = name.trim();
        let value = value.trim();
        if name.eq_ignore_ascii_case("content-length") {
            content_length = Some(value.parse().map_err(|_| {
                TransportError::InvalidResponse(format!("bad Content-Length '{value}'"))
            })?);
        } else if name.eq_ignore_ascii_case("transfer-encoding")
            && value.eq_ignore_ascii_case("chunked")
        {
            chunked = true;
        }
        headers.push((name.to_string(), value.to_string()));
    }

    let body = if chunked {
        read_chunked_body(stream).await?
    } else if let Some(length) = content_length {
        let mut body = vec![0; length];
        stream.read_exact(&mut body).await.map_err(receive_failed)?;
        body
    } else {
        // Connection: close was requested, so EOF delimits the body.
        let mut body = Vec::new();
        stream.read_to_end(&mut body).await.map_err(receive_failed)?;
        body
    };

    Ok(HttpResponse {
        status,
        reason,
        headers,
        body: Bytes::from(body),
    })
}

async fn read_chunked_body<S>(stream: &mut S) -> TransportResult<Vec<u8>>
where
    S: AsyncBufRead + Unpin,
{
    let mut body = Vec::new();
    let mut line = String::new();
    loop {
        line.clear();
        stream.read_line(&mut line).await.map_err(receive_failed)?;
        let size_field = line.trim().split(';').next().unwrap_or_default();
        let size = usize::from_str_radix(size_field, 16).map_err(|_| {
            TransportError::InvalidResponse(format!("bad chunk size '{size_field}'"))
        })?;
        if size == 0 {
            // Trailer section: lines until the terminating blank line or EOF.
            loop {
                line.clear();
                let read = stream.read_line(&mut line).await.map_err(receive_failed)?;
                if read == 0 || line.trim_end().is_empty() {
                    break;
                }
            }
            return Ok(body);
        }
        let start = body.len();
        body.resize(start + size, 0);
        stream
            .read_exact(&mut body[start..])
            .await
            .map_err(receive_failed)?;
        let mut crlf = [0u8; 2];
        stream.read_exact(&mut crlf).await.map_err(receive_failed)?;
    }
}
