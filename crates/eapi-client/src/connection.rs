//! The eAPI connection: envelope construction, the synchronous exchange,
//! and error classification.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use std::fmt;
#[cfg(unix)]
use std::path::PathBuf;
use tracing::debug;
use uuid::Uuid;

use eapi_protocol::{CommandError, ConnectionError, EapiError, Request, Response, ResponseFormat};
use eapi_transport::{HttpRequest, HttpTransport, HttpsTransport, Transport};
#[cfg(unix)]
use eapi_transport::UnixTransport;

/// Message attached to every transport-level failure.
const CONNECT_FAILURE_MESSAGE: &str = "unable to connect to eAPI";

/// A connection to one eAPI endpoint.
///
/// Owns exactly one transport binding and drives it one exchange at a time:
/// every call opens a fresh stream and closes it before returning, success
/// or failure. The most recent command or connection failure stays readable
/// through [`last_error`](Self::last_error) until the next call resets it.
///
/// Not safe for concurrent use from multiple callers - all entry points
/// take `&mut self` and the last-error slot is per-instance state. Separate
/// instances are independent.
#[derive(Debug)]
pub struct Connection {
    transport: Box<dyn Transport>,
    auth: Option<String>,
    error: Option<EapiError>,
    connection_id: Uuid,
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EapiConnection(transport={})", self.transport.endpoint())
    }
}

impl Connection {
    /// Wrap an already-constructed transport binding.
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            auth: None,
            error: None,
            connection_id: Uuid::new_v4(),
        }
    }

    /// Unix-socket variant. `None` selects `/var/run/command-api.sock`.
    /// No credentials: the socket's filesystem permissions are the trust
    /// boundary.
    #[cfg(unix)]
    pub fn socket(path: Option<PathBuf>) -> Self {
        Self::new(Box::new(UnixTransport::new(path)))
    }

    /// Loopback HTTP variant, default port 8080. No credentials: the
    /// endpoint only answers on the box itself.
    pub fn http_local(port: Option<u16>, path: Option<String>) -> Self {
        Self::new(Box::new(HttpTransport::localhost(port, path)))
    }

    /// HTTP variant to an explicit host, default port 80. Credentials are
    /// always applied, empty when absent, so the authorization token is
    /// deterministic.
    pub fn http(
        host: &str,
        port: Option<u16>,
        path: Option<String>,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Self {
        let mut connection = Self::new(Box::new(HttpTransport::new(host, port, path)));
        connection.authenticate(username.unwrap_or_default(), password.unwrap_or_default());
        connection
    }

    /// HTTPS variant to an explicit host, default port 443. Credential
    /// handling matches [`http`](Self::http).
    pub fn https(
        host: &str,
        port: Option<u16>,
        path: Option<String>,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Self {
        let mut connection = Self::new(Box::new(HttpsTransport::new(host, port, path)));
        connection.authenticate(username.unwrap_or_default(), password.unwrap_or_default());
        connection
    }

    /// Configure user authentication.
    ///
    /// The pair is folded into a reusable `Basic` token held for the life
    /// of the connection; the clear-text password is not retained. Until
    /// this is called, requests go out without an `Authorization` header.
    pub fn authenticate(&mut self, username: &str, password: &str) {
        self.auth = Some(BASE64.encode(format!("{username}:{password}")));
    }

    /// Identity string of the owned transport binding.
    pub fn endpoint(&self) -> String {
        self.transport.endpoint()
    }

    /// The most recent command or connection failure, kept until the next
    /// call.
    pub fn last_error(&self) -> Option<&EapiError> {
        self.error.as_ref()
    }

    /// Build the serialized `runCmds` envelope. Pure construction, no I/O.
    ///
    /// `request_id` defaults to this connection's opaque per-instance
    /// identifier.
    pub fn build_request(
        &self,
        commands: &[String],
        format: ResponseFormat,
        request_id: Option<&str>,
    ) -> String {
        let id = request_id.map_or_else(|| self.connection_id.to_string(), str::to_string);
        Request::run_cmds(commands.to_vec(), format, id)
            .to_json()
            .expect("runCmds envelope serializes to JSON")
    }

    /// Perform exactly one request/response cycle.
    ///
    /// Opens the owned binding, posts `request` with the protocol headers
    /// (plus `Authorization` when configured), blocks for the full reply,
    /// and decodes it. Transport failures and undecodable bodies classify
    /// as [`ConnectionError`] and land in the last-error slot; an envelope
    /// carrying an `error` member classifies as [`CommandError`] (the
    /// command batch is attached by [`execute`](Self::execute)). The
    /// binding is closed on every exit path.
    pub async fn send(&mut self, request: &str) -> Result<Response, EapiError> {
        let outcome = self.exchange(request).await;
        let _ = self.transport.disconnect().await;
        match outcome {
            Ok(response) => {
                if let Some(error) = &response.error {
                    return Err(CommandError::new(error.code, error.message.clone()).into());
                }
                Ok(response)
            }
            Err(detail) => {
                let error = ConnectionError::new(self.transport.endpoint(), CONNECT_FAILURE_MESSAGE)
                    .with_detail(detail);
                self.error = Some(error.clone().into());
                Err(error.into())
            }
        }
    }

    async fn exchange(&mut self, request: &str) -> Result<Response, String> {
        debug!(request = %request, "eapi request");

        self.transport.connect().await.map_err(|e| e.to_string())?;

        let mut http_request = HttpRequest::new(Bytes::copy_from_slice(request.as_bytes()))
            .header("Content-type", "application/json-rpc")
            .header("Content-length", request.len().to_string());
        if let Some(token) = &self.auth {
            http_request = http_request.header("Authorization", format!("Basic {token}"));
        }

        self.transport.send(&http_request).await.map_err(|e| e.to_string())?;
        let raw = self.transport.receive().await.map_err(|e| e.to_string())?;
        let response = Response::from_slice(&raw.body)
            .map_err(|e| format!("malformed eAPI response: {e}"))?;

        debug!(status = raw.status, response = ?response, "eapi response");
        Ok(response)
    }

    /// Execute a command batch on the device. The caller-facing entry
    /// point.
    ///
    /// `encoding` must be `"json"` or `"text"`; anything else is rejected
    /// before any transport activity and leaves the last-error slot
    /// untouched. On a wire failure the command batch is attached to the
    /// error, the error is stored in the slot, and it is returned; on
    /// success the decoded envelope is returned unmodified.
    pub async fn execute<I, S>(
        &mut self,
        commands: I,
        encoding: &str,
    ) -> Result<Response, EapiError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let format: ResponseFormat = encoding.parse()?;
        self.error = None;

        let commands: Vec<String> = commands.into_iter().map(Into::into).collect();
        let request = self.build_request(&commands, format, None);
        match self.send(&request).await {
            Ok(response) => Ok(response),
            Err(mut error) => {
                error.set_commands(commands);
                self.error = Some(error.clone());
                Err(error)
            }
        }
    }
}
