//! # eapi-transport
//!
//! Transport bindings for the eAPI client. Each binding opens a fresh
//! stream to the device, writes one framed HTTP request, reads one framed
//! response, and closes. Four bindings share the contract:
//!
//! - [`HttpTransport`] - TCP to an explicit host (default port 80), with a
//!   `localhost` convenience constructor for the on-box case (default 8080)
//! - [`HttpsTransport`] - TLS-wrapped TCP (default port 443)
//! - [`UnixTransport`] - stream socket to a filesystem path (unix only)
//!
//! The [`Transport`] trait is the single polymorphic boundary: the
//! connection layer drives any binding through the same
//! connect/send/receive/disconnect surface and never learns which channel
//! carried the exchange. Streams are scoped to one exchange; bindings are
//! never left holding an open stream between calls.

pub mod error;
pub mod http;
pub mod http1;
pub mod https;
mod traits;
#[cfg(unix)]
pub mod unix;

pub use error::{TransportError, TransportResult};
pub use http::HttpTransport;
pub use http1::{HttpRequest, HttpResponse};
pub use https::{HttpsTransport, TlsOptions};
pub use traits::Transport;
#[cfg(unix)]
pub use unix::UnixTransport;

/// Default port for the plain HTTP binding.
pub const DEFAULT_HTTP_PORT: u16 = 80;

/// Default port for the HTTPS binding.
pub const DEFAULT_HTTPS_PORT: u16 = 443;

/// Default port for the loopback HTTP binding.
pub const DEFAULT_HTTP_LOCAL_PORT: u16 = 8080;

/// Default request path for the HTTP and HTTPS bindings.
pub const DEFAULT_HTTP_PATH: &str = "/command-api";

/// Default filesystem path for the unix-socket binding.
pub const DEFAULT_UNIX_SOCKET: &str = "/var/run/command-api.sock";
