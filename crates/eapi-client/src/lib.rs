//! # eapi-client
//!
//! Client connection layer for the eAPI management protocol: build a
//! `runCmds` envelope, drive one synchronous exchange over an owned
//! transport binding, and classify failures into a typed taxonomy.
//!
//! ```rust,ignore
//! use eapi_client::Connection;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut connection = Connection::https(
//!         "veos01",
//!         None,
//!         None,
//!         Some("admin"),
//!         Some("secret"),
//!     );
//!     let response = connection
//!         .execute(["show version", "show hostname"], "json")
//!         .await?;
//!     println!("{:?}", response.result);
//!     Ok(())
//! }
//! ```
//!
//! Each call is one blocking round trip over a freshly opened stream: no
//! retries, no pooling, no pipelining. A `Connection` is driven through
//! `&mut self`, so a single instance never has overlapping requests in
//! flight; separate instances are fully independent.

pub mod config;
pub mod connection;

pub use config::{ConfigError, ConnectionConfig, TransportKind};
pub use connection::Connection;

pub use eapi_protocol::{
    CommandError, ConnectionError, EapiError, EapiResult, ErrorObject, Request, Response,
    ResponseFormat,
};
pub use eapi_transport::{
    HttpRequest, HttpResponse, HttpTransport, HttpsTransport, TlsOptions, Transport,
    TransportError, TransportResult,
};
#[cfg(unix)]
pub use eapi_transport::UnixTransport;
