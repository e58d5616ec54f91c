//! TLS transport binding.

use async_trait::async_trait;
use rustls::pki_types::ServerName;
use std::fmt;
use std::sync::Arc;
use tokio::io::{AsyncWriteExt, BufStream};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tracing::debug;

use crate::error::{TransportError, TransportResult};
use crate::http1::{self, HttpRequest, HttpResponse};
use crate::traits::Transport;
use crate::{DEFAULT_HTTP_PATH, DEFAULT_HTTPS_PORT};

/// TLS settings for the HTTPS binding.
#[derive(Debug, Clone, Default)]
pub struct TlsOptions {
    /// Skip server certificate verification. Most eAPI devices ship with a
    /// self-signed certificate, which the default webpki root store will
    /// reject.
    pub accept_invalid_certs: bool,
}

/// TLS-wrapped TCP binding to an explicit host.
pub struct HttpsTransport {
    host: String,
    port: u16,
    path: String,
    connector: TlsConnector,
    stream: Option<BufStream<TlsStream<TcpStream>>>,
}

// Manual Debug implementation since TlsConnector doesn't implement Debug
impl fmt::Debug for HttpsTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpsTransport")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("path", &self.path)
            .field("connected", &self.stream.is_some())
            .finish()
    }
}

impl HttpsTransport {
    /// Create a binding to `host` with full certificate verification. Port
    /// defaults to 443, path to `/command-api`.
    pub fn new(host: impl Into<String>, port: Option<u16>, path: Option<String>) -> Self {
        Self::with_options(host, port, path, TlsOptions::default())
    }

    /// Create a binding with explicit TLS settings.
    pub fn with_options(
        host: impl Into<String>,
        port: Option<u16>,
        path: Option<String>,
        options: TlsOptions,
    ) -> Self {
        let config = client_config(&options);
        Self {
            host: host.into(),
            port: port.unwrap_or(DEFAULT_HTTPS_PORT),
            path: path.unwrap_or_else(|| DEFAULT_HTTP_PATH.to_string()),
            connector: TlsConnector::from(Arc::new(config)),
            stream: None,
        }
    }

    fn host_header(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn client_config(options: &TlsOptions) -> rustls::ClientConfig {
    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let builder = rustls::ClientConfig::builder_with_provider(Arc::clone(&provider))
        .with_safe_default_protocol_versions()
        .expect("default provider supports the default protocol versions");
    if options.accept_invalid_certs {
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(danger::NoVerification::new(provider)))
            .with_no_client_auth()
    } else {
        let mut roots = rustls::RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        builder.with_root_certificates(roots).with_no_client_auth()
    }
}

#[async_trait]
impl Transport for HttpsTransport {
    fn endpoint(&self) -> String {
        format!("https://{}:{}/command-api", self.host, self.port)
    }

    async fn connect(&mut self) -> TransportResult<()> {
        debug!(host = %self.host, port = self.port, "opening TLS stream");
        let tcp = TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        let server_name = ServerName::try_from(self.host.clone()).map_err(|e| {
            TransportError::ConnectionFailed(format!("invalid server name '{}': {e}", self.host))
        })?;
        let tls = self
            .connector
            .connect(server_name, tcp)
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        self.stream = Some(BufStream::new(tls));
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

mod danger {
    use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
    use rustls::crypto::CryptoProvider;
    use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
    use rustls::{DigitallySignedStruct, SignatureScheme};
    use std::sync::Arc;

    /// Accepts any server certificate. Only reachable through
    /// [`TlsOptions::accept_invalid_certs`](super::TlsOptions).
    #[derive(Debug)]
    pub(super) struct NoVerification {
        provider: Arc<CryptoProvider>,
    }

    impl NoVerification {
        pub(super) fn new(provider: Arc<CryptoProvider>) -> Self {
            Self { provider }
        }
    }

    impl ServerCertVerifier for NoVerification {
        fn verify_server_cert(
            &self,
            _end_entity: &CertificateDer<'_>,
            _intermediates: &[CertificateDer<'_>],
            _server_name: &ServerName<'_>,
            _ocsp_response: &[u8],
            _now: UnixTime,
        ) -> Result<ServerCertVerified, rustls::Error> {
            Ok(ServerCertVerified::assertion())
        }

        fn verify_tls12_signature(
            &self,
            _message: &[u8],
            _cert: &CertificateDer<'_>,
            _dss: &DigitallySignedStruct,
        ) -> Result<HandshakeSignatureValid, rustls::Error> {
            Ok(HandshakeSignatureValid::assertion())
        }

        fn verify_tls13_signature(
            &self,
            _message: &[u8],
            _cert: &CertificateDer<'_>,
            _dss: &DigitallySignedStruct,
        ) -> Result<HandshakeSignatureValid, rustls::Error> {
            Ok(HandshakeSignatureValid::assertion())
        }

        fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
            self.provider
                .signature_verification_algorithms
                .supported_schemes()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_omitted() {
        let transport = HttpsTransport::new("veos01", None, None);
        assert_eq!(transport.endpoint(), "https://veos01:443/command-api");
    }

    #[test]
    fn identity_pins_the_protocol_path() {
        // The request path is configurable but the identity string always
        // names the protocol endpoint.
        let transport = HttpsTransport::new("veos01", Some(8443), Some("/api".to_string()));
        assert_eq!(transport.endpoint(), "https://veos01:8443/command-api");
    }

    #[tokio::test]
    async fn receive_without_connect_is_not_connected() {
        let mut transport = HttpsTransport::new("veos01", None, None);
        let error = transport.receive().await.unwrap_err();
        assert!(matches!(error, TransportError::NotConnected));
    }
}
