// Shared transport configuration for building reqwest::Client instances.
//
// The daemon serves its REST gateway over TLS with a self-signed
// certificate by default, so the CA handling lives here rather than
// in the client.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use crate::error::Error;

/// Header the gRPC gateway maps onto the `macaroon` gRPC metadata key.
pub const MACAROON_HEADER: &str = "Grpc-Metadata-macaroon";

/// TLS verification mode.
#[derive(Debug, Clone)]
pub enum TlsMode {
    /// Use the system certificate store.
    System,
    /// Trust the daemon's own certificate (usually `~/.loop/<network>/tls.cert`).
    CustomCa(PathBuf),
    /// Accept any certificate.
    DangerAcceptInvalid,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
    /// Hex-encoded macaroon sent on every request.
    pub macaroon: Option<SecretString>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::DangerAcceptInvalid,
            timeout: Duration::from_secs(30),
            macaroon: None,
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    ///
    /// The macaroon, when present, is installed as a sensitive default header.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("loopdash/", env!("CARGO_PKG_VERSION")))
            .default_headers(self.default_headers()?);

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read TLS cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid TLS cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }

    fn default_headers(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        if let Some(ref macaroon) = self.macaroon {
            let mut value = HeaderValue::from_str(macaroon.expose_secret()).map_err(|_| {
                Error::Authentication {
                    message: "macaroon is not a valid header value".into(),
                }
            })?;
            value.set_sensitive(true);
            headers.insert(MACAROON_HEADER, value);
        }
        Ok(headers)
    }

    /// Attach a hex-encoded macaroon.
    pub fn with_macaroon(mut self, macaroon: SecretString) -> Self {
        self.macaroon = Some(macaroon);
        self
    }
}
