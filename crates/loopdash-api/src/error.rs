use thiserror::Error;

/// Top-level error type for the `loopdash-api` crate.
///
/// Covers every failure mode of the REST gateway: transport, TLS,
/// HTTP status, and payload decoding. `loopdash-core` flattens these
/// into a single fetch failure carrying the message.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The daemon rejected the macaroon (missing, expired, or wrong permissions).
    #[error("Macaroon rejected by daemon: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Gateway ─────────────────────────────────────────────────────
    /// Structured error returned by the gRPC gateway (`{code, message}` body).
    #[error("Daemon error (HTTP {status}): {message}")]
    Gateway {
        message: String,
        code: Option<i32>,
        status: u16,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            Self::Gateway { status, .. } => *status == 503,
            _ => false,
        }
    }

    /// Returns `true` if the daemon refused the credentials.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }
}
