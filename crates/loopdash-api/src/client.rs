// Loop daemon REST client
//
// Wraps `reqwest::Client` with gateway URL construction and error-body
// decoding. The macaroon travels as a default header installed by
// `TransportConfig`, so request helpers here never see credentials.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::{GatewayError, ListSwapsResponse, SwapStatus};
use crate::transport::TransportConfig;

/// HTTP client for the Loop daemon's REST gateway.
#[derive(Clone)]
pub struct LoopClient {
    http: reqwest::Client,
    base_url: Url,
    /// Request timeout baked into `http`, when this client built it.
    timeout: Option<Duration>,
}

impl LoopClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the gateway root, e.g. `https://localhost:8081`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            timeout: Some(transport.timeout),
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    ///
    /// Timeouts of such a client surface as [`Error::Transport`] since its
    /// configured limit is unknown here.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            timeout: None,
        }
    }

    /// The gateway base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// List every swap the daemon knows about (`GET /v1/loop/swaps`).
    pub async fn list_swaps(&self) -> Result<Vec<SwapStatus>, Error> {
        let url = self.api_url("v1/loop/swaps")?;
        let resp: ListSwapsResponse = self.get(url).await?;
        debug!(count = resp.swaps.len(), "listed swaps");
        Ok(resp.swaps)
    }

    // ── URL builders ─────────────────────────────────────────────────

    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        Self::parse_body(resp).await
    }

    fn send_error(&self, err: reqwest::Error) -> Error {
        match self.timeout {
            Some(timeout) if err.is_timeout() => Error::Timeout {
                timeout_secs: timeout.as_secs(),
            },
            _ => Error::Transport(err),
        }
    }

    /// Decode a success body, or turn a gateway error body into `Error`.
    async fn parse_body<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;

        if !status.is_success() {
            let parsed = serde_json::from_str::<GatewayError>(&body).ok();
            let message = parsed
                .as_ref()
                .and_then(|e| e.message.clone())
                .unwrap_or_else(|| format!("HTTP {status}: {}", preview(&body)));

            if status == reqwest::StatusCode::UNAUTHORIZED
                || status == reqwest::StatusCode::FORBIDDEN
                || message.contains("verification failed")
            {
                return Err(Error::Authentication { message });
            }

            return Err(Error::Gateway {
                message,
                code: parsed.and_then(|e| e.code),
                status: status.as_u16(),
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body: body.clone(),
        })
    }
}

fn preview(body: &str) -> &str {
    let end = body
        .char_indices()
        .nth(200)
        .map_or(body.len(), |(idx, _)| idx);
    &body[..end]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn api_url_joins_without_double_slash() {
        let client = LoopClient::with_client(
            reqwest::Client::new(),
            Url::parse("https://localhost:8081/").unwrap(),
        );
        assert_eq!(
            client.api_url("v1/loop/swaps").unwrap().as_str(),
            "https://localhost:8081/v1/loop/swaps"
        );
    }

    #[test]
    fn preview_respects_char_boundaries() {
        let body = "é".repeat(300);
        assert_eq!(preview(&body).chars().count(), 200);
        assert_eq!(preview("short"), "short");
    }
}
