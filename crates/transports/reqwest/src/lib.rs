//! reqwest-backed [`HttpTransport`] used by the Gemini provider.

use crate::genview_core::error::TransportError;
use crate::genview_core::transport::{HttpTransport, TransportConfig};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::error::Error as StdError;
use std::time::{Duration, Instant};
use tracing::debug;

const TARGET: &str = "genview::transport::reqwest";

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    fn build(cfg: &TransportConfig, builder: reqwest::ClientBuilder) -> Result<Self, TransportError> {
        let mut builder = builder
            .connect_timeout(cfg.connect_timeout)
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .pool_idle_timeout(Duration::from_secs(90));
        if let Some(limit) = cfg.request_timeout {
            builder = builder.timeout(limit);
        }
        let client = builder.build().map_err(|err| {
            TransportError::Other(format!("reqwest client build failed: {}", error_chain(&err)))
        })?;
        Ok(Self { client })
    }

    pub fn try_new(cfg: &TransportConfig) -> Result<Self, TransportError> {
        Self::build(cfg, Client::builder())
    }

    /// Like [`ReqwestTransport::try_new`], falling back to a default client.
    pub fn new(cfg: &TransportConfig) -> Self {
        Self::build(cfg, Client::builder()).unwrap_or_else(|err| {
            debug!(target: TARGET, error = %err, "using default reqwest client");
            Self {
                client: Client::new(),
            }
        })
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(&TransportConfig::default())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_json(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &Value,
        cfg: &TransportConfig,
    ) -> Result<Value, TransportError> {
        let req = headers
            .iter()
            .filter(|(k, _)| !k.eq_ignore_ascii_case("content-type"))
            .fold(self.client.post(url).json(body), |req, (k, v)| {
                req.header(k, v)
            });

        let started = Instant::now();
        let resp = req.send().await.map_err(|err| {
            let detail = error_chain(&err);
            debug!(
                target: TARGET,
                %detail,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "generateContent request failed before a reply"
            );
            send_error(detail, err.is_connect(), err.is_timeout(), cfg)
        })?;

        let status = resp.status();
        if !status.is_success() {
            let retry_after_ms = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|h| h.to_str().ok())
                .and_then(parse_retry_after_ms);
            let body = resp.text().await.unwrap_or_default();
            debug!(
                target: TARGET,
                status = status.as_u16(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                body_bytes = body.len(),
                retry_after_ms,
                "provider replied with an error status"
            );
            return Err(TransportError::HttpStatus {
                status: status.as_u16(),
                body,
                retry_after_ms,
            });
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| TransportError::BodyRead(e.to_string()))?;
        debug!(
            target: TARGET,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            body_bytes = bytes.len(),
            "provider reply received"
        );
        serde_json::from_slice(&bytes)
            .map_err(|e| TransportError::BodyRead(format!("reply is not json: {e}")))
    }
}

/// Classify a failure that happened before any reply arrived.
fn send_error(detail: String, connect: bool, timeout: bool, cfg: &TransportConfig) -> TransportError {
    match (connect, timeout) {
        (true, true) => TransportError::ConnectTimeout(cfg.connect_timeout),
        (false, true) => match cfg.request_timeout {
            Some(limit) => TransportError::RequestTimeout(limit),
            None => TransportError::Network(format!("timeout: {detail}")),
        },
        (true, false) => TransportError::Network(format!("connect: {detail}")),
        (false, false) => TransportError::Network(detail),
    }
}

/// Delta-seconds form only; HTTP dates are ignored.
fn parse_retry_after_ms(value: &str) -> Option<u64> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .map(|secs| secs.saturating_mul(1000))
}

fn error_chain(err: &reqwest::Error) -> String {
    let mut out = err.to_string();
    let mut current = err.source();
    while let Some(src) = current {
        out.push_str(": ");
        out.push_str(&src.to_string());
        current = src.source();
    }
    out
}
