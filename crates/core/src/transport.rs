//! HTTP seam between image providers and the network.

use crate::genview_core::error::TransportError;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeouts applied to every provider request.
#[derive(Clone, Debug, PartialEq)]
pub struct TransportConfig {
    pub connect_timeout: Duration,
    /// Deadline for the whole exchange; `None` bounds only the connect.
    pub request_timeout: Option<Duration>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: None,
        }
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// POST `body` as JSON and decode the successful reply. Non-2xx replies
    /// are [`TransportError::HttpStatus`].
    async fn post_json(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &Value,
        cfg: &TransportConfig,
    ) -> Result<Value, TransportError>;
}
