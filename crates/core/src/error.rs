use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("rate limited")]
    RateLimited {
        /// Milliseconds from the provider's Retry-After header
        retry_after_ms: Option<u64>,
        #[source]
        source: Option<Box<TransportError>>,
    },
    #[error("upstream error (status {status}): {message}")]
    Upstream {
        status: u16,
        message: String,
        #[source]
        source: Option<Box<TransportError>>,
    },
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },
    #[error("no pricing configured for model '{model_id}'")]
    UnknownModel { model_id: String },
    #[error("missing credentials: {message}")]
    MissingCredentials { message: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image encoding error: {0}")]
    ImageEncoding(#[from] image::ImageError),
}

impl SdkError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        SdkError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Error for a non-success provider reply. 429 is [`SdkError::RateLimited`];
    /// any other status is [`SdkError::Upstream`] carrying `message`, or
    /// `http status NNN` when the body had none.
    pub fn from_http_status(
        status: u16,
        body: String,
        retry_after_ms: Option<u64>,
        message: Option<String>,
    ) -> Self {
        let source = Some(Box::new(TransportError::HttpStatus {
            status,
            body,
            retry_after_ms,
        }));
        if status == 429 {
            return SdkError::RateLimited {
                retry_after_ms,
                source,
            };
        }
        SdkError::Upstream {
            status,
            message: message.unwrap_or_else(|| format!("http status {status}")),
            source,
        }
    }

    /// One line with the upstream body included. Logged on every failed
    /// attempt and matched against the retry markers.
    pub fn format_details(&self) -> String {
        match self {
            SdkError::RateLimited {
                retry_after_ms,
                source,
            } => {
                let mut msg = match source.as_deref() {
                    Some(TransportError::HttpStatus { status, body, .. }) => {
                        format!("rate limited: http status {status}: {body}")
                    }
                    _ => "rate limited".to_string(),
                };
                if let Some(ms) = retry_after_ms {
                    msg.push_str(&format!(" (retry after {ms}ms)"));
                }
                msg
            }
            SdkError::Upstream {
                status,
                message,
                source,
            } => match source.as_deref() {
                Some(TransportError::HttpStatus { body, .. })
                    if !body.is_empty() && !message.contains(body.as_str()) =>
                {
                    format!("http status {status}: {message} [body: {body}]")
                }
                _ => format!("http status {status}: {message}"),
            },
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    /// Non-success reply. The body stays out of `Display` because it can echo
    /// request content.
    #[error("http status {status} ({} byte body)", .body.len())]
    HttpStatus {
        status: u16,
        body: String,
        retry_after_ms: Option<u64>,
    },
    #[error("network: {0}")]
    Network(String),
    #[error("connect timeout after {0:?}")]
    ConnectTimeout(Duration),
    #[error("request timeout after {0:?}")]
    RequestTimeout(Duration),
    #[error("body read error: {0}")]
    BodyRead(String),
    #[error("other: {0}")]
    Other(String),
}
