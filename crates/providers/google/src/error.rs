use crate::genview_core::error::{SdkError, TransportError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleErrorInner {
    pub code: Option<i64>,
    pub message: String,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleErrorData {
    pub error: GoogleErrorInner,
}

/// Message of a Google-family JSON error body, prefixed with its status
/// code name (`UNAVAILABLE: The model is overloaded.`).
pub fn parse_google_error_message(body: &str) -> Option<String> {
    let parsed = serde_json::from_str::<GoogleErrorData>(body).ok()?;
    Some(match parsed.error.status {
        Some(code) if !code.is_empty() => format!("{}: {}", code, parsed.error.message),
        _ => parsed.error.message,
    })
}

/// Map transport failures to [`SdkError`]; HTTP 429 becomes
/// [`SdkError::RateLimited`].
pub fn map_transport_error_to_sdk_error(te: TransportError) -> SdkError {
    match te {
        TransportError::HttpStatus {
            status,
            body,
            retry_after_ms,
        } => {
            let message = parse_google_error_message(&body);
            SdkError::from_http_status(status, body, retry_after_ms, message)
        }
        other => SdkError::Transport(other),
    }
}
