use credential_store::CredentialStoreError;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Message used when the authority gave no readable error payload.
pub const FALLBACK_ERROR_MESSAGE: &str = "API request failed with no error message";

#[derive(Debug, Error)]
pub enum ApiError {
    /// The authority answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The request never produced an HTTP response.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("request was cancelled")]
    Cancelled,

    #[error("failed to decode response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    #[error("{endpoint} returned no content where a payload was expected")]
    EmptyResponse { endpoint: String },

    #[error("invalid request URL: {0}")]
    InvalidUrl(String),

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("credential store failure: {0}")]
    Credentials(#[from] CredentialStoreError),
}

impl ApiError {
    /// Numeric HTTP status, absent for failures that never reached the authority.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_status(&self, expected: u16) -> bool {
        self.status() == Some(expected)
    }

    /// Human-readable message; for status errors this is the authority's detail text.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_builder() {
            Self::InvalidUrl(error.to_string())
        } else {
            Self::Transport(error.to_string())
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    detail: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Message(String),
    Items(Vec<ValidationItem>),
    Other(Value),
}

#[derive(Debug, Deserialize)]
struct ValidationItem {
    msg: Option<String>,
}

impl ErrorDetail {
    fn into_message(self) -> Option<String> {
        match self {
            Self::Message(message) => non_empty(message),
            Self::Items(items) => {
                let joined = items
                    .into_iter()
                    .filter_map(|item| item.msg.and_then(non_empty))
                    .collect::<Vec<_>>()
                    .join("; ");
                non_empty(joined)
            }
            Self::Other(_) => None,
        }
    }
}

/// Resolve the human-readable message of an error response body.
///
/// Accepts `{"detail": "..."}` and the validation-list form
/// `{"detail": [{"msg": "..."}, ...]}`; anything else yields
/// [`FALLBACK_ERROR_MESSAGE`].
pub fn parse_error_message(body: &str) -> String {
    serde_json::from_str::<ErrorPayload>(body)
        .ok()
        .and_then(|payload| payload.detail)
        .and_then(ErrorDetail::into_message)
        .unwrap_or_else(|| FALLBACK_ERROR_MESSAGE.to_string())
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
