use serde_json::Value;
use thiserror::Error;

/// Errors surfaced by the hosted backend client.
#[derive(Error, Debug)]
pub enum BackendError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Service is offline or unreachable
    #[error("Backend unreachable: {0}")]
    Unreachable(String),

    /// Service returned an error response
    #[error("Backend error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response body did not have the expected shape
    #[error("Failed to parse response: {0}")]
    Parse(String),
}

impl BackendError {
    /// Message suitable for showing next to a form.
    pub fn user_message(&self) -> String {
        match self {
            BackendError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, BackendError::Api { status: 401 | 403, .. })
    }
}

pub type Result<T> = std::result::Result<T, BackendError>;

/// Pulls the human-readable message out of an auth or row API error body.
/// Empty when the body carries nothing usable; callers supply their own fallback.
pub(crate) fn extract_message(body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for key in ["msg", "message", "error_description", "error"] {
            if let Some(Value::String(s)) = map.get(key) {
                if !s.is_empty() {
                    return s.clone();
                }
            }
        }
    }
    body.trim().to_string()
}
