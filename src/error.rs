use thiserror::Error;

/// Errors surfaced by the API client and services.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("failed to decode response: {0}")]
    Decode(String),
    #[error("{0}")]
    Validation(String),
    #[error("session storage error: {0}")]
    Session(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            ApiError::Unauthorized(_) => Some(401),
            ApiError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Message suitable for inline display next to the form or table that failed.
    pub fn display_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Api { message, .. } | ApiError::Unauthorized(message)
                if !message.trim().is_empty() =>
            {
                message.clone()
            }
            ApiError::Validation(message) => message.clone(),
            _ => fallback.to_string(),
        }
    }
}

/// Pulls a human message out of an error response body: `message`, then `error`,
/// then the raw text.
pub fn extract_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        for key in ["message", "error"] {
            if let Some(msg) = value.get(key).and_then(|v| v.as_str()) {
                if !msg.trim().is_empty() {
                    return Some(msg.to_string());
                }
            }
        }
        if value.is_object() {
            return None;
        }
    }
    Some(trimmed.to_string())
}
