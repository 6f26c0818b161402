use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error body returned by the tutor and auth services on non-2xx responses.
///
/// The tutor service answers `{"error": "..."}`; the auth service may answer
/// `{"message": "..."}`. Either field may be absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiError {
    pub fn detail(&self) -> Option<&str> {
        self.error
            .as_deref()
            .or(self.message.as_deref())
            .filter(|detail| !detail.trim().is_empty())
    }
}

#[derive(Debug, Error)]
#[error("{status}: {detail}")]
pub struct ApiException {
    pub status: u16,
    pub detail: String,
}

impl ApiException {
    pub fn new(status: u16, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    /// Builds an exception from a raw response body, falling back to the body
    /// text when it is not a recognizable error document.
    pub fn from_body(status: u16, body: &str) -> Self {
        let detail = serde_json::from_str::<ApiError>(body)
            .ok()
            .and_then(|parsed| parsed.detail().map(str::to_string))
            .unwrap_or_else(|| body.trim().to_string());
        Self::new(status, detail)
    }
}
