//! Unified error taxonomy for the client core.
//!
//! The gateway recovers from exactly one failure class (an expired access
//! token, observed as a 401) and only once per original request; every other
//! failure maps onto one of these variants and is passed through unmodified
//! so calling screens can render appropriate messaging.

use thiserror::Error;

/// Errors surfaced by the API gateway and the flows built on top of it.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure; no response was received. Not retried at
    /// this layer.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response body could not be decoded as the expected schema.
    #[error("malformed response: {0}")]
    Parse(#[from] serde_json::Error),

    /// The recovery protocol could not restore a valid session. Session
    /// state has been forcibly cleared; the caller must route the user back
    /// to authentication.
    #[error("session expired, please sign in again")]
    SessionExpired,

    /// A checkout-time precondition failed. No state was mutated and no
    /// request was sent.
    #[error("validation error: {0}")]
    Validation(String),

    /// Any other non-2xx status, propagated unchanged.
    #[error("server error ({status}): {message}")]
    Server {
        /// HTTP status returned by the backend.
        status: reqwest::StatusCode,
        /// Response body, truncated for logging.
        message: String,
    },
}

impl ApiError {
    /// Whether the failure is worth retrying from the UI (generic failure
    /// notice) as opposed to terminal (session teardown) or user-correctable
    /// (validation prompt).
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Server { status, .. } => status.is_server_error(),
            Self::Parse(_) | Self::SessionExpired | Self::Validation(_) => false,
        }
    }
}
