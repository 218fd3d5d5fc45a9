//! Error types for the action-execution gateway.
//!
//! [`GatewayError`] separates failures the caller may retry (platform and
//! network errors) from ones that need a human or a pause (authentication,
//! rate limiting). The retry decorator uses [`GatewayError::is_transient`] to
//! make that call.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The gateway rejected our credentials or the connected account.
    #[error("authentication failed for {action}: {message}")]
    Authentication { action: String, message: String },

    /// HTTP 429 or an equivalent error payload.
    /// `retry_after_ms` is set when the server said how long to wait.
    #[error("rate limited on {action}")]
    RateLimited {
        action: String,
        retry_after_ms: Option<u64>,
    },

    /// The action ran and failed, or the gateway returned an error status.
    #[error("action {action} failed: {message}")]
    Platform { action: String, message: String },

    /// The response body could not be understood.
    #[error("malformed response from {action}: {message}")]
    Malformed { action: String, message: String },

    /// Transport failure underneath the gateway (DNS, refused connection, timeout).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The retry decorator gave up; `last_error` is the final underlying failure.
    #[error("all {attempts} attempts exhausted: {last_error}")]
    RetryExhausted {
        attempts: u32,
        last_error: Box<GatewayError>,
    },
}

impl GatewayError {
    /// Errors worth retrying without outside intervention.
    pub fn is_transient(&self) -> bool {
        matches!(self, GatewayError::Platform { .. } | GatewayError::Network(_))
    }

    /// Short platform tag derived from an action name, e.g. `TWITTER_CREATION_OF_A_POST` -> `twitter`.
    pub fn platform_of(action: &str) -> String {
        action
            .split('_')
            .next()
            .filter(|s| !s.is_empty())
            .map(|s| s.to_lowercase())
            .unwrap_or_else(|| "unknown".to_string())
    }
}
