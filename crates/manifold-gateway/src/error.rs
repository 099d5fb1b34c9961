//! Gateway error types.
//!
//! All gateway subsystems surface failures through [`GatewayError`].  Caller
//! cancellation is deliberately NOT an error: it is reported as a distinct
//! non-failure outcome by the turn orchestrator.  Protocol anomalies in the
//! stream (an orphan tool-call continuation fragment) are likewise not
//! errors; they are dropped with a warning and the turn continues.

/// Unified error type for the gateway.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// A request was malformed before any turn started, e.g. an unqualified
    /// model id against a backend that requires `vendor/model` ids.
    #[error("config error: {reason}")]
    Config { reason: String },

    /// The turn's deadline expired; the exchange was cancelled.  Not
    /// retried at this layer.
    #[error("turn for model `{model}` timed out after {secs}s")]
    Timeout { model: String, secs: u64 },

    /// The backend answered with a non-2xx status.
    #[error("backend returned {status}: {body}")]
    Transport { status: u16, body: String },

    /// The HTTP exchange itself failed (connect, TLS, read).
    #[error("request failed: {reason}")]
    RequestFailed { reason: String },

    /// A stream payload could not be parsed.
    #[error("stream payload parse error: {reason}")]
    Parse { reason: String },

    /// The stream was interrupted mid-body.
    #[error("stream interrupted: {reason}")]
    Stream { reason: String },

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the gateway crate.
pub type Result<T> = std::result::Result<T, GatewayError>;

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        Self::RequestFailed {
            reason: err.to_string(),
        }
    }
}
