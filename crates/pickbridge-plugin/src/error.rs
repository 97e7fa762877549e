//! Plugin bridge error types.

use serde::Serialize;
use thiserror::Error;

/// Configuration-level failures (bad endpoint, client construction).
#[derive(Error, Debug)]
pub enum PluginError {
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("HTTP client error: {0}")]
    Http(String),
}

/// Why a single notification was not delivered.
///
/// Never propagated as an operation failure for live changes; it ends up
/// in logs and in the delivery log.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeliveryFailure {
    #[error("timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    #[error("connection failed: {message}")]
    Connect { message: String },

    #[error("plugin responded with HTTP {status}")]
    Status { status: u16 },

    #[error("request failed: {message}")]
    Request { message: String },

    #[error("invalid endpoint: {message}")]
    InvalidEndpoint { message: String },

    #[error("state store unavailable: {message}")]
    Store { message: String },
}

impl DeliveryFailure {
    pub fn is_timeout(&self) -> bool {
        matches!(self, DeliveryFailure::Timeout { .. })
    }
}
