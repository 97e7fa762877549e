//! Selection engine error types.

use pickbridge_db::{PlayerId, StoreError};
use pickbridge_plugin::{DeliveryFailure, PluginError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SelectionError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("selection limit reached: {streamer} holds {held} of {limit}")]
    LimitExceeded {
        streamer: String,
        held: usize,
        limit: u32,
    },

    #[error("player {player_id} is already claimed by {holder}")]
    AlreadyClaimed { player_id: PlayerId, holder: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("delivery failed: {0}")]
    DeliveryFailed(DeliveryFailure),

    #[error("state store error: {0}")]
    Store(#[from] StoreError),
}

impl From<PluginError> for SelectionError {
    fn from(err: PluginError) -> Self {
        match err {
            PluginError::InvalidEndpoint(msg) => SelectionError::InvalidConfig(msg),
            PluginError::Http(msg) => SelectionError::InvalidConfig(format!("HTTP client: {msg}")),
        }
    }
}
