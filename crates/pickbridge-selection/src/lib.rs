//! PickBridge selection engine
//!
//! Streamers claim players from a shared pool. A player is held by at most
//! one streamer, and no streamer holds more than the configured limit.
//! [`Coordinator`] is the only way to change that state; it serializes every
//! change and hands accepted ones to the plugin dispatcher in commit order.

pub mod accounts;
pub mod catalog;
pub mod coordinator;
pub mod error;
pub mod mutator;
pub mod validator;

pub use accounts::AccountSummary;
pub use catalog::{NewPlayer, PlayerPatch};
pub use coordinator::{Coordinator, Principal, Requested, SelectionChange};
pub use error::SelectionError;
pub use validator::{validate, Direction, Verdict};
