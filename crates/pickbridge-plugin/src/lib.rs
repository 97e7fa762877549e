//! PickBridge plugin bridge
//!
//! Delivers accepted selection changes to the game server plugin over its
//! form-encoded `POST /action` protocol. Delivery is best-effort: bounded by
//! a timeout, never retried automatically, repaired by an explicit
//! resend-all.

pub mod delivery_log;
pub mod dispatcher;
pub mod endpoint;
pub mod error;
pub mod events;
pub mod notifier;
pub mod reconcile;

pub use delivery_log::{DeliveryLog, DeliveryRecord, DeliveryStats};
pub use dispatcher::{deliver, NotificationDispatcher};
pub use endpoint::{action_url, normalize_endpoint, validate_endpoint};
pub use error::{DeliveryFailure, PluginError};
pub use events::{ActionNotification, PluginAction, TEST_PLAYER_NAME, TEST_STREAMER_NAME};
pub use notifier::{DeliveryOutcome, HttpNotifier, NotifierConfig, PluginNotifier};
pub use reconcile::resend_all;
