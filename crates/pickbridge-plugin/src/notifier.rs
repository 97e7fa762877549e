//! Outbound notifications to the game server plugin.
//!
//! One form-encoded `POST /action` per accepted change. Calls are bounded by
//! a timeout and never retried here; reconciliation is an explicit action.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pickbridge_db::{PluginEndpoint, StateStore};

use crate::endpoint::action_url;
use crate::error::{DeliveryFailure, PluginError};
use crate::events::ActionNotification;

/// Default bound on a single outbound call.
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Default number of delivery records kept for the admin API.
pub const DEFAULT_DELIVERY_LOG_CAPACITY: usize = 200;

// ─── Configuration ──────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct NotifierConfig {
    pub timeout: Duration,
    pub delivery_log_capacity: usize,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            delivery_log_capacity: DEFAULT_DELIVERY_LOG_CAPACITY,
        }
    }
}

impl NotifierConfig {
    pub fn from_env() -> Self {
        Self {
            timeout: Duration::from_millis(
                std::env::var("PLUGIN_TIMEOUT_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .filter(|ms: &u64| *ms > 0)
                    .unwrap_or(DEFAULT_TIMEOUT_MS),
            ),
            delivery_log_capacity: std::env::var("PLUGIN_DELIVERY_LOG_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_DELIVERY_LOG_CAPACITY),
        }
    }
}

// ─── Outcome ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    Failed(DeliveryFailure),
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered)
    }

    pub fn into_result(self) -> Result<(), DeliveryFailure> {
        match self {
            DeliveryOutcome::Delivered => Ok(()),
            DeliveryOutcome::Failed(failure) => Err(failure),
        }
    }
}

// ─── Notifier ───────────────────────────────────────────────────────────

/// Sends one notification and reports what happened. Implementations must
/// bound the call in time and must not panic on delivery errors.
#[async_trait]
pub trait PluginNotifier: Send + Sync {
    async fn notify(&self, notification: &ActionNotification) -> DeliveryOutcome;
}

/// reqwest-backed notifier. Reads the endpoint from the store on every call
/// so configuration changes apply to the very next notification.
pub struct HttpNotifier {
    client: reqwest::Client,
    store: Arc<dyn StateStore>,
    timeout: Duration,
}

impl HttpNotifier {
    pub fn new(store: Arc<dyn StateStore>, config: &NotifierConfig) -> Result<Self, PluginError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("PickBridge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PluginError::Http(e.to_string()))?;

        Ok(Self {
            client,
            store,
            timeout: config.timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Deliver to an explicit endpoint.
    pub async fn send(
        &self,
        endpoint: &PluginEndpoint,
        notification: &ActionNotification,
    ) -> DeliveryOutcome {
        let url = match action_url(endpoint) {
            Ok(url) => url,
            Err(e) => {
                return DeliveryOutcome::Failed(DeliveryFailure::InvalidEndpoint {
                    message: e.to_string(),
                })
            }
        };
        let fields = notification.form_fields(endpoint.auth_token.as_deref());

        tracing::debug!(
            url = %url,
            player = %notification.player_name,
            streamer = %notification.streamer,
            action = %notification.action,
            "sending plugin notification"
        );

        let result = self
            .client
            .post(url)
            .timeout(self.timeout)
            .form(&fields)
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => DeliveryOutcome::Delivered,
            Ok(resp) => DeliveryOutcome::Failed(DeliveryFailure::Status {
                status: resp.status().as_u16(),
            }),
            Err(e) => DeliveryOutcome::Failed(classify_error(&e, self.timeout)),
        }
    }
}

fn classify_error(err: &reqwest::Error, timeout: Duration) -> DeliveryFailure {
    if err.is_timeout() {
        DeliveryFailure::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        }
    } else if err.is_connect() {
        DeliveryFailure::Connect {
            message: err.to_string(),
        }
    } else {
        DeliveryFailure::Request {
            message: err.to_string(),
        }
    }
}

#[async_trait]
impl PluginNotifier for HttpNotifier {
    async fn notify(&self, notification: &ActionNotification) -> DeliveryOutcome {
        let endpoint = match self.store.read().await {
            Ok(doc) => doc.settings.plugin,
            Err(e) => {
                return DeliveryOutcome::Failed(DeliveryFailure::Store {
                    message: e.to_string(),
                })
            }
        };
        self.send(&endpoint, notification).await
    }
}
