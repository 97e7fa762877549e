use std::sync::Arc;

use pickbridge_db::StateStore;
use pickbridge_plugin::{DeliveryLog, HttpNotifier, NotifierConfig, PluginError};
use pickbridge_selection::Coordinator;

/// Shared application state handed to every handler.
pub struct AppState {
    pub coordinator: Coordinator,
    pub jwt_secret: String,
}

impl AppState {
    /// Wire the coordinator to the HTTP plugin notifier.
    pub fn new(
        store: Arc<dyn StateStore>,
        notifier_config: &NotifierConfig,
        jwt_secret: String,
    ) -> Result<Self, PluginError> {
        let notifier = HttpNotifier::new(store.clone(), notifier_config)?;
        let log = Arc::new(DeliveryLog::new(notifier_config.delivery_log_capacity));
        Ok(Self {
            coordinator: Coordinator::new(store, Arc::new(notifier), log),
            jwt_secret,
        })
    }
}
