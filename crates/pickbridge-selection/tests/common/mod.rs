// Shared helpers for selection integration tests
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use pickbridge_db::{
    Document, MemoryStore, Player, PluginEndpoint, Role, StateStore, UserRecord,
    DEFAULT_PLAYER_COLOR,
};
use pickbridge_plugin::{DeliveryLog, HttpNotifier, NotifierConfig};
use pickbridge_selection::{Coordinator, Principal};
use wiremock::MockServer;

/// Document with players `1..=players` named `P{id}` and two streamers.
pub fn seeded_document(limit: u32, players: i64) -> Document {
    let mut doc = Document::with_limit(limit);
    doc.players = (1..=players)
        .map(|id| Player {
            id,
            name: format!("P{id}"),
            tags: Vec::new(),
            color: DEFAULT_PLAYER_COLOR.to_string(),
        })
        .collect();
    for name in ["nova", "kai"] {
        doc.users.push(UserRecord {
            username: name.to_string(),
            password_hash: String::new(),
            role: Role::Streamer,
        });
    }
    doc
}

/// Point the document at a running mock plugin.
pub fn with_plugin(mut doc: Document, server: &MockServer) -> Document {
    let addr = server.address();
    doc.settings.plugin = PluginEndpoint {
        host: addr.ip().to_string(),
        port: addr.port(),
        auth_token: None,
    };
    doc
}

/// Coordinator wired to the real HTTP notifier.
pub fn http_coordinator(doc: Document, timeout: Duration) -> (Coordinator, Arc<dyn StateStore>) {
    let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new(doc));
    let config = NotifierConfig {
        timeout,
        ..NotifierConfig::default()
    };
    let notifier = HttpNotifier::new(store.clone(), &config).expect("client builds");
    let coordinator = Coordinator::new(
        store.clone(),
        Arc::new(notifier),
        Arc::new(DeliveryLog::new(100)),
    );
    (coordinator, store)
}

pub fn streamer(name: &str) -> Principal {
    Principal::new(name, Role::Streamer)
}

pub fn admin() -> Principal {
    Principal::new("admin", Role::Admin)
}
