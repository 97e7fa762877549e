use std::env;
use std::path::PathBuf;
use std::sync::Arc;

pub mod document;
pub mod error;
pub mod store;

pub use document::{
    Document, Player, PlayerId, PluginEndpoint, Role, SelectionState, Settings, UserRecord,
    DEFAULT_PLAYER_COLOR, DEFAULT_SELECTION_LIMIT,
};
pub use error::StoreError;
pub use store::{JsonFileStore, MemoryStore, StateStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    File,
    Memory,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub data_file: PathBuf,
    pub default_selection_limit: u32,
}

impl StoreConfig {
    pub fn from_env() -> Self {
        let backend = match env::var("STORE_BACKEND")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str()
        {
            "memory" => StoreBackend::Memory,
            _ => StoreBackend::File,
        };

        Self {
            backend,
            data_file: env::var("DATA_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data/pickbridge.json")),
            default_selection_limit: env::var("DEFAULT_SELECTION_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SELECTION_LIMIT),
        }
    }
}

/// Open the configured store and make sure its document is readable.
pub async fn connect(config: &StoreConfig) -> Result<Arc<dyn StateStore>, StoreError> {
    if config.default_selection_limit == 0 {
        return Err(StoreError::Config(
            "DEFAULT_SELECTION_LIMIT must be a positive integer".to_string(),
        ));
    }
    let initial = Document::with_limit(config.default_selection_limit);

    let store: Arc<dyn StateStore> = match config.backend {
        StoreBackend::File => {
            tracing::info!(path = %config.data_file.display(), "using JSON file state store");
            Arc::new(JsonFileStore::new(&config.data_file, initial))
        }
        StoreBackend::Memory => {
            tracing::warn!("using in-memory state store, nothing will survive a restart");
            Arc::new(MemoryStore::new(initial))
        }
    };

    let doc = store.read().await?;
    tracing::info!(
        players = doc.players.len(),
        users = doc.users.len(),
        selections = doc.selections.total(),
        "state store ready"
    );
    Ok(store)
}
