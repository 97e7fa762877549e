use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;

use crate::document::Document;
use crate::error::StoreError;

/// Whole-document persistence.
///
/// Both calls are atomic at the granularity of one call: a concurrent
/// reader sees either the previous document or the new one, never a mix.
/// Read-modify-write sequences are NOT atomic; callers serialize them.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn read(&self) -> Result<Document, StoreError>;

    async fn write(&self, document: &Document) -> Result<(), StoreError>;
}

// ─── JSON file backend ─────────────────────────────────────────────

/// Stores the document as pretty-printed JSON on disk.
///
/// Writes go to a sibling temp file which is then renamed over the target.
/// A missing file reads as the initial document.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    initial: Document,
    io_lock: RwLock<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>, initial: Document) -> Self {
        Self {
            path: path.into(),
            initial,
            io_lock: RwLock::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "document.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl StateStore for JsonFileStore {
    async fn read(&self) -> Result<Document, StoreError> {
        let _guard = self.io_lock.read().await;
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(self.initial.clone()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, document: &Document) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(document)?;
        let _guard = self.io_lock.write().await;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let tmp = self.temp_path();
        fs::write(&tmp, &bytes).await?;
        fs::rename(&tmp, &self.path).await?;

        tracing::debug!(path = %self.path.display(), bytes = bytes.len(), "document written");
        Ok(())
    }
}

// ─── In-memory backend ─────────────────────────────────────────────

/// Keeps the document in memory only. Used for ephemeral runs and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    document: RwLock<Document>,
}

impl MemoryStore {
    pub fn new(initial: Document) -> Self {
        Self {
            document: RwLock::new(initial),
        }
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn read(&self) -> Result<Document, StoreError> {
        Ok(self.document.read().await.clone())
    }

    async fn write(&self, document: &Document) -> Result<(), StoreError> {
        *self.document.write().await = document.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Player, DEFAULT_PLAYER_COLOR};
    use tempfile::TempDir;

    fn sample_document() -> Document {
        let mut doc = Document::with_limit(3);
        doc.players.push(Player {
            id: 1,
            name: "Steve".into(),
            tags: vec!["pvp".into()],
            color: DEFAULT_PLAYER_COLOR.into(),
        });
        doc.selections.set_mut("nova").push(1);
        doc
    }

    #[tokio::test]
    async fn test_missing_file_reads_initial_document() {
        let tmp = TempDir::new().unwrap();
        let store = JsonFileStore::new(tmp.path().join("data.json"), Document::with_limit(7));

        let doc = store.read().await.unwrap();
        assert_eq!(doc.settings.selection_limit, 7);
        assert!(doc.players.is_empty());
    }

    #[tokio::test]
    async fn test_write_then_read_returns_same_document() {
        let tmp = TempDir::new().unwrap();
        let store = JsonFileStore::new(tmp.path().join("data.json"), Document::default());

        let doc = sample_document();
        store.write(&doc).await.unwrap();
        assert_eq!(store.read().await.unwrap(), doc);
    }

    #[tokio::test]
    async fn test_write_creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("deeper").join("data.json");
        let store = JsonFileStore::new(&path, Document::default());

        store.write(&sample_document()).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_write_leaves_no_temp_file() {
        let tmp = TempDir::new().unwrap();
        let store = JsonFileStore::new(tmp.path().join("data.json"), Document::default());

        store.write(&sample_document()).await.unwrap();
        assert!(!tmp.path().join("data.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_a_serialization_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data.json");
        std::fs::write(&path, b"{ not json").unwrap();
        let store = JsonFileStore::new(&path, Document::default());

        let err = store.read().await.unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_memory_store_roundtrip_is_isolated_from_caller() {
        let store = MemoryStore::new(Document::with_limit(2));
        let mut doc = store.read().await.unwrap();
        doc.selections.set_mut("kai").push(9);

        // Mutating the copy does not touch the stored document until written.
        assert_eq!(store.read().await.unwrap().selections.total(), 0);

        store.write(&doc).await.unwrap();
        assert_eq!(store.read().await.unwrap().selections.of("kai"), &[9]);
    }
}
