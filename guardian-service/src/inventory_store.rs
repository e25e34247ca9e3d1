//! On-disk inventory document.

use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{Result, ServiceError};

pub struct InventoryStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl InventoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn empty_document() -> Value {
        json!({ "medicines": [], "equipment": [] })
    }

    /// Current document. Any read or parse failure yields the empty document.
    pub async fn load(&self) -> Value {
        let _guard = self.lock.read().await;
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!(path = %self.path.display(), error = %e, "Inventory file is not valid JSON");
                Self::empty_document()
            }),
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "Inventory file not readable");
                Self::empty_document()
            }
        }
    }

    /// Replace the whole document. Writers are serialized; the last one wins.
    pub async fn save(&self, document: &Value) -> Result<()> {
        if !document.is_object() {
            return Err(ServiceError::Inventory(
                "inventory must be a JSON object".to_string(),
            ));
        }
        let content = serde_json::to_string_pretty(document)?;

        let _guard = self.lock.write().await;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, content).await?;
        info!(path = %self.path.display(), "Inventory saved");
        Ok(())
    }

    /// The `medicines` list of the current document, as shown to the model.
    pub async fn medicines(&self) -> Value {
        self.load()
            .await
            .get("medicines")
            .cloned()
            .unwrap_or_else(|| json!([]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_reads_as_empty_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = InventoryStore::new(dir.path().join("inventory.json"));
        assert_eq!(store.load().await, InventoryStore::empty_document());
        assert_eq!(store.medicines().await, json!([]));
    }

    #[tokio::test]
    async fn test_saved_document_is_pretty_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("inventory.json");
        let store = InventoryStore::new(&path);

        let document = json!({ "medicines": ["Paracetamol", "Gauze"], "equipment": ["Splint"] });
        store.save(&document).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains('\n'));
        assert_eq!(store.load().await, document);
        assert_eq!(store.medicines().await, json!(["Paracetamol", "Gauze"]));
    }

    #[tokio::test]
    async fn test_corrupt_file_reads_as_empty_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inventory.json");
        std::fs::write(&path, "[1, 2").unwrap();
        let store = InventoryStore::new(&path);
        assert_eq!(store.load().await, InventoryStore::empty_document());
    }

    #[tokio::test]
    async fn test_non_object_documents_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let store = InventoryStore::new(dir.path().join("inventory.json"));
        let err = store.save(&json!(["Gauze"])).await.unwrap_err();
        assert!(matches!(err, ServiceError::Inventory(_)));
    }
}
