use std::sync::Arc;

use bytes::Bytes;
use object_store::{memory::InMemory, path::Path, ObjectStore, PutPayload};

use super::{StorageError, StoredObject};

pub const URL_PREFIX: &str = "/uploads/";

/// Objects kept on local disk or in memory and served back by this server
pub struct LocalStorage {
    store: Arc<dyn ObjectStore>,
    kind: &'static str,
}

impl LocalStorage {
    pub fn new_filesystem(base_path: &str) -> Result<Self, StorageError> {
        std::fs::create_dir_all(base_path).map_err(|e| {
            StorageError::Configuration(format!("Cannot create storage directory {base_path}: {e}"))
        })?;

        let store = object_store::local::LocalFileSystem::new_with_prefix(base_path)
            .map_err(StorageError::BuildingClient)?;

        Ok(Self {
            store: Arc::new(store),
            kind: "local",
        })
    }

    pub fn new_memory() -> Self {
        Self {
            store: Arc::new(InMemory::new()),
            kind: "memory",
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn url_for(&self, key: &str) -> String {
        format!("{URL_PREFIX}{key}")
    }

    pub fn display_url(&self, stored: &str) -> String {
        match self.key_for(stored) {
            Some(key) => self.url_for(&key),
            None => stored.to_string(),
        }
    }

    /// Bare keys and `/uploads/` paths belong to this provider
    pub fn key_for(&self, stored: &str) -> Option<String> {
        let stored = stored.trim();
        if let Some(key) = stored.strip_prefix(URL_PREFIX) {
            return (!key.is_empty()).then(|| key.to_string());
        }

        if stored.is_empty() || stored.starts_with('/') || stored.contains("://") {
            return None;
        }

        Some(stored.to_string())
    }

    pub async fn put(&self, key: &str, bytes: Bytes) -> Result<(), StorageError> {
        let location = Path::from(key);
        self.store
            .put(&location, PutPayload::from(bytes))
            .await
            .map_err(|e| StorageError::Put(key.to_string(), e))?;
        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Option<StoredObject>, StorageError> {
        let location = Path::from(key);
        let result = match self.store.get(&location).await {
            Ok(result) => result,
            Err(object_store::Error::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(StorageError::Get(key.to_string(), e)),
        };

        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::Get(key.to_string(), e))?;

        Ok(Some(StoredObject {
            bytes,
            content_type: mime_guess::from_path(key)
                .first_or_octet_stream()
                .essence_str()
                .to_string(),
        }))
    }

    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let location = Path::from(key);
        match self.store.delete(&location).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(StorageError::Delete(key.to_string(), e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_for() {
        let storage = LocalStorage::new_memory();

        assert_eq!(storage.key_for("/uploads/a/b.png").as_deref(), Some("a/b.png"));
        assert_eq!(storage.key_for("a/b.png").as_deref(), Some("a/b.png"));
        assert_eq!(storage.key_for("/uploads/"), None);
        assert_eq!(storage.key_for("/static/logo.svg"), None);
        assert_eq!(storage.key_for("https://cdn.example.com/a.png"), None);
    }

    #[tokio::test]
    async fn test_filesystem_roundtrip() -> color_eyre::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().to_string_lossy().to_string();
        let storage = LocalStorage::new_filesystem(&path)?;

        storage
            .put("resume/1_cv.pdf", Bytes::from_static(b"%PDF"))
            .await?;
        let stored = storage.get("resume/1_cv.pdf").await?.expect("file was written");
        assert_eq!(stored.content_type, "application/pdf");

        storage.delete("resume/1_cv.pdf").await?;
        storage.delete("resume/1_cv.pdf").await?;
        assert!(storage.get("resume/1_cv.pdf").await?.is_none());
        Ok(())
    }
}
