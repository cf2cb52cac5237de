use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

pub mod cloudinary;
pub mod local;
pub mod s3;

use crate::config::env_non_empty;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage configuration error: {0}")]
    Configuration(String),
    #[error("Failed to build storage client")]
    BuildingClient(#[source] object_store::Error),
    #[error("Failed to put {0}")]
    Put(String, #[source] object_store::Error),
    #[error("Failed to get {0}")]
    Get(String, #[source] object_store::Error),
    #[error("Failed to delete {0}")]
    Delete(String, #[source] object_store::Error),
    #[error("Failed to sign a url for {0}")]
    Sign(String, #[source] object_store::Error),
    #[error("Cloudinary request failed: {0}")]
    Cloudinary(String),
    #[error("Cloudinary request failed")]
    Http(#[from] reqwest::Error),
}

/// Which provider handles uploads, chosen at boot
#[derive(Debug, Clone)]
pub enum StorageConfig {
    S3(s3::S3Config),
    Cloudinary(cloudinary::CloudinaryConfig),
    /// Files on local disk, served back under `/uploads`
    Local { path: String },
    /// Process memory, lost on restart
    Memory,
}

impl StorageConfig {
    /// Reads `STORAGE_PROVIDER`, falling back to whichever provider has credentials set
    pub fn from_env() -> Result<Self, StorageError> {
        let provider = env_non_empty("STORAGE_PROVIDER").map(|p| p.to_lowercase());

        match provider.as_deref() {
            Some("s3") => Ok(Self::S3(s3::S3Config::from_env()?)),
            Some("cloudinary") => Ok(Self::Cloudinary(cloudinary::CloudinaryConfig::from_env()?)),
            Some("local") => Ok(Self::Local {
                path: env_non_empty("LOCAL_STORAGE_PATH").unwrap_or_else(|| "uploads".to_string()),
            }),
            Some("memory") => Ok(Self::Memory),
            Some(other) => Err(StorageError::Configuration(format!(
                "Unknown STORAGE_PROVIDER {other}, expected s3, cloudinary, local or memory"
            ))),
            None if env_non_empty("AWS_BUCKET_NAME").is_some() => {
                Ok(Self::S3(s3::S3Config::from_env()?))
            }
            None if env_non_empty("CLOUDINARY_CLOUD_NAME").is_some() => {
                Ok(Self::Cloudinary(cloudinary::CloudinaryConfig::from_env()?))
            }
            None => {
                warn!("No storage provider configured, uploads will be kept in memory");
                Ok(Self::Memory)
            }
        }
    }
}

/// What an upload hands back: the reference to store and the provider key
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UploadedObject {
    pub url: String,
    pub key: String,
}

/// Bytes read back from a local or in-memory provider
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Bytes,
    pub content_type: String,
}

pub struct Storage {
    backend: Backend,
    signed_url_ttl: Duration,
}

/// Dispatch to the active provider. An enum instead of a dyn trait so the S3 variant
/// can expose presigning next to the plain object operations.
enum Backend {
    S3(s3::S3Storage),
    Cloudinary(cloudinary::CloudinaryStorage),
    Local(local::LocalStorage),
}

impl Storage {
    pub fn from_config(config: &StorageConfig, signed_url_ttl: Duration) -> Result<Self, StorageError> {
        let backend = match config {
            StorageConfig::S3(s3_config) => Backend::S3(s3::S3Storage::new(s3_config.clone())?),
            StorageConfig::Cloudinary(cloudinary_config) => Backend::Cloudinary(
                cloudinary::CloudinaryStorage::new(cloudinary_config.clone()),
            ),
            StorageConfig::Local { path } => Backend::Local(local::LocalStorage::new_filesystem(path)?),
            StorageConfig::Memory => Backend::Local(local::LocalStorage::new_memory()),
        };

        let storage = Self {
            backend,
            signed_url_ttl,
        };
        info!(provider = storage.provider_name(), "Storage provider ready");

        Ok(storage)
    }

    pub fn memory() -> Self {
        Self {
            backend: Backend::Local(local::LocalStorage::new_memory()),
            signed_url_ttl: Duration::from_secs(3600),
        }
    }

    pub fn provider_name(&self) -> &'static str {
        match &self.backend {
            Backend::S3(_) => "s3",
            Backend::Cloudinary(_) => "cloudinary",
            Backend::Local(local) => local.kind(),
        }
    }

    #[instrument(skip(self, bytes), fields(provider = self.provider_name(), size = bytes.len()))]
    pub async fn upload(
        &self,
        folder: &str,
        file_name: &str,
        content_type: &str,
        bytes: Bytes,
    ) -> Result<UploadedObject, StorageError> {
        let folder = sanitize_folder(folder);

        match &self.backend {
            Backend::S3(s3) => {
                let key = object_key(&folder, file_name, now_millis());
                s3.put(&key, content_type, bytes).await?;
                Ok(UploadedObject {
                    url: s3.config().public_url(&key),
                    key,
                })
            }
            Backend::Cloudinary(cloudinary) => {
                cloudinary
                    .upload(&folder, file_name, content_type, bytes)
                    .await
            }
            Backend::Local(local) => {
                let key = object_key(&folder, file_name, now_millis());
                local.put(&key, bytes).await?;
                Ok(UploadedObject {
                    url: local.url_for(&key),
                    key,
                })
            }
        }
    }

    /// Maps a stored asset reference to something a browser can load
    pub async fn display_url(&self, stored: &str) -> String {
        match &self.backend {
            Backend::S3(s3) => s3.display_url(stored, self.signed_url_ttl).await,
            Backend::Cloudinary(_) => stored.to_string(),
            Backend::Local(local) => local.display_url(stored),
        }
    }

    pub async fn display_url_opt(&self, stored: Option<&str>) -> Option<String> {
        match stored {
            Some(stored) => Some(self.display_url(stored).await),
            None => None,
        }
    }

    /// Deletes the object behind `stored` when the active provider owns it.
    ///
    /// Never fails: problems are logged and reported as `false`.
    #[instrument(skip(self), fields(provider = self.provider_name()))]
    pub async fn delete(&self, stored: &str) -> bool {
        if stored.trim().is_empty() {
            return false;
        }

        let result = match &self.backend {
            Backend::S3(s3) => match s3.key_for(stored) {
                Some(key) => s3.delete(&key).await.map(|_| true),
                None => Ok(false),
            },
            Backend::Cloudinary(cloudinary) => match cloudinary::CloudinaryRef::parse(stored) {
                Some(reference) => cloudinary.destroy(&reference).await,
                None => Ok(false),
            },
            Backend::Local(local) => match local.key_for(stored) {
                Some(key) => local.delete(&key).await.map(|_| true),
                None => Ok(false),
            },
        };

        match result {
            Ok(deleted) => deleted,
            Err(err) => {
                error!(error = ?err, stored, "Failed to delete stored object");
                false
            }
        }
    }

    /// Removes `previous` when an asset field moved on to a different object.
    ///
    /// The URL and key forms of one object compare equal, so switching between them keeps it.
    pub async fn replace(&self, previous: Option<&str>, current: Option<&str>) {
        let Some(previous) = previous else {
            return;
        };
        let Some(previous_key) = self.owned_key(previous) else {
            return;
        };

        if current.and_then(|current| self.owned_key(current)).as_ref() != Some(&previous_key) {
            self.delete(previous).await;
        }
    }

    /// Provider identity of a stored reference: object key, or Cloudinary public id
    pub fn owned_key(&self, stored: &str) -> Option<String> {
        let stored = stored.trim();
        if stored.is_empty() {
            return None;
        }

        match &self.backend {
            Backend::S3(s3) => s3.key_for(stored),
            Backend::Cloudinary(_) => match cloudinary::CloudinaryRef::parse(stored) {
                Some(reference) => Some(reference.public_id),
                None if stored.contains("://") || stored.starts_with('/') => None,
                None => Some(stored.to_string()),
            },
            Backend::Local(local) => local.key_for(stored),
        }
    }

    /// Reads an object back. Only local and in-memory providers serve their own files.
    pub async fn get(&self, key: &str) -> Result<Option<StoredObject>, StorageError> {
        match &self.backend {
            Backend::Local(local) => local.get(key).await,
            Backend::S3(_) | Backend::Cloudinary(_) => Ok(None),
        }
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// `{folder}/{unix_millis}_{sanitized_name}`
pub fn object_key(folder: &str, file_name: &str, millis: i64) -> String {
    format!("{folder}/{millis}_{}", sanitize_file_name(file_name))
}

pub fn sanitize_file_name(file_name: &str) -> String {
    let sanitized: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.is_empty() {
        "file".to_string()
    } else {
        sanitized
    }
}

pub fn sanitize_folder(folder: &str) -> String {
    let segments: Vec<String> = folder
        .split('/')
        .map(str::trim)
        .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
        .map(|segment| {
            segment
                .chars()
                .map(|c| {
                    if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                        c
                    } else {
                        '_'
                    }
                })
                .collect()
        })
        .collect();

    if segments.is_empty() {
        "uploads".to_string()
    } else {
        segments.join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_sanitizes_name() {
        assert_eq!(
            object_key("projects", "My Résumé (final).pdf", 1700000000000),
            "projects/1700000000000_My_R_sum___final_.pdf"
        );
    }

    #[test]
    fn test_sanitize_folder() {
        assert_eq!(sanitize_folder(""), "uploads");
        assert_eq!(sanitize_folder("../../etc"), "etc");
        assert_eq!(sanitize_folder("/projects//thumbs/"), "projects/thumbs");
        assert_eq!(sanitize_folder("my folder"), "my_folder");
    }

    #[test]
    fn test_sanitize_file_name_empty() {
        assert_eq!(sanitize_file_name(""), "file");
    }

    #[tokio::test]
    async fn test_memory_upload_display_and_delete() -> color_eyre::Result<()> {
        let storage = Storage::memory();

        let uploaded = storage
            .upload("services", "icon.png", "image/png", Bytes::from_static(b"png"))
            .await?;
        assert!(uploaded.key.starts_with("services/"));
        assert!(uploaded.key.ends_with("_icon.png"));
        assert_eq!(uploaded.url, format!("/uploads/{}", uploaded.key));

        assert_eq!(storage.display_url(&uploaded.key).await, uploaded.url);
        assert_eq!(
            storage.display_url("https://example.com/a.png").await,
            "https://example.com/a.png"
        );

        let stored = storage.get(&uploaded.key).await?.expect("object should exist");
        assert_eq!(stored.bytes.as_ref(), b"png");
        assert_eq!(stored.content_type, "image/png");

        assert!(storage.delete(&uploaded.url).await);
        assert!(storage.get(&uploaded.key).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_replace_keeps_object_across_url_and_key_forms() -> color_eyre::Result<()> {
        let storage = Storage::memory();
        let uploaded = storage
            .upload("diagrams", "flow.svg", "image/svg+xml", Bytes::from_static(b"<svg/>"))
            .await?;

        storage.replace(Some(&uploaded.url), Some(&uploaded.key)).await;
        assert!(storage.get(&uploaded.key).await?.is_some());

        storage.replace(Some(&uploaded.key), Some(&uploaded.url)).await;
        assert!(storage.get(&uploaded.key).await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_replace_deletes_changed_object() -> color_eyre::Result<()> {
        let storage = Storage::memory();
        let old = storage
            .upload("projects", "old.png", "image/png", Bytes::from_static(b"old"))
            .await?;
        let new = storage
            .upload("projects", "new.png", "image/png", Bytes::from_static(b"new"))
            .await?;

        storage.replace(Some(&old.url), Some(&new.url)).await;
        assert!(storage.get(&old.key).await?.is_none());
        assert!(storage.get(&new.key).await?.is_some());

        storage.replace(Some(&new.url), None).await;
        assert!(storage.get(&new.key).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_replace_unchanged_and_foreign_values() -> color_eyre::Result<()> {
        let storage = Storage::memory();
        let kept = storage
            .upload("services", "icon.png", "image/png", Bytes::from_static(b"png"))
            .await?;

        storage.replace(Some(&kept.url), Some(&kept.url)).await;
        assert!(storage.get(&kept.key).await?.is_some());

        // References owned by another provider are never touched
        storage
            .replace(
                Some("https://res.cloudinary.com/demo/image/upload/v1/a.png"),
                Some(&kept.url),
            )
            .await;
        storage.replace(None, Some(&kept.url)).await;
        assert!(storage.get(&kept.key).await?.is_some());
        Ok(())
    }

    #[test]
    fn test_owned_key() {
        let storage = Storage::memory();

        assert_eq!(storage.owned_key("/uploads/a/b.png").as_deref(), Some("a/b.png"));
        assert_eq!(storage.owned_key(" a/b.png ").as_deref(), Some("a/b.png"));
        assert_eq!(storage.owned_key(""), None);
        assert_eq!(storage.owned_key("https://cdn.example.com/a.png"), None);
    }

    #[tokio::test]
    async fn test_delete_ignores_foreign_urls() {
        let storage = Storage::memory();

        assert!(!storage.delete("").await);
        assert!(!storage.delete("https://res.cloudinary.com/demo/image/upload/v1/a.png").await);
    }
}
