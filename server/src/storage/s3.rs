//! S3-compatible storage (AWS, Tebi, R2, MinIO)
use std::time::Duration;

use bytes::Bytes;
use object_store::{
    aws::{AmazonS3, AmazonS3Builder},
    path::Path,
    signer::Signer as _,
    Attribute, Attributes, ObjectStore as _, PutOptions, PutPayload,
};
use regex::Regex;
use tracing::{debug, error};
use url::Url;

use super::StorageError;
use crate::config::env_non_empty;

/// Connection settings for an S3 bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Config {
    /// Custom endpoint without a trailing slash, if not plain AWS
    pub endpoint: Option<String>,
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub bucket: String,
}

impl S3Config {
    pub fn from_env() -> Result<Self, StorageError> {
        let bucket = env_non_empty("AWS_BUCKET_NAME").ok_or_else(|| {
            StorageError::Configuration("AWS_BUCKET_NAME must be set for S3 storage".to_string())
        })?;

        let mut config = Self::new(
            bucket,
            env_non_empty("AWS_S3_ENDPOINT").as_deref(),
            env_non_empty("AWS_REGION").as_deref(),
        )?;
        config.access_key_id = env_non_empty("AWS_ACCESS_KEY_ID");
        config.secret_access_key = env_non_empty("AWS_SECRET_ACCESS_KEY");

        match (&config.access_key_id, &config.secret_access_key) {
            (Some(_), Some(_)) | (None, None) => Ok(config),
            _ => Err(StorageError::Configuration(
                "Must provide both or none of AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY"
                    .to_string(),
            )),
        }
    }

    /// Normalises the endpoint and picks the region.
    ///
    /// Custom S3-compatible endpoints fall back to the `auto` region, plain AWS needs one.
    pub fn new(bucket: String, endpoint: Option<&str>, region: Option<&str>) -> Result<Self, StorageError> {
        let endpoint = endpoint
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(|e| e.strip_suffix('/').unwrap_or(e).to_string());

        let custom_endpoint = endpoint
            .as_deref()
            .is_some_and(|e| !e.contains("amazonaws.com"));

        let region = match (region, custom_endpoint) {
            (Some(region), _) => region.to_string(),
            (None, true) => "auto".to_string(),
            (None, false) => {
                return Err(StorageError::Configuration(
                    "AWS_REGION must be set when using AWS S3".to_string(),
                ))
            }
        };

        Ok(Self {
            endpoint,
            region,
            access_key_id: None,
            secret_access_key: None,
            bucket,
        })
    }

    /// The unsigned URL of `key`
    pub fn public_url(&self, key: &str) -> String {
        match &self.endpoint {
            Some(endpoint) => format!("{endpoint}/{}/{key}", self.bucket),
            None => format!(
                "https://{}.s3.{}.amazonaws.com/{key}",
                self.bucket, self.region
            ),
        }
    }
}

pub struct S3Storage {
    config: S3Config,
    store: AmazonS3,
    key_pattern: Regex,
}

impl S3Storage {
    pub fn new(config: S3Config) -> Result<Self, StorageError> {
        let mut builder = AmazonS3Builder::new()
            .with_bucket_name(&config.bucket)
            .with_region(&config.region)
            .with_virtual_hosted_style_request(false);

        if let (Some(access_key_id), Some(secret_access_key)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            builder = builder
                .with_access_key_id(access_key_id)
                .with_secret_access_key(secret_access_key);
        }

        if let Some(endpoint) = &config.endpoint {
            debug!(%endpoint, "Creating S3 provider with custom endpoint");
            builder = builder
                .with_endpoint(endpoint)
                .with_allow_http(endpoint.starts_with("http://"));
        }

        let store = builder.build().map_err(StorageError::BuildingClient)?;

        let key_pattern = Regex::new(&format!("{}/([^?]+)", regex::escape(&config.bucket)))
            .map_err(|e| StorageError::Configuration(format!("Invalid bucket name: {e}")))?;

        Ok(Self {
            config,
            store,
            key_pattern,
        })
    }

    pub fn config(&self) -> &S3Config {
        &self.config
    }

    pub async fn put(&self, key: &str, content_type: &str, bytes: Bytes) -> Result<(), StorageError> {
        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());

        self.store
            .put_opts(
                &Path::from(key),
                PutPayload::from(bytes),
                PutOptions {
                    attributes,
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| StorageError::Put(key.to_string(), e))?;

        Ok(())
    }

    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.store
            .delete(&Path::from(key))
            .await
            .map_err(|e| StorageError::Delete(key.to_string(), e))
    }

    pub async fn signed_url(&self, key: &str, ttl: Duration) -> Result<Url, StorageError> {
        self.store
            .signed_url(reqwest::Method::GET, &Path::from(key), ttl)
            .await
            .map_err(|e| StorageError::Sign(key.to_string(), e))
    }

    /// Pulls the object key out of a URL pointing at this bucket
    pub fn extract_key(&self, url: &str) -> Option<String> {
        if let Some(captures) = self.key_pattern.captures(url) {
            return captures.get(1).map(|m| m.as_str().to_string());
        }

        // https://{bucket}.s3.{region}.amazonaws.com/{key}
        let parsed = Url::parse(url).ok()?;
        let host = parsed.host_str()?;
        if !host.starts_with(&format!("{}.", self.config.bucket)) {
            return None;
        }

        let key = parsed.path().trim_start_matches('/');
        (!key.is_empty()).then(|| key.to_string())
    }

    /// The key behind a stored reference, when it belongs to this bucket
    pub fn key_for(&self, stored: &str) -> Option<String> {
        let stored = stored.trim();
        if stored.starts_with("http") {
            if !stored.contains(&self.config.bucket) {
                return None;
            }
            return self.extract_key(stored);
        }

        if stored.is_empty() || stored.starts_with('/') {
            return None;
        }

        Some(stored.to_string())
    }

    pub async fn display_url(&self, stored: &str, ttl: Duration) -> String {
        if stored.is_empty() || is_signed(stored) {
            return stored.to_string();
        }

        let Some(key) = self.key_for(stored) else {
            return stored.to_string();
        };

        match self.signed_url(&key, ttl).await {
            Ok(url) => url.to_string(),
            Err(err) => {
                error!(error = ?err, key, "Error generating signed URL");
                stored.to_string()
            }
        }
    }
}

fn is_signed(url: &str) -> bool {
    url.contains("X-Amz-Signature") || url.contains("Signature=")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tebi_storage() -> S3Storage {
        let mut config = S3Config::new(
            "portfolio-assets".to_string(),
            Some("https://s3.tebi.io/"),
            None,
        )
        .expect("custom endpoint needs no region");
        config.access_key_id = Some("test-access-key".to_string());
        config.secret_access_key = Some("test-secret-key".to_string());

        S3Storage::new(config).expect("builder accepts static credentials")
    }

    #[test]
    fn test_custom_endpoint_defaults_to_auto_region() -> color_eyre::Result<()> {
        let config = S3Config::new("bucket".to_string(), Some("https://s3.tebi.io/"), None)?;

        assert_eq!(config.endpoint.as_deref(), Some("https://s3.tebi.io"));
        assert_eq!(config.region, "auto");
        assert_eq!(
            config.public_url("projects/1_a.png"),
            "https://s3.tebi.io/bucket/projects/1_a.png"
        );
        Ok(())
    }

    #[test]
    fn test_plain_aws_requires_region() -> color_eyre::Result<()> {
        assert!(S3Config::new("bucket".to_string(), None, None).is_err());
        assert!(S3Config::new(
            "bucket".to_string(),
            Some("https://s3.amazonaws.com"),
            None
        )
        .is_err());

        let config = S3Config::new("bucket".to_string(), None, Some("eu-west-1"))?;
        assert_eq!(
            config.public_url("resume/cv.pdf"),
            "https://bucket.s3.eu-west-1.amazonaws.com/resume/cv.pdf"
        );
        Ok(())
    }

    #[test]
    fn test_extract_key() {
        let storage = tebi_storage();

        assert_eq!(
            storage
                .extract_key("https://s3.tebi.io/portfolio-assets/projects/1_a.png?x=1")
                .as_deref(),
            Some("projects/1_a.png")
        );
        assert_eq!(
            storage
                .extract_key("https://portfolio-assets.s3.us-east-1.amazonaws.com/stats/icon.svg")
                .as_deref(),
            Some("stats/icon.svg")
        );
        assert_eq!(storage.extract_key("https://example.com/portfolio-assets"), None);
    }

    #[test]
    fn test_key_for_ownership() {
        let storage = tebi_storage();

        assert_eq!(storage.key_for("services/icon.png").as_deref(), Some("services/icon.png"));
        assert_eq!(storage.key_for("https://cdn.example.com/icon.png"), None);
        assert_eq!(storage.key_for("/uploads/services/icon.png"), None);
        assert_eq!(storage.key_for(""), None);
    }

    #[tokio::test]
    async fn test_display_url_signs_keys_and_passes_through_the_rest() {
        let storage = tebi_storage();
        let ttl = Duration::from_secs(60);

        let signed = storage.display_url("services/icon.png", ttl).await;
        assert!(signed.starts_with("https://s3.tebi.io/portfolio-assets/services/icon.png?"));
        assert!(signed.contains("X-Amz-Signature"));

        let from_url = storage
            .display_url("https://s3.tebi.io/portfolio-assets/services/icon.png", ttl)
            .await;
        assert!(from_url.contains("X-Amz-Signature"));

        assert_eq!(storage.display_url("", ttl).await, "");
        assert_eq!(
            storage.display_url("https://example.com/logo.png", ttl).await,
            "https://example.com/logo.png"
        );
        assert_eq!(storage.display_url(&signed, ttl).await, signed);
    }
}
