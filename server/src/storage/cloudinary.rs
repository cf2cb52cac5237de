//! Cloudinary uploads through the signed REST API
use bytes::Bytes;
use serde::Deserialize;
use sha1::{Digest as _, Sha1};
use tracing::{info, warn};

use super::{StorageError, UploadedObject};
use crate::config::env_non_empty;

const DEFAULT_API_BASE: &str = "https://api.cloudinary.com/v1_1";

#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    /// Root folder every upload lands under
    pub folder: String,
    pub api_base: String,
}

impl CloudinaryConfig {
    pub fn from_env() -> Result<Self, StorageError> {
        let required = |name: &str| {
            env_non_empty(name).ok_or_else(|| {
                StorageError::Configuration(format!("{name} must be set for Cloudinary storage"))
            })
        };

        Ok(Self {
            cloud_name: required("CLOUDINARY_CLOUD_NAME")?,
            api_key: required("CLOUDINARY_API_KEY")?,
            api_secret: required("CLOUDINARY_API_SECRET")?,
            folder: env_non_empty("CLOUDINARY_FOLDER").unwrap_or_else(|| "portfolio".to_string()),
            api_base: DEFAULT_API_BASE.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: String,
}

pub struct CloudinaryStorage {
    config: CloudinaryConfig,
    client: reqwest::Client,
}

impl CloudinaryStorage {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub async fn upload(
        &self,
        folder: &str,
        file_name: &str,
        content_type: &str,
        bytes: Bytes,
    ) -> Result<UploadedObject, StorageError> {
        let folder = format!("{}/{folder}", self.config.folder);
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign_params(
            &[("folder", folder.as_str()), ("timestamp", timestamp.as_str())],
            &self.config.api_secret,
        );

        let file = reqwest::multipart::Part::bytes(bytes.to_vec())
            .file_name(file_name.to_string())
            .mime_str(content_type)?;
        let form = reqwest::multipart::Form::new()
            .part("file", file)
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", folder)
            .text("signature", signature);

        let url = format!("{}/{}/auto/upload", self.config.api_base, self.config.cloud_name);
        let response = self.client.post(url).multipart(form).send().await?;

        if !response.status().is_success() {
            return Err(StorageError::Cloudinary(error_message(response).await));
        }

        let uploaded: UploadResponse = response.json().await?;
        info!(public_id = %uploaded.public_id, "Uploaded to Cloudinary");

        Ok(UploadedObject {
            url: uploaded.secure_url,
            key: uploaded.public_id,
        })
    }

    /// Returns whether Cloudinary reported the asset as removed
    pub async fn destroy(&self, reference: &CloudinaryRef) -> Result<bool, StorageError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign_params(
            &[
                ("public_id", reference.public_id.as_str()),
                ("timestamp", timestamp.as_str()),
            ],
            &self.config.api_secret,
        );

        let url = format!(
            "{}/{}/{}/destroy",
            self.config.api_base, self.config.cloud_name, reference.resource_type
        );
        let response = self
            .client
            .post(url)
            .form(&[
                ("public_id", reference.public_id.as_str()),
                ("timestamp", timestamp.as_str()),
                ("api_key", self.config.api_key.as_str()),
                ("signature", signature.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StorageError::Cloudinary(error_message(response).await));
        }

        let destroyed: DestroyResponse = response.json().await?;
        if destroyed.result != "ok" {
            warn!(public_id = %reference.public_id, result = %destroyed.result, "Cloudinary did not delete asset");
        }

        Ok(destroyed.result == "ok")
    }
}

async fn error_message(response: reqwest::Response) -> String {
    let status = response.status();
    match response.json::<ErrorResponse>().await {
        Ok(body) => format!("{status}: {}", body.error.message),
        Err(_) => status.to_string(),
    }
}

/// SHA-1 of the alphabetically sorted `key=value` pairs joined with `&`, followed by the secret
pub fn sign_params(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted: Vec<_> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// An asset identified from its delivery URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudinaryRef {
    /// `image`, `video` or `raw`
    pub resource_type: String,
    pub public_id: String,
}

impl CloudinaryRef {
    /// Parses `https://res.cloudinary.com/{cloud}/{type}/upload/v123/folder/name.ext`
    pub fn parse(url: &str) -> Option<Self> {
        if !url.contains("cloudinary.com") {
            return None;
        }

        let (before, after) = url.split_once("/upload/")?;
        let resource_type = before
            .rsplit('/')
            .next()
            .filter(|t| matches!(*t, "image" | "video" | "raw"))
            .unwrap_or("image")
            .to_string();

        let after = after.split(['?', '#']).next().unwrap_or_default();
        let mut segments: Vec<&str> = after.split('/').filter(|s| !s.is_empty()).collect();
        if segments.first().is_some_and(|first| is_version(first)) {
            segments.remove(0);
        }

        let with_ext = segments.join("/");
        let public_id = match with_ext.rfind('.') {
            Some(dot) if dot > with_ext.rfind('/').map_or(0, |slash| slash + 1) => {
                &with_ext[..dot]
            }
            _ => with_ext.as_str(),
        };

        (!public_id.is_empty()).then(|| Self {
            resource_type,
            public_id: public_id.to_string(),
        })
    }
}

fn is_version(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .is_some_and(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::{Arc, Mutex},
        time::Duration,
    };

    use axum::{
        extract::{Multipart, Path, State},
        routing::post,
        Form, Json, Router,
    };
    use serde_json::{json, Value};

    use super::*;
    use crate::storage::{Storage, StorageConfig};

    /// Request path plus every form field. File parts record `{name}.filename` and `{name}.bytes`.
    type Captured = Arc<Mutex<Vec<(String, HashMap<String, String>)>>>;

    async fn fake_upload(
        State(captured): State<Captured>,
        Path((cloud, resource_type)): Path<(String, String)>,
        mut multipart: Multipart,
    ) -> Json<Value> {
        let mut fields = HashMap::new();
        while let Ok(Some(field)) = multipart.next_field().await {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let bytes = field.bytes().await.unwrap_or_default();
                    fields.insert(format!("{name}.filename"), file_name);
                    fields.insert(format!("{name}.bytes"), String::from_utf8_lossy(&bytes).to_string());
                }
                None => {
                    fields.insert(name, field.text().await.unwrap_or_default());
                }
            }
        }

        let folder = fields.get("folder").cloned().unwrap_or_default();
        captured
            .lock()
            .expect("lock poisoned")
            .push((format!("/{cloud}/{resource_type}/upload"), fields));

        Json(json!({
            "secure_url": format!("https://res.cloudinary.com/{cloud}/image/upload/v17/{folder}/shot.png"),
            "public_id": format!("{folder}/shot"),
        }))
    }

    async fn fake_destroy(
        State(captured): State<Captured>,
        Path((cloud, resource_type)): Path<(String, String)>,
        Form(fields): Form<HashMap<String, String>>,
    ) -> Json<Value> {
        captured
            .lock()
            .expect("lock poisoned")
            .push((format!("/{cloud}/{resource_type}/destroy"), fields));

        Json(json!({ "result": "ok" }))
    }

    async fn spawn_fake_cloudinary(captured: Captured) -> color_eyre::Result<String> {
        let app = Router::new()
            .route("/:cloud/:resource_type/upload", post(fake_upload))
            .route("/:cloud/:resource_type/destroy", post(fake_destroy))
            .with_state(captured);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(format!("http://{addr}"))
    }

    fn fake_config(api_base: String) -> CloudinaryConfig {
        CloudinaryConfig {
            cloud_name: "demo".to_string(),
            api_key: "key-123".to_string(),
            api_secret: "shh".to_string(),
            folder: "portfolio".to_string(),
            api_base,
        }
    }

    #[tokio::test]
    async fn test_upload_sends_signed_multipart() -> color_eyre::Result<()> {
        let captured: Captured = Arc::default();
        let api_base = spawn_fake_cloudinary(captured.clone()).await?;
        let storage = CloudinaryStorage::new(fake_config(api_base));

        let uploaded = storage
            .upload("projects", "shot.png", "image/png", Bytes::from_static(b"png-bytes"))
            .await?;
        assert_eq!(
            uploaded.url,
            "https://res.cloudinary.com/demo/image/upload/v17/portfolio/projects/shot.png"
        );
        assert_eq!(uploaded.key, "portfolio/projects/shot");

        let requests = captured.lock().expect("lock poisoned").clone();
        let (path, fields) = &requests[0];
        assert_eq!(path, "/demo/auto/upload");
        assert_eq!(fields["api_key"], "key-123");
        assert_eq!(fields["folder"], "portfolio/projects");
        assert_eq!(fields["file.filename"], "shot.png");
        assert_eq!(fields["file.bytes"], "png-bytes");

        let expected = sign_params(
            &[("folder", "portfolio/projects"), ("timestamp", fields["timestamp"].as_str())],
            "shh",
        );
        assert_eq!(fields["signature"], expected);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_destroys_by_resource_type() -> color_eyre::Result<()> {
        let captured: Captured = Arc::default();
        let api_base = spawn_fake_cloudinary(captured.clone()).await?;
        let storage = Storage::from_config(
            &StorageConfig::Cloudinary(fake_config(api_base)),
            Duration::from_secs(60),
        )?;

        assert!(
            storage
                .delete("https://res.cloudinary.com/demo/video/upload/v3/portfolio/videos/intro.mp4")
                .await
        );
        // Not a Cloudinary reference, so nothing is sent
        assert!(!storage.delete("https://s3.tebi.io/bucket/a.png").await);

        let requests = captured.lock().expect("lock poisoned").clone();
        assert_eq!(requests.len(), 1);
        let (path, fields) = &requests[0];
        assert_eq!(path, "/demo/video/destroy");
        assert_eq!(fields["public_id"], "portfolio/videos/intro");
        assert_eq!(fields["api_key"], "key-123");

        let expected = sign_params(
            &[
                ("public_id", "portfolio/videos/intro"),
                ("timestamp", fields["timestamp"].as_str()),
            ],
            "shh",
        );
        assert_eq!(fields["signature"], expected);
        Ok(())
    }

    #[test]
    fn test_parse_skips_version_and_extension() {
        let reference = CloudinaryRef::parse(
            "https://res.cloudinary.com/demo/image/upload/v1712345678/portfolio/projects/shot.png",
        )
        .expect("valid cloudinary url");

        assert_eq!(reference.resource_type, "image");
        assert_eq!(reference.public_id, "portfolio/projects/shot");
    }

    #[test]
    fn test_parse_without_version() {
        let reference =
            CloudinaryRef::parse("https://res.cloudinary.com/demo/video/upload/portfolio/videos/intro.mp4")
                .expect("valid cloudinary url");

        assert_eq!(reference.resource_type, "video");
        assert_eq!(reference.public_id, "portfolio/videos/intro");
    }

    #[test]
    fn test_parse_keeps_ids_without_extension() {
        let reference =
            CloudinaryRef::parse("https://res.cloudinary.com/demo/raw/upload/v3/portfolio/resume/cv")
                .expect("valid cloudinary url");

        assert_eq!(reference.public_id, "portfolio/resume/cv");
    }

    #[test]
    fn test_parse_rejects_other_hosts() {
        assert_eq!(CloudinaryRef::parse("https://s3.tebi.io/bucket/a.png"), None);
        assert_eq!(CloudinaryRef::parse("https://res.cloudinary.com/demo/image/fetch/a.png"), None);
    }

    #[test]
    fn test_sign_params_sorts_and_appends_secret() {
        // Example from the Cloudinary signature documentation
        let signature = sign_params(
            &[
                ("timestamp", "1315060510"),
                ("public_id", "sample_image"),
                ("eager", "w_400,h_300,c_pad|w_260,h_200,c_crop"),
            ],
            "abcd",
        );

        assert_eq!(signature, "bfd09f95f331f558cbd1320e67aa8d488770583e");
    }
}
