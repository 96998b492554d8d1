//! Cloudinary signed uploads, and folder cleanup through the Admin API.

use async_trait::async_trait;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::config::CloudinaryConfig;
use crate::mirror::{MirrorError, ObjectStorage};

const UPLOAD_BASE: &str = "https://api.cloudinary.com/v1_1";

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

pub struct CloudinaryStorage {
    client: reqwest::Client,
    config: CloudinaryConfig,
}

impl CloudinaryStorage {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn upload_url(&self) -> String {
        format!("{UPLOAD_BASE}/{}/image/upload", self.config.cloud_name)
    }

    fn resources_url(&self) -> String {
        format!("{UPLOAD_BASE}/{}/resources/image/upload", self.config.cloud_name)
    }

    fn folder_url(&self, folder: &str) -> String {
        format!("{UPLOAD_BASE}/{}/folders/{folder}", self.config.cloud_name)
    }

    /// Admin API call authenticated with the key pair. A 404 counts as done.
    async fn admin_delete(
        &self,
        url: String,
        query: &[(&str, &str)],
    ) -> Result<(), MirrorError> {
        let response = self
            .client
            .delete(url)
            .basic_auth(&self.config.api_key, Some(&self.config.api_secret))
            .query(query)
            .send()
            .await?;
        let status = response.status();
        if status.is_success() || status == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        let text = response.text().await?;
        Err(rejected(status, text))
    }
}

fn rejected(status: reqwest::StatusCode, text: String) -> MirrorError {
    let message = serde_json::from_str::<ErrorResponse>(&text)
        .map(|e| e.error.message)
        .unwrap_or(text);
    MirrorError::Rejected {
        status: status.as_u16(),
        message,
    }
}

/// SHA-256 request signature: the signed parameters sorted by name, joined as
/// `k=v&k=v`, followed by the API secret.
pub fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl ObjectStorage for CloudinaryStorage {
    async fn upload(
        &self,
        data_uri: &str,
        folder: &str,
        public_id: &str,
    ) -> Result<String, MirrorError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign(
            &[
                ("folder", folder),
                ("public_id", public_id),
                ("timestamp", timestamp.as_str()),
            ],
            &self.config.api_secret,
        );

        let form = [
            ("file", data_uri),
            ("folder", folder),
            ("public_id", public_id),
            ("timestamp", timestamp.as_str()),
            ("api_key", self.config.api_key.as_str()),
            ("signature", signature.as_str()),
            ("signature_algorithm", "sha256"),
        ];

        let response = self.client.post(self.upload_url()).form(&form).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(rejected(status, text));
        }

        let parsed: UploadResponse = serde_json::from_str(&text)
            .map_err(|e| MirrorError::InvalidUpload(format!("unexpected upload response: {e}")))?;
        Ok(parsed.secure_url)
    }

    async fn delete_folder(&self, folder: &str) -> Result<(), MirrorError> {
        if folder.trim_matches('/').is_empty() {
            return Err(MirrorError::InvalidUpload("empty folder".to_string()));
        }
        let prefix = format!("{}/", folder.trim_end_matches('/'));
        self.admin_delete(self.resources_url(), &[("prefix", prefix.as_str())])
            .await?;
        self.admin_delete(self.folder_url(folder.trim_end_matches('/')), &[])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_is_order_independent() {
        let a = sign(&[("timestamp", "1700000000"), ("folder", "f")], "secret");
        let b = sign(&[("folder", "f"), ("timestamp", "1700000000")], "secret");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_signature_matches_manual_digest() {
        let expected = hex::encode(Sha256::digest(b"folder=f&public_id=p&timestamp=1secret"));
        let actual = sign(&[("public_id", "p"), ("timestamp", "1"), ("folder", "f")], "secret");
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_upload_url() {
        let storage = CloudinaryStorage::new(CloudinaryConfig {
            cloud_name: "demo".into(),
            api_key: "k".into(),
            api_secret: "s".into(),
        });
        assert_eq!(storage.upload_url(), "https://api.cloudinary.com/v1_1/demo/image/upload");
        assert_eq!(
            storage.resources_url(),
            "https://api.cloudinary.com/v1_1/demo/resources/image/upload"
        );
        assert_eq!(
            storage.folder_url("dreamlayout_projects/u_abc"),
            "https://api.cloudinary.com/v1_1/demo/folders/dreamlayout_projects/u_abc"
        );
    }

    #[test]
    fn test_rejection_message_prefers_error_body() {
        let err = rejected(
            reqwest::StatusCode::UNAUTHORIZED,
            r#"{"error": {"message": "Invalid api_key"}}"#.to_string(),
        );
        assert!(matches!(err, MirrorError::Rejected { status: 401, ref message } if message == "Invalid api_key"));

        let err = rejected(reqwest::StatusCode::BAD_GATEWAY, "upstream down".to_string());
        assert!(matches!(err, MirrorError::Rejected { status: 502, ref message } if message == "upstream down"));
    }
}
