//! Best-effort copy of a project's rendering to object storage.
//!
//! A failed mirror never fails the save: the outcome is logged and the
//! project is stored without a rendering reference. Purging an owner's folder
//! on account deletion follows the same contract.

use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use dreamlayout_shared::constants::{MIRROR_ROOT_FOLDER, MIRROR_SLUG_MAX_CHARS};
use dreamlayout_shared::markup::to_svg_document;
use dreamlayout_shared::MarkupError;
use thiserror::Error;

pub const SVG_DATA_URI_PREFIX: &str = "data:image/svg+xml;base64,";

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("Markup error: {0}")]
    Markup(#[from] MarkupError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Upload rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Opaque upload-and-get-URL storage.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `data_uri` as `{folder}/{public_id}` and return its public URL.
    async fn upload(
        &self,
        data_uri: &str,
        folder: &str,
        public_id: &str,
    ) -> Result<String, MirrorError>;

    /// Remove everything stored under `folder`. A missing folder is not an
    /// error.
    async fn delete_folder(&self, folder: &str) -> Result<(), MirrorError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorOutcome {
    Mirrored(String),
    Unavailable,
}

impl MirrorOutcome {
    pub fn into_url(self) -> Option<String> {
        match self {
            MirrorOutcome::Mirrored(url) => Some(url),
            MirrorOutcome::Unavailable => None,
        }
    }
}

#[derive(Clone)]
pub struct AssetMirror {
    storage: Arc<dyn ObjectStorage>,
}

impl AssetMirror {
    pub fn new(storage: Arc<dyn ObjectStorage>) -> Self {
        Self { storage }
    }

    /// Upload `markup` for the owner identified by `owner_key`, naming it
    /// after `title`.
    pub async fn mirror(&self, markup: &str, owner_key: &str, title: &str) -> MirrorOutcome {
        if markup.trim().is_empty() {
            tracing::debug!("nothing to mirror");
            return MirrorOutcome::Unavailable;
        }
        if owner_key.is_empty() {
            tracing::warn!("owner has no key, not mirroring");
            return MirrorOutcome::Unavailable;
        }

        let folder = owner_folder(owner_key);
        let public_id = format!("{}_{}", slug(title), Utc::now().timestamp());

        match self.try_mirror(markup, &folder, &public_id).await {
            Ok(url) => {
                tracing::info!(folder = %folder, public_id = %public_id, "rendering mirrored");
                MirrorOutcome::Mirrored(url)
            }
            Err(e) => {
                tracing::warn!(error = %e, folder = %folder, "rendering mirror failed, saving without it");
                MirrorOutcome::Unavailable
            }
        }
    }

    /// Delete every rendering mirrored for `owner_key`. Returns whether the
    /// folder is gone; failures are logged only.
    pub async fn purge_owner(&self, owner_key: &str) -> bool {
        if owner_key.is_empty() {
            tracing::warn!("owner has no key, nothing to purge");
            return false;
        }

        let folder = owner_folder(owner_key);
        match self.storage.delete_folder(&folder).await {
            Ok(()) => {
                tracing::info!(folder = %folder, "owner renderings purged");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, folder = %folder, "owner rendering purge failed");
                false
            }
        }
    }

    async fn try_mirror(
        &self,
        markup: &str,
        folder: &str,
        public_id: &str,
    ) -> Result<String, MirrorError> {
        let document = to_svg_document(markup)?;
        self.storage
            .upload(&svg_data_uri(&document), folder, public_id)
            .await
    }
}

pub fn owner_folder(owner_key: &str) -> String {
    format!("{MIRROR_ROOT_FOLDER}/u_{owner_key}")
}

/// File-name-safe form of a title: first 30 characters, lower-cased, spaces
/// as underscores, anything outside `[a-z0-9_-]` dropped.
pub fn slug(title: &str) -> String {
    let slug: String = title
        .trim()
        .chars()
        .take(MIRROR_SLUG_MAX_CHARS)
        .flat_map(char::to_lowercase)
        .filter_map(|c| match c {
            ' ' => Some('_'),
            'a'..='z' | '0'..='9' | '_' | '-' => Some(c),
            _ => None,
        })
        .collect();

    if slug.is_empty() {
        "layout".to_string()
    } else {
        slug
    }
}

pub fn svg_data_uri(document: &str) -> String {
    format!("{SVG_DATA_URI_PREFIX}{}", STANDARD.encode(document))
}

/// Decode a URI produced by [`svg_data_uri`].
pub fn decode_svg_data_uri(data_uri: &str) -> Result<Vec<u8>, MirrorError> {
    let encoded = data_uri
        .strip_prefix(SVG_DATA_URI_PREFIX)
        .ok_or_else(|| MirrorError::InvalidUpload("expected an SVG data URI".to_string()))?;
    STANDARD
        .decode(encoded)
        .map_err(|e| MirrorError::InvalidUpload(format!("bad base64: {e}")))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records uploads and folder deletions; fails every call when `fail` is
    /// set.
    #[derive(Default)]
    pub(crate) struct RecordingStorage {
        pub fail: bool,
        pub uploads: Mutex<Vec<(String, String, String)>>,
        pub deleted_folders: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ObjectStorage for RecordingStorage {
        async fn upload(
            &self,
            data_uri: &str,
            folder: &str,
            public_id: &str,
        ) -> Result<String, MirrorError> {
            if self.fail {
                return Err(MirrorError::Rejected {
                    status: 503,
                    message: "storage offline".into(),
                });
            }
            self.uploads.lock().unwrap().push((
                data_uri.to_string(),
                folder.to_string(),
                public_id.to_string(),
            ));
            Ok(format!("https://assets.test/{folder}/{public_id}.svg"))
        }

        async fn delete_folder(&self, folder: &str) -> Result<(), MirrorError> {
            if self.fail {
                return Err(MirrorError::Rejected {
                    status: 503,
                    message: "storage offline".into(),
                });
            }
            self.deleted_folders.lock().unwrap().push(folder.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("Cozy Corner Cafe"), "cozy_corner_cafe");
        assert_eq!(slug("L'Atelier: Büro #2"), "latelier_bro_2");
        assert_eq!(slug("A very long title that keeps going on and on"), "a_very_long_title_that_keeps_g");
        assert_eq!(slug("  !!!  "), "layout");
    }

    #[test]
    fn test_data_uri_round_trip() {
        let uri = svg_data_uri("<svg/>");
        assert!(uri.starts_with(SVG_DATA_URI_PREFIX));
        assert_eq!(decode_svg_data_uri(&uri).unwrap(), b"<svg/>");
        assert!(decode_svg_data_uri("data:text/plain,hi").is_err());
    }

    #[tokio::test]
    async fn test_mirror_uploads_standalone_document() {
        let storage = Arc::new(RecordingStorage::default());
        let mirror = AssetMirror::new(storage.clone());

        let outcome = mirror
            .mirror("<svg viewBox=\"0 0 10 10\"></svg>", "abc123", "Corner Cafe")
            .await;
        let url = outcome.into_url().unwrap();
        assert!(url.starts_with("https://assets.test/dreamlayout_projects/u_abc123/corner_cafe_"));

        let uploads = storage.uploads.lock().unwrap();
        let (data_uri, folder, public_id) = &uploads[0];
        assert_eq!(folder, "dreamlayout_projects/u_abc123");
        assert!(public_id.starts_with("corner_cafe_"));

        let document = String::from_utf8(decode_svg_data_uri(data_uri).unwrap()).unwrap();
        assert!(document.starts_with("<?xml"));
        assert!(document.contains(r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10">"#));
    }

    #[tokio::test]
    async fn test_failures_are_unavailable() {
        let failing = AssetMirror::new(Arc::new(RecordingStorage {
            fail: true,
            ..Default::default()
        }));
        assert_eq!(failing.mirror("<svg></svg>", "k", "t").await, MirrorOutcome::Unavailable);

        let working = AssetMirror::new(Arc::new(RecordingStorage::default()));
        assert_eq!(working.mirror("no markup here", "k", "t").await, MirrorOutcome::Unavailable);
        assert_eq!(working.mirror("   ", "k", "t").await, MirrorOutcome::Unavailable);
    }

    #[tokio::test]
    async fn test_keyless_owner_is_not_mirrored() {
        let storage = Arc::new(RecordingStorage::default());
        let mirror = AssetMirror::new(storage.clone());

        assert_eq!(mirror.mirror("<svg></svg>", "", "Cafe").await, MirrorOutcome::Unavailable);
        assert!(!mirror.purge_owner("").await);
        assert!(storage.uploads.lock().unwrap().is_empty());
        assert!(storage.deleted_folders.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_purge_owner() {
        let storage = Arc::new(RecordingStorage::default());
        let mirror = AssetMirror::new(storage.clone());
        assert!(mirror.purge_owner("abc123").await);
        assert_eq!(
            *storage.deleted_folders.lock().unwrap(),
            vec!["dreamlayout_projects/u_abc123".to_string()]
        );

        let failing = AssetMirror::new(Arc::new(RecordingStorage {
            fail: true,
            ..Default::default()
        }));
        assert!(!failing.purge_owner("abc123").await);
    }
}
