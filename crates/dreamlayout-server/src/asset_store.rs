use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info};

use crate::mirror::{decode_svg_data_uri, MirrorError, ObjectStorage};

/// Verify that a resolved path stays within the expected base directory.
fn ensure_within(base: &Path, relative: &Path) -> Result<PathBuf, MirrorError> {
    let mut resolved = base.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(c) => resolved.push(c),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(MirrorError::InvalidUpload(
                    "Path traversal detected".to_string(),
                ));
            }
        }
    }
    if !resolved.starts_with(base) || resolved == base {
        return Err(MirrorError::InvalidUpload(
            "Path traversal detected".to_string(),
        ));
    }
    Ok(resolved)
}

/// Object storage on local disk, served back under `public_url`.
#[derive(Debug, Clone)]
pub struct LocalAssetStore {
    base_path: PathBuf,
    public_url: String,
}

impl LocalAssetStore {
    pub async fn new(base_path: PathBuf, public_url: &str) -> Result<Self, MirrorError> {
        fs::create_dir_all(&base_path).await?;
        let base_path = base_path.canonicalize()?;

        info!(path = %base_path.display(), "Local asset store initialized");

        Ok(Self {
            base_path,
            public_url: public_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn asset_path(&self, folder: &str, public_id: &str) -> Result<PathBuf, MirrorError> {
        if public_id.is_empty() || public_id.contains(['/', '\\']) {
            return Err(MirrorError::InvalidUpload(format!(
                "invalid public id: {public_id}"
            )));
        }
        let relative = Path::new(folder).join(format!("{public_id}.svg"));
        ensure_within(&self.base_path, &relative)
    }
}

#[async_trait]
impl ObjectStorage for LocalAssetStore {
    async fn upload(
        &self,
        data_uri: &str,
        folder: &str,
        public_id: &str,
    ) -> Result<String, MirrorError> {
        let data = decode_svg_data_uri(data_uri)?;
        let path = self.asset_path(folder, public_id)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, &data).await?;

        debug!(path = %path.display(), size = data.len(), "Stored asset");
        Ok(format!("{}/{folder}/{public_id}.svg", self.public_url))
    }

    async fn delete_folder(&self, folder: &str) -> Result<(), MirrorError> {
        let path = ensure_within(&self.base_path, Path::new(folder))?;
        match fs::remove_dir_all(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), "Removed asset folder");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mirror::svg_data_uri;
    use tempfile::TempDir;

    async fn test_store() -> (LocalAssetStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = LocalAssetStore::new(dir.path().join("assets"), "http://localhost:8080/assets/")
            .await
            .unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn test_upload_writes_file_and_returns_url() {
        let (store, _dir) = test_store().await;
        let uri = svg_data_uri("<svg></svg>");

        let url = store
            .upload(&uri, "dreamlayout_projects/u_abc", "cafe_1700000000")
            .await
            .unwrap();
        assert_eq!(
            url,
            "http://localhost:8080/assets/dreamlayout_projects/u_abc/cafe_1700000000.svg"
        );

        let written = store
            .base_path()
            .join("dreamlayout_projects/u_abc/cafe_1700000000.svg");
        assert_eq!(std::fs::read_to_string(written).unwrap(), "<svg></svg>");
    }

    #[tokio::test]
    async fn test_traversal_rejected() {
        let (store, _dir) = test_store().await;
        let uri = svg_data_uri("<svg></svg>");

        assert!(store.upload(&uri, "../outside", "x").await.is_err());
        assert!(store.upload(&uri, "/etc", "x").await.is_err());
        assert!(store.upload(&uri, "ok", "../x").await.is_err());
    }

    #[tokio::test]
    async fn test_delete_folder_removes_owner_assets_only() {
        let (store, _dir) = test_store().await;
        let uri = svg_data_uri("<svg></svg>");
        store.upload(&uri, "dreamlayout_projects/u_a", "one").await.unwrap();
        store.upload(&uri, "dreamlayout_projects/u_b", "two").await.unwrap();

        store.delete_folder("dreamlayout_projects/u_a").await.unwrap();
        assert!(!store.base_path().join("dreamlayout_projects/u_a").exists());
        assert!(store.base_path().join("dreamlayout_projects/u_b/two.svg").exists());

        store.delete_folder("dreamlayout_projects/u_a").await.unwrap();
        assert!(store.delete_folder("").await.is_err());
        assert!(store.delete_folder("../outside").await.is_err());
    }

    #[tokio::test]
    async fn test_non_svg_payload_rejected() {
        let (store, _dir) = test_store().await;
        assert!(store.upload("data:text/plain;base64,aGk=", "f", "x").await.is_err());
    }
}
