//! Per-request database access from async handlers.

use std::path::{Path, PathBuf};

use dreamlayout_store::{Database, StoreError};

use crate::error::ServerError;

/// Handle to the migrated database file. Each [`Db::call`] opens its own
/// connection on the blocking pool and drops it when the closure returns.
#[derive(Debug, Clone)]
pub struct Db {
    path: PathBuf,
}

impl Db {
    /// Open the file once, bringing the schema up to date. Schema errors are
    /// returned to the caller, which aborts startup.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Database::open_at(path)?;
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn call<T, F>(&self, f: F) -> Result<T, ServerError>
    where
        F: FnOnce(&Database) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let db = Database::connect(&path)?;
            f(&db)
        })
        .await
        .map_err(|e| ServerError::Internal(format!("database task failed: {e}")))?
        .map_err(ServerError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_call_sees_committed_writes() {
        let dir = TempDir::new().unwrap();
        let db = Db::open(&dir.path().join("layouts.db")).unwrap();

        let user = db
            .call(|db| db.create_user("Ada", "ada@example.com", "hash"))
            .await
            .unwrap();
        let fetched = db.call(move |db| db.get_user(user.id)).await.unwrap();
        assert_eq!(fetched.email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_store_errors_are_mapped() {
        let dir = TempDir::new().unwrap();
        let db = Db::open(&dir.path().join("layouts.db")).unwrap();

        let err = db.call(|db| db.get_project(99)).await.unwrap_err();
        assert!(matches!(err, ServerError::NotFound));
    }
}
