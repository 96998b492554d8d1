//! Database connection management.
//!
//! The [`Database`] struct owns a [`rusqlite::Connection`]. The server opens
//! the file once at startup with [`Database::open_at`], which brings the schema
//! up to date, and then uses [`Database::connect`] for each request so that no
//! connection outlives the operation it serves.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use rusqlite::Connection;

use crate::error::{Result, StoreError};
use crate::migrations;

/// Wrapper around a [`rusqlite::Connection`].
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Default location of the database file:
    /// - Linux:   `~/.local/share/dreamlayout/dreamlayout.db`
    /// - macOS:   `~/Library/Application Support/com.dreamlayout.dreamlayout/dreamlayout.db`
    /// - Windows: `{FOLDERID_RoamingAppData}\dreamlayout\dreamlayout\data\dreamlayout.db`
    pub fn default_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("com", "dreamlayout", "dreamlayout")
            .ok_or(StoreError::NoDataDir)?;

        let data_dir = project_dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        Ok(data_dir.join("dreamlayout.db"))
    }

    /// Open (or create) a database at `path` and run the schema migrations.
    ///
    /// Any migration failure is reported as [`StoreError::Schema`] and should
    /// abort startup.
    pub fn open_at(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        tracing::info!(path = %path.display(), "opening database");

        let db = Self::connect(path)?;
        migrations::ensure_schema(&db.conn)?;
        Ok(db)
    }

    /// Open a connection to an existing, already migrated database.
    pub fn connect(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::configure(&conn)?;
        Ok(Self { conn })
    }

    /// Fresh in-memory database with the full schema.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::configure(&conn)?;
        migrations::ensure_schema(&conn)?;
        Ok(Self { conn })
    }

    fn configure(conn: &Connection) -> Result<()> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        Ok(())
    }

    /// Return a reference to the underlying `rusqlite::Connection`.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Return the filesystem path of the open database (if any).
    pub fn path(&self) -> Option<PathBuf> {
        self.conn.path().map(PathBuf::from)
    }
}
