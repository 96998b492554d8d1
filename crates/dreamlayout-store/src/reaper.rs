//! Archive reaper.
//!
//! Projects that have sat soft-deleted for longer than
//! [`ARCHIVE_RETENTION_DAYS`] are removed for good. There is no scheduler:
//! the sweep runs at the start of every archive listing, so an expired
//! project is never shown, but may stay on disk until someone looks.

use chrono::{DateTime, Duration, Utc};
use dreamlayout_shared::constants::ARCHIVE_RETENTION_DAYS;
use rusqlite::params;

use crate::database::Database;
use crate::error::Result;
use crate::models::{to_db_timestamp, Project};
use crate::projects::PROJECT_COLUMNS;

impl Database {
    /// Purge every project archived before the retention window. Returns the
    /// number of rows removed.
    pub fn sweep_archive(&self) -> Result<usize> {
        self.sweep_archive_at(Utc::now())
    }

    /// [`Database::sweep_archive`] against an explicit clock.
    pub fn sweep_archive_at(&self, now: DateTime<Utc>) -> Result<usize> {
        let cutoff = now - Duration::days(ARCHIVE_RETENTION_DAYS);

        // julianday() also understands the space-separated timestamps of
        // legacy rows.
        let purged = self.conn().execute(
            "DELETE FROM projects
             WHERE is_deleted = 1
               AND deleted_at IS NOT NULL
               AND julianday(deleted_at) < julianday(?1)",
            params![to_db_timestamp(cutoff)],
        )?;

        if purged > 0 {
            tracing::info!(purged, cutoff = %cutoff, "archive sweep removed expired projects");
        }
        Ok(purged)
    }

    /// The owner's archived projects, newest deletion first. Sweeps first.
    pub fn list_archived(&self, owner_id: i64) -> Result<Vec<Project>> {
        self.sweep_archive()?;
        self.query_projects(
            &format!(
                "SELECT {PROJECT_COLUMNS} FROM projects
                 WHERE user_id = ?1 AND is_deleted = 1
                 ORDER BY deleted_at DESC, id DESC"
            ),
            params![owner_id],
        )
    }
}
