//! Lifecycle operations for [`Project`] records.
//!
//! Every statement commits on its own; there is no transaction spanning more
//! than one call. Listings other than the archive never return soft-deleted
//! rows.

use chrono::{DateTime, Utc};
use dreamlayout_shared::codes::generate_design_code;
use dreamlayout_shared::LayoutResult;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, ToSql};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{parse_db_timestamp, to_db_timestamp, Project, StatusField};
use crate::payload::{decode_floors, encode_floors};

pub(crate) const PROJECT_COLUMNS: &str = "id, user_id, title, description, design_code, \
     thumbnail, svg_content, rooms, design_philosophy, is_favourite, is_public, is_deleted, \
     deleted_at, created_at, updated_at";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Persist a generated layout for `owner_id` and return the new project id.
    ///
    /// The layout's `design_code` is used when present, otherwise a new one is
    /// generated. A code already taken by another project is reported as
    /// [`StoreError::Conflict`].
    pub fn create_project(
        &self,
        owner_id: i64,
        layout: &LayoutResult,
        rendering_ref: Option<&str>,
    ) -> Result<i64> {
        let design_code = layout
            .design_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(str::to_string)
            .unwrap_or_else(generate_design_code);
        let canonical_markup = layout.primary_markup().unwrap_or_default();
        let payload = encode_floors(&layout.floors)?;
        let now = to_db_timestamp(Utc::now());

        self.conn()
            .execute(
                "INSERT INTO projects (user_id, title, description, design_code, thumbnail,
                                       svg_content, rooms, design_philosophy, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
                params![
                    owner_id,
                    layout.title,
                    layout.description,
                    design_code,
                    rendering_ref,
                    canonical_markup,
                    payload,
                    layout.conversational_response,
                    now,
                ],
            )
            .map_err(StoreError::from_write)?;

        let id = self.conn().last_insert_rowid();
        tracing::info!(
            project_id = id,
            owner_id,
            design_code = %design_code,
            floors = layout.floors.len(),
            mirrored = rendering_ref.is_some(),
            "created project"
        );
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a project by id regardless of owner or deletion state.
    ///
    /// Callers serving a user must go through
    /// [`Database::get_project_for`](crate::access) instead.
    pub fn get_project(&self, id: i64) -> Result<Project> {
        self.conn()
            .query_row(
                &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1"),
                params![id],
                row_to_project,
            )
            .map_err(StoreError::from_read)
    }

    /// The owner's live projects, most recently updated first.
    pub fn list_active(&self, owner_id: i64, limit: u32) -> Result<Vec<Project>> {
        self.query_projects(
            &format!(
                "SELECT {PROJECT_COLUMNS} FROM projects
                 WHERE user_id = ?1 AND is_deleted = 0
                 ORDER BY updated_at DESC, id DESC
                 LIMIT ?2"
            ),
            params![owner_id, limit],
        )
    }

    pub fn list_favourites(&self, owner_id: i64) -> Result<Vec<Project>> {
        self.query_projects(
            &format!(
                "SELECT {PROJECT_COLUMNS} FROM projects
                 WHERE user_id = ?1 AND is_favourite = 1 AND is_deleted = 0
                 ORDER BY updated_at DESC, id DESC"
            ),
            params![owner_id],
        )
    }

    /// Public gallery across all owners.
    pub fn list_public(&self, limit: u32) -> Result<Vec<Project>> {
        self.query_projects(
            &format!(
                "SELECT {PROJECT_COLUMNS} FROM projects
                 WHERE is_public = 1 AND is_deleted = 0
                 ORDER BY updated_at DESC, id DESC
                 LIMIT ?1"
            ),
            params![limit],
        )
    }

    pub(crate) fn query_projects(&self, sql: &str, params: &[&dyn ToSql]) -> Result<Vec<Project>> {
        let mut stmt = self.conn().prepare(sql)?;
        let rows = stmt.query_map(params, row_to_project)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Replace title and description. Returns `true` if the row exists.
    pub fn edit_project(&self, id: i64, title: &str, description: &str) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE projects SET title = ?1, description = ?2, updated_at = ?3 WHERE id = ?4",
            params![title, description, to_db_timestamp(Utc::now()), id],
        )?;
        Ok(affected > 0)
    }

    /// Set one flag on one project.
    pub fn update_status(&self, id: i64, field: StatusField, value: bool) -> Result<bool> {
        let sql = format!(
            "UPDATE projects SET {} = ?1, updated_at = ?2 WHERE id = ?3",
            field.column()
        );
        let affected = self
            .conn()
            .execute(&sql, params![value, to_db_timestamp(Utc::now()), id])?;
        Ok(affected > 0)
    }

    /// Set one flag on every listed project owned by `owner_id`.
    ///
    /// Returns `true` only if every requested id was updated. On `false` the
    /// rows that did belong to the owner have still been changed; nothing is
    /// rolled back. Duplicate ids count once. An empty id list is a no-op that
    /// returns `true`.
    pub fn update_status_bulk(
        &self,
        ids: &[i64],
        field: StatusField,
        value: bool,
        owner_id: i64,
    ) -> Result<bool> {
        let mut unique = ids.to_vec();
        unique.sort_unstable();
        unique.dedup();

        if unique.is_empty() {
            return Ok(true);
        }

        let placeholders = (0..unique.len())
            .map(|i| format!("?{}", i + 4))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE projects SET {} = ?1, updated_at = ?2
             WHERE user_id = ?3 AND id IN ({placeholders})",
            field.column()
        );

        let mut values = vec![
            Value::Integer(i64::from(value)),
            Value::Text(to_db_timestamp(Utc::now())),
            Value::Integer(owner_id),
        ];
        values.extend(unique.iter().map(|id| Value::Integer(*id)));

        let affected = self.conn().execute(&sql, params_from_iter(values.iter()))?;
        let complete = affected == unique.len();

        if complete {
            tracing::debug!(owner_id, %field, value, count = affected, "bulk status update");
        } else {
            tracing::warn!(
                owner_id,
                %field,
                requested = unique.len(),
                affected,
                "bulk status update touched fewer rows than requested"
            );
        }
        Ok(complete)
    }

    // ------------------------------------------------------------------
    // Soft delete / restore
    // ------------------------------------------------------------------

    /// Move a project to the archive. Already archived projects keep their
    /// original `deleted_at`.
    pub fn soft_delete(&self, id: i64) -> Result<bool> {
        self.soft_delete_at(id, Utc::now())
    }

    /// [`Database::soft_delete`] with an explicit deletion time.
    pub fn soft_delete_at(&self, id: i64, at: DateTime<Utc>) -> Result<bool> {
        let ts = to_db_timestamp(at);
        let affected = self.conn().execute(
            "UPDATE projects SET is_deleted = 1, deleted_at = ?1, updated_at = ?1
             WHERE id = ?2 AND is_deleted = 0",
            params![ts, id],
        )?;
        Ok(affected > 0)
    }

    /// Bring an archived project back. Returns `false` if it was not archived.
    pub fn restore(&self, id: i64) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE projects SET is_deleted = 0, deleted_at = NULL, updated_at = ?1
             WHERE id = ?2 AND is_deleted = 1",
            params![to_db_timestamp(Utc::now()), id],
        )?;
        Ok(affected > 0)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Permanently remove a project. Irreversible.
    pub fn hard_delete(&self, id: i64) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM projects WHERE id = ?1", params![id])?;
        if affected > 0 {
            tracing::info!(project_id = id, "permanently deleted project");
        }
        Ok(affected > 0)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn conversion_err<E>(idx: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
}

/// Map a `rusqlite::Row` selected with [`PROJECT_COLUMNS`] to a [`Project`].
pub(crate) fn row_to_project(row: &rusqlite::Row<'_>) -> rusqlite::Result<Project> {
    let canonical_markup: String = row.get::<_, Option<String>>(6)?.unwrap_or_default();
    let payload: Option<String> = row.get(7)?;
    let deleted_str: Option<String> = row.get(12)?;
    let created_str: String = row.get(13)?;
    let updated_str: String = row.get(14)?;

    let floors = decode_floors(payload.as_deref(), &canonical_markup);
    let deleted_at = deleted_str
        .as_deref()
        .map(parse_db_timestamp)
        .transpose()
        .map_err(|e| conversion_err(12, e))?;
    let created_at = parse_db_timestamp(&created_str).map_err(|e| conversion_err(13, e))?;
    let updated_at = parse_db_timestamp(&updated_str).map_err(|e| conversion_err(14, e))?;

    Ok(Project {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        design_code: row.get(4)?,
        rendering_ref: row.get(5)?,
        canonical_markup,
        floors,
        narrative: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
        is_favourite: row.get(9)?,
        is_public: row.get(10)?,
        is_deleted: row.get(11)?,
        deleted_at,
        created_at,
        updated_at,
    })
}
