//! User records. Sign-up, login and password checks belong to the
//! authentication layer; the store keeps the profile, the owner key and the
//! account lifetime.

use chrono::Utc;
use dreamlayout_shared::codes::generate_owner_key;
use rusqlite::params;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{parse_db_timestamp, to_db_timestamp, ProfileUpdate, User};

const USER_COLUMNS: &str =
    "id, name, email, user_key, about, profile_pic, location, created_at";

impl Database {
    /// Insert a user with a freshly generated owner key.
    ///
    /// A duplicate email is reported as [`StoreError::Conflict`].
    pub fn create_user(&self, name: &str, email: &str, password_hash: &str) -> Result<User> {
        let user_key = generate_owner_key();
        let now = Utc::now();

        self.conn()
            .execute(
                "INSERT INTO users (name, email, password_hash, user_key, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![name, email, password_hash, user_key, to_db_timestamp(now)],
            )
            .map_err(StoreError::from_write)?;

        let id = self.conn().last_insert_rowid();
        tracing::debug!(user_id = id, "created user");
        self.get_user(id)
    }

    pub fn get_user(&self, id: i64) -> Result<User> {
        self.conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                row_to_user,
            )
            .map_err(StoreError::from_read)
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<User> {
        self.conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                params![email],
                row_to_user,
            )
            .map_err(StoreError::from_read)
    }

    /// Give `user` an owner key if its row predates them or lost its key.
    pub fn ensure_user_key(&self, user: User) -> Result<User> {
        if !user.user_key.is_empty() {
            return Ok(user);
        }
        let key = generate_owner_key();
        self.conn()
            .execute(
                "UPDATE users SET user_key = ?1
                 WHERE id = ?2 AND (user_key IS NULL OR user_key = '')",
                params![key, user.id],
            )
            .map_err(StoreError::from_write)?;
        tracing::info!(user_id = user.id, "assigned missing owner key");
        self.get_user(user.id)
    }

    /// Replace the profile fields of `user_id`.
    ///
    /// A duplicate email is reported as [`StoreError::Conflict`].
    pub fn update_user_profile(&self, user_id: i64, update: &ProfileUpdate) -> Result<User> {
        let affected = self
            .conn()
            .execute(
                "UPDATE users
                 SET name = ?1, email = ?2, about = ?3, location = ?4,
                     profile_pic = COALESCE(?5, profile_pic)
                 WHERE id = ?6",
                params![
                    update.name,
                    update.email,
                    update.about,
                    update.location,
                    update.profile_pic,
                    user_id
                ],
            )
            .map_err(StoreError::from_write)?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        tracing::debug!(user_id, "updated profile");
        self.get_user(user_id)
    }

    /// Delete a user. Their projects go with them through the cascading
    /// foreign key. Returns `false` when no such user exists.
    pub fn delete_user(&self, user_id: i64) -> Result<bool> {
        let projects: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM projects WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        let affected = self
            .conn()
            .execute("DELETE FROM users WHERE id = ?1", params![user_id])?;
        if affected > 0 {
            tracing::info!(user_id, projects, "deleted user and their projects");
        }
        Ok(affected > 0)
    }
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let created_str: String = row.get(7)?;
    let created_at = parse_db_timestamp(&created_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        user_key: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        about: row.get(4)?,
        profile_pic: row.get(5)?,
        location: row.get(6)?,
        created_at,
    })
}
