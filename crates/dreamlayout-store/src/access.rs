//! Ownership checks for per-project operations.
//!
//! A project that does not exist and a project owned by someone else look the
//! same to the caller, so the existence of other users' projects never leaks.

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::Project;

/// Whether `requester_id` may view or change `project`.
pub fn authorize(project: &Project, requester_id: i64) -> bool {
    project.owner_id == requester_id
}

impl Database {
    /// Fetch a project on behalf of `requester_id`.
    ///
    /// Fails with [`StoreError::NotFound`] when the id has no row and with
    /// [`StoreError::AccessDenied`] when it belongs to another user; the HTTP
    /// layer reports both the same way.
    pub fn get_project_for(&self, id: i64, requester_id: i64) -> Result<Project> {
        let project = self.get_project(id)?;
        if !authorize(&project, requester_id) {
            tracing::debug!(project_id = id, requester_id, "ownership check failed");
            return Err(StoreError::AccessDenied);
        }
        Ok(project)
    }
}
