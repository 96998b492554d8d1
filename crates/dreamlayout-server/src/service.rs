//! Project lifecycle and generation operations, independent of HTTP.
//!
//! Every per-project operation goes through the ownership check in the same
//! database call that performs it. Bulk status updates are scoped by owner in
//! SQL instead.

use dreamlayout_generator::response::UNTITLED;
use dreamlayout_generator::{Generation, LayoutGenerator};
use dreamlayout_shared::{GenerationRequest, LayoutResult};
use dreamlayout_store::{ProfileUpdate, Project, StatusField, User};

use crate::db::Db;
use crate::error::ServerError;
use crate::mirror::AssetMirror;

/// Upper bound on any caller-supplied listing limit.
pub const MAX_LIST_LIMIT: u32 = 100;

pub const BULK_OWNERSHIP_MESSAGE: &str = "You do not own all selected items";

pub struct LayoutService {
    db: Db,
    generator: LayoutGenerator,
    mirror: AssetMirror,
    dashboard_limit: u32,
    public_limit: u32,
}

impl LayoutService {
    pub fn new(
        db: Db,
        generator: LayoutGenerator,
        mirror: AssetMirror,
        dashboard_limit: u32,
        public_limit: u32,
    ) -> Self {
        Self {
            db,
            generator,
            mirror,
            dashboard_limit,
            public_limit,
        }
    }

    // ------------------------------------------------------------------
    // Generation
    // ------------------------------------------------------------------

    /// Generate a layout without storing anything.
    pub async fn preview(&self, request: &GenerationRequest) -> Result<LayoutResult, ServerError> {
        validate_request(request)?;
        match self.generator.generate(request).await? {
            Generation::Layout(layout) => Ok(layout),
            Generation::Malformed(malformed) => Err(ServerError::Malformed(malformed)),
        }
    }

    /// Generate a layout and save it as a new project for `owner_id`.
    pub async fn generate_and_save(
        &self,
        owner_id: i64,
        request: &GenerationRequest,
    ) -> Result<Project, ServerError> {
        let layout = self.preview(request).await?;
        self.save_layout(owner_id, layout).await
    }

    /// Save a layout the user previewed earlier.
    ///
    /// The first floor's markup is mirrored before the insert; a failed
    /// mirror only leaves `rendering_ref` empty.
    pub async fn save_layout(
        &self,
        owner_id: i64,
        mut layout: LayoutResult,
    ) -> Result<Project, ServerError> {
        if layout.floors.is_empty() {
            return Err(ServerError::BadRequest(
                "layout has no floors".to_string(),
            ));
        }
        if layout.title.trim().is_empty() {
            layout.title = UNTITLED.to_string();
        }

        let owner = self
            .db
            .call(move |db| {
                let user = db.get_user(owner_id)?;
                db.ensure_user_key(user)
            })
            .await
            .map_err(unknown_user)?;

        let rendering_ref = match layout.primary_markup() {
            Some(markup) => self
                .mirror
                .mirror(markup, &owner.user_key, &layout.title)
                .await
                .into_url(),
            None => None,
        };

        self.db
            .call(move |db| {
                let id = db.create_project(owner_id, &layout, rendering_ref.as_deref())?;
                db.get_project(id)
            })
            .await
    }

    // ------------------------------------------------------------------
    // Listings
    // ------------------------------------------------------------------

    pub async fn list_active(
        &self,
        owner_id: i64,
        limit: Option<u32>,
    ) -> Result<Vec<Project>, ServerError> {
        let limit = clamp_limit(limit, self.dashboard_limit);
        self.db.call(move |db| db.list_active(owner_id, limit)).await
    }

    pub async fn list_favourites(&self, owner_id: i64) -> Result<Vec<Project>, ServerError> {
        self.db.call(move |db| db.list_favourites(owner_id)).await
    }

    pub async fn list_public(&self, limit: Option<u32>) -> Result<Vec<Project>, ServerError> {
        let limit = clamp_limit(limit, self.public_limit);
        self.db.call(move |db| db.list_public(limit)).await
    }

    /// Archived projects of `owner_id`, after purging expired ones.
    pub async fn list_archived(&self, owner_id: i64) -> Result<Vec<Project>, ServerError> {
        self.db.call(move |db| db.list_archived(owner_id)).await
    }

    // ------------------------------------------------------------------
    // Status
    // ------------------------------------------------------------------

    /// Set `field` on every project in `ids`. Fails with
    /// [`ServerError::Forbidden`] when any id is not owned by `owner_id`;
    /// the owned ones have been updated regardless.
    pub async fn update_status_bulk(
        &self,
        owner_id: i64,
        ids: Vec<i64>,
        field: StatusField,
        value: bool,
    ) -> Result<(), ServerError> {
        let complete = self
            .db
            .call(move |db| db.update_status_bulk(&ids, field, value, owner_id))
            .await?;
        if complete {
            Ok(())
        } else {
            Err(ServerError::Forbidden(BULK_OWNERSHIP_MESSAGE.to_string()))
        }
    }

    pub async fn set_status(
        &self,
        owner_id: i64,
        id: i64,
        field: StatusField,
        value: bool,
    ) -> Result<Project, ServerError> {
        self.db
            .call(move |db| {
                db.get_project_for(id, owner_id)?;
                db.update_status(id, field, value)?;
                db.get_project(id)
            })
            .await
    }

    // ------------------------------------------------------------------
    // Per-project operations
    // ------------------------------------------------------------------

    pub async fn view(&self, owner_id: i64, id: i64) -> Result<Project, ServerError> {
        self.db.call(move |db| db.get_project_for(id, owner_id)).await
    }

    pub async fn edit(
        &self,
        owner_id: i64,
        id: i64,
        title: String,
        description: String,
    ) -> Result<Project, ServerError> {
        let title = title.trim().to_string();
        if title.is_empty() {
            return Err(ServerError::BadRequest("title must not be empty".to_string()));
        }

        self.db
            .call(move |db| {
                db.get_project_for(id, owner_id)?;
                db.edit_project(id, &title, description.trim())?;
                db.get_project(id)
            })
            .await
    }

    pub async fn soft_delete(&self, owner_id: i64, id: i64) -> Result<Project, ServerError> {
        self.db
            .call(move |db| {
                db.get_project_for(id, owner_id)?;
                db.soft_delete(id)?;
                db.get_project(id)
            })
            .await
    }

    pub async fn restore(&self, owner_id: i64, id: i64) -> Result<Project, ServerError> {
        self.db
            .call(move |db| {
                db.get_project_for(id, owner_id)?;
                db.restore(id)?;
                db.get_project(id)
            })
            .await
    }

    pub async fn hard_delete(&self, owner_id: i64, id: i64) -> Result<(), ServerError> {
        self.db
            .call(move |db| {
                db.get_project_for(id, owner_id)?;
                db.hard_delete(id)?;
                Ok(())
            })
            .await
    }
}

impl LayoutService {
    // ------------------------------------------------------------------
    // Account
    // ------------------------------------------------------------------

    pub async fn account(&self, owner_id: i64) -> Result<User, ServerError> {
        self.db
            .call(move |db| db.get_user(owner_id))
            .await
            .map_err(unknown_user)
    }

    pub async fn update_profile(
        &self,
        owner_id: i64,
        update: ProfileUpdate,
    ) -> Result<User, ServerError> {
        let update = ProfileUpdate {
            name: update.name.trim().to_string(),
            email: update.email.trim().to_string(),
            about: non_blank(update.about),
            location: non_blank(update.location),
            profile_pic: non_blank(update.profile_pic),
        };
        if update.name.is_empty() {
            return Err(ServerError::BadRequest("name is required".to_string()));
        }
        if update.email.is_empty() {
            return Err(ServerError::BadRequest("email is required".to_string()));
        }

        self.db
            .call(move |db| db.update_user_profile(owner_id, &update))
            .await
            .map_err(unknown_user)
    }

    /// Delete the account and every project it owns, then clear its mirrored
    /// renderings. Returns whether the renderings were purged; a failed purge
    /// leaves orphaned assets but the account is gone regardless.
    pub async fn delete_account(&self, owner_id: i64) -> Result<bool, ServerError> {
        let owner = self
            .db
            .call(move |db| {
                let user = db.get_user(owner_id)?;
                db.delete_user(owner_id)?;
                Ok(user)
            })
            .await
            .map_err(unknown_user)?;

        Ok(self.mirror.purge_owner(&owner.user_key).await)
    }
}

fn unknown_user(e: ServerError) -> ServerError {
    match e {
        ServerError::NotFound => ServerError::Unauthorized("unknown user".to_string()),
        other => other,
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_request(request: &GenerationRequest) -> Result<(), ServerError> {
    if request.venture_type.trim().is_empty() {
        return Err(ServerError::BadRequest("venture_type is required".to_string()));
    }
    if request.target_area.trim().is_empty() {
        return Err(ServerError::BadRequest("target_area is required".to_string()));
    }
    Ok(())
}

fn clamp_limit(requested: Option<u32>, default: u32) -> u32 {
    requested.unwrap_or(default).clamp(1, MAX_LIST_LIMIT)
}
