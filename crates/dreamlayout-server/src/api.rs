use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Path, Query, State},
    http::{request::Parts, Method, StatusCode},
    routing::{get, post},
    Json, Router,
};
use dreamlayout_shared::{GenerationRequest, LayoutResult};
use dreamlayout_store::{ProfileUpdate, Project, StatusField, User};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::ServerError;
use crate::service::LayoutService;

/// Header carrying the authenticated user id, set by the upstream
/// authenticator.
pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<LayoutService>,
    /// Directory served under `/assets` for locally mirrored renderings.
    pub asset_dir: Option<PathBuf>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    let mut router = Router::new()
        .route("/health", get(health_check))
        .route("/layouts/preview", post(preview_layout))
        .route("/layouts/generate", post(generate_layout))
        .route("/projects", post(save_project).get(list_projects))
        .route("/projects/favourites", get(list_favourites))
        .route("/projects/public", get(list_public))
        .route("/projects/archived", get(list_archived))
        .route("/projects/status", post(bulk_status))
        .route(
            "/projects/:id",
            get(view_project).patch(edit_project).delete(purge_project),
        )
        .route("/projects/:id/status", post(set_status))
        .route("/projects/:id/delete", post(archive_project))
        .route("/projects/:id/restore", post(restore_project))
        .route(
            "/account",
            get(view_account).patch(update_account).delete(delete_account),
        );

    if let Some(dir) = &state.asset_dir {
        router = router.nest_service("/assets", ServeDir::new(dir));
    }

    router
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// The requesting user, taken from [`USER_ID_HEADER`].
#[derive(Debug, Clone, Copy)]
pub struct Requester(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for Requester
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| ServerError::Unauthorized("missing user id".to_string()))?;
        value
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|id| *id > 0)
            .map(Requester)
            .ok_or_else(|| ServerError::Unauthorized("invalid user id".to_string()))
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Deserialize)]
struct LimitQuery {
    limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct BulkStatusRequest {
    ids: Vec<i64>,
    field: StatusField,
    value: bool,
}

#[derive(Debug, Deserialize)]
struct StatusRequest {
    field: StatusField,
    value: bool,
}

#[derive(Debug, Deserialize)]
struct EditRequest {
    title: String,
    #[serde(default)]
    description: String,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn preview_layout(
    State(state): State<AppState>,
    _requester: Requester,
    Json(request): Json<GenerationRequest>,
) -> Result<Json<LayoutResult>, ServerError> {
    let layout = state.service.preview(&request).await?;
    Ok(Json(layout))
}

async fn generate_layout(
    State(state): State<AppState>,
    Requester(user_id): Requester,
    Json(request): Json<GenerationRequest>,
) -> Result<(StatusCode, Json<Project>), ServerError> {
    let project = state.service.generate_and_save(user_id, &request).await?;
    info!(project_id = project.id, user_id, "generated and saved layout");
    Ok((StatusCode::CREATED, Json(project)))
}

async fn save_project(
    State(state): State<AppState>,
    Requester(user_id): Requester,
    Json(layout): Json<LayoutResult>,
) -> Result<(StatusCode, Json<Project>), ServerError> {
    let project = state.service.save_layout(user_id, layout).await?;
    info!(project_id = project.id, user_id, "saved previewed layout");
    Ok((StatusCode::CREATED, Json(project)))
}

async fn list_projects(
    State(state): State<AppState>,
    Requester(user_id): Requester,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<Project>>, ServerError> {
    Ok(Json(state.service.list_active(user_id, query.limit).await?))
}

async fn list_favourites(
    State(state): State<AppState>,
    Requester(user_id): Requester,
) -> Result<Json<Vec<Project>>, ServerError> {
    Ok(Json(state.service.list_favourites(user_id).await?))
}

async fn list_public(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<Project>>, ServerError> {
    Ok(Json(state.service.list_public(query.limit).await?))
}

async fn list_archived(
    State(state): State<AppState>,
    Requester(user_id): Requester,
) -> Result<Json<Vec<Project>>, ServerError> {
    Ok(Json(state.service.list_archived(user_id).await?))
}

async fn bulk_status(
    State(state): State<AppState>,
    Requester(user_id): Requester,
    Json(req): Json<BulkStatusRequest>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let count = req.ids.len();
    state
        .service
        .update_status_bulk(user_id, req.ids, req.field, req.value)
        .await?;
    Ok(Json(serde_json::json!({ "updated": count })))
}

async fn view_project(
    State(state): State<AppState>,
    Requester(user_id): Requester,
    Path(id): Path<i64>,
) -> Result<Json<Project>, ServerError> {
    Ok(Json(state.service.view(user_id, id).await?))
}

async fn edit_project(
    State(state): State<AppState>,
    Requester(user_id): Requester,
    Path(id): Path<i64>,
    Json(req): Json<EditRequest>,
) -> Result<Json<Project>, ServerError> {
    let project = state
        .service
        .edit(user_id, id, req.title, req.description)
        .await?;
    Ok(Json(project))
}

async fn set_status(
    State(state): State<AppState>,
    Requester(user_id): Requester,
    Path(id): Path<i64>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<Project>, ServerError> {
    let project = state
        .service
        .set_status(user_id, id, req.field, req.value)
        .await?;
    Ok(Json(project))
}

async fn archive_project(
    State(state): State<AppState>,
    Requester(user_id): Requester,
    Path(id): Path<i64>,
) -> Result<Json<Project>, ServerError> {
    let project = state.service.soft_delete(user_id, id).await?;
    info!(project_id = id, user_id, "project archived");
    Ok(Json(project))
}

async fn restore_project(
    State(state): State<AppState>,
    Requester(user_id): Requester,
    Path(id): Path<i64>,
) -> Result<Json<Project>, ServerError> {
    let project = state.service.restore(user_id, id).await?;
    info!(project_id = id, user_id, "project restored");
    Ok(Json(project))
}

async fn purge_project(
    State(state): State<AppState>,
    Requester(user_id): Requester,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ServerError> {
    state.service.hard_delete(user_id, id).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

async fn view_account(
    State(state): State<AppState>,
    Requester(user_id): Requester,
) -> Result<Json<User>, ServerError> {
    Ok(Json(state.service.account(user_id).await?))
}

async fn update_account(
    State(state): State<AppState>,
    Requester(user_id): Requester,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<User>, ServerError> {
    Ok(Json(state.service.update_profile(user_id, update).await?))
}

async fn delete_account(
    State(state): State<AppState>,
    Requester(user_id): Requester,
) -> Result<Json<serde_json::Value>, ServerError> {
    let renderings_purged = state.service.delete_account(user_id).await?;
    info!(user_id, renderings_purged, "account deleted");
    Ok(Json(serde_json::json!({
        "deleted": true,
        "renderings_purged": renderings_purged,
    })))
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
