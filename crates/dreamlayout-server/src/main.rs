//! # dreamlayout-server
//!
//! HTTP API for DreamLayout.
//!
//! This binary provides:
//! - **Layout generation** through the Gemini API, as a preview or saved
//!   straight into a new project
//! - **Project lifecycle** endpoints: listings, favourite/public toggles
//!   (single and bulk), edit, archive, restore, permanent delete
//! - **Account** endpoints: profile view and update, and account deletion
//!   with its projects and mirrored renderings
//! - **Rendering mirror** to Cloudinary, or to a local directory served under
//!   `/assets` when Cloudinary is not configured
//!
//! Authentication happens upstream; requests carry the user id in the
//! `X-User-Id` header.

mod api;
mod asset_store;
mod cloudinary;
mod config;
mod db;
mod error;
mod mirror;
mod service;

use std::sync::Arc;

use anyhow::Context;
use dreamlayout_generator::{GeminiClient, GeminiConfig, LayoutGenerator};
use dreamlayout_shared::constants::APP_NAME;
use dreamlayout_store::Database;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::api::AppState;
use crate::asset_store::LocalAssetStore;
use crate::cloudinary::CloudinaryStorage;
use crate::config::ServerConfig;
use crate::db::Db;
use crate::mirror::{AssetMirror, ObjectStorage};
use crate::service::LayoutService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Environment and tracing (respects RUST_LOG)
    // -----------------------------------------------------------------------
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,dreamlayout_server=debug")),
        )
        .init();

    info!("Starting {APP_NAME} server v{}", env!("CARGO_PKG_VERSION"));
    if let Ok(path) = dotenv {
        info!(path = %path.display(), "Loaded .env");
    }

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems. Schema and model configuration errors are
    //    fatal.
    // -----------------------------------------------------------------------
    let db_path = match &config.db_path {
        Some(path) => path.clone(),
        None => Database::default_path().context("resolving default database path")?,
    };
    let db = Db::open(&db_path).context("opening database")?;
    info!(path = %db.path().display(), "Database ready");

    let model = GeminiClient::new(
        GeminiConfig::new(config.gemini_api_key.clone()).with_model(config.gemini_model.clone()),
    )
    .context("configuring Gemini client")?;
    info!(model = model.model(), "Completion model configured");

    let mut asset_dir = None;
    let storage: Arc<dyn ObjectStorage> = match &config.cloudinary {
        Some(cloudinary) => {
            info!(cloud = %cloudinary.cloud_name, "Mirroring renderings to Cloudinary");
            Arc::new(CloudinaryStorage::new(cloudinary.clone()))
        }
        None => {
            let store =
                LocalAssetStore::new(config.asset_storage_path.clone(), &config.asset_public_url)
                    .await
                    .context("creating local asset directory")?;
            asset_dir = Some(store.base_path().to_path_buf());
            Arc::new(store)
        }
    };

    let service = LayoutService::new(
        db,
        LayoutGenerator::new(Arc::new(model)),
        AssetMirror::new(storage),
        config.dashboard_limit,
        config.public_gallery_limit,
    );

    let app_state = AppState {
        service: Arc::new(service),
        asset_dir,
    };

    // -----------------------------------------------------------------------
    // 4. Run the HTTP API server until Ctrl+C
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, config.http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
