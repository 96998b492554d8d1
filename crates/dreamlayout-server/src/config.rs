//! Server configuration loaded from environment variables.
//!
//! Everything except the model API key has a default so the server starts
//! with almost no configuration for local development. A `.env` file in the
//! working directory is loaded first when present.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

use dreamlayout_generator::gemini::DEFAULT_MODEL;
use dreamlayout_shared::constants::{DEFAULT_DASHBOARD_LIMIT, DEFAULT_PUBLIC_LIMIT};

/// Cloudinary credentials. All three must be set for the mirror to use
/// Cloudinary instead of the local asset directory.
#[derive(Clone, PartialEq, Eq)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

impl fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// SQLite database file.
    /// Env: `DB_PATH`
    /// Default: the platform data directory (see `Database::default_path`).
    pub db_path: Option<PathBuf>,

    /// Env: `GEMINI_API_KEY`. Required; startup fails without it.
    pub gemini_api_key: String,

    /// Env: `GEMINI_MODEL`
    /// Default: `gemini-2.5-flash`
    pub gemini_model: String,

    /// Directory for mirrored renderings when Cloudinary is not configured.
    /// Env: `ASSET_STORAGE_PATH`
    /// Default: `./assets`
    pub asset_storage_path: PathBuf,

    /// Public URL prefix under which `asset_storage_path` is served.
    /// Env: `ASSET_PUBLIC_URL`
    /// Default: `http://localhost:8080/assets`
    pub asset_public_url: String,

    /// Env: `CLOUDINARY_CLOUD_NAME`, `CLOUDINARY_API_KEY`, `CLOUDINARY_API_SECRET`
    pub cloudinary: Option<CloudinaryConfig>,

    /// Number of projects on the dashboard.
    /// Env: `DASHBOARD_LIMIT`
    /// Default: `6`
    pub dashboard_limit: u32,

    /// Number of projects in the public gallery.
    /// Env: `PUBLIC_GALLERY_LIMIT`
    /// Default: `24`
    pub public_gallery_limit: u32,
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("http_addr", &self.http_addr)
            .field("db_path", &self.db_path)
            .field("gemini_api_key", &if self.gemini_api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("gemini_model", &self.gemini_model)
            .field("asset_storage_path", &self.asset_storage_path)
            .field("asset_public_url", &self.asset_public_url)
            .field("cloudinary", &self.cloudinary)
            .field("dashboard_limit", &self.dashboard_limit)
            .field("public_gallery_limit", &self.public_gallery_limit)
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], 8080).into(),
            db_path: None,
            gemini_api_key: String::new(),
            gemini_model: DEFAULT_MODEL.to_string(),
            asset_storage_path: PathBuf::from("./assets"),
            asset_public_url: "http://localhost:8080/assets".to_string(),
            cloudinary: None,
            dashboard_limit: DEFAULT_DASHBOARD_LIMIT,
            public_gallery_limit: DEFAULT_PUBLIC_LIMIT,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(addr) = var("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Some(path) = var("DB_PATH") {
            config.db_path = Some(PathBuf::from(path));
        }

        if let Some(key) = var("GEMINI_API_KEY") {
            config.gemini_api_key = key;
        }

        if let Some(model) = var("GEMINI_MODEL") {
            config.gemini_model = model;
        }

        if let Some(path) = var("ASSET_STORAGE_PATH") {
            config.asset_storage_path = PathBuf::from(path);
        }

        if let Some(url) = var("ASSET_PUBLIC_URL") {
            config.asset_public_url = url.trim_end_matches('/').to_string();
        }

        match (
            var("CLOUDINARY_CLOUD_NAME"),
            var("CLOUDINARY_API_KEY"),
            var("CLOUDINARY_API_SECRET"),
        ) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => {
                config.cloudinary = Some(CloudinaryConfig {
                    cloud_name,
                    api_key,
                    api_secret,
                });
            }
            (None, None, None) => {}
            _ => tracing::warn!(
                "Incomplete Cloudinary credentials, falling back to local asset storage"
            ),
        }

        if let Some(val) = var("DASHBOARD_LIMIT") {
            match val.parse::<u32>() {
                Ok(n) if n > 0 => config.dashboard_limit = n,
                _ => tracing::warn!(value = %val, "Invalid DASHBOARD_LIMIT, using default"),
            }
        }

        if let Some(val) = var("PUBLIC_GALLERY_LIMIT") {
            match val.parse::<u32>() {
                Ok(n) if n > 0 => config.public_gallery_limit = n,
                _ => tracing::warn!(value = %val, "Invalid PUBLIC_GALLERY_LIMIT, using default"),
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter.

        config
    }
}
