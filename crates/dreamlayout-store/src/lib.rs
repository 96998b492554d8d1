//! # dreamlayout-store
//!
//! SQLite-backed persistence for DreamLayout users and projects.
//!
//! The crate exposes a synchronous `Database` handle that wraps a
//! `rusqlite::Connection`. Opening a database with [`Database::open_at`] runs
//! the additive schema migrations; [`Database::connect`] opens a short-lived
//! per-request connection against an already migrated file.
//!
//! Project lifecycle operations (create, list, status toggles, soft-delete,
//! restore, purge) live in [`projects`]; the time-based archive purge lives in
//! [`reaper`] and the ownership check in [`access`].

pub mod access;
pub mod database;
pub mod migrations;
pub mod models;
pub mod payload;
pub mod projects;
pub mod reaper;
pub mod users;

mod error;

pub use access::authorize;
pub use database::Database;
pub use error::StoreError;
pub use models::*;
