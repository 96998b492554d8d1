//! Domain model structs persisted in the SQLite database.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to the HTTP layer.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use dreamlayout_shared::Floor;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// An account row. Authentication itself happens elsewhere; the store only
/// needs the id and the owner key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    /// Unguessable key used in external-facing paths instead of `id`.
    pub user_key: String,
    pub about: Option<String>,
    pub profile_pic: Option<String>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Editable profile fields. `about` and `location` are replaced as given;
/// a `None` picture keeps the current one.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub about: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub profile_pic: Option<String>,
}

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

/// A saved floor-plan artifact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Project {
    pub id: i64,
    /// Owning user. Never changes after creation.
    pub owner_id: i64,
    pub title: String,
    pub description: String,
    /// Shareable code such as `DL-7K2QX`. `None` only for rows created before
    /// codes existed.
    pub design_code: Option<String>,
    /// URL of the mirrored rendering, if the mirror succeeded.
    pub rendering_ref: Option<String>,
    /// First floor's raw markup, kept for fallback rendering.
    pub canonical_markup: String,
    pub floors: Vec<Floor>,
    /// Model-written design rationale.
    pub narrative: String,
    pub is_favourite: bool,
    pub is_public: bool,
    pub is_deleted: bool,
    /// Set iff `is_deleted`.
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Status flags
// ---------------------------------------------------------------------------

/// The independently toggleable project flags.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StatusField {
    Favourite,
    Public,
}

impl StatusField {
    pub(crate) fn column(self) -> &'static str {
        match self {
            StatusField::Favourite => "is_favourite",
            StatusField::Public => "is_public",
        }
    }
}

impl fmt::Display for StatusField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusField::Favourite => f.write_str("favourite"),
            StatusField::Public => f.write_str("public"),
        }
    }
}

impl FromStr for StatusField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "favourite" | "is_favourite" => Ok(StatusField::Favourite),
            "public" | "is_public" => Ok(StatusField::Public),
            other => Err(format!("unknown status field: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

/// RFC-3339 UTC with fixed microsecond precision, so text order is time order.
pub(crate) fn to_db_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Accepts RFC-3339 and SQLite's `CURRENT_TIMESTAMP` format (legacy rows).
pub(crate) fn parse_db_timestamp(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    match DateTime::parse_from_rfc3339(s) {
        Ok(dt) => Ok(dt.with_timezone(&Utc)),
        Err(_) => NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").map(|n| n.and_utc()),
    }
}
