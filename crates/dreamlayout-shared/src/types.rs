use serde::{Deserialize, Serialize};

/// A single vertex of the user-sketched site outline, in canvas pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Everything the user supplies for one generation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationRequest {
    /// Kind of venture the layout is for, e.g. "cafe" or "2BHK apartment".
    pub venture_type: String,
    /// Free-form target area, e.g. "800 sqft".
    pub target_area: String,
    /// Rough site outline in drawing order. Not assumed closed, convex or
    /// orthogonal.
    #[serde(default)]
    pub boundary_points: Vec<Point>,
    /// Free-text brief.
    #[serde(default)]
    pub user_prompt: String,
}

/// One room on a floor, as listed in the model's legend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Room {
    /// Legend number drawn in the room's badge, when the model supplied one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    pub name: String,
    pub size: String,
    pub position: String,
}

/// One floor of a layout: its rooms and its own vector rendering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Floor {
    pub floor_name: String,
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub svg: String,
}

/// A validated layout document ready to be previewed or saved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LayoutResult {
    pub title: String,
    pub description: String,
    /// The model's design rationale and numbered room legend.
    pub conversational_response: String,
    pub floors: Vec<Floor>,
    /// Set when a previewed layout already carries a code; otherwise the store
    /// assigns one on save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design_code: Option<String>,
}

impl LayoutResult {
    /// Markup of the first floor, used for thumbnails and fallback rendering.
    pub fn primary_markup(&self) -> Option<&str> {
        self.floors
            .first()
            .map(|floor| floor.svg.as_str())
            .filter(|svg| !svg.trim().is_empty())
    }
}
