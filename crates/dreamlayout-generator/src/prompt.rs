//! The instruction sent to the model.
//!
//! The boundary points are embedded as raw JSON data; rectifying the sketch
//! is the model's job. The labeling rules under "SVG STYLING & LABELING" are
//! a readability contract with the renderer and must stay word for word.

use dreamlayout_shared::constants::{CANVAS_HEIGHT, CANVAS_WIDTH};
use dreamlayout_shared::GenerationRequest;

/// Numbered-badge labeling rules for the per-floor SVG.
pub const LABELING_RULES: &str = "\
   - LABEL CLARITY & NUMBERING:
     * Do NOT place long text names inside rooms as they often overlap.
     * Instead, assign a unique NUMBER (1, 2, 3...) to each room.
     * Place a small circle with the number inside it at the center of the room.
     * If the room is too small, place a dot in the room and draw a thin leader line (line) to the number placed just outside the room outline.
     * Ensure numbers are bold and legible (font-size: 14px).";

/// JSON shape the model must answer with.
pub const RESPONSE_SCHEMA: &str = r#"{
    "title": "Professional Project Name",
    "description": "Architectural summary",
    "conversational_response": "A friendly confirmation followed by expert architectural advice and a numbered legend of components.",
    "floors": [
        {
            "floor_name": "e.g., Ground Floor",
            "rooms": [
                {"id": 1, "name": "Room Name", "size": "e.g., 12' x 15'", "position": "Description of location"}
            ],
            "svg": "<svg ...>...</svg>"
        }
    ]
}"#;

/// Render the full instruction for one generation request.
pub fn build_prompt(request: &GenerationRequest) -> String {
    let venture_type = request.venture_type.trim();
    let area = request.target_area.trim();
    let outline =
        serde_json::to_string(&request.boundary_points).unwrap_or_else(|_| "[]".to_string());
    let user_prompt = request.user_prompt.trim();

    format!(
        "You are an expert architect and interior designer.
Design a functional, professional and aesthetic layout for a {venture_type} with an area of {area}.

SITE OUTLINE (rough hand-drawn sketch, sequential (x, y) points on a {CANVAS_WIDTH}x{CANVAS_HEIGHT} canvas):
{outline}

INSTRUCTIONS:
1. RECTIFY THE SHAPE: treat the points as a rough sketch. Turn them into a clean polygon with straight edges, preferring orthogonal 90-degree corners unless the sketch clearly implies a diagonal. This rectified shape is the outer boundary of the design.
2. ROOM PLANNING: distribute rooms logically inside the rectified boundary for a {venture_type} of {area}, with efficient circulation.
3. FLOORS: if the requirements imply more than one floor, provide a separate layout, room list and SVG for EACH floor.
4. AREA ANALYSIS: state whether {area} is sufficient for a {venture_type} with these requirements.
5. CONVERSATIONAL RESPONSE:
   - Open with a friendly confirmation that the layout was created.
   - Summarise the design decisions and whether the area is sufficient.
   - Include a CLEAR LEGEND mapping every room number used in the SVG to its name and dimensions, e.g.
     1. Master Bedroom: 15'x12'
     2. Modular Kitchen: 10'x12'
6. SVG STYLING & LABELING (CRITICAL FOR READABILITY):
   - Use thick, dark lines (2px or 3px) for outer and internal walls.
   - Use light pastel fills per room type.
{LABELING_RULES}
   - Use subtle 1px dashed lines for furniture or area suggestions.
   - Set the viewBox to show the entire rectified layout with 50px padding.

User's specific requirements: {user_prompt}

Answer with a single JSON document in exactly this format and nothing else:
{RESPONSE_SCHEMA}
"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use dreamlayout_shared::Point;

    fn request() -> GenerationRequest {
        GenerationRequest {
            venture_type: "cafe".into(),
            target_area: "800 sqft".into(),
            boundary_points: vec![
                Point::new(100.0, 50.0),
                Point::new(700.0, 52.0),
                Point::new(698.0, 350.0),
                Point::new(101.0, 349.0),
            ],
            user_prompt: "two floors with a rooftop seating area".into(),
        }
    }

    #[test]
    fn test_prompt_embeds_inputs() {
        let prompt = build_prompt(&request());
        assert!(prompt.contains("layout for a cafe with an area of 800 sqft"));
        assert!(prompt.contains(r#"[{"x":100.0,"y":50.0},{"x":700.0,"y":52.0}"#));
        assert!(prompt.contains("two floors with a rooftop seating area"));
        assert!(prompt.contains("800x400 canvas"));
    }

    #[test]
    fn test_prompt_keeps_labeling_contract() {
        let prompt = build_prompt(&request());
        assert!(prompt.contains(LABELING_RULES));
        assert!(prompt.contains("leader line"));
        assert!(prompt.contains("CLEAR LEGEND"));
        assert!(prompt.contains("RECTIFY THE SHAPE"));
        assert!(prompt.contains("is sufficient"));
    }

    #[test]
    fn test_prompt_carries_schema() {
        let prompt = build_prompt(&request());
        assert!(prompt.contains(r#""floors": ["#));
        assert!(prompt.contains(r#""conversational_response""#));
    }
}
