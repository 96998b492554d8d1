use std::sync::Arc;

use dreamlayout_shared::{GenerationRequest, LayoutResult};

use crate::error::Result;
use crate::model::CompletionModel;
use crate::prompt::build_prompt;
use crate::response::{parse_layout, MalformedResponse};

/// Outcome of a generation call that reached the model.
#[derive(Debug, Clone, PartialEq)]
pub enum Generation {
    Layout(LayoutResult),
    /// The model answered, but not with a usable layout.
    Malformed(MalformedResponse),
}

impl Generation {
    pub fn layout(&self) -> Option<&LayoutResult> {
        match self {
            Generation::Layout(layout) => Some(layout),
            Generation::Malformed(_) => None,
        }
    }
}

/// Drives one request through prompt, model and validation.
#[derive(Clone)]
pub struct LayoutGenerator {
    model: Arc<dyn CompletionModel>,
}

impl LayoutGenerator {
    pub fn new(model: Arc<dyn CompletionModel>) -> Self {
        Self { model }
    }

    /// Ask the model for a layout.
    ///
    /// Transport and API failures are errors. An answer that is not layout
    /// JSON is [`Generation::Malformed`] and carries the raw text.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<Generation> {
        let prompt = build_prompt(request);
        let raw = self.model.complete(&prompt).await?;

        match parse_layout(&raw) {
            Ok(layout) => {
                tracing::info!(
                    venture_type = %request.venture_type,
                    floors = layout.floors.len(),
                    "layout generated"
                );
                Ok(Generation::Layout(layout))
            }
            Err(malformed) => {
                tracing::warn!(reason = %malformed.reason, raw_len = raw.len(), "model answer rejected");
                Ok(Generation::Malformed(malformed))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeneratorError;
    use async_trait::async_trait;
    use dreamlayout_shared::Point;
    use std::sync::Mutex;

    /// Replays a canned answer and records the prompt it was given.
    struct ScriptedModel {
        answer: std::result::Result<String, u16>,
        seen: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn answering(answer: &str) -> Arc<Self> {
            Arc::new(Self {
                answer: Ok(answer.to_string()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn failing(status: u16) -> Arc<Self> {
            Arc::new(Self {
                answer: Err(status),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CompletionModel for ScriptedModel {
        async fn complete(&self, prompt: &str) -> Result<String> {
            self.seen.lock().unwrap().push(prompt.to_string());
            match &self.answer {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(GeneratorError::Api {
                    status: *status,
                    message: "unavailable".into(),
                }),
            }
        }
    }

    fn cafe_request() -> GenerationRequest {
        GenerationRequest {
            venture_type: "cafe".into(),
            target_area: "800 sqft".into(),
            boundary_points: vec![
                Point::new(100.0, 50.0),
                Point::new(700.0, 50.0),
                Point::new(700.0, 350.0),
                Point::new(100.0, 350.0),
            ],
            user_prompt: "two floors".into(),
        }
    }

    const CAFE_ANSWER: &str = r#"Here is your design.
```json
{
  "title": "Two Storey Cafe",
  "description": "Counter and kitchen below, seating above.",
  "conversational_response": "Your cafe layout is ready! 800 sqft is tight but workable.\n1. Counter: 12'x8'\n2. Kitchen: 10'x10'\n3. Seating: 25'x20'",
  "floors": [
    {"floor_name": "Ground Floor",
     "rooms": [{"id": 1, "name": "Counter", "size": "12' x 8'", "position": "front"},
               {"id": 2, "name": "Kitchen", "size": "10' x 10'", "position": "rear"}],
     "svg": "<svg viewBox=\"0 0 700 400\"><circle cx=\"10\" cy=\"10\" r=\"8\"/></svg>"},
    {"floor_name": "First Floor",
     "rooms": [{"id": 3, "name": "Seating", "size": "25' x 20'", "position": "whole floor"}],
     "svg": "<svg viewBox=\"0 0 700 400\"></svg>"}
  ]
}
```"#;

    #[tokio::test]
    async fn test_cafe_request_yields_two_floors() {
        let model = ScriptedModel::answering(CAFE_ANSWER);
        let generator = LayoutGenerator::new(model.clone());

        let generation = generator.generate(&cafe_request()).await.unwrap();
        let layout = generation.layout().expect("layout");
        assert!(layout.floors.len() >= 2);
        assert_eq!(layout.title, "Two Storey Cafe");
        assert!(layout.floors.iter().all(|f| f.svg.contains("xmlns=")));

        let prompts = model.seen.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("cafe with an area of 800 sqft"));
        assert!(prompts[0].contains("two floors"));
    }

    #[tokio::test]
    async fn test_malformed_answer_keeps_raw_text() {
        let answer = "```json\n{\"title\": \"Cut off\", \"floors\": [";
        let generator = LayoutGenerator::new(ScriptedModel::answering(answer));

        match generator.generate(&cafe_request()).await.unwrap() {
            Generation::Malformed(m) => assert_eq!(m.raw, answer),
            other => panic!("expected malformed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_model_failure_is_an_error() {
        let generator = LayoutGenerator::new(ScriptedModel::failing(503));
        let err = generator.generate(&cafe_request()).await.unwrap_err();
        assert!(err.is_upstream());
        assert!(matches!(err, GeneratorError::Api { status: 503, .. }));
    }
}
