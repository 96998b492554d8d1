//! # dreamlayout-generator
//!
//! Turns a user's brief into a validated [`LayoutResult`] by asking an
//! external text-completion model for a JSON floor plan.
//!
//! The pipeline is: build the prompt ([`prompt`]), call the model
//! ([`CompletionModel`]), strip an optional Markdown fence ([`fence`]), and
//! validate the untrusted JSON ([`response`]). A response that cannot be
//! turned into a layout is returned as [`Generation::Malformed`] together with
//! the model's raw text instead of being dropped.

pub mod fence;
pub mod gemini;
pub mod generator;
pub mod model;
pub mod prompt;
pub mod response;

mod error;

pub use dreamlayout_shared::LayoutResult;
pub use error::{GeneratorError, Result};
pub use gemini::{GeminiClient, GeminiConfig};
pub use generator::{Generation, LayoutGenerator};
pub use model::CompletionModel;
pub use response::MalformedResponse;
