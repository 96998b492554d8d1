//! # dreamlayout-shared
//!
//! Value types and helpers shared by the store, the generator and the server:
//! the layout document produced by the model, design-code and owner-key
//! generation, and SVG markup normalization.

pub mod codes;
pub mod constants;
pub mod error;
pub mod markup;
pub mod types;

pub use error::MarkupError;
pub use types::*;
