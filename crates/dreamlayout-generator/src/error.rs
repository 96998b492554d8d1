use thiserror::Error;

/// Errors from the generation pipeline.
///
/// A response that is not valid layout JSON is not an error; see
/// [`Generation::Malformed`](crate::Generation::Malformed).
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// Missing or invalid model credentials/settings. Raised when the client
    /// is built, never per call.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Network request failed.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The model API answered with an error status.
    #[error("Model API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The model API answered successfully but produced no text.
    #[error("Model returned no content: {0}")]
    EmptyCompletion(String),
}

impl GeneratorError {
    /// Whether the failure came from the remote model rather than local setup.
    pub fn is_upstream(&self) -> bool {
        !matches!(self, GeneratorError::Configuration(_))
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GeneratorError>;
