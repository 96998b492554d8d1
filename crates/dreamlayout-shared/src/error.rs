use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarkupError {
    #[error("Markup has no <svg> root element")]
    MissingSvgElement,

    #[error("Unterminated <svg> start tag")]
    UnterminatedStartTag,
}
