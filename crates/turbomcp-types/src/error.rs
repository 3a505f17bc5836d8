//! Errors raised while building or projecting the data model.

/// Errors produced while validating or serializing tool schemas and content.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TypesError {
    /// A required input field was missing or empty.
    #[error("missing_required_params: {0}")]
    MissingRequiredParam(String),
}
