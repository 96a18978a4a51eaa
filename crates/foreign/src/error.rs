//! Error types for the raw document layer

use thiserror::Error;

/// Result type alias for raw document operations
pub type Result<T> = std::result::Result<T, ForeignError>;

/// Errors raised while encoding or decoding a raw design document
#[derive(Debug, Error)]
pub enum ForeignError {
    /// Malformed JSON or a field of the wrong shape
    ///
    /// The message carries the line and column reported by the parser.
    #[error("Invalid design document: {0}")]
    Json(#[from] serde_json::Error),
}
