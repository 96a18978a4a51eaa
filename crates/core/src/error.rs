//! Error types for the core crate
//!
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use crate::variant::ValueType;
use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised by the identity and value layers
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// Text that does not denote an identity value
    #[error("Invalid identity: {0:?}")]
    InvalidIdentity(String),

    /// Variant could not be converted to the requested type
    #[error("Cannot convert {from} to {to}")]
    ConversionFailed {
        /// Type of the value being converted
        from: ValueType,
        /// Requested type
        to: ValueType,
    },

    /// Array variant built from items of different types
    #[error("Array items must share one type, found {expected} and {found}")]
    HeterogeneousArray {
        /// Type of the first item
        expected: ValueType,
        /// Type of the offending item
        found: ValueType,
    },

    /// Unknown value type name
    #[error("Unknown value type: {0:?}")]
    UnknownValueType(String),

    /// Malformed raw encoding of a value
    #[error("Invalid value encoding: {0}")]
    InvalidEncoding(String),
}
