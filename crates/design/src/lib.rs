//! Versioned object graph for Trellis
//!
//! This crate implements the snapshot/frame model:
//! - ObjectSnapshot: One immutable version of one object
//! - Structure: Relational role (unstructured, node, edge, ordered set)
//! - TransientFrame: Mutable staging frame borrowing its design
//! - StableFrame: Immutable, structurally validated frame
//! - Design: Registry of frames, snapshots, history and named frames
//! - Validation: Structural integrity checks shared by all frames

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod design;
pub mod error;
pub mod frame;
pub mod snapshot;
pub mod validation;

pub use design::Design;
pub use error::{DesignError, FrameValidationError, Result, StructuralIntegrityError};
pub use frame::{FrameView, StableFrame, TransientFrame};
pub use snapshot::{ObjectSnapshot, Structure};
pub use validation::{
    validate_acyclic, validate_hierarchy, validate_references, validate_structure, IntegrityReport,
};
