//! Error types for the design layer

use thiserror::Error;
use trellis_core::{FrameId, ObjectId, SnapshotId, StructuralType};

/// Result type alias for design operations
pub type Result<T> = std::result::Result<T, DesignError>;

/// A single structural-integrity violation found in a frame
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralIntegrityError {
    /// Edge endpoint, ordered-set owner or item not present in the frame
    #[error("Object {object} references {reference}, which is not in the frame")]
    BrokenReference {
        /// Object holding the reference
        object: ObjectId,
        /// Missing referenced object
        reference: ObjectId,
    },

    /// Edge endpoint present but not a node
    #[error("Edge {edge} endpoint {endpoint} is not a node")]
    EdgeEndpointNotNode {
        /// The edge
        edge: ObjectId,
        /// Endpoint that is not node-typed
        endpoint: ObjectId,
    },

    /// Parent not present in the frame
    #[error("Object {object} has parent {parent}, which is not in the frame")]
    MissingParent {
        /// Child object
        object: ObjectId,
        /// Missing parent
        parent: ObjectId,
    },

    /// Child list and parent pointer disagree
    #[error("Children of {parent} disagree with parent of {child}")]
    ChildrenMismatch {
        /// Parent whose child list is inconsistent
        parent: ObjectId,
        /// Child involved in the disagreement
        child: ObjectId,
    },

    /// Parent chain returns to the object
    #[error("Parent chain of {object} forms a cycle")]
    ParentCycle {
        /// Object on the cycle
        object: ObjectId,
    },
}

impl StructuralIntegrityError {
    /// Object the violation is reported on
    pub fn object(&self) -> ObjectId {
        match self {
            StructuralIntegrityError::BrokenReference { object, .. }
            | StructuralIntegrityError::MissingParent { object, .. }
            | StructuralIntegrityError::ParentCycle { object } => *object,
            StructuralIntegrityError::EdgeEndpointNotNode { edge, .. } => *edge,
            StructuralIntegrityError::ChildrenMismatch { parent, .. } => *parent,
        }
    }
}

/// Errors raised when a frame cannot become stable
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameValidationError {
    /// Two snapshots of the same object in one frame
    #[error("Object {0} appears more than once in the frame")]
    DuplicateObject(ObjectId),

    /// Structural integrity violations
    #[error(
        "Frame violates structural integrity ({} violation(s)), first: {}",
        .0.len(),
        .0.first().map(ToString::to_string).unwrap_or_default()
    )]
    BrokenStructure(Vec<StructuralIntegrityError>),
}

/// Errors raised by design and frame operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DesignError {
    /// Structure kind does not match the object type
    #[error("Structural type mismatch: type requires {expected}, got {found}")]
    StructuralTypeMismatch {
        /// Structural type required by the object type
        expected: StructuralType,
        /// Structural type supplied
        found: StructuralType,
    },

    /// Frame not present in the design
    #[error("Unknown frame {0}")]
    UnknownFrame(FrameId),

    /// Object not present in the frame
    #[error("Unknown object {0}")]
    UnknownObject(ObjectId),

    /// Snapshot not retained by the design
    #[error("Unknown snapshot {0}")]
    UnknownSnapshot(SnapshotId),

    /// Object already present in the frame
    #[error("Object {0} is already in the frame")]
    DuplicateObject(ObjectId),

    /// History is non-empty but no current frame is set
    #[error("Undo or redo history requires a current frame")]
    MissingCurrentFrame,

    /// Frame cannot be removed while it is the current frame
    #[error("Frame {0} is the current frame")]
    FrameInUse(FrameId),

    /// Setting the parent would make an object its own ancestor
    #[error("Object {0} cannot become a descendant of itself")]
    ParentCycle(ObjectId),

    /// Frame failed validation
    #[error(transparent)]
    Validation(#[from] FrameValidationError),
}
