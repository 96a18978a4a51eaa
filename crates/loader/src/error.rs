//! Error types for loading and configuration
//!
//! Loader errors fall into two groups:
//! - item errors: one raw item is wrong; carry the collection and index
//!   of that item ([`DesignLoaderError::Item`])
//! - design-level errors: the document as a whole is inconsistent

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use trellis_core::{EntityId, IdKind, ObjectId, SnapshotId, StructuralType};
use trellis_design::StructuralIntegrityError;
use trellis_foreign::RawId;

/// Result type alias for loader operations
pub type Result<T> = std::result::Result<T, DesignLoaderError>;

/// Collection of the raw document an item belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawCollection {
    /// `snapshots[]`
    Snapshots,
    /// `frames[]`
    Frames,
    /// `user_references[]`
    UserReferences,
    /// `user_lists[]`
    UserLists,
    /// `system_references[]`
    SystemReferences,
    /// `system_lists[]`
    SystemLists,
}

impl RawCollection {
    /// Field name in the raw document
    pub fn as_str(&self) -> &'static str {
        match self {
            RawCollection::Snapshots => "snapshots",
            RawCollection::Frames => "frames",
            RawCollection::UserReferences => "user_references",
            RawCollection::UserLists => "user_lists",
            RawCollection::SystemReferences => "system_references",
            RawCollection::SystemLists => "system_lists",
        }
    }
}

impl fmt::Display for RawCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What is wrong with a single raw item
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemError {
    /// Entity kind tag is not `object`, `snapshot` or `frame`
    #[error("unknown entity type '{0}'")]
    UnknownEntityType(String),

    /// Identity is reserved by another in-flight operation
    #[error("identity {0} is reserved by another operation")]
    ReservationConflict(EntityId),

    /// Identity is already used by an entity of the same kind
    #[error("duplicate identity {0}")]
    DuplicateId(EntityId),

    /// Reference does not resolve within the batch
    #[error("unknown identity {0}")]
    UnknownId(RawId),

    /// Same raw identity given to two items of the batch
    #[error("duplicate identity {0} in the document")]
    DuplicateForeignId(RawId),

    /// Identity is bound to another kind
    #[error("identity {id} belongs to kind {found}, expected {expected}")]
    IdTypeMismatch {
        /// Offending identity
        id: RawId,
        /// Kind required here
        expected: IdKind,
        /// Kind the identity is bound to
        found: IdKind,
    },

    /// Empty object type name
    #[error("missing object type")]
    MissingObjectType,

    /// Object type not in the metamodel
    #[error("unknown object type '{0}'")]
    UnknownObjectType(String),

    /// Unknown structure kind or wrong number of structural references
    #[error("invalid structure: {0}")]
    InvalidStructuralType(String),

    /// Structure kind differs from the object type's
    #[error("structural type mismatch: type requires {expected}, got {found}")]
    StructuralTypeMismatch {
        /// Structural type of the object type
        expected: StructuralType,
        /// Structural type declared by the item
        found: StructuralType,
    },

    /// Frame entry that names no snapshot of the batch
    #[error("unknown snapshot {id} at position {position}")]
    UnknownSnapshotId {
        /// Offending entry
        id: RawId,
        /// Position within the frame's snapshot list
        position: usize,
    },

    /// Two versions of one object in one frame
    #[error("object {0} appears more than once")]
    DuplicateObject(ObjectId),

    /// Assembled frame failed structural validation
    #[error("broken structural integrity: {}", .0.first().map(ToString::to_string).unwrap_or_default())]
    BrokenStructuralIntegrity(Vec<StructuralIntegrityError>),

    /// Parent not present in the same frame
    #[error("object {object} has parent {parent}, which is not in the frame")]
    UnknownParent {
        /// Child object
        object: ObjectId,
        /// Missing parent
        parent: ObjectId,
    },

    /// Children of a snapshot disagree between frames or with child lists
    #[error("children of snapshot {0} are inconsistent")]
    ChildrenMismatch(SnapshotId),

    /// Parent chain loops back on itself
    #[error("parent chain of object {0} forms a cycle")]
    ParentCycle(ObjectId),

    /// Name used twice in one collection
    #[error("duplicate name '{0}'")]
    DuplicateName(String),
}

/// Errors raised while loading a raw design
#[derive(Debug, Error)]
pub enum DesignLoaderError {
    /// A single raw item is invalid
    #[error("{collection}[{index}]: {error}")]
    Item {
        /// Collection the item belongs to
        collection: RawCollection,
        /// Index of the item within its collection
        index: usize,
        /// What is wrong with it
        error: ItemError,
    },

    /// Undo or redo history given without a current frame
    #[error("Undo or redo history requires a current frame")]
    MissingCurrentFrame,

    /// Named reference points to the wrong kind of entity
    #[error("Named reference '{name}' must refer to a {expected}, found {found}")]
    NamedReferenceTypeMismatch {
        /// Reference or list name
        name: String,
        /// Kind required for this name
        expected: IdKind,
        /// Kind declared by the document
        found: IdKind,
    },

    /// Named reference points to a frame that does not exist
    #[error("Named reference '{name}' refers to unknown frame {id}")]
    UnknownFrameId {
        /// Reference or list name
        name: String,
        /// Offending identity
        id: RawId,
    },

    /// Frame receiving a clip was already structurally broken
    #[error(
        "Target frame violates structural integrity before the load: {}",
        .0.first().map(ToString::to_string).unwrap_or_default()
    )]
    BrokenTargetFrame(Vec<StructuralIntegrityError>),

    /// Document version is neither current nor upgradable
    #[error("Unsupported format version {found} (supported: {supported})")]
    UnsupportedFormatVersion {
        /// Version declared by the document
        found: u32,
        /// Version this loader reads
        supported: u32,
    },

    /// Registered legacy adapter failed
    #[error("Failed to upgrade format version {version}: {source}")]
    LegacyUpgrade {
        /// Version the upgrade started from
        version: u32,
        /// Adapter failure
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl DesignLoaderError {
    /// Build an item error
    pub fn item(collection: RawCollection, index: usize, error: ItemError) -> Self {
        DesignLoaderError::Item {
            collection,
            index,
            error,
        }
    }

    /// Collection and index of the offending item, for item errors
    pub fn location(&self) -> Option<(RawCollection, usize)> {
        match self {
            DesignLoaderError::Item {
                collection, index, ..
            } => Some((*collection, *index)),
            _ => None,
        }
    }

    /// Item error, if this is one
    pub fn item_error(&self) -> Option<&ItemError> {
        match self {
            DesignLoaderError::Item { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Errors raised while reading or writing the loader configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read or written
    #[error("Failed to access config file '{}': {source}", .path.display())]
    Io {
        /// Config file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// File content is not valid configuration
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Configuration could not be encoded
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A field holds a value outside its domain
    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}
