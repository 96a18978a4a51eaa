//! Identity types for Trellis
//!
//! This module defines the identifiers used throughout the system:
//! - EntityId: Raw identity value shared by every kind of entity
//! - ObjectId: Identity of a logical object, stable across its versions
//! - SnapshotId: Identity of one immutable version of an object
//! - FrameId: Identity of one committed (or staged) whole-graph state
//! - IdKind: Type tag recording which kind of entity owns a raw value
//!
//! All three typed identities are drawn from one value space. The
//! [`IdentityManager`](crate::identity::IdentityManager) records the kind of
//! every allocated value so that, for example, object `7` and frame `7` can
//! never coexist.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Raw identity value
///
/// An EntityId is an untyped 64-bit value. It carries no information about
/// which kind of entity it denotes; that association lives in the identity
/// manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(u64);

impl EntityId {
    /// Create an EntityId from its raw value
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw value
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for EntityId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntityId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| CoreError::InvalidIdentity(s.to_string()))
    }
}

/// Kind of entity an identity belongs to
///
/// Ordering: Object < Snapshot < Frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdKind {
    /// Logical object identity (persists across versions)
    Object,
    /// Object version identity (unique per version)
    Snapshot,
    /// Frame identity (unique per whole-graph state)
    Frame,
}

impl IdKind {
    /// Name used in the raw design document (`"object"`, `"snapshot"`, `"frame"`)
    pub fn as_str(&self) -> &'static str {
        match self {
            IdKind::Object => "object",
            IdKind::Snapshot => "snapshot",
            IdKind::Frame => "frame",
        }
    }

    /// Parse the name used in the raw design document
    ///
    /// Returns None for unknown entity kind names.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "object" => Some(IdKind::Object),
            "snapshot" => Some(IdKind::Snapshot),
            "frame" => Some(IdKind::Frame),
            _ => None,
        }
    }
}

impl fmt::Display for IdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident, $kind:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(EntityId);

        impl $name {
            /// Kind tag of this identity type
            pub const KIND: IdKind = $kind;

            /// Wrap a raw identity
            pub const fn new(id: EntityId) -> Self {
                Self(id)
            }

            /// Create from a raw integer value
            pub const fn from_u64(value: u64) -> Self {
                Self(EntityId::new(value))
            }

            /// Get the underlying raw identity
            pub const fn entity(&self) -> EntityId {
                self.0
            }
        }

        impl From<$name> for EntityId {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

typed_id!(
    /// Identity of a logical object
    ///
    /// Shared by every snapshot (version) of the same object.
    ObjectId,
    IdKind::Object
);

typed_id!(
    /// Identity of one object version
    SnapshotId,
    IdKind::Snapshot
);

typed_id!(
    /// Identity of a frame
    FrameId,
    IdKind::Frame
);
