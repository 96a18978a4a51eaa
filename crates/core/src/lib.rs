//! Core types for Trellis
//!
//! This crate defines the foundational types used throughout the system:
//! - EntityId, ObjectId, SnapshotId, FrameId: Typed identities
//! - IdKind: Discriminates between identity kinds
//! - IdentityManager: Two-phase allocator/registry for identities
//! - Variant: Typed attribute values
//! - Metamodel: Object type lookup and attribute defaults
//! - CoreError: Error type for the identity and value layers

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod identity;
pub mod metamodel;
pub mod types;
pub mod variant;

pub use error::{CoreError, Result};
pub use identity::IdentityManager;
pub use metamodel::{Attribute, Metamodel, MetamodelView, ObjectType, StructuralType};
pub use types::{EntityId, FrameId, IdKind, ObjectId, SnapshotId};
pub use variant::{AtomType, Point, ValueType, Variant, VariantArray, VariantAtom};
