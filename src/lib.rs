//! Trellis - versioned object graphs with all-or-nothing loading
//!
//! A [`Design`] holds immutable frames (whole-graph states) of typed
//! objects: nodes, edges, hierarchies and ordered reference lists. Frames
//! share unchanged object versions, and the design keeps the undo/redo
//! history that points into them.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use trellis::{DesignExtractor, DesignLoader, Metamodel, RawDesign};
//!
//! let loader = DesignLoader::new(Arc::new(metamodel));
//! let design = loader.load(&RawDesign::from_json_str(&text)?)?;
//!
//! let raw = DesignExtractor::new().extract(&design);
//! let text = raw.to_json_string()?;
//! ```
//!
//! # Architecture
//!
//! - `trellis-core`: identities, identity manager, variants, metamodel queries
//! - `trellis-design`: snapshots, frames, validation, the design aggregate
//! - `trellis-foreign`: raw data model and its JSON form
//! - `trellis-loader`: the eight-phase loader and the extractor

pub use trellis_core::{
    AtomType, Attribute, EntityId, FrameId, IdKind, IdentityManager, Metamodel, MetamodelView,
    ObjectId, ObjectType, Point, SnapshotId, StructuralType, ValueType, Variant,
};
pub use trellis_design::{
    Design, DesignError, FrameValidationError, FrameView, IntegrityReport, ObjectSnapshot,
    StableFrame, Structure, StructuralIntegrityError, TransientFrame,
};
pub use trellis_foreign::{
    ForeignError, ForeignObject, RawDesign, RawFrame, RawId, RawNamedList, RawNamedReference,
    RawSnapshot, RawStructure, FORMAT_VERSION,
};
pub use trellis_loader::{
    ConfigError, DesignExtractor, DesignLoader, DesignLoaderError, IdentityStrategy, ItemError,
    LegacyAdapter, LoaderConfig, RawCollection, Reservation,
};
