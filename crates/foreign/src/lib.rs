//! Raw (foreign) representation of Trellis designs
//!
//! This crate defines the loosely typed, unvalidated form that designs take
//! outside the store:
//! - RawId: Identity reference (resolved, integer or name)
//! - RawSnapshot, RawStructure: One object version as found in a document
//! - RawFrame: Ordered list of snapshot references
//! - RawNamedReference, RawNamedList: Named pointers into the design
//! - RawDesign: The whole document, with its JSON codec
//! - ForeignObject: Capability set the loader ingests

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod foreign;
pub mod raw;

pub use error::{ForeignError, Result};
pub use foreign::ForeignObject;
pub use raw::{
    RawDesign, RawFrame, RawId, RawNamedList, RawNamedReference, RawSnapshot, RawStructure,
    FORMAT_VERSION,
};
