//! Loading and extracting Trellis designs
//!
//! This crate moves designs between the raw data model and the store:
//! - DesignLoader: Eight-phase, all-or-nothing load of raw documents and clips
//! - DesignExtractor: Designs, frames and pruned selections back to raw form
//! - Reservation: Exclusive identity reservations of one load
//! - LoaderConfig: Identity strategy and compatibility settings (TOML)
//! - DesignLoaderError: Item errors tagged with collection and index

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod extract;
pub mod loader;
mod pipeline;
pub mod reservation;

pub use config::{IdentityStrategy, LoaderConfig, CONFIG_FILE_NAME};
pub use error::{ConfigError, DesignLoaderError, ItemError, RawCollection, Result};
pub use extract::DesignExtractor;
pub use loader::{DesignLoader, LegacyAdapter};
pub use reservation::Reservation;
