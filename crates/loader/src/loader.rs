//! DesignLoader: raw documents into designs and frames
//!
//! Three entry points share the phase pipeline of [`crate::pipeline`]:
//!
//! - [`DesignLoader::load`] / [`DesignLoader::load_into`]: a whole
//!   [`RawDesign`] into a design, all eight phases
//! - [`DesignLoader::load_snapshots`]: a clip of raw snapshots into an open
//!   transient frame (paste), phases 1 to 6 with the batch as its only frame
//! - [`DesignLoader::load_foreign`]: the same for any [`ForeignObject`]
//!
//! Loads are all-or-nothing. Identities are reserved through a
//! [`Reservation`] that releases them when a phase fails, and the target is
//! only mutated once every check has passed.

use crate::config::{IdentityStrategy, LoaderConfig};
use crate::error::{DesignLoaderError, ItemError, RawCollection, Result};
use crate::pipeline::Validated;
use crate::reservation::Reservation;
use std::borrow::Cow;
use std::collections::HashSet;
use std::error::Error as StdError;
use std::sync::Arc;
use tracing::{debug, info, warn};
use trellis_core::{FrameId, Metamodel, MetamodelView, ObjectId};
use trellis_design::{Design, FrameView, TransientFrame};
use trellis_foreign::{ForeignObject, RawDesign, RawSnapshot};

/// Upgrades documents written in an older format version
///
/// Registered with [`DesignLoader::with_legacy_adapter`]. Closures of the
/// matching signature implement it.
pub trait LegacyAdapter: Send + Sync {
    /// Rewrite `raw` from `from_version` to the current format
    fn upgrade(
        &self,
        raw: RawDesign,
        from_version: u32,
    ) -> std::result::Result<RawDesign, Box<dyn StdError + Send + Sync>>;
}

impl<F> LegacyAdapter for F
where
    F: Fn(RawDesign, u32) -> std::result::Result<RawDesign, Box<dyn StdError + Send + Sync>>
        + Send
        + Sync,
{
    fn upgrade(
        &self,
        raw: RawDesign,
        from_version: u32,
    ) -> std::result::Result<RawDesign, Box<dyn StdError + Send + Sync>> {
        self(raw, from_version)
    }
}

/// Loads raw documents against one metamodel
pub struct DesignLoader<M: MetamodelView + ?Sized = Metamodel> {
    metamodel: Arc<M>,
    config: LoaderConfig,
    legacy: Option<Box<dyn LegacyAdapter>>,
}

impl<M: MetamodelView + ?Sized> DesignLoader<M> {
    /// Loader with the default configuration
    pub fn new(metamodel: Arc<M>) -> Self {
        DesignLoader {
            metamodel,
            config: LoaderConfig::default(),
            legacy: None,
        }
    }

    /// Loader with an explicit configuration
    pub fn with_config(metamodel: Arc<M>, config: LoaderConfig) -> Self {
        DesignLoader {
            metamodel,
            config,
            legacy: None,
        }
    }

    /// Register an adapter for older document versions
    pub fn with_legacy_adapter(mut self, adapter: impl LegacyAdapter + 'static) -> Self {
        self.legacy = Some(Box::new(adapter));
        self
    }

    /// Active configuration
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Metamodel object types are looked up in
    pub fn metamodel(&self) -> &Arc<M> {
        &self.metamodel
    }

    // =========================================================================
    // Whole documents
    // =========================================================================

    /// Load a document into a new design, using the configured strategy
    pub fn load(&self, raw: &RawDesign) -> Result<Design> {
        let mut design = Design::new();
        self.load_into(raw, &mut design, self.config.identity_strategy)?;
        Ok(design)
    }

    /// Load a document into an existing design
    ///
    /// Returns the identities of the inserted frames in document order.
    /// Named references may also point at frames the design already has.
    /// On error the design is unchanged.
    pub fn load_into(
        &self,
        raw: &RawDesign,
        design: &mut Design,
        strategy: IdentityStrategy,
    ) -> Result<Vec<FrameId>> {
        let result = self.try_load_into(raw, design, strategy);
        if let Err(e) = &result {
            warn!(target: "trellis::loader", error = %e, "Load abandoned");
        }
        result
    }

    fn try_load_into(
        &self,
        raw: &RawDesign,
        design: &mut Design,
        strategy: IdentityStrategy,
    ) -> Result<Vec<FrameId>> {
        let raw = self.upgrade(raw)?;
        self.check_metamodel(&raw);
        info!(
            target: "trellis::loader",
            strategy = %strategy,
            snapshots = raw.snapshots.len(),
            frames = raw.frames.len(),
            "Loading design"
        );

        let existing: HashSet<FrameId> = design.frame_ids().into_iter().collect();
        let (ready, reservations) = {
            let mut reservation = Reservation::new(design.identities_mut());
            let ready = Validated::new(&raw.snapshots, &raw.frames)?
                .reserve(&mut reservation, strategy)?
                .resolve_references()?
                .resolve_frames()?
                .resolve_hierarchy()?
                .materialize(&*self.metamodel, self.config.name_from_string_id)?
                .assemble()?
                .resolve_named(&raw, &existing)?;
            (ready, reservation.into_ids())
        };

        if design.metamodel_name().is_none() {
            design.set_metamodel_info(
                self.metamodel.name(),
                self.metamodel.version().map(str::to_string),
            );
        }
        Ok(ready.commit(design, reservations))
    }

    /// Bring the document to the configured format version
    fn upgrade<'a>(&self, raw: &'a RawDesign) -> Result<Cow<'a, RawDesign>> {
        let supported = self.config.format_version;
        let found = raw.format_version.unwrap_or(supported);
        if found == supported {
            return Ok(Cow::Borrowed(raw));
        }

        let adapter = self
            .legacy
            .as_ref()
            .ok_or(DesignLoaderError::UnsupportedFormatVersion { found, supported })?;
        info!(target: "trellis::loader", from = found, to = supported, "Upgrading document");
        let upgraded = adapter
            .upgrade(raw.clone(), found)
            .map_err(|source| DesignLoaderError::LegacyUpgrade {
                version: found,
                source,
            })?;

        let now = upgraded.format_version.unwrap_or(supported);
        if now != supported {
            return Err(DesignLoaderError::UnsupportedFormatVersion {
                found: now,
                supported,
            });
        }
        Ok(Cow::Owned(upgraded))
    }

    fn check_metamodel(&self, raw: &RawDesign) {
        if let Some(name) = raw.metamodel_name.as_deref() {
            if name != self.metamodel.name() {
                warn!(
                    target: "trellis::loader",
                    document = name,
                    loader = self.metamodel.name(),
                    "Document was written for another metamodel"
                );
            }
        }
    }

    // =========================================================================
    // Clips
    // =========================================================================

    /// Load raw snapshots into an open frame
    ///
    /// References resolve only within `snapshots`, never against the
    /// frame's existing content. The frame must be structurally sound
    /// before the load, and the whole frame is validated again after
    /// insertion. Returns the new objects in batch order; their identities
    /// are committed when the frame is accepted. On error the frame and the
    /// identity space are unchanged.
    pub fn load_snapshots(
        &self,
        snapshots: &[RawSnapshot],
        frame: &mut TransientFrame<'_>,
        strategy: IdentityStrategy,
    ) -> Result<Vec<ObjectId>> {
        let before = frame.validate();
        if !before.is_valid() {
            return Err(DesignLoaderError::BrokenTargetFrame(before.violations));
        }

        let (built, reservations) = {
            let mut reservation = Reservation::new(frame.identities_mut());
            let built = Validated::new(snapshots, &[])?
                .reserve(&mut reservation, strategy)?
                .resolve_references()?
                .into_batch_frame()?
                .resolve_hierarchy()?
                .materialize(&*self.metamodel, self.config.name_from_string_id)?
                .into_snapshots();
            (built, reservation.into_ids())
        };

        let objects: Vec<ObjectId> = built.iter().map(|s| s.id()).collect();
        let mut inserted = Vec::with_capacity(built.len());
        let mut failure = None;
        for (index, snapshot) in built.into_iter().enumerate() {
            let object = snapshot.id();
            if frame.insert(snapshot).is_err() {
                failure = Some(DesignLoaderError::item(
                    RawCollection::Snapshots,
                    index,
                    ItemError::DuplicateObject(object),
                ));
                break;
            }
            inserted.push(object);
        }

        if failure.is_none() {
            let report = frame.validate();
            if !report.is_valid() {
                let index = report
                    .violations
                    .iter()
                    .find_map(|v| objects.iter().position(|o| *o == v.object()))
                    .unwrap_or(0);
                failure = Some(DesignLoaderError::item(
                    RawCollection::Snapshots,
                    index,
                    ItemError::BrokenStructuralIntegrity(report.violations),
                ));
            }
        }

        if let Some(e) = failure {
            frame.remove_inserted(&inserted);
            frame.identities_mut().release(reservations);
            warn!(target: "trellis::loader", error = %e, "Clip load abandoned");
            return Err(e);
        }

        frame.adopt_reservations(reservations);
        debug!(target: "trellis::loader", objects = objects.len(), "Clip loaded into frame");
        Ok(objects)
    }

    /// Load foreign objects into an open frame
    ///
    /// Same semantics as [`load_snapshots`](Self::load_snapshots). Child
    /// lists assign parents to children that do not name one.
    pub fn load_foreign<F: ForeignObject>(
        &self,
        objects: &[F],
        frame: &mut TransientFrame<'_>,
        strategy: IdentityStrategy,
    ) -> Result<Vec<ObjectId>> {
        let snapshots: Vec<RawSnapshot> = objects.iter().map(|o| o.to_raw_snapshot()).collect();
        self.load_snapshots(&snapshots, frame, strategy)
    }
}
