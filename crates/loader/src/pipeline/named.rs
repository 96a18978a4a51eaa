//! Phases 7 and 8: assemble stable frames, resolve named references, commit
//!
//! Named references may point at frames of the batch or at frames the
//! target design already has. Both phases finish before the design is
//! touched, so a failure in either leaves it unchanged.

use super::{IdentityTable, Materialized, RawKey};
use crate::error::{DesignLoaderError, ItemError, RawCollection, Result};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};
use trellis_core::{EntityId, FrameId, IdKind};
use trellis_design::{Design, FrameValidationError, FrameView, StableFrame};
use trellis_foreign::{RawDesign, RawId, RawNamedList, RawNamedReference};

/// System reference holding the current frame
pub(crate) const CURRENT_FRAME: &str = "current_frame";
/// System list holding the undo history
pub(crate) const UNDO: &str = "undo";
/// System list holding the redo history
pub(crate) const REDO: &str = "redo";

/// Batch of validated stable frames
pub(crate) struct Assembled {
    frames: Vec<StableFrame>,
    table: IdentityTable,
}

impl Materialized {
    /// Build every frame through structural validation
    ///
    /// # Errors
    /// `BrokenStructuralIntegrity` or `DuplicateObject` at the failing frame.
    pub(crate) fn assemble(self) -> Result<Assembled> {
        let mut frames = Vec::with_capacity(self.members.len());
        for (index, (members, id)) in self.members.iter().zip(&self.frame_ids).enumerate() {
            let snapshots = members
                .iter()
                .map(|&i| Arc::clone(&self.snapshots[i]))
                .collect();
            let frame = StableFrame::validated(*id, snapshots).map_err(|e| {
                let error = match e {
                    FrameValidationError::DuplicateObject(object) => {
                        ItemError::DuplicateObject(object)
                    }
                    FrameValidationError::BrokenStructure(violations) => {
                        ItemError::BrokenStructuralIntegrity(violations)
                    }
                };
                DesignLoaderError::item(RawCollection::Frames, index, error)
            })?;
            frames.push(frame);
        }

        debug!(target: "trellis::loader", frames = frames.len(), "Frames assembled");
        Ok(Assembled {
            frames,
            table: self.table,
        })
    }
}

// ============================================================================
// Named references
// ============================================================================

/// Replacement for the design's current frame and undo/redo lists
#[derive(Debug, Default)]
struct History {
    current: Option<FrameId>,
    undo: Vec<FrameId>,
    redo: Vec<FrameId>,
}

/// Batch ready to be committed
pub(crate) struct Ready {
    frames: Vec<StableFrame>,
    history: Option<History>,
    references: Vec<(String, FrameId)>,
    lists: Vec<(String, Vec<FrameId>)>,
}

/// Frames a named reference may point at
struct FrameScope<'a> {
    table: &'a IdentityTable,
    existing: &'a HashSet<FrameId>,
}

impl FrameScope<'_> {
    fn resolve(&self, name: &str, id: &RawId) -> Result<FrameId> {
        let key = RawKey::from(id);
        if let Some(found) = self.table.get(IdKind::Frame, &key) {
            return Ok(FrameId::new(found));
        }
        if let RawKey::Value(value) = key {
            let frame = FrameId::from_u64(value);
            if self.existing.contains(&frame) {
                return Ok(frame);
            }
        }
        Err(DesignLoaderError::UnknownFrameId {
            name: name.to_string(),
            id: id.clone(),
        })
    }

    fn reference(
        &self,
        collection: RawCollection,
        index: usize,
        reference: &RawNamedReference,
    ) -> Result<FrameId> {
        check_kind(collection, index, &reference.name, &reference.kind)?;
        self.resolve(&reference.name, &reference.id)
    }

    fn list(
        &self,
        collection: RawCollection,
        index: usize,
        list: &RawNamedList,
    ) -> Result<Vec<FrameId>> {
        check_kind(collection, index, &list.name, &list.item_type)?;
        list.ids
            .iter()
            .map(|id| self.resolve(&list.name, id))
            .collect()
    }
}

/// Named references and lists may only hold frames
fn check_kind(collection: RawCollection, index: usize, name: &str, tag: &str) -> Result<()> {
    let kind = IdKind::from_name(tag).ok_or_else(|| {
        DesignLoaderError::item(
            collection,
            index,
            ItemError::UnknownEntityType(tag.to_string()),
        )
    })?;
    if kind != IdKind::Frame {
        return Err(DesignLoaderError::NamedReferenceTypeMismatch {
            name: name.to_string(),
            expected: IdKind::Frame,
            found: kind,
        });
    }
    Ok(())
}

/// Reject a name seen earlier in the same collection
fn check_unique<'a>(
    seen: &mut BTreeSet<&'a str>,
    collection: RawCollection,
    index: usize,
    name: &'a str,
) -> Result<()> {
    if !seen.insert(name) {
        return Err(DesignLoaderError::item(
            collection,
            index,
            ItemError::DuplicateName(name.to_string()),
        ));
    }
    Ok(())
}

impl Assembled {
    /// Resolve system and user named references of `raw`
    ///
    /// `existing` holds the frames of the target design before the load.
    /// The design's history is replaced only when the document carries a
    /// `current_frame`, `undo` or `redo` entry.
    ///
    /// # Errors
    /// - `UnknownEntityType` for an unknown kind tag
    /// - `NamedReferenceTypeMismatch` for a reference to a non-frame
    /// - `UnknownFrameId` for a frame in neither the batch nor the design
    /// - `DuplicateName` for a name used twice in one collection
    /// - `MissingCurrentFrame` for undo/redo history without a current frame
    pub(crate) fn resolve_named(self, raw: &RawDesign, existing: &HashSet<FrameId>) -> Result<Ready> {
        let scope = FrameScope {
            table: &self.table,
            existing,
        };

        let mut history: Option<History> = None;
        let mut seen = BTreeSet::new();
        for (index, reference) in raw.system_references.iter().enumerate() {
            let collection = RawCollection::SystemReferences;
            check_unique(&mut seen, collection, index, &reference.name)?;
            match reference.name.as_str() {
                CURRENT_FRAME => {
                    let frame = scope.reference(collection, index, reference)?;
                    history.get_or_insert_with(History::default).current = Some(frame);
                }
                other => {
                    warn!(target: "trellis::loader", name = other, "Ignoring unknown system reference");
                }
            }
        }

        let mut seen = BTreeSet::new();
        for (index, list) in raw.system_lists.iter().enumerate() {
            let collection = RawCollection::SystemLists;
            check_unique(&mut seen, collection, index, &list.name)?;
            match list.name.as_str() {
                UNDO => {
                    let frames = scope.list(collection, index, list)?;
                    history.get_or_insert_with(History::default).undo = frames;
                }
                REDO => {
                    let frames = scope.list(collection, index, list)?;
                    history.get_or_insert_with(History::default).redo = frames;
                }
                other => {
                    warn!(target: "trellis::loader", name = other, "Ignoring unknown system list");
                }
            }
        }

        if let Some(h) = &history {
            if h.current.is_none() && (!h.undo.is_empty() || !h.redo.is_empty()) {
                return Err(DesignLoaderError::MissingCurrentFrame);
            }
        }

        let mut seen = BTreeSet::new();
        let mut references = Vec::with_capacity(raw.user_references.len());
        for (index, reference) in raw.user_references.iter().enumerate() {
            let collection = RawCollection::UserReferences;
            check_unique(&mut seen, collection, index, &reference.name)?;
            let frame = scope.reference(collection, index, reference)?;
            references.push((reference.name.clone(), frame));
        }

        let mut seen = BTreeSet::new();
        let mut lists = Vec::with_capacity(raw.user_lists.len());
        for (index, list) in raw.user_lists.iter().enumerate() {
            let collection = RawCollection::UserLists;
            check_unique(&mut seen, collection, index, &list.name)?;
            lists.push((list.name.clone(), scope.list(collection, index, list)?));
        }

        debug!(
            target: "trellis::loader",
            history = history.is_some(),
            references = references.len(),
            lists = lists.len(),
            "Named references resolved"
        );
        Ok(Ready {
            frames: self.frames,
            history,
            references,
            lists,
        })
    }
}

impl Ready {
    /// Identities of the frames about to be inserted, in document order
    pub(crate) fn frame_ids(&self) -> Vec<FrameId> {
        self.frames.iter().map(|f| f.id()).collect()
    }

    /// Insert the frames, commit `reservations`, apply named references
    ///
    /// Cannot fail: every check ran in earlier phases.
    pub(crate) fn commit(self, design: &mut Design, reservations: Vec<EntityId>) -> Vec<FrameId> {
        let ids = self.frame_ids();
        let committed = reservations.len();
        design.insert_stable_frames(self.frames, reservations);

        if let Some(history) = self.history {
            design
                .set_history(history.current, history.undo, history.redo)
                .expect("history frames were resolved against the batch and the design");
        }
        for (name, frame) in self.references {
            design
                .set_named_frame(name, frame)
                .expect("named frame was resolved against the batch and the design");
        }
        for (name, frames) in self.lists {
            design
                .set_named_list(name, frames)
                .expect("named list was resolved against the batch and the design");
        }

        info!(
            target: "trellis::loader",
            frames = ids.len(),
            identities = committed,
            "Load committed"
        );
        ids
    }
}
