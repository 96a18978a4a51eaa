//! DesignExtractor: designs and frames back into the raw data model
//!
//! Every identity is written as a concrete value, so a document produced by
//! [`DesignExtractor::extract`] loads back with
//! [`IdentityStrategy::RequireProvided`](crate::IdentityStrategy) into an
//! equal design. Child lists are written explicitly to keep child order.
//!
//! [`DesignExtractor::extract_pruning`] copies part of a frame (clipboard).
//! The result is self-consistent:
//!
//! - an edge is kept only if both endpoints are kept
//! - an ordered set is kept only if its owner is kept; items outside the
//!   selection are dropped from it
//! - a parent outside the selection is cleared, children outside it are
//!   dropped

use crate::pipeline::{CURRENT_FRAME, REDO, UNDO};
use std::collections::HashSet;
use tracing::debug;
use trellis_core::{FrameId, ObjectId, SnapshotId};
use trellis_design::{Design, FrameView, ObjectSnapshot, Structure};
use trellis_foreign::{
    RawDesign, RawFrame, RawId, RawNamedList, RawNamedReference, RawSnapshot, RawStructure,
    FORMAT_VERSION,
};

/// Converts designs and frames to raw documents
#[derive(Debug, Clone, Copy, Default)]
pub struct DesignExtractor;

impl DesignExtractor {
    /// Create an extractor
    pub fn new() -> Self {
        DesignExtractor
    }

    /// Whole design: snapshots, frames, history and named references
    ///
    /// Only snapshots referenced by a frame are written; retained versions
    /// awaiting garbage collection are skipped. The current frame is written
    /// only if set, undo and redo only if non-empty.
    pub fn extract(&self, design: &Design) -> RawDesign {
        let referenced: HashSet<SnapshotId> =
            design.frames().flat_map(|f| f.snapshot_ids()).collect();
        let snapshots: Vec<RawSnapshot> = design
            .snapshots()
            .into_iter()
            .filter(|s| referenced.contains(&s.snapshot_id()))
            .map(|s| raw_snapshot(s))
            .collect();
        let frames: Vec<RawFrame> = design
            .frames()
            .map(|f| {
                RawFrame::new(
                    Some(RawId::from(f.id())),
                    f.snapshot_ids().into_iter().map(RawId::from).collect(),
                )
            })
            .collect();

        let mut system_references = Vec::new();
        if let Some(current) = design.current_frame_id() {
            system_references.push(RawNamedReference::frame(CURRENT_FRAME, current));
        }
        let mut system_lists = Vec::new();
        for (name, list) in [(UNDO, design.undo_list()), (REDO, design.redo_list())] {
            if !list.is_empty() {
                system_lists.push(RawNamedList::frames(name, frame_ids(list)));
            }
        }

        let user_references = design
            .named_frames()
            .iter()
            .map(|(name, id)| RawNamedReference::frame(name.clone(), *id))
            .collect();
        let user_lists = design
            .named_lists()
            .iter()
            .map(|(name, ids)| RawNamedList::frames(name.clone(), frame_ids(ids)))
            .collect();

        debug!(
            target: "trellis::extract",
            snapshots = snapshots.len(),
            frames = frames.len(),
            "Design extracted"
        );
        RawDesign {
            format_version: Some(FORMAT_VERSION),
            metamodel_name: design.metamodel_name().map(str::to_string),
            metamodel_version: design.metamodel_version().map(str::to_string),
            snapshots,
            frames,
            user_references,
            system_references,
            user_lists,
            system_lists,
        }
    }

    /// Every snapshot of one frame, in frame order
    pub fn extract_frame<F: FrameView + ?Sized>(&self, frame: &F) -> Vec<RawSnapshot> {
        frame.snapshots().iter().map(|s| raw_snapshot(s)).collect()
    }

    /// Self-consistent subset of `frame` around the selected objects
    ///
    /// Objects not in the frame are ignored. Output follows frame order.
    pub fn extract_pruning<F: FrameView + ?Sized>(
        &self,
        objects: &[ObjectId],
        frame: &F,
    ) -> Vec<RawSnapshot> {
        let mut kept: HashSet<ObjectId> = objects
            .iter()
            .copied()
            .filter(|id| frame.contains(*id))
            .collect();

        // Dropping a set owner can orphan other sets; repeat until stable
        loop {
            let dropped: Vec<ObjectId> = kept
                .iter()
                .copied()
                .filter(|id| {
                    frame
                        .object(*id)
                        .map_or(false, |s| !anchored(s.structure(), &kept))
                })
                .collect();
            if dropped.is_empty() {
                break;
            }
            for id in dropped {
                kept.remove(&id);
            }
        }

        let pruned: Vec<RawSnapshot> = frame
            .snapshots()
            .iter()
            .filter(|s| kept.contains(&s.id()))
            .map(|s| pruned_snapshot(s, &kept))
            .collect();
        debug!(
            target: "trellis::extract",
            selected = objects.len(),
            kept = pruned.len(),
            "Frame subset extracted"
        );
        pruned
    }
}

/// Check that the objects a structure depends on are kept
fn anchored(structure: &Structure, kept: &HashSet<ObjectId>) -> bool {
    match structure {
        Structure::Unstructured | Structure::Node => true,
        Structure::Edge { origin, target } => kept.contains(origin) && kept.contains(target),
        Structure::OrderedSet { owner, .. } => kept.contains(owner),
    }
}

fn frame_ids(ids: &[FrameId]) -> Vec<RawId> {
    ids.iter().copied().map(RawId::from).collect()
}

fn raw_structure(structure: &Structure) -> RawStructure {
    RawStructure::new(
        structure.structural_type().as_str(),
        structure.references().into_iter().map(RawId::from).collect(),
    )
}

fn raw_snapshot(snapshot: &ObjectSnapshot) -> RawSnapshot {
    RawSnapshot {
        type_name: snapshot.type_name().to_string(),
        id: Some(RawId::from(snapshot.id())),
        snapshot_id: Some(RawId::from(snapshot.snapshot_id())),
        structure: raw_structure(snapshot.structure()),
        parent: snapshot.parent().map(RawId::from),
        children: snapshot.children().iter().copied().map(RawId::from).collect(),
        attributes: snapshot.attributes().clone(),
    }
}

fn pruned_snapshot(snapshot: &ObjectSnapshot, kept: &HashSet<ObjectId>) -> RawSnapshot {
    let mut raw = raw_snapshot(snapshot);
    if let Structure::OrderedSet { owner, items } = snapshot.structure() {
        let items = items.iter().filter(|i| kept.contains(*i)).copied().collect();
        raw.structure = raw_structure(&Structure::OrderedSet {
            owner: *owner,
            items,
        });
    }
    raw.parent = snapshot
        .parent()
        .filter(|p| kept.contains(p))
        .map(RawId::from);
    raw.children = snapshot
        .children()
        .iter()
        .filter(|c| kept.contains(*c))
        .copied()
        .map(RawId::from)
        .collect();
    raw
}
