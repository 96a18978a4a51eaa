//! Phase 4: resolve frame entries to batch snapshots

use super::{RawKey, ResolvedReferences};
use crate::error::{DesignLoaderError, ItemError, RawCollection, Result};
use std::collections::{HashMap, HashSet};
use tracing::debug;
use trellis_core::{IdKind, ObjectId, SnapshotId};

/// Where hierarchy errors of a frame are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Scope {
    /// Frames come from `frames[]`; errors name the frame
    Frames,
    /// The batch itself is the only frame; errors name the snapshot
    Batch,
}

impl Scope {
    pub(super) fn locate(&self, frame: usize, snapshot: usize) -> (RawCollection, usize) {
        match self {
            Scope::Frames => (RawCollection::Frames, frame),
            Scope::Batch => (RawCollection::Snapshots, snapshot),
        }
    }
}

/// Batch with every frame resolved to snapshot indices
pub(crate) struct ResolvedFrames<'r> {
    pub(super) resolved: ResolvedReferences<'r>,
    /// Snapshot indices per frame, in frame order
    pub(super) members: Vec<Vec<usize>>,
    pub(super) scope: Scope,
}

impl<'r> ResolvedReferences<'r> {
    /// Resolve each raw frame's entries
    ///
    /// An entry names a raw snapshot identity. An entry that is not one may
    /// name the raw object identity of a snapshot given without a snapshot
    /// identity, provided exactly one such snapshot has that object identity.
    ///
    /// # Errors
    /// - `UnknownSnapshotId` for an entry naming no batch snapshot
    /// - `DuplicateObject` if two entries are versions of one object
    pub(crate) fn resolve_frames(self) -> Result<ResolvedFrames<'r>> {
        let reserved = &self.reserved;
        let by_snapshot: HashMap<SnapshotId, usize> = reserved
            .snapshot_ids
            .iter()
            .enumerate()
            .map(|(index, id)| (*id, index))
            .collect();

        let mut unversioned: HashMap<RawKey, Vec<usize>> = HashMap::new();
        for (index, raw) in reserved.snapshots.iter().enumerate() {
            if raw.snapshot_id.is_none() {
                if let Some(id) = &raw.id {
                    unversioned.entry(RawKey::from(id)).or_default().push(index);
                }
            }
        }

        let mut members = Vec::with_capacity(reserved.frames.len());
        for (frame_index, frame) in reserved.frames.iter().enumerate() {
            let at = |e| DesignLoaderError::item(RawCollection::Frames, frame_index, e);
            let mut entries = Vec::with_capacity(frame.snapshots.len());
            let mut seen: HashSet<ObjectId> = HashSet::new();

            for (position, raw) in frame.snapshots.iter().enumerate() {
                let key = RawKey::from(raw);
                let index = reserved
                    .table
                    .get(IdKind::Snapshot, &key)
                    .and_then(|id| by_snapshot.get(&SnapshotId::new(id)).copied())
                    .or_else(|| match unversioned.get(&key).map(Vec::as_slice) {
                        Some([only]) => Some(*only),
                        _ => None,
                    })
                    .ok_or_else(|| {
                        at(ItemError::UnknownSnapshotId {
                            id: raw.clone(),
                            position,
                        })
                    })?;

                let object = reserved.objects[index];
                if !seen.insert(object) {
                    return Err(at(ItemError::DuplicateObject(object)));
                }
                entries.push(index);
            }
            members.push(entries);
        }

        debug!(target: "trellis::loader", frames = members.len(), "Frames resolved");
        Ok(ResolvedFrames {
            resolved: self,
            members,
            scope: Scope::Frames,
        })
    }

    /// Treat the whole batch as one frame (reduced path)
    ///
    /// # Errors
    /// `DuplicateObject` at the second version of an object.
    pub(crate) fn into_batch_frame(self) -> Result<ResolvedFrames<'r>> {
        let mut seen: HashSet<ObjectId> = HashSet::new();
        for (index, object) in self.reserved.objects.iter().enumerate() {
            if !seen.insert(*object) {
                return Err(DesignLoaderError::item(
                    RawCollection::Snapshots,
                    index,
                    ItemError::DuplicateObject(*object),
                ));
            }
        }

        let members = vec![(0..self.reserved.objects.len()).collect()];
        Ok(ResolvedFrames {
            resolved: self,
            members,
            scope: Scope::Batch,
        })
    }
}
