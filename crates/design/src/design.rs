//! Design: aggregate root of frames, snapshots and history
//!
//! A Design owns:
//! - every stable frame, by frame identity
//! - every retained snapshot (shared by `Arc` with the frames holding it)
//! - the identity manager all of its identities come from
//! - the current frame pointer and the persisted undo/redo lists
//! - user-defined named frame references and named frame lists
//!
//! ## Invariants
//!
//! - If the undo or redo list is non-empty, the current frame is set.
//! - Every frame referenced by history or by a name exists.
//! - A snapshot is retained while at least one frame references it;
//!   [`Design::collect_garbage`] releases the rest.
//!
//! Undo/redo navigation is not implemented here; callers restore and read
//! the list-and-pointer state through [`Design::set_history`] and the
//! accessors.

use crate::error::{DesignError, Result};
use crate::frame::{FrameView, StableFrame, TransientFrame};
use crate::snapshot::ObjectSnapshot;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info};
use trellis_core::{EntityId, FrameId, IdKind, IdentityManager, SnapshotId};

/// Aggregate root of a versioned object graph
#[derive(Debug, Default)]
pub struct Design {
    metamodel_name: Option<String>,
    metamodel_version: Option<String>,
    identities: IdentityManager,
    snapshots: HashMap<SnapshotId, Arc<ObjectSnapshot>>,
    frames: BTreeMap<FrameId, Arc<StableFrame>>,
    current_frame: Option<FrameId>,
    undo_list: Vec<FrameId>,
    redo_list: Vec<FrameId>,
    named_frames: BTreeMap<String, FrameId>,
    named_lists: BTreeMap<String, Vec<FrameId>>,
}

impl Design {
    /// Create an empty design
    pub fn new() -> Self {
        Design::default()
    }

    /// Record which metamodel the design was built against
    pub fn set_metamodel_info(&mut self, name: impl Into<String>, version: Option<String>) {
        self.metamodel_name = Some(name.into());
        self.metamodel_version = version;
    }

    /// Metamodel name, if recorded
    pub fn metamodel_name(&self) -> Option<&str> {
        self.metamodel_name.as_deref()
    }

    /// Metamodel version, if recorded
    pub fn metamodel_version(&self) -> Option<&str> {
        self.metamodel_version.as_deref()
    }

    // =========================================================================
    // Identities
    // =========================================================================

    /// Identity manager
    pub fn identities(&self) -> &IdentityManager {
        &self.identities
    }

    /// Identity manager, mutable
    pub fn identities_mut(&mut self) -> &mut IdentityManager {
        &mut self.identities
    }

    // =========================================================================
    // Frames and snapshots
    // =========================================================================

    /// Stable frame by identity
    pub fn frame(&self, id: FrameId) -> Option<&Arc<StableFrame>> {
        self.frames.get(&id)
    }

    /// Check if a stable frame exists
    pub fn contains_frame(&self, id: FrameId) -> bool {
        self.frames.contains_key(&id)
    }

    /// All stable frames, ordered by identity
    pub fn frames(&self) -> impl Iterator<Item = &Arc<StableFrame>> {
        self.frames.values()
    }

    /// Identities of all stable frames, ordered
    pub fn frame_ids(&self) -> Vec<FrameId> {
        self.frames.keys().copied().collect()
    }

    /// Number of stable frames
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Retained snapshot by identity
    pub fn snapshot(&self, id: SnapshotId) -> Option<&Arc<ObjectSnapshot>> {
        self.snapshots.get(&id)
    }

    /// All retained snapshots, ordered by snapshot identity
    pub fn snapshots(&self) -> Vec<&Arc<ObjectSnapshot>> {
        let mut all: Vec<&Arc<ObjectSnapshot>> = self.snapshots.values().collect();
        all.sort_by_key(|s| s.snapshot_id());
        all
    }

    /// Number of retained snapshots
    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }

    /// Start an empty transient frame
    pub fn create_frame(&mut self) -> TransientFrame<'_> {
        let id = FrameId::new(self.identities.create_and_reserve(IdKind::Frame));
        TransientFrame::new(self, id, Vec::new())
    }

    /// Start a transient frame holding the contents of a stable frame
    ///
    /// # Errors
    /// `UnknownFrame` if `original` does not exist.
    pub fn derive_frame(&mut self, original: FrameId) -> Result<TransientFrame<'_>> {
        let snapshots = self
            .frames
            .get(&original)
            .ok_or(DesignError::UnknownFrame(original))?
            .snapshots()
            .to_vec();
        let id = FrameId::new(self.identities.create_and_reserve(IdKind::Frame));
        Ok(TransientFrame::new(self, id, snapshots))
    }

    /// Insert validated frames and commit the identities reserved for them
    ///
    /// # Panics
    /// Panics if a frame identity already exists. Callers reserve frame
    /// identities through this design's identity manager, so a clash means
    /// the caller's bookkeeping is broken.
    pub fn insert_stable_frames<I>(&mut self, frames: Vec<StableFrame>, reservations: I)
    where
        I: IntoIterator<Item = EntityId>,
    {
        let count = frames.len();
        for frame in frames {
            for snapshot in frame.snapshots() {
                self.snapshots
                    .entry(snapshot.snapshot_id())
                    .or_insert_with(|| Arc::clone(snapshot));
            }
            let id = frame.id();
            let previous = self.frames.insert(id, Arc::new(frame));
            assert!(previous.is_none(), "frame {id} inserted twice");
        }
        self.identities.commit(reservations);
        debug!(target: "trellis::design", frames = count, "Stable frames inserted");
    }

    /// Remove a stable frame
    ///
    /// The frame is also dropped from the undo/redo lists, from named
    /// references and from named lists. Snapshots stay retained until [`collect_garbage`](Self::collect_garbage).
    ///
    /// # Errors
    /// - `UnknownFrame` if the frame does not exist
    /// - `FrameInUse` if it is the current frame
    pub fn remove_frame(&mut self, id: FrameId) -> Result<()> {
        if self.current_frame == Some(id) {
            return Err(DesignError::FrameInUse(id));
        }
        if self.frames.remove(&id).is_none() {
            return Err(DesignError::UnknownFrame(id));
        }
        self.undo_list.retain(|f| *f != id);
        self.redo_list.retain(|f| *f != id);
        self.named_frames.retain(|_, f| *f != id);
        for list in self.named_lists.values_mut() {
            list.retain(|f| *f != id);
        }
        info!(target: "trellis::design", frame = %id, "Frame removed");
        Ok(())
    }

    /// Release snapshots no frame references
    ///
    /// Returns the number of snapshots released.
    pub fn collect_garbage(&mut self) -> usize {
        let before = self.snapshots.len();
        self.snapshots.retain(|_, s| Arc::strong_count(s) > 1);
        let released = before - self.snapshots.len();
        debug!(target: "trellis::design", released, "Snapshots released");
        released
    }

    // =========================================================================
    // History
    // =========================================================================

    /// Current frame identity
    pub fn current_frame_id(&self) -> Option<FrameId> {
        self.current_frame
    }

    /// Current frame
    pub fn current_frame(&self) -> Option<&Arc<StableFrame>> {
        self.current_frame.and_then(|id| self.frames.get(&id))
    }

    /// Undo list, oldest first
    pub fn undo_list(&self) -> &[FrameId] {
        &self.undo_list
    }

    /// Redo list
    pub fn redo_list(&self) -> &[FrameId] {
        &self.redo_list
    }

    /// Replace the current frame and the undo/redo lists
    ///
    /// # Errors
    /// - `UnknownFrame` if any referenced frame does not exist
    /// - `MissingCurrentFrame` if a list is non-empty and `current` is None
    pub fn set_history(
        &mut self,
        current: Option<FrameId>,
        undo: Vec<FrameId>,
        redo: Vec<FrameId>,
    ) -> Result<()> {
        if current.is_none() && (!undo.is_empty() || !redo.is_empty()) {
            return Err(DesignError::MissingCurrentFrame);
        }
        for id in current.iter().chain(undo.iter()).chain(redo.iter()) {
            if !self.frames.contains_key(id) {
                return Err(DesignError::UnknownFrame(*id));
            }
        }
        self.current_frame = current;
        self.undo_list = undo;
        self.redo_list = redo;
        Ok(())
    }

    // =========================================================================
    // Named frames
    // =========================================================================

    /// Frame referenced by a user-defined name
    pub fn named_frame(&self, name: &str) -> Option<FrameId> {
        self.named_frames.get(name).copied()
    }

    /// All user-defined frame references, ordered by name
    pub fn named_frames(&self) -> &BTreeMap<String, FrameId> {
        &self.named_frames
    }

    /// Bind a name to a frame, replacing any previous binding
    ///
    /// # Errors
    /// `UnknownFrame` if the frame does not exist.
    pub fn set_named_frame(&mut self, name: impl Into<String>, id: FrameId) -> Result<()> {
        if !self.frames.contains_key(&id) {
            return Err(DesignError::UnknownFrame(id));
        }
        self.named_frames.insert(name.into(), id);
        Ok(())
    }

    /// Remove a named reference, returning the frame it pointed to
    pub fn remove_named_frame(&mut self, name: &str) -> Option<FrameId> {
        self.named_frames.remove(name)
    }

    /// Frames of a user-defined named list
    pub fn named_list(&self, name: &str) -> Option<&[FrameId]> {
        self.named_lists.get(name).map(Vec::as_slice)
    }

    /// All user-defined frame lists, ordered by name
    pub fn named_lists(&self) -> &BTreeMap<String, Vec<FrameId>> {
        &self.named_lists
    }

    /// Bind a name to an ordered list of frames, replacing any previous list
    ///
    /// # Errors
    /// `UnknownFrame` if any listed frame does not exist.
    pub fn set_named_list(&mut self, name: impl Into<String>, frames: Vec<FrameId>) -> Result<()> {
        if let Some(missing) = frames.iter().find(|f| !self.frames.contains_key(*f)) {
            return Err(DesignError::UnknownFrame(*missing));
        }
        self.named_lists.insert(name.into(), frames);
        Ok(())
    }

    /// Remove a named list, returning its frames
    pub fn remove_named_list(&mut self, name: &str) -> Option<Vec<FrameId>> {
        self.named_lists.remove(name)
    }
}
