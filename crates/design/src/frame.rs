//! Frames: consistent whole-graph states
//!
//! Two lifecycle forms share the [`FrameView`] read interface:
//!
//! - [`TransientFrame`]: mutable staging area. It borrows its [`Design`]
//!   exclusively, so at most one frame can be under construction at a time.
//!   Identities it allocates stay *reserved* until [`TransientFrame::accept`]
//!   commits them; dropping the frame releases them.
//! - [`StableFrame`]: immutable, part of the design's history. The only way
//!   to build one is [`StableFrame::validated`], so every stable frame has
//!   passed structural validation.
//!
//! A frame holds at most one version (snapshot) of each object.

use crate::design::Design;
use crate::error::{DesignError, FrameValidationError, Result};
use crate::snapshot::{ObjectSnapshot, Structure};
use crate::validation::{validate_structure, IntegrityReport};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};
use trellis_core::{
    EntityId, FrameId, IdKind, IdentityManager, ObjectId, ObjectType, SnapshotId, StructuralType,
    Variant,
};

// ============================================================================
// Read interface
// ============================================================================

/// Read-only view of a frame
pub trait FrameView {
    /// Frame identity
    fn id(&self) -> FrameId;

    /// Snapshots in frame order
    fn snapshots(&self) -> &[Arc<ObjectSnapshot>];

    /// Snapshot of an object, if the object is in the frame
    fn object(&self, id: ObjectId) -> Option<&Arc<ObjectSnapshot>>;

    /// Check if an object is in the frame
    fn contains(&self, id: ObjectId) -> bool {
        self.object(id).is_some()
    }

    /// Check if a specific version is in the frame
    fn contains_snapshot(&self, snapshot_id: SnapshotId) -> bool {
        self.snapshots()
            .iter()
            .any(|s| s.snapshot_id() == snapshot_id)
    }

    /// Number of objects
    fn len(&self) -> usize {
        self.snapshots().len()
    }

    /// Check if the frame has no objects
    fn is_empty(&self) -> bool {
        self.snapshots().is_empty()
    }

    /// Object identities in frame order
    fn object_ids(&self) -> Vec<ObjectId> {
        self.snapshots().iter().map(|s| s.id()).collect()
    }

    /// Objects of the given type
    fn filter_type(&self, type_name: &str) -> Vec<&Arc<ObjectSnapshot>> {
        self.snapshots()
            .iter()
            .filter(|s| s.type_name() == type_name)
            .collect()
    }

    /// Node objects
    fn nodes(&self) -> Vec<&Arc<ObjectSnapshot>> {
        self.snapshots()
            .iter()
            .filter(|s| s.structure().structural_type() == StructuralType::Node)
            .collect()
    }

    /// Edge objects
    fn edges(&self) -> Vec<&Arc<ObjectSnapshot>> {
        self.snapshots()
            .iter()
            .filter(|s| s.structure().structural_type() == StructuralType::Edge)
            .collect()
    }

    /// Edges leaving `origin`
    fn outgoing(&self, origin: ObjectId) -> Vec<&Arc<ObjectSnapshot>> {
        self.snapshots()
            .iter()
            .filter(|s| matches!(s.structure(), Structure::Edge { origin: o, .. } if *o == origin))
            .collect()
    }

    /// Edges arriving at `target`
    fn incoming(&self, target: ObjectId) -> Vec<&Arc<ObjectSnapshot>> {
        self.snapshots()
            .iter()
            .filter(|s| matches!(s.structure(), Structure::Edge { target: t, .. } if *t == target))
            .collect()
    }

    /// Children of an object, in order
    fn children_of(&self, id: ObjectId) -> Vec<&Arc<ObjectSnapshot>> {
        match self.object(id) {
            Some(parent) => parent
                .children()
                .iter()
                .filter_map(|c| self.object(*c))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Run full structural validation
    fn validate(&self) -> IntegrityReport {
        validate_structure(self)
    }
}

// ============================================================================
// Shared storage
// ============================================================================

/// Ordered snapshots with an object-id index
#[derive(Debug, Clone, Default)]
struct FrameContent {
    snapshots: Vec<Arc<ObjectSnapshot>>,
    index: HashMap<ObjectId, usize>,
}

impl FrameContent {
    fn from_snapshots(snapshots: Vec<Arc<ObjectSnapshot>>) -> std::result::Result<Self, ObjectId> {
        let mut content = FrameContent {
            snapshots: Vec::with_capacity(snapshots.len()),
            index: HashMap::with_capacity(snapshots.len()),
        };
        for snapshot in snapshots {
            content.insert(snapshot)?;
        }
        Ok(content)
    }

    fn get(&self, id: ObjectId) -> Option<&Arc<ObjectSnapshot>> {
        self.index.get(&id).map(|i| &self.snapshots[*i])
    }

    fn insert(&mut self, snapshot: Arc<ObjectSnapshot>) -> std::result::Result<(), ObjectId> {
        let id = snapshot.id();
        if self.index.contains_key(&id) {
            return Err(id);
        }
        self.index.insert(id, self.snapshots.len());
        self.snapshots.push(snapshot);
        Ok(())
    }

    fn replace(&mut self, snapshot: Arc<ObjectSnapshot>) {
        let i = *self
            .index
            .get(&snapshot.id())
            .expect("replaced object must be in the frame");
        self.snapshots[i] = snapshot;
    }

    fn remove_all(&mut self, ids: &HashSet<ObjectId>) {
        self.snapshots.retain(|s| !ids.contains(&s.id()));
        self.index = self
            .snapshots
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id(), i))
            .collect();
    }
}

// ============================================================================
// Stable frame
// ============================================================================

/// Immutable, validated frame
#[derive(Debug, Clone)]
pub struct StableFrame {
    id: FrameId,
    content: FrameContent,
}

impl StableFrame {
    /// Build a stable frame, running full structural validation
    ///
    /// # Errors
    /// - `DuplicateObject` if two snapshots share an object identity
    /// - `BrokenStructure` with every violation found otherwise
    pub fn validated(
        id: FrameId,
        snapshots: Vec<Arc<ObjectSnapshot>>,
    ) -> std::result::Result<Self, FrameValidationError> {
        let content =
            FrameContent::from_snapshots(snapshots).map_err(FrameValidationError::DuplicateObject)?;
        let frame = StableFrame { id, content };
        let report = validate_structure(&frame);
        if !report.is_valid() {
            return Err(FrameValidationError::BrokenStructure(report.violations));
        }
        Ok(frame)
    }

    /// Snapshot identities in frame order
    pub fn snapshot_ids(&self) -> Vec<SnapshotId> {
        self.content
            .snapshots
            .iter()
            .map(|s| s.snapshot_id())
            .collect()
    }
}

impl FrameView for StableFrame {
    fn id(&self) -> FrameId {
        self.id
    }

    fn snapshots(&self) -> &[Arc<ObjectSnapshot>] {
        &self.content.snapshots
    }

    fn object(&self, id: ObjectId) -> Option<&Arc<ObjectSnapshot>> {
        self.content.get(id)
    }
}

// ============================================================================
// Transient frame
// ============================================================================

/// Mutable frame under construction
///
/// Created by [`Design::create_frame`] or [`Design::derive_frame`].
/// Mutations never touch an existing snapshot: the first change to an
/// object inherited from another frame derives a new version of it.
pub struct TransientFrame<'d> {
    design: &'d mut Design,
    id: FrameId,
    content: FrameContent,
    /// Versions created while this frame is open (safe to rewrite)
    fresh: HashSet<SnapshotId>,
    /// Identities reserved on behalf of this frame
    reservations: Vec<EntityId>,
    accepted: bool,
}

impl<'d> TransientFrame<'d> {
    pub(crate) fn new(
        design: &'d mut Design,
        id: FrameId,
        snapshots: Vec<Arc<ObjectSnapshot>>,
    ) -> Self {
        let content = FrameContent::from_snapshots(snapshots)
            .expect("snapshots of a stable frame are unique per object");
        TransientFrame {
            design,
            id,
            content,
            fresh: HashSet::new(),
            reservations: vec![id.entity()],
            accepted: false,
        }
    }

    /// Design this frame belongs to
    pub fn design(&self) -> &Design {
        self.design
    }

    /// Identity manager of the owning design
    ///
    /// Used by loaders that reserve identities before inserting into the
    /// frame. Reservations made here must be handed over with
    /// [`adopt_reservations`](Self::adopt_reservations) or released.
    pub fn identities_mut(&mut self) -> &mut IdentityManager {
        self.design.identities_mut()
    }

    /// Take ownership of reservations made through `identities_mut`
    ///
    /// They are committed by `accept` and released if the frame is dropped.
    pub fn adopt_reservations<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = EntityId>,
    {
        self.reservations.extend(ids);
    }

    fn reserve(&mut self, kind: IdKind) -> EntityId {
        let id = self.design.identities_mut().create_and_reserve(kind);
        self.reservations.push(id);
        id
    }

    fn unreserve(&mut self, ids: &[EntityId]) {
        self.reservations.retain(|r| !ids.contains(r));
        self.design.identities_mut().release(ids.iter().copied());
    }

    /// Create a new object with the type's default attributes
    ///
    /// # Errors
    /// `StructuralTypeMismatch` if `structure` does not fit `object_type`.
    pub fn create(
        &mut self,
        object_type: Arc<ObjectType>,
        structure: Structure,
    ) -> Result<ObjectId> {
        let object_id = ObjectId::new(self.reserve(IdKind::Object));
        let snapshot_id = SnapshotId::new(self.reserve(IdKind::Snapshot));
        let defaults = object_type.default_attributes();

        match ObjectSnapshot::new(object_id, snapshot_id, object_type, structure) {
            Ok(snapshot) => {
                let snapshot = snapshot.with_attributes(defaults);
                self.fresh.insert(snapshot_id);
                self.content
                    .insert(Arc::new(snapshot))
                    .expect("freshly reserved object id cannot be in the frame");
                Ok(object_id)
            }
            Err(e) => {
                self.unreserve(&[object_id.entity(), snapshot_id.entity()]);
                Err(e)
            }
        }
    }

    /// Insert an existing snapshot
    ///
    /// # Errors
    /// `DuplicateObject` if a version of the object is already present.
    pub fn insert(&mut self, snapshot: Arc<ObjectSnapshot>) -> Result<()> {
        self.content
            .insert(snapshot)
            .map_err(DesignError::DuplicateObject)
    }

    /// Remove a batch of objects previously inserted, without cascading
    pub fn remove_inserted(&mut self, ids: &[ObjectId]) {
        let ids: HashSet<ObjectId> = ids.iter().copied().collect();
        self.content.remove_all(&ids);
    }

    fn mutable_copy(&mut self, id: ObjectId) -> Result<ObjectSnapshot> {
        let current = Arc::clone(self.content.get(id).ok_or(DesignError::UnknownObject(id))?);
        if self.fresh.contains(&current.snapshot_id()) {
            return Ok((*current).clone());
        }
        let snapshot_id = SnapshotId::new(self.reserve(IdKind::Snapshot));
        self.fresh.insert(snapshot_id);
        Ok(current.derive(snapshot_id))
    }

    fn store(&mut self, snapshot: ObjectSnapshot) {
        self.content.replace(Arc::new(snapshot));
    }

    /// Set an attribute, deriving a new version if needed
    pub fn set_attribute(
        &mut self,
        id: ObjectId,
        name: impl Into<String>,
        value: Variant,
    ) -> Result<()> {
        let mut snapshot = self.mutable_copy(id)?;
        snapshot.attributes_mut().insert(name.into(), value);
        self.store(snapshot);
        Ok(())
    }

    /// Make `child` the last child of `parent`
    ///
    /// # Errors
    /// - `UnknownObject` if either object is missing
    /// - `ParentCycle` if `parent` is `child` or one of its descendants
    pub fn set_parent(&mut self, child: ObjectId, parent: ObjectId) -> Result<()> {
        if !self.contains(child) {
            return Err(DesignError::UnknownObject(child));
        }
        let mut ancestor = Some(parent);
        while let Some(a) = ancestor {
            if a == child {
                return Err(DesignError::ParentCycle(child));
            }
            ancestor = self
                .object(a)
                .ok_or(DesignError::UnknownObject(a))?
                .parent();
        }

        self.remove_from_parent(child)?;

        let mut c = self.mutable_copy(child)?;
        *c.parent_mut() = Some(parent);
        self.store(c);

        let mut p = self.mutable_copy(parent)?;
        p.children_mut().push(child);
        self.store(p);
        Ok(())
    }

    /// Detach `child` from its parent, if it has one
    pub fn remove_from_parent(&mut self, child: ObjectId) -> Result<()> {
        let parent = match self.object(child).ok_or(DesignError::UnknownObject(child))?.parent() {
            Some(parent) => parent,
            None => return Ok(()),
        };

        let mut c = self.mutable_copy(child)?;
        *c.parent_mut() = None;
        self.store(c);

        if self.contains(parent) {
            let mut p = self.mutable_copy(parent)?;
            p.children_mut().retain(|x| *x != child);
            self.store(p);
        }
        Ok(())
    }

    /// Remove an object together with everything that depends on it
    ///
    /// Cascades to children, to edges whose origin or target is removed and
    /// to ordered sets whose owner is removed. Removed objects are dropped
    /// from surviving parents' child lists and ordered-set items.
    ///
    /// Returns the removed object identities.
    pub fn remove_cascading(&mut self, id: ObjectId) -> Result<Vec<ObjectId>> {
        if !self.contains(id) {
            return Err(DesignError::UnknownObject(id));
        }

        let mut removed: Vec<ObjectId> = Vec::new();
        let mut seen: HashSet<ObjectId> = HashSet::new();
        let mut queue = vec![id];

        while let Some(current) = queue.pop() {
            if !seen.insert(current) {
                continue;
            }
            removed.push(current);
            if let Some(snapshot) = self.content.get(current) {
                queue.extend(snapshot.children().iter().copied());
            }
            for snapshot in &self.content.snapshots {
                let dependent = match snapshot.structure() {
                    Structure::Edge { origin, target } => *origin == current || *target == current,
                    Structure::OrderedSet { owner, .. } => *owner == current,
                    _ => false,
                };
                if dependent {
                    queue.push(snapshot.id());
                }
            }
        }

        self.content.remove_all(&seen);

        let to_fix: Vec<ObjectId> = self
            .content
            .snapshots
            .iter()
            .filter(|s| {
                s.children().iter().any(|c| seen.contains(c))
                    || matches!(s.structure(), Structure::OrderedSet { items, .. }
                        if items.iter().any(|i| seen.contains(i)))
            })
            .map(|s| s.id())
            .collect();

        for object in to_fix {
            let mut snapshot = self.mutable_copy(object)?;
            snapshot.children_mut().retain(|c| !seen.contains(c));
            if let Structure::OrderedSet { items, .. } = snapshot.structure_mut() {
                items.retain(|i| !seen.contains(i));
            }
            self.store(snapshot);
        }

        debug!(target: "trellis::design", frame = %self.id, removed = removed.len(), "Objects removed");
        Ok(removed)
    }

    /// Validate and promote this frame into the design's history
    ///
    /// On success the frame's reservations are committed. On failure the
    /// frame is discarded and its reservations released.
    pub fn accept(mut self) -> std::result::Result<FrameId, FrameValidationError> {
        let snapshots = std::mem::take(&mut self.content).snapshots;
        let frame = StableFrame::validated(self.id, snapshots)?;
        let reservations = std::mem::take(&mut self.reservations);

        self.design.insert_stable_frames(vec![frame], reservations);
        self.accepted = true;

        info!(target: "trellis::design", frame = %self.id, "Frame accepted");
        Ok(self.id)
    }

    /// Drop this frame and release its reservations
    pub fn discard(self) {}
}

impl FrameView for TransientFrame<'_> {
    fn id(&self) -> FrameId {
        self.id
    }

    fn snapshots(&self) -> &[Arc<ObjectSnapshot>] {
        &self.content.snapshots
    }

    fn object(&self, id: ObjectId) -> Option<&Arc<ObjectSnapshot>> {
        self.content.get(id)
    }
}

impl Drop for TransientFrame<'_> {
    fn drop(&mut self) {
        if !self.accepted {
            let reservations = std::mem::take(&mut self.reservations);
            debug!(
                target: "trellis::design",
                frame = %self.id,
                released = reservations.len(),
                "Transient frame discarded"
            );
            self.design.identities_mut().release(reservations);
        }
    }
}
