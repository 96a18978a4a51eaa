//! Phase 2: bind every raw identity of the batch
//!
//! Free concrete values are bound first, in a separate pass, so that fresh
//! allocations for names, missing identities and replaced values can never
//! take a value the document asks for.

use super::{filled, IdentityTable, RawKey, Validated};
use crate::config::IdentityStrategy;
use crate::error::{DesignLoaderError, ItemError, RawCollection, Result};
use crate::reservation::Reservation;
use tracing::debug;
use trellis_core::{EntityId, FrameId, IdKind, ObjectId, SnapshotId};
use trellis_foreign::{RawFrame, RawId, RawSnapshot};

/// Batch with every snapshot and frame bound to a reserved identity
pub(crate) struct Reserved<'r> {
    pub(super) snapshots: &'r [RawSnapshot],
    pub(super) frames: &'r [RawFrame],
    pub(super) table: IdentityTable,
    pub(super) objects: Vec<ObjectId>,
    pub(super) snapshot_ids: Vec<SnapshotId>,
    pub(super) frame_ids: Vec<FrameId>,
}

impl<'r> Validated<'r> {
    /// Reserve identities under `strategy`
    ///
    /// # Errors
    /// - `DuplicateId` if a required value is already used by the same kind
    /// - `IdTypeMismatch` if a value or name is bound to another kind
    /// - `ReservationConflict` if a required value is reserved elsewhere
    pub(crate) fn reserve(
        self,
        reservation: &mut Reservation<'_>,
        strategy: IdentityStrategy,
    ) -> Result<Reserved<'r>> {
        let Validated { snapshots, frames } = self;
        let mut binder = Binder {
            reservation: &mut *reservation,
            strategy,
            table: IdentityTable::default(),
        };

        let mut objects: Vec<Option<EntityId>> = vec![None; snapshots.len()];
        let mut versions: Vec<Option<EntityId>> = vec![None; snapshots.len()];
        let mut frame_ids: Vec<Option<EntityId>> = vec![None; frames.len()];

        // Concrete values; taken ones are left for the second pass
        for (index, raw) in snapshots.iter().enumerate() {
            let at = |e| DesignLoaderError::item(RawCollection::Snapshots, index, e);
            if let Some(id) = concrete(raw.id.as_ref()) {
                objects[index] = binder.bind_concrete(id, IdKind::Object).map_err(at)?;
            }
            if let Some(id) = concrete(raw.snapshot_id.as_ref()) {
                versions[index] = binder.bind_concrete(id, IdKind::Snapshot).map_err(at)?;
            }
        }
        for (index, raw) in frames.iter().enumerate() {
            if let Some(id) = concrete(raw.id.as_ref()) {
                frame_ids[index] = binder
                    .bind_concrete(id, IdKind::Frame)
                    .map_err(|e| DesignLoaderError::item(RawCollection::Frames, index, e))?;
            }
        }

        // Names, missing identities and replacements
        for (index, raw) in snapshots.iter().enumerate() {
            let at = |e| DesignLoaderError::item(RawCollection::Snapshots, index, e);
            if objects[index].is_none() {
                objects[index] = Some(
                    binder
                        .bind_optional(raw.id.as_ref(), IdKind::Object)
                        .map_err(at)?,
                );
            }
            if versions[index].is_none() {
                versions[index] = Some(
                    binder
                        .bind_optional(raw.snapshot_id.as_ref(), IdKind::Snapshot)
                        .map_err(at)?,
                );
            }
        }
        for (index, raw) in frames.iter().enumerate() {
            if frame_ids[index].is_none() {
                frame_ids[index] = Some(
                    binder
                        .bind_optional(raw.id.as_ref(), IdKind::Frame)
                        .map_err(|e| DesignLoaderError::item(RawCollection::Frames, index, e))?,
                );
            }
        }

        let Binder { table, .. } = binder;
        debug!(
            target: "trellis::loader",
            strategy = %strategy,
            reserved = reservation.len(),
            "Identities reserved"
        );

        Ok(Reserved {
            snapshots,
            frames,
            table,
            objects: filled(objects, "object").into_iter().map(ObjectId::new).collect(),
            snapshot_ids: filled(versions, "snapshot")
                .into_iter()
                .map(SnapshotId::new)
                .collect(),
            frame_ids: filled(frame_ids, "frame").into_iter().map(FrameId::new).collect(),
        })
    }
}

fn concrete(id: Option<&RawId>) -> Option<&RawId> {
    id.filter(|id| id.as_entity().is_some())
}

/// Strategy-aware binding of raw identities
struct Binder<'a, 'b> {
    reservation: &'a mut Reservation<'b>,
    strategy: IdentityStrategy,
    table: IdentityTable,
}

impl Binder<'_, '_> {
    /// Bind a concrete value if it can be held as is
    ///
    /// Under `PreserveOrCreate` a taken value yields `None` and gets its
    /// replacement from [`Binder::bind`] once every free value is held.
    fn bind_concrete(
        &mut self,
        raw: &RawId,
        kind: IdKind,
    ) -> std::result::Result<Option<EntityId>, ItemError> {
        let key = RawKey::from(raw);
        if let Some(id) = self.table.get(kind, &key) {
            return Ok(Some(id));
        }
        match (self.strategy, raw.as_entity()) {
            (IdentityStrategy::PreserveOrCreate, Some(value)) => {
                if self.reservation.reserve(value, kind) {
                    self.table.insert(kind, key, value);
                    Ok(Some(value))
                } else {
                    Ok(None)
                }
            }
            _ => self.bind(raw, kind).map(Some),
        }
    }

    /// Bind a raw identity, or allocate when there is none
    fn bind_optional(
        &mut self,
        raw: Option<&RawId>,
        kind: IdKind,
    ) -> std::result::Result<EntityId, ItemError> {
        match raw {
            Some(raw) => self.bind(raw, kind),
            None => Ok(self.reservation.allocate(kind)),
        }
    }

    /// Bind a raw identity; repeated raw identities of one kind share a binding
    fn bind(&mut self, raw: &RawId, kind: IdKind) -> std::result::Result<EntityId, ItemError> {
        let key = RawKey::from(raw);
        if let Some(id) = self.table.get(kind, &key) {
            return Ok(id);
        }

        let id = match raw.as_entity() {
            Some(value) => self.bind_value(raw, value, kind)?,
            None => {
                if let Some(found) = self.table.other_kind(&key, kind) {
                    return Err(ItemError::IdTypeMismatch {
                        id: raw.clone(),
                        expected: kind,
                        found,
                    });
                }
                self.reservation.allocate(kind)
            }
        };

        self.table.insert(kind, key, id);
        Ok(id)
    }

    fn bind_value(
        &mut self,
        raw: &RawId,
        value: EntityId,
        kind: IdKind,
    ) -> std::result::Result<EntityId, ItemError> {
        match self.strategy {
            IdentityStrategy::CreateNew => Ok(self.reservation.allocate(kind)),
            IdentityStrategy::PreserveOrCreate => {
                if self.reservation.reserve(value, kind) {
                    Ok(value)
                } else {
                    Ok(self.reservation.allocate(kind))
                }
            }
            IdentityStrategy::RequireProvided => {
                if self.reservation.reserve(value, kind) {
                    return Ok(value);
                }
                let identities = self.reservation.identities();
                Err(match identities.kind(value) {
                    Some(found) if found != kind => ItemError::IdTypeMismatch {
                        id: raw.clone(),
                        expected: kind,
                        found,
                    },
                    _ if identities.is_used(value) => ItemError::DuplicateId(value),
                    _ => ItemError::ReservationConflict(value),
                })
            }
        }
    }
}
