//! Eight-phase load pipeline
//!
//! Each phase is a type; each transition consumes the previous phase's
//! value, so phases cannot run out of order or twice:
//!
//! ```text
//! Validated          1. no duplicate raw snapshot / frame identities
//!   .reserve()       2. bind every raw identity under the strategy
//! Reserved
//!   .resolve_references()   3. structural references, parents, child lists
//! ResolvedReferences
//!   .resolve_frames()       4. frame entries -> batch snapshots
//!   .into_batch_frame()     4'. reduced path: the batch is the only frame
//! ResolvedFrames
//!   .resolve_hierarchy()    5. derived children, unknown parents, cycles
//! ResolvedHierarchy
//!   .materialize()          6. object types, structures, defaults
//! Materialized
//!   .assemble()             7. validated stable frames
//! Assembled
//!   .resolve_named()        8. history and named frame references
//! Ready
//!   .commit()               insert frames, commit reservations
//! ```
//!
//! Phases 1 to 8 never touch the target design. Identities are reserved
//! through a [`Reservation`](crate::Reservation) owned by the caller; the
//! only mutation of the design happens in [`Ready::commit`].

mod frames;
mod hierarchy;
mod materialize;
mod named;
mod references;
mod reserve;
mod validate;

pub(crate) use frames::ResolvedFrames;
pub(crate) use hierarchy::ResolvedHierarchy;
pub(crate) use materialize::Materialized;
pub(crate) use named::{Assembled, Ready, CURRENT_FRAME, REDO, UNDO};
pub(crate) use references::ResolvedReferences;
pub(crate) use reserve::Reserved;
pub(crate) use validate::Validated;

use crate::error::ItemError;
use std::collections::HashMap;
use trellis_core::{EntityId, IdKind};
use trellis_foreign::RawId;

// ============================================================================
// Identity table
// ============================================================================

/// Raw identity normalized for lookup
///
/// `RawId::Id(5)` and `RawId::Int(5)` are the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum RawKey {
    Value(u64),
    Name(String),
}

impl From<&RawId> for RawKey {
    fn from(id: &RawId) -> Self {
        match id {
            RawId::Id(id) => RawKey::Value(id.as_u64()),
            RawId::Int(value) => RawKey::Value(*value),
            RawId::String(name) => RawKey::Name(name.clone()),
        }
    }
}

const KINDS: [IdKind; 3] = [IdKind::Object, IdKind::Snapshot, IdKind::Frame];

/// Raw identity to reserved identity, per kind, for one batch
#[derive(Debug, Default)]
pub(crate) struct IdentityTable {
    entries: HashMap<(IdKind, RawKey), EntityId>,
}

impl IdentityTable {
    pub(crate) fn get(&self, kind: IdKind, key: &RawKey) -> Option<EntityId> {
        self.entries.get(&(kind, key.clone())).copied()
    }

    pub(crate) fn insert(&mut self, kind: IdKind, key: RawKey, id: EntityId) {
        self.entries.insert((kind, key), id);
    }

    /// Kind other than `kind` a name is already bound to
    pub(crate) fn other_kind(&self, key: &RawKey, kind: IdKind) -> Option<IdKind> {
        KINDS
            .into_iter()
            .filter(|k| *k != kind)
            .find(|k| self.entries.contains_key(&(*k, key.clone())))
    }

    /// Resolve a reference of the given kind within the batch
    pub(crate) fn resolve(&self, raw: &RawId, kind: IdKind) -> Result<EntityId, ItemError> {
        let key = RawKey::from(raw);
        if let Some(id) = self.get(kind, &key) {
            return Ok(id);
        }
        if let RawKey::Name(_) = key {
            if let Some(found) = self.other_kind(&key, kind) {
                return Err(ItemError::IdTypeMismatch {
                    id: raw.clone(),
                    expected: kind,
                    found,
                });
            }
        }
        Err(ItemError::UnknownId(raw.clone()))
    }
}

/// Unwrap per-item identities every pass of a phase has filled in
fn filled<T>(slots: Vec<Option<T>>, what: &str) -> Vec<T> {
    slots
        .into_iter()
        .map(|slot| slot.unwrap_or_else(|| panic!("{what} left unbound by reservation")))
        .collect()
}
