//! Identity manager
//!
//! Process-local allocator and registry for object, snapshot and frame
//! identities. Every allocated value is tagged with the kind that owns it.
//!
//! ## Two-phase reservation
//!
//! ```text
//! 1. reserve() / reserve_if_needed() / create_and_reserve()
//!    - value becomes *reserved* (invisible to nobody, releasable)
//! 2a. commit(ids)  - reserved values become permanently *used*
//! 2b. release(ids) - reserved values are forgotten
//! ```
//!
//! A value is unavailable while it is either reserved or used. Releasing a
//! batch restores the used/reserved sets to what they were before the batch
//! was reserved. The allocation counter is never rewound, so a released
//! value may simply be skipped by later allocations.

use crate::types::{EntityId, IdKind};
use std::collections::HashMap;
use tracing::debug;

/// Registry of allocated identities
///
/// Not designed for concurrent writers: callers serialize access, typically
/// by owning one manager per design.
#[derive(Debug, Clone)]
pub struct IdentityManager {
    /// Permanently allocated values
    used: HashMap<EntityId, IdKind>,
    /// Values reserved by an in-flight operation, not yet committed
    reserved: HashMap<EntityId, IdKind>,
    /// Next candidate for fresh allocation
    next: u64,
}

impl Default for IdentityManager {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityManager {
    /// Create an empty identity manager
    ///
    /// Fresh allocation starts at 1.
    pub fn new() -> Self {
        IdentityManager {
            used: HashMap::new(),
            reserved: HashMap::new(),
            next: 1,
        }
    }

    /// Check whether a value is reserved or used by any kind
    pub fn contains(&self, id: EntityId) -> bool {
        self.used.contains_key(&id) || self.reserved.contains_key(&id)
    }

    /// Check whether a value is permanently used
    pub fn is_used(&self, id: EntityId) -> bool {
        self.used.contains_key(&id)
    }

    /// Check whether a value is reserved but not yet committed
    pub fn is_reserved(&self, id: EntityId) -> bool {
        self.reserved.contains_key(&id)
    }

    /// Kind that owns a value, whether reserved or used
    pub fn kind(&self, id: EntityId) -> Option<IdKind> {
        self.used
            .get(&id)
            .or_else(|| self.reserved.get(&id))
            .copied()
    }

    /// Number of permanently used values
    pub fn used_count(&self) -> usize {
        self.used.len()
    }

    /// Number of outstanding reservations
    pub fn reserved_count(&self) -> usize {
        self.reserved.len()
    }

    /// Reserve a specific value
    ///
    /// Returns false if the value is already reserved or used, regardless
    /// of kind.
    pub fn reserve(&mut self, id: EntityId, kind: IdKind) -> bool {
        if self.contains(id) {
            return false;
        }
        self.reserved.insert(id, kind);
        true
    }

    /// Reserve a value unless it is already owned by the same kind
    ///
    /// Returns true if the value was free (and is now reserved) or is
    /// already reserved or used with `kind`. Returns false if another kind
    /// owns it.
    pub fn reserve_if_needed(&mut self, id: EntityId, kind: IdKind) -> bool {
        match self.kind(id) {
            Some(existing) => existing == kind,
            None => {
                self.reserved.insert(id, kind);
                true
            }
        }
    }

    /// Allocate and reserve a fresh, unused value
    pub fn create_and_reserve(&mut self, kind: IdKind) -> EntityId {
        loop {
            let candidate = EntityId::new(self.next);
            self.next += 1;
            if !self.contains(candidate) {
                self.reserved.insert(candidate, kind);
                return candidate;
            }
        }
    }

    /// Make a batch of reservations permanent
    ///
    /// # Panics
    ///
    /// Panics if an id was neither reserved nor already used. Committing an
    /// unknown id means the caller's own bookkeeping is broken.
    pub fn commit<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = EntityId>,
    {
        let mut count = 0usize;
        for id in ids {
            if let Some(kind) = self.reserved.remove(&id) {
                self.used.insert(id, kind);
                count += 1;
            } else {
                assert!(
                    self.used.contains_key(&id),
                    "committing identity {id} that was never reserved"
                );
            }
        }
        debug!(target: "trellis::identity", committed = count, "Identities committed");
    }

    /// Drop a batch of uncommitted reservations
    ///
    /// Ids that are already committed are left untouched.
    pub fn release<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = EntityId>,
    {
        let mut count = 0usize;
        for id in ids {
            if self.reserved.remove(&id).is_some() {
                count += 1;
            }
        }
        debug!(target: "trellis::identity", released = count, "Reservations released");
    }
}
