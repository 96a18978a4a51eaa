//! Exclusive reservation state of one load
//!
//! A [`Reservation`] borrows the target identity manager mutably for the
//! whole load, so nothing else can observe or change the identity space
//! while the load is in flight. Every identity it reserves is recorded;
//! unless [`Reservation::into_ids`] hands them over for commit, dropping
//! the reservation releases all of them and the identity manager is back
//! to its pre-load state.

use tracing::debug;
use trellis_core::{EntityId, IdKind, IdentityManager};

/// Identities reserved by one in-flight load
pub struct Reservation<'a> {
    identities: &'a mut IdentityManager,
    reserved: Vec<EntityId>,
    handed_over: bool,
}

impl<'a> Reservation<'a> {
    /// Start an empty reservation
    pub fn new(identities: &'a mut IdentityManager) -> Self {
        Reservation {
            identities,
            reserved: Vec::new(),
            handed_over: false,
        }
    }

    /// Read access to the identity manager
    pub fn identities(&self) -> &IdentityManager {
        self.identities
    }

    /// Reserve a specific value
    ///
    /// Returns false if the value is reserved or used by anyone.
    pub fn reserve(&mut self, id: EntityId, kind: IdKind) -> bool {
        if self.identities.reserve(id, kind) {
            self.reserved.push(id);
            true
        } else {
            false
        }
    }

    /// Allocate and reserve a fresh value
    pub fn allocate(&mut self, kind: IdKind) -> EntityId {
        let id = self.identities.create_and_reserve(kind);
        self.reserved.push(id);
        id
    }

    /// Values reserved so far, in reservation order
    pub fn reserved(&self) -> &[EntityId] {
        &self.reserved
    }

    /// Number of values reserved so far
    pub fn len(&self) -> usize {
        self.reserved.len()
    }

    /// Check if nothing has been reserved
    pub fn is_empty(&self) -> bool {
        self.reserved.is_empty()
    }

    /// Hand the reserved values over to the caller
    ///
    /// The values stay reserved; the caller becomes responsible for
    /// committing or releasing them.
    pub fn into_ids(mut self) -> Vec<EntityId> {
        self.handed_over = true;
        std::mem::take(&mut self.reserved)
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if !self.handed_over && !self.reserved.is_empty() {
            debug!(
                target: "trellis::loader",
                released = self.reserved.len(),
                "Abandoned load, releasing reservations"
            );
            self.identities.release(self.reserved.drain(..));
        }
    }
}
