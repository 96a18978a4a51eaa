//! Phase 3: resolve structural references, parents and child lists
//!
//! References may only point at objects of the batch. A child list given by
//! a foreign producer assigns its owner as parent to every version of a
//! child when no version names a parent; otherwise some version must
//! already name the owner.

use super::Reserved;
use crate::error::{DesignLoaderError, ItemError, RawCollection, Result};
use std::collections::HashMap;
use tracing::debug;
use trellis_core::{IdKind, ObjectId};
use trellis_foreign::RawId;

/// Batch with every object reference resolved
pub(crate) struct ResolvedReferences<'r> {
    pub(super) reserved: Reserved<'r>,
    /// Structural references per snapshot
    pub(super) references: Vec<Vec<ObjectId>>,
    /// Parent per snapshot
    pub(super) parents: Vec<Option<ObjectId>>,
    /// Explicit child order per snapshot (empty if none given)
    pub(super) child_orders: Vec<Vec<ObjectId>>,
}

impl<'r> Reserved<'r> {
    /// Resolve references against the batch
    ///
    /// # Errors
    /// - `UnknownId` for a reference to an object outside the batch
    /// - `IdTypeMismatch` for a name bound to a snapshot or frame
    /// - `ChildrenMismatch` if a child list contradicts parent pointers
    /// - `ParentCycle` if an object lists itself as a child
    pub(crate) fn resolve_references(self) -> Result<ResolvedReferences<'r>> {
        let count = self.snapshots.len();
        let mut references = Vec::with_capacity(count);
        let mut parents = Vec::with_capacity(count);
        let mut child_orders = Vec::with_capacity(count);

        for (index, raw) in self.snapshots.iter().enumerate() {
            let at = |e| DesignLoaderError::item(RawCollection::Snapshots, index, e);
            references.push(
                self.resolve_all(&raw.structure.references)
                    .map_err(at)?,
            );
            parents.push(
                raw.parent
                    .as_ref()
                    .map(|p| self.resolve_object(p))
                    .transpose()
                    .map_err(at)?,
            );
            child_orders.push(self.resolve_all(&raw.children).map_err(at)?);
        }

        self.apply_child_lists(&child_orders, &mut parents)?;

        debug!(target: "trellis::loader", snapshots = count, "References resolved");
        Ok(ResolvedReferences {
            reserved: self,
            references,
            parents,
            child_orders,
        })
    }

    fn resolve_object(&self, raw: &RawId) -> std::result::Result<ObjectId, ItemError> {
        self.table.resolve(raw, IdKind::Object).map(ObjectId::new)
    }

    fn resolve_all(&self, raw: &[RawId]) -> std::result::Result<Vec<ObjectId>, ItemError> {
        raw.iter().map(|r| self.resolve_object(r)).collect()
    }

    fn apply_child_lists(
        &self,
        child_orders: &[Vec<ObjectId>],
        parents: &mut [Option<ObjectId>],
    ) -> Result<()> {
        let mut versions: HashMap<ObjectId, Vec<usize>> = HashMap::new();
        for (index, object) in self.objects.iter().enumerate() {
            versions.entry(*object).or_default().push(index);
        }

        let mut claims: HashMap<usize, ObjectId> = HashMap::new();
        for (index, children) in child_orders.iter().enumerate() {
            let owner = self.objects[index];
            let mismatch = || {
                DesignLoaderError::item(
                    RawCollection::Snapshots,
                    index,
                    ItemError::ChildrenMismatch(self.snapshot_ids[index]),
                )
            };

            for child in children {
                if *child == owner {
                    return Err(DesignLoaderError::item(
                        RawCollection::Snapshots,
                        index,
                        ItemError::ParentCycle(owner),
                    ));
                }
                let child_versions = versions.get(child).map(Vec::as_slice).unwrap_or(&[]);
                let named: Vec<ObjectId> =
                    child_versions.iter().filter_map(|&v| parents[v]).collect();
                if named.is_empty() {
                    for &version in child_versions {
                        match claims.insert(version, owner) {
                            Some(previous) if previous != owner => return Err(mismatch()),
                            _ => {}
                        }
                    }
                } else if !named.contains(&owner) {
                    return Err(mismatch());
                }
            }
        }

        for (version, owner) in claims {
            parents[version] = Some(owner);
        }
        Ok(())
    }
}
