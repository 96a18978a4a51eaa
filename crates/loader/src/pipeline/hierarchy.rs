//! Phase 5: derive children from parent pointers, frame by frame

use super::frames::Scope;
use super::ResolvedFrames;
use crate::error::{DesignLoaderError, ItemError, Result};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;
use trellis_core::ObjectId;

/// Batch with one consistent child list per snapshot
pub(crate) struct ResolvedHierarchy<'r> {
    pub(super) frames: ResolvedFrames<'r>,
    /// Derived children per snapshot
    pub(super) children: Vec<Vec<ObjectId>>,
}

impl<'r> ResolvedFrames<'r> {
    /// Derive each snapshot's children within every frame containing it
    ///
    /// Children follow the snapshot's explicit child order when one was
    /// given, then frame order.
    ///
    /// # Errors
    /// - `UnknownParent` if a parent is not in the same frame
    /// - `ParentCycle` if parent pointers loop
    /// - `ChildrenMismatch` if one snapshot gets a different set of children
    ///   in different frames; the first frame's order is kept
    pub(crate) fn resolve_hierarchy(self) -> Result<ResolvedHierarchy<'r>> {
        let reserved = &self.resolved.reserved;
        let parents = &self.resolved.parents;
        let scope = self.scope;
        let mut children: Vec<Option<Vec<ObjectId>>> = vec![None; reserved.objects.len()];

        for (frame_index, members) in self.members.iter().enumerate() {
            let at = |snapshot: usize, e: ItemError| {
                let (collection, index) = scope.locate(frame_index, snapshot);
                DesignLoaderError::item(collection, index, e)
            };

            let in_frame: HashMap<ObjectId, usize> = members
                .iter()
                .map(|&index| (reserved.objects[index], index))
                .collect();

            let mut derived: HashMap<ObjectId, Vec<ObjectId>> = HashMap::new();
            for &index in members {
                if let Some(parent) = parents[index] {
                    let object = reserved.objects[index];
                    if !in_frame.contains_key(&parent) {
                        return Err(at(index, ItemError::UnknownParent { object, parent }));
                    }
                    derived.entry(parent).or_default().push(object);
                }
            }

            if let Some((index, object)) = find_cycle(members, &in_frame, |i| parents[i], |i| {
                reserved.objects[i]
            }) {
                return Err(at(index, ItemError::ParentCycle(object)));
            }

            for &index in members {
                let mut kids = derived
                    .remove(&reserved.objects[index])
                    .unwrap_or_default();
                let order = &self.resolved.child_orders[index];
                if !order.is_empty() {
                    kids.sort_by_key(|k| order.iter().position(|o| o == k).unwrap_or(usize::MAX));
                }

                if let Some(existing) = &children[index] {
                    if !same_members(existing, &kids) {
                        return Err(at(
                            index,
                            ItemError::ChildrenMismatch(reserved.snapshot_ids[index]),
                        ));
                    }
                } else {
                    children[index] = Some(kids);
                }
            }
        }

        debug!(target: "trellis::loader", "Hierarchy resolved");
        Ok(ResolvedHierarchy {
            frames: self,
            children: children.into_iter().map(Option::unwrap_or_default).collect(),
        })
    }
}

/// Whether two child lists hold the same objects, in any order
fn same_members(a: &[ObjectId], b: &[ObjectId]) -> bool {
    a.len() == b.len() && a.iter().collect::<BTreeSet<_>>() == b.iter().collect::<BTreeSet<_>>()
}

/// First parent cycle among `members`, as (snapshot index, smallest object on the cycle)
fn find_cycle<P, O>(
    members: &[usize],
    in_frame: &HashMap<ObjectId, usize>,
    parent_of: P,
    object_of: O,
) -> Option<(usize, ObjectId)>
where
    P: Fn(usize) -> Option<ObjectId>,
    O: Fn(usize) -> ObjectId,
{
    let mut settled: HashSet<usize> = HashSet::new();
    for &start in members {
        let mut path: Vec<usize> = Vec::new();
        let mut current = Some(start);
        while let Some(index) = current {
            if settled.contains(&index) {
                break;
            }
            if let Some(pos) = path.iter().position(|p| *p == index) {
                let object = path[pos..]
                    .iter()
                    .map(|i| object_of(*i))
                    .min()
                    .unwrap_or_else(|| object_of(index));
                return Some((start, object));
            }
            path.push(index);
            current = parent_of(index).and_then(|p| in_frame.get(&p).copied());
        }
        settled.extend(path);
    }
    None
}
