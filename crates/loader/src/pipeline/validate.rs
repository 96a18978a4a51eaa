//! Phase 1: reject duplicate raw identities before anything is reserved

use super::RawKey;
use crate::error::{DesignLoaderError, ItemError, RawCollection, Result};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::debug;
use trellis_foreign::{RawFrame, RawId, RawSnapshot};

/// Batch whose raw snapshot and frame identities are pairwise distinct
pub(crate) struct Validated<'r> {
    pub(super) snapshots: &'r [RawSnapshot],
    pub(super) frames: &'r [RawFrame],
}

impl<'r> Validated<'r> {
    /// Check a batch
    ///
    /// A duplicate is reported at the index of its first occurrence.
    pub(crate) fn new(snapshots: &'r [RawSnapshot], frames: &'r [RawFrame]) -> Result<Self> {
        if let Some((index, id)) = first_duplicate(snapshots.iter().map(|s| s.snapshot_id.as_ref()))
        {
            return Err(DesignLoaderError::item(
                RawCollection::Snapshots,
                index,
                ItemError::DuplicateForeignId(id.clone()),
            ));
        }
        if let Some((index, id)) = first_duplicate(frames.iter().map(|f| f.id.as_ref())) {
            return Err(DesignLoaderError::item(
                RawCollection::Frames,
                index,
                ItemError::DuplicateForeignId(id.clone()),
            ));
        }

        debug!(
            target: "trellis::loader",
            snapshots = snapshots.len(),
            frames = frames.len(),
            "Batch validated"
        );
        Ok(Validated { snapshots, frames })
    }
}

/// Index of the first occurrence of the first repeated identity
fn first_duplicate<'a, I>(ids: I) -> Option<(usize, &'a RawId)>
where
    I: Iterator<Item = Option<&'a RawId>>,
{
    let mut first: HashMap<RawKey, usize> = HashMap::new();
    for (index, id) in ids.enumerate() {
        let Some(id) = id else { continue };
        match first.entry(RawKey::from(id)) {
            Entry::Occupied(e) => return Some((*e.get(), id)),
            Entry::Vacant(e) => {
                e.insert(index);
            }
        }
    }
    None
}
