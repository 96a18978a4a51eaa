//! Collaborator contract for ingestible objects
//!
//! The loader does not care which concrete representation an external
//! producer uses. Anything that can answer the questions below can be
//! loaded; [`RawSnapshot`] is the reference implementation.

use crate::raw::{RawId, RawSnapshot, RawStructure};
use std::collections::BTreeMap;
use trellis_core::Variant;

/// Capability set of an object the loader can ingest
pub trait ForeignObject {
    /// Object type name
    fn type_name(&self) -> &str;

    /// Structure kind name, if the producer states it
    fn structural_kind(&self) -> Option<&str>;

    /// Object identity
    fn id(&self) -> Option<&RawId>;

    /// Snapshot identity
    fn snapshot_id(&self) -> Option<&RawId>;

    /// Parent object
    fn parent(&self) -> Option<&RawId>;

    /// Edge origin
    fn origin(&self) -> Option<&RawId> {
        None
    }

    /// Edge target
    fn target(&self) -> Option<&RawId> {
        None
    }

    /// Ordered-set owner
    fn owner(&self) -> Option<&RawId> {
        None
    }

    /// Ordered-set items
    fn items(&self) -> &[RawId] {
        &[]
    }

    /// Children, in order
    fn children(&self) -> &[RawId];

    /// Attribute values by name
    fn attributes(&self) -> &BTreeMap<String, Variant>;

    /// Copy into the raw data model
    fn to_raw_snapshot(&self) -> RawSnapshot {
        let references = self
            .origin()
            .into_iter()
            .chain(self.target())
            .chain(self.owner())
            .chain(self.items())
            .cloned()
            .collect();
        RawSnapshot {
            type_name: self.type_name().to_string(),
            id: self.id().cloned(),
            snapshot_id: self.snapshot_id().cloned(),
            structure: RawStructure {
                kind: self.structural_kind().map(str::to_string),
                references,
            },
            parent: self.parent().cloned(),
            children: self.children().to_vec(),
            attributes: self.attributes().clone(),
        }
    }
}

impl ForeignObject for RawSnapshot {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn structural_kind(&self) -> Option<&str> {
        self.structure.kind.as_deref()
    }

    fn id(&self) -> Option<&RawId> {
        self.id.as_ref()
    }

    fn snapshot_id(&self) -> Option<&RawId> {
        self.snapshot_id.as_ref()
    }

    fn parent(&self) -> Option<&RawId> {
        self.parent.as_ref()
    }

    fn children(&self) -> &[RawId] {
        &self.children
    }

    fn attributes(&self) -> &BTreeMap<String, Variant> {
        &self.attributes
    }

    fn to_raw_snapshot(&self) -> RawSnapshot {
        self.clone()
    }
}
