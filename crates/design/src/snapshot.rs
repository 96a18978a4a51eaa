//! Object snapshots
//!
//! An [`ObjectSnapshot`] is one immutable version of one logical object.
//! Snapshots are built once, wrapped in `Arc`, and shared by every frame
//! that contains that version. A new version is produced with
//! [`ObjectSnapshot::derive`], which keeps the object identity and assigns a
//! new snapshot identity.

use crate::error::{DesignError, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use trellis_core::{ObjectId, ObjectType, SnapshotId, StructuralType, Variant};

/// Relational structure of an object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Structure {
    /// No relational role
    Unstructured,
    /// Graph node
    Node,
    /// Directed edge between two nodes
    Edge {
        /// Origin node
        origin: ObjectId,
        /// Target node
        target: ObjectId,
    },
    /// Ordered list of references owned by another object
    OrderedSet {
        /// Owner of the set
        owner: ObjectId,
        /// Referenced objects, in order
        items: Vec<ObjectId>,
    },
}

impl Structure {
    /// Structural type of this structure
    pub fn structural_type(&self) -> StructuralType {
        match self {
            Structure::Unstructured => StructuralType::Unstructured,
            Structure::Node => StructuralType::Node,
            Structure::Edge { .. } => StructuralType::Edge,
            Structure::OrderedSet { .. } => StructuralType::OrderedSet,
        }
    }

    /// All objects this structure refers to, in order
    ///
    /// Edge: `[origin, target]`, ordered set: `[owner, items...]`.
    pub fn references(&self) -> Vec<ObjectId> {
        match self {
            Structure::Unstructured | Structure::Node => Vec::new(),
            Structure::Edge { origin, target } => vec![*origin, *target],
            Structure::OrderedSet { owner, items } => {
                let mut refs = Vec::with_capacity(items.len() + 1);
                refs.push(*owner);
                refs.extend(items.iter().copied());
                refs
            }
        }
    }
}

/// One immutable version of an object
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSnapshot {
    object_id: ObjectId,
    snapshot_id: SnapshotId,
    object_type: Arc<ObjectType>,
    structure: Structure,
    parent: Option<ObjectId>,
    children: Vec<ObjectId>,
    attributes: BTreeMap<String, Variant>,
}

impl ObjectSnapshot {
    /// Create a snapshot without parent, children or attributes
    ///
    /// # Errors
    /// Returns `StructuralTypeMismatch` if the structure kind differs from
    /// the structural type declared by `object_type`.
    pub fn new(
        object_id: ObjectId,
        snapshot_id: SnapshotId,
        object_type: Arc<ObjectType>,
        structure: Structure,
    ) -> Result<Self> {
        let expected = object_type.structural_type;
        let found = structure.structural_type();
        if expected != found {
            return Err(DesignError::StructuralTypeMismatch { expected, found });
        }
        Ok(ObjectSnapshot {
            object_id,
            snapshot_id,
            object_type,
            structure,
            parent: None,
            children: Vec::new(),
            attributes: BTreeMap::new(),
        })
    }

    /// Set the parent
    pub fn with_parent(mut self, parent: Option<ObjectId>) -> Self {
        self.parent = parent;
        self
    }

    /// Set the ordered children
    pub fn with_children(mut self, children: Vec<ObjectId>) -> Self {
        self.children = children;
        self
    }

    /// Replace all attributes
    pub fn with_attributes(mut self, attributes: BTreeMap<String, Variant>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Set one attribute
    pub fn with_attribute(mut self, name: impl Into<String>, value: Variant) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    /// Next version of this object with a new snapshot identity
    pub fn derive(&self, snapshot_id: SnapshotId) -> Self {
        ObjectSnapshot {
            snapshot_id,
            ..self.clone()
        }
    }

    /// Object identity
    pub fn id(&self) -> ObjectId {
        self.object_id
    }

    /// Snapshot (version) identity
    pub fn snapshot_id(&self) -> SnapshotId {
        self.snapshot_id
    }

    /// Object type
    pub fn object_type(&self) -> &Arc<ObjectType> {
        &self.object_type
    }

    /// Object type name
    pub fn type_name(&self) -> &str {
        &self.object_type.name
    }

    /// Relational structure
    pub fn structure(&self) -> &Structure {
        &self.structure
    }

    /// Parent object, if any
    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    /// Ordered children
    pub fn children(&self) -> &[ObjectId] {
        &self.children
    }

    /// All attributes
    pub fn attributes(&self) -> &BTreeMap<String, Variant> {
        &self.attributes
    }

    /// Attribute value by name
    pub fn attribute(&self, name: &str) -> Option<&Variant> {
        self.attributes.get(name)
    }

    /// Value of the `name` attribute when it is a string
    pub fn name(&self) -> Option<&str> {
        self.attribute("name").and_then(|v| v.try_str().ok())
    }

    pub(crate) fn parent_mut(&mut self) -> &mut Option<ObjectId> {
        &mut self.parent
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<ObjectId> {
        &mut self.children
    }

    pub(crate) fn structure_mut(&mut self) -> &mut Structure {
        &mut self.structure
    }

    pub(crate) fn attributes_mut(&mut self) -> &mut BTreeMap<String, Variant> {
        &mut self.attributes
    }
}
