//! Raw data model
//!
//! Everything here mirrors the design document field by field and carries
//! no integrity guarantees: identities may be missing, duplicated or
//! dangling, type names may be unknown, structures may be malformed. The
//! loader is responsible for rejecting all of that.
//!
//! ## Document shape
//!
//! ```text
//! {
//!   "format_version": 1,
//!   "metamodel": "StockFlow", "metamodel_version": "0.1",
//!   "snapshots": [
//!     {"type": "Stock", "id": 1, "snapshot_id": 10, "structure": "node",
//!      "parent": 7, "attributes": {"name": {"type": "string", "value": "water"}}},
//!     {"type": "Flow", "id": 3, "structure": "edge", "from": 1, "to": 2}
//!   ],
//!   "frames": [{"id": 100, "snapshots": [10, 11, 3]}],
//!   "system_references": [{"name": "current_frame", "type": "frame", "id": 100}],
//!   "system_lists": [{"name": "undo", "item_type": "frame", "ids": [99]}]
//! }
//! ```

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use trellis_core::{EntityId, FrameId, ObjectId, SnapshotId, Variant};

/// Document format version written by this build
pub const FORMAT_VERSION: u32 = 1;

// ============================================================================
// RawId
// ============================================================================

/// Identity reference as found in a document
///
/// `Id` and `Int` are concrete identity values. `String` is a
/// human-readable name, resolved through a per-load name table and never
/// kept as a permanent identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "WireId", into = "WireId")]
pub enum RawId {
    /// Identity already resolved by the producer
    Id(EntityId),
    /// Integer identity value
    Int(u64),
    /// Name used as a cross-reference within one document
    String(String),
}

impl RawId {
    /// Concrete identity value, if this is not a name
    pub fn as_entity(&self) -> Option<EntityId> {
        match self {
            RawId::Id(id) => Some(*id),
            RawId::Int(value) => Some(EntityId::new(*value)),
            RawId::String(_) => None,
        }
    }

    /// Name, if this is a string reference
    pub fn as_name(&self) -> Option<&str> {
        match self {
            RawId::String(name) => Some(name),
            RawId::Id(_) | RawId::Int(_) => None,
        }
    }
}

impl fmt::Display for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawId::Id(id) => write!(f, "{id}"),
            RawId::Int(value) => write!(f, "{value}"),
            RawId::String(name) => write!(f, "\"{name}\""),
        }
    }
}

impl From<EntityId> for RawId {
    fn from(id: EntityId) -> Self {
        RawId::Id(id)
    }
}

impl From<ObjectId> for RawId {
    fn from(id: ObjectId) -> Self {
        RawId::Id(id.entity())
    }
}

impl From<SnapshotId> for RawId {
    fn from(id: SnapshotId) -> Self {
        RawId::Id(id.entity())
    }
}

impl From<FrameId> for RawId {
    fn from(id: FrameId) -> Self {
        RawId::Id(id.entity())
    }
}

impl From<u64> for RawId {
    fn from(value: u64) -> Self {
        RawId::Int(value)
    }
}

impl From<&str> for RawId {
    fn from(name: &str) -> Self {
        RawId::String(name.to_string())
    }
}

impl From<String> for RawId {
    fn from(name: String) -> Self {
        RawId::String(name)
    }
}

/// Document encoding of an identity: a number or a string
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum WireId {
    Int(u64),
    String(String),
}

impl From<WireId> for RawId {
    fn from(wire: WireId) -> Self {
        match wire {
            WireId::Int(value) => RawId::Int(value),
            WireId::String(name) => RawId::String(name),
        }
    }
}

impl From<RawId> for WireId {
    fn from(id: RawId) -> Self {
        match id {
            RawId::Id(id) => WireId::Int(id.as_u64()),
            RawId::Int(value) => WireId::Int(value),
            RawId::String(name) => WireId::String(name),
        }
    }
}

// ============================================================================
// RawStructure / RawSnapshot
// ============================================================================

/// Structure kind and its references, unchecked
///
/// References are ordered: edges hold `[from, to]`, ordered sets hold
/// `[owner, items...]`. A missing kind defers to the object type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawStructure {
    /// Structure kind name (`"unstructured"`, `"node"`, `"edge"`, `"ordered_set"`)
    pub kind: Option<String>,
    /// Structural references
    pub references: Vec<RawId>,
}

impl RawStructure {
    /// Structure with an explicit kind and references
    pub fn new(kind: impl Into<String>, references: Vec<RawId>) -> Self {
        RawStructure {
            kind: Some(kind.into()),
            references,
        }
    }

    /// Unstructured object
    pub fn unstructured() -> Self {
        RawStructure::new("unstructured", Vec::new())
    }

    /// Node
    pub fn node() -> Self {
        RawStructure::new("node", Vec::new())
    }

    /// Edge from `origin` to `target`
    pub fn edge(origin: impl Into<RawId>, target: impl Into<RawId>) -> Self {
        RawStructure::new("edge", vec![origin.into(), target.into()])
    }

    /// Ordered set owned by `owner`
    pub fn ordered_set(owner: impl Into<RawId>, items: Vec<RawId>) -> Self {
        let mut references = Vec::with_capacity(items.len() + 1);
        references.push(owner.into());
        references.extend(items);
        RawStructure::new("ordered_set", references)
    }
}

/// One object version as found in a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SnapshotRecord", into = "SnapshotRecord")]
pub struct RawSnapshot {
    /// Object type name
    pub type_name: String,
    /// Object identity
    pub id: Option<RawId>,
    /// Snapshot identity
    pub snapshot_id: Option<RawId>,
    /// Structure kind and references
    pub structure: RawStructure,
    /// Parent object
    pub parent: Option<RawId>,
    /// Children assigned by the producer
    ///
    /// Documents normally leave this empty and let parents be derived from
    /// `parent`; foreign producers that only know child lists fill it.
    pub children: Vec<RawId>,
    /// Attribute values by name
    pub attributes: BTreeMap<String, Variant>,
}

impl RawSnapshot {
    /// Snapshot of the given type with nothing else set
    pub fn new(type_name: impl Into<String>) -> Self {
        RawSnapshot {
            type_name: type_name.into(),
            id: None,
            snapshot_id: None,
            structure: RawStructure::default(),
            parent: None,
            children: Vec::new(),
            attributes: BTreeMap::new(),
        }
    }

    /// Set the object identity
    pub fn with_id(mut self, id: impl Into<RawId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the snapshot identity
    pub fn with_snapshot_id(mut self, id: impl Into<RawId>) -> Self {
        self.snapshot_id = Some(id.into());
        self
    }

    /// Set the structure
    pub fn with_structure(mut self, structure: RawStructure) -> Self {
        self.structure = structure;
        self
    }

    /// Set the parent
    pub fn with_parent(mut self, parent: impl Into<RawId>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Append a child
    pub fn with_child(mut self, child: impl Into<RawId>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Set an attribute
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Variant>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
}

/// Flat document form of a snapshot
#[derive(Serialize, Deserialize)]
struct SnapshotRecord {
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<RawId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    snapshot_id: Option<RawId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    structure: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    from: Option<RawId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    to: Option<RawId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    owner: Option<RawId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    items: Vec<RawId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent: Option<RawId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<RawId>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    attributes: BTreeMap<String, Variant>,
}

impl From<SnapshotRecord> for RawSnapshot {
    fn from(record: SnapshotRecord) -> Self {
        let references = record
            .from
            .into_iter()
            .chain(record.to)
            .chain(record.owner)
            .chain(record.items)
            .collect();
        RawSnapshot {
            type_name: record.type_name,
            id: record.id,
            snapshot_id: record.snapshot_id,
            structure: RawStructure {
                kind: record.structure,
                references,
            },
            parent: record.parent,
            children: record.children,
            attributes: record.attributes,
        }
    }
}

impl From<RawSnapshot> for SnapshotRecord {
    fn from(raw: RawSnapshot) -> Self {
        let RawStructure { kind, references } = raw.structure;
        let mut refs = references.into_iter();
        let (from, to, owner) = if kind.as_deref() == Some("ordered_set") {
            (None, None, refs.next())
        } else {
            (refs.next(), refs.next(), None)
        };
        SnapshotRecord {
            type_name: raw.type_name,
            id: raw.id,
            snapshot_id: raw.snapshot_id,
            structure: kind,
            from,
            to,
            owner,
            items: refs.collect(),
            parent: raw.parent,
            children: raw.children,
            attributes: raw.attributes,
        }
    }
}

// ============================================================================
// Frames and named references
// ============================================================================

/// Ordered list of snapshot references forming one frame
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawFrame {
    /// Frame identity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RawId>,
    /// Snapshot identities, in frame order
    #[serde(default)]
    pub snapshots: Vec<RawId>,
}

impl RawFrame {
    /// Frame with the given identity and snapshots
    pub fn new(id: Option<RawId>, snapshots: Vec<RawId>) -> Self {
        RawFrame { id, snapshots }
    }
}

/// Named pointer to one entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawNamedReference {
    /// Reference name
    pub name: String,
    /// Entity kind tag (`"object"`, `"snapshot"`, `"frame"`)
    #[serde(rename = "type")]
    pub kind: String,
    /// Referenced identity
    pub id: RawId,
}

impl RawNamedReference {
    /// Reference to a frame
    pub fn frame(name: impl Into<String>, id: impl Into<RawId>) -> Self {
        RawNamedReference {
            name: name.into(),
            kind: "frame".to_string(),
            id: id.into(),
        }
    }
}

/// Named, ordered list of entities of one kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawNamedList {
    /// List name
    pub name: String,
    /// Entity kind tag of every item
    pub item_type: String,
    /// Referenced identities, in order
    #[serde(default)]
    pub ids: Vec<RawId>,
}

impl RawNamedList {
    /// List of frames
    pub fn frames(name: impl Into<String>, ids: Vec<RawId>) -> Self {
        RawNamedList {
            name: name.into(),
            item_type: "frame".to_string(),
            ids,
        }
    }
}

// ============================================================================
// RawDesign
// ============================================================================

/// Whole design document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawDesign {
    /// Document format version, absent in hand-written documents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_version: Option<u32>,
    /// Name of the metamodel the design was built against
    #[serde(default, rename = "metamodel", skip_serializing_if = "Option::is_none")]
    pub metamodel_name: Option<String>,
    /// Version of that metamodel
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metamodel_version: Option<String>,
    /// All object versions
    #[serde(default)]
    pub snapshots: Vec<RawSnapshot>,
    /// All frames
    #[serde(default)]
    pub frames: Vec<RawFrame>,
    /// User-defined named references
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub user_references: Vec<RawNamedReference>,
    /// Named references with reserved meaning (`current_frame`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub system_references: Vec<RawNamedReference>,
    /// User-defined named lists
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub user_lists: Vec<RawNamedList>,
    /// Named lists with reserved meaning (`undo`, `redo`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub system_lists: Vec<RawNamedList>,
}

impl RawDesign {
    /// Empty document
    pub fn new() -> Self {
        RawDesign::default()
    }

    /// Parse a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build from an already parsed JSON value
    pub fn from_json_value(value: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Encode as pretty-printed JSON
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Encode as a JSON value
    pub fn to_json_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// System reference by name
    pub fn system_reference(&self, name: &str) -> Option<&RawNamedReference> {
        self.system_references.iter().find(|r| r.name == name)
    }

    /// System list by name
    pub fn system_list(&self, name: &str) -> Option<&RawNamedList> {
        self.system_lists.iter().find(|l| l.name == name)
    }
}
