//! Metamodel query types
//!
//! The metamodel is the schema registry of a design: it names the object
//! types, their structural role and their attributes. The core never
//! authors a metamodel, it only looks types up and reads attribute
//! defaults through [`MetamodelView`].

use crate::variant::{ValueType, Variant};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Relational role of an object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructuralType {
    /// No relational role
    Unstructured,
    /// Graph node
    Node,
    /// Graph edge between two nodes
    Edge,
    /// Owned, ordered list of references
    OrderedSet,
}

impl StructuralType {
    /// Name used in the raw document (`"unstructured"`, `"node"`, `"edge"`, `"ordered_set"`)
    pub fn as_str(&self) -> &'static str {
        match self {
            StructuralType::Unstructured => "unstructured",
            StructuralType::Node => "node",
            StructuralType::Edge => "edge",
            StructuralType::OrderedSet => "ordered_set",
        }
    }

    /// Parse the raw document name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "unstructured" => Some(StructuralType::Unstructured),
            "node" => Some(StructuralType::Node),
            "edge" => Some(StructuralType::Edge),
            "ordered_set" => Some(StructuralType::OrderedSet),
            _ => None,
        }
    }
}

impl fmt::Display for StructuralType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attribute declared by an object type
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// Attribute name
    pub name: String,
    /// Declared value type
    pub value_type: ValueType,
    /// Value used when an object does not provide one
    pub default: Option<Variant>,
}

impl Attribute {
    /// Create an attribute without a default value
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Attribute {
            name: name.into(),
            value_type,
            default: None,
        }
    }

    /// Set the default value
    pub fn with_default(mut self, default: impl Into<Variant>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// Object type of a metamodel
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectType {
    /// Type name, unique within a metamodel
    pub name: String,
    /// Structural role every object of this type has
    pub structural_type: StructuralType,
    /// Declared attributes, in declaration order
    pub attributes: Vec<Attribute>,
}

impl ObjectType {
    /// Create an object type without attributes
    pub fn new(name: impl Into<String>, structural_type: StructuralType) -> Self {
        ObjectType {
            name: name.into(),
            structural_type,
            attributes: Vec::new(),
        }
    }

    /// Add an attribute declaration
    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Look up an attribute declaration by name
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Default values of all attributes that declare one
    pub fn default_attributes(&self) -> BTreeMap<String, Variant> {
        self.attributes
            .iter()
            .filter_map(|a| a.default.clone().map(|d| (a.name.clone(), d)))
            .collect()
    }
}

/// Read-only access to a metamodel
///
/// The loader is generic over this trait so callers can back it with any
/// schema registry.
pub trait MetamodelView {
    /// Metamodel name
    fn name(&self) -> &str;

    /// Metamodel version, if versioned
    fn version(&self) -> Option<&str>;

    /// Look up an object type by name
    fn object_type(&self, name: &str) -> Option<Arc<ObjectType>>;
}

/// In-memory metamodel
///
/// A plain container of object types. Types are shared as
/// `Arc<ObjectType>` so snapshots can hold on to their type.
#[derive(Debug, Clone, Default)]
pub struct Metamodel {
    name: String,
    version: Option<String>,
    types: BTreeMap<String, Arc<ObjectType>>,
}

impl Metamodel {
    /// Create an empty metamodel
    pub fn new(name: impl Into<String>) -> Self {
        Metamodel {
            name: name.into(),
            version: None,
            types: BTreeMap::new(),
        }
    }

    /// Set the version string
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Add (or replace) an object type
    pub fn with_type(mut self, object_type: ObjectType) -> Self {
        self.add_type(object_type);
        self
    }

    /// Add (or replace) an object type
    pub fn add_type(&mut self, object_type: ObjectType) {
        self.types
            .insert(object_type.name.clone(), Arc::new(object_type));
    }

    /// All object types, ordered by name
    pub fn types(&self) -> impl Iterator<Item = &Arc<ObjectType>> {
        self.types.values()
    }
}

impl MetamodelView for Metamodel {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    fn object_type(&self, name: &str) -> Option<Arc<ObjectType>> {
        self.types.get(name).cloned()
    }
}
