//! Attribute value types
//!
//! This module defines:
//! - Variant: Typed scalar or homogeneous array stored in object attributes
//! - VariantAtom / VariantArray: The two shapes of a variant
//! - AtomType / ValueType: Type descriptors used by the metamodel
//!
//! ## Raw Document Encoding
//!
//! ```text
//! atom:  {"type": "int",       "value": 10}
//! point: {"type": "point",     "value": [1.0, 2.0]}
//! array: {"type": "int_array", "items": [1, 2, 3]}
//! ```
//!
//! All items of an array share one atom type.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::json;
use std::fmt;
use std::str::FromStr;

/// Two-dimensional point
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

impl Point {
    /// Create a point
    pub const fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

/// Type of a single atom
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtomType {
    /// Boolean
    Bool,
    /// 64-bit signed integer
    Int,
    /// 64-bit float
    Float,
    /// UTF-8 string
    String,
    /// Two-dimensional point
    Point,
}

impl AtomType {
    /// Name used in the raw document encoding
    pub fn as_str(&self) -> &'static str {
        match self {
            AtomType::Bool => "bool",
            AtomType::Int => "int",
            AtomType::Float => "float",
            AtomType::String => "string",
            AtomType::Point => "point",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "bool" => Some(AtomType::Bool),
            "int" => Some(AtomType::Int),
            "float" => Some(AtomType::Float),
            "string" => Some(AtomType::String),
            "point" => Some(AtomType::Point),
            _ => None,
        }
    }
}

/// Type of a variant: an atom type or an array of atoms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// Single atom
    Atom(AtomType),
    /// Homogeneous array of atoms
    Array(AtomType),
}

impl ValueType {
    /// Atom type of the value or of its items
    pub fn atom_type(&self) -> AtomType {
        match self {
            ValueType::Atom(atom) | ValueType::Array(atom) => *atom,
        }
    }

    /// Check if this is an array type
    pub fn is_array(&self) -> bool {
        matches!(self, ValueType::Array(_))
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Atom(atom) => f.write_str(atom.as_str()),
            ValueType::Array(atom) => write!(f, "{}_array", atom.as_str()),
        }
    }
}

impl FromStr for ValueType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        if let Some(atom) = s.strip_suffix("_array") {
            return AtomType::from_name(atom)
                .map(ValueType::Array)
                .ok_or_else(|| CoreError::UnknownValueType(s.to_string()));
        }
        AtomType::from_name(s)
            .map(ValueType::Atom)
            .ok_or_else(|| CoreError::UnknownValueType(s.to_string()))
    }
}

/// Single typed value
#[derive(Debug, Clone, PartialEq)]
pub enum VariantAtom {
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Float value
    Float(f64),
    /// String value
    String(String),
    /// Point value
    Point(Point),
}

impl VariantAtom {
    /// Type of this atom
    pub fn atom_type(&self) -> AtomType {
        match self {
            VariantAtom::Bool(_) => AtomType::Bool,
            VariantAtom::Int(_) => AtomType::Int,
            VariantAtom::Float(_) => AtomType::Float,
            VariantAtom::String(_) => AtomType::String,
            VariantAtom::Point(_) => AtomType::Point,
        }
    }

    fn to_json(&self) -> serde_json::Value {
        match self {
            VariantAtom::Bool(v) => json!(v),
            VariantAtom::Int(v) => json!(v),
            VariantAtom::Float(v) => json!(v),
            VariantAtom::String(v) => json!(v),
            VariantAtom::Point(p) => json!([p.x, p.y]),
        }
    }

    fn from_json(atom_type: AtomType, value: &serde_json::Value) -> Result<Self> {
        let invalid = || {
            CoreError::InvalidEncoding(format!("expected {} value, got {}", atom_type.as_str(), value))
        };
        match atom_type {
            AtomType::Bool => value.as_bool().map(VariantAtom::Bool).ok_or_else(invalid),
            AtomType::Int => value.as_i64().map(VariantAtom::Int).ok_or_else(invalid),
            AtomType::Float => value.as_f64().map(VariantAtom::Float).ok_or_else(invalid),
            AtomType::String => value
                .as_str()
                .map(|s| VariantAtom::String(s.to_string()))
                .ok_or_else(invalid),
            AtomType::Point => match value.as_array().map(Vec::as_slice) {
                Some([x, y]) => match (x.as_f64(), y.as_f64()) {
                    (Some(x), Some(y)) => Ok(VariantAtom::Point(Point::new(x, y))),
                    _ => Err(invalid()),
                },
                _ => Err(invalid()),
            },
        }
    }
}

/// Homogeneous array of values
#[derive(Debug, Clone, PartialEq)]
pub enum VariantArray {
    /// Array of booleans
    Bool(Vec<bool>),
    /// Array of integers
    Int(Vec<i64>),
    /// Array of floats
    Float(Vec<f64>),
    /// Array of strings
    String(Vec<String>),
    /// Array of points
    Point(Vec<Point>),
}

impl VariantArray {
    /// Type of the array items
    pub fn item_type(&self) -> AtomType {
        match self {
            VariantArray::Bool(_) => AtomType::Bool,
            VariantArray::Int(_) => AtomType::Int,
            VariantArray::Float(_) => AtomType::Float,
            VariantArray::String(_) => AtomType::String,
            VariantArray::Point(_) => AtomType::Point,
        }
    }

    /// Number of items
    pub fn len(&self) -> usize {
        match self {
            VariantArray::Bool(v) => v.len(),
            VariantArray::Int(v) => v.len(),
            VariantArray::Float(v) => v.len(),
            VariantArray::String(v) => v.len(),
            VariantArray::Point(v) => v.len(),
        }
    }

    /// Check if the array has no items
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Items as atoms, in order
    pub fn atoms(&self) -> Vec<VariantAtom> {
        match self {
            VariantArray::Bool(v) => v.iter().copied().map(VariantAtom::Bool).collect(),
            VariantArray::Int(v) => v.iter().copied().map(VariantAtom::Int).collect(),
            VariantArray::Float(v) => v.iter().copied().map(VariantAtom::Float).collect(),
            VariantArray::String(v) => v.iter().cloned().map(VariantAtom::String).collect(),
            VariantArray::Point(v) => v.iter().copied().map(VariantAtom::Point).collect(),
        }
    }

    /// Build an array from atoms of one type
    ///
    /// An empty item list needs an explicit type, so `item_type` is used
    /// for it and for checking the remaining items.
    pub fn from_atoms(item_type: AtomType, atoms: Vec<VariantAtom>) -> Result<Self> {
        let mut array = match item_type {
            AtomType::Bool => VariantArray::Bool(Vec::with_capacity(atoms.len())),
            AtomType::Int => VariantArray::Int(Vec::with_capacity(atoms.len())),
            AtomType::Float => VariantArray::Float(Vec::with_capacity(atoms.len())),
            AtomType::String => VariantArray::String(Vec::with_capacity(atoms.len())),
            AtomType::Point => VariantArray::Point(Vec::with_capacity(atoms.len())),
        };
        for atom in atoms {
            match (&mut array, atom) {
                (VariantArray::Bool(v), VariantAtom::Bool(x)) => v.push(x),
                (VariantArray::Int(v), VariantAtom::Int(x)) => v.push(x),
                (VariantArray::Float(v), VariantAtom::Float(x)) => v.push(x),
                (VariantArray::String(v), VariantAtom::String(x)) => v.push(x),
                (VariantArray::Point(v), VariantAtom::Point(x)) => v.push(x),
                (_, other) => {
                    return Err(CoreError::HeterogeneousArray {
                        expected: ValueType::Atom(item_type),
                        found: ValueType::Atom(other.atom_type()),
                    })
                }
            }
        }
        Ok(array)
    }
}

/// Attribute value: an atom or a homogeneous array
#[derive(Debug, Clone, PartialEq)]
pub enum Variant {
    /// Single value
    Atom(VariantAtom),
    /// Array of values
    Array(VariantArray),
}

impl Variant {
    /// Type of this value
    pub fn value_type(&self) -> ValueType {
        match self {
            Variant::Atom(atom) => ValueType::Atom(atom.atom_type()),
            Variant::Array(array) => ValueType::Array(array.item_type()),
        }
    }

    /// Get as atom if this is a single value
    pub fn as_atom(&self) -> Option<&VariantAtom> {
        match self {
            Variant::Atom(atom) => Some(atom),
            Variant::Array(_) => None,
        }
    }

    /// Get as array if this is an array value
    pub fn as_array(&self) -> Option<&VariantArray> {
        match self {
            Variant::Array(array) => Some(array),
            Variant::Atom(_) => None,
        }
    }

    fn conversion_error(&self, to: AtomType) -> CoreError {
        CoreError::ConversionFailed {
            from: self.value_type(),
            to: ValueType::Atom(to),
        }
    }

    /// Convert to bool
    pub fn try_bool(&self) -> Result<bool> {
        match self {
            Variant::Atom(VariantAtom::Bool(v)) => Ok(*v),
            _ => Err(self.conversion_error(AtomType::Bool)),
        }
    }

    /// Convert to integer
    ///
    /// Floats convert when they have no fractional part.
    pub fn try_int(&self) -> Result<i64> {
        match self {
            Variant::Atom(VariantAtom::Int(v)) => Ok(*v),
            Variant::Atom(VariantAtom::Float(v)) if v.fract() == 0.0 && v.is_finite() => {
                Ok(*v as i64)
            }
            _ => Err(self.conversion_error(AtomType::Int)),
        }
    }

    /// Convert to float
    ///
    /// Integers always convert.
    pub fn try_float(&self) -> Result<f64> {
        match self {
            Variant::Atom(VariantAtom::Float(v)) => Ok(*v),
            Variant::Atom(VariantAtom::Int(v)) => Ok(*v as f64),
            _ => Err(self.conversion_error(AtomType::Float)),
        }
    }

    /// Get as string slice
    pub fn try_str(&self) -> Result<&str> {
        match self {
            Variant::Atom(VariantAtom::String(v)) => Ok(v),
            _ => Err(self.conversion_error(AtomType::String)),
        }
    }

    /// Convert to point
    pub fn try_point(&self) -> Result<Point> {
        match self {
            Variant::Atom(VariantAtom::Point(p)) => Ok(*p),
            _ => Err(self.conversion_error(AtomType::Point)),
        }
    }

    /// Encode in the raw document form
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Variant::Atom(atom) => json!({
                "type": atom.atom_type().as_str(),
                "value": atom.to_json(),
            }),
            Variant::Array(array) => json!({
                "type": self.value_type().to_string(),
                "items": array.atoms().iter().map(VariantAtom::to_json).collect::<Vec<_>>(),
            }),
        }
    }

    /// Decode from the raw document form
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| CoreError::InvalidEncoding(format!("expected variant object, got {value}")))?;
        let type_name = object
            .get("type")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| CoreError::InvalidEncoding("variant without type".to_string()))?;

        match type_name.parse::<ValueType>()? {
            ValueType::Atom(atom_type) => {
                let raw = object.get("value").ok_or_else(|| {
                    CoreError::InvalidEncoding(format!("{type_name} variant without value"))
                })?;
                Ok(Variant::Atom(VariantAtom::from_json(atom_type, raw)?))
            }
            ValueType::Array(item_type) => {
                let items = object
                    .get("items")
                    .and_then(serde_json::Value::as_array)
                    .ok_or_else(|| {
                        CoreError::InvalidEncoding(format!("{type_name} variant without items"))
                    })?;
                let atoms = items
                    .iter()
                    .map(|item| VariantAtom::from_json(item_type, item))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Variant::Array(VariantArray::from_atoms(item_type, atoms)?))
            }
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn atom(f: &mut fmt::Formatter<'_>, atom: &VariantAtom) -> fmt::Result {
            match atom {
                VariantAtom::Bool(v) => write!(f, "{v}"),
                VariantAtom::Int(v) => write!(f, "{v}"),
                VariantAtom::Float(v) => write!(f, "{v}"),
                VariantAtom::String(v) => write!(f, "{v}"),
                VariantAtom::Point(p) => write!(f, "[{}, {}]", p.x, p.y),
            }
        }
        match self {
            Variant::Atom(a) => atom(f, a),
            Variant::Array(array) => {
                f.write_str("[")?;
                for (i, item) in array.atoms().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    atom(f, item)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl Serialize for Variant {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Variant {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        Variant::from_json(&value).map_err(serde::de::Error::custom)
    }
}

impl From<bool> for Variant {
    fn from(v: bool) -> Self {
        Variant::Atom(VariantAtom::Bool(v))
    }
}

impl From<i64> for Variant {
    fn from(v: i64) -> Self {
        Variant::Atom(VariantAtom::Int(v))
    }
}

impl From<i32> for Variant {
    fn from(v: i32) -> Self {
        Variant::Atom(VariantAtom::Int(v as i64))
    }
}

impl From<f64> for Variant {
    fn from(v: f64) -> Self {
        Variant::Atom(VariantAtom::Float(v))
    }
}

impl From<&str> for Variant {
    fn from(v: &str) -> Self {
        Variant::Atom(VariantAtom::String(v.to_string()))
    }
}

impl From<String> for Variant {
    fn from(v: String) -> Self {
        Variant::Atom(VariantAtom::String(v))
    }
}

impl From<Point> for Variant {
    fn from(v: Point) -> Self {
        Variant::Atom(VariantAtom::Point(v))
    }
}

impl From<Vec<i64>> for Variant {
    fn from(v: Vec<i64>) -> Self {
        Variant::Array(VariantArray::Int(v))
    }
}

impl From<Vec<f64>> for Variant {
    fn from(v: Vec<f64>) -> Self {
        Variant::Array(VariantArray::Float(v))
    }
}

impl From<Vec<String>> for Variant {
    fn from(v: Vec<String>) -> Self {
        Variant::Array(VariantArray::String(v))
    }
}
