//! Typed attribute snapshots.

use crate::math::{Vec3, Vec4};
use crate::session::{AttributeInfo, AttributeOwner};

/// Semantic type of an attribute as seen by consumers.
///
/// The geometry session only stores floats, integers, and strings. `Bool`
/// is read through the integer query; `Vector3`/`Vector4` are float
/// queries regrouped into vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AttributeType {
    #[default]
    Undefined,
    Bool,
    Int,
    Float,
    String,
    Vector3,
    Vector4,
}

impl AttributeType {
    /// Components per element a vector type expects, if it is one.
    pub fn vector_width(&self) -> Option<usize> {
        match self {
            Self::Vector3 => Some(3),
            Self::Vector4 => Some(4),
            _ => None,
        }
    }
}

/// Whether a record holds fetched data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AttributeState {
    #[default]
    Unsynced,
    Synced,
}

/// Value array of a record. The variant always matches the record's
/// [`AttributeType`].
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValues {
    Bool(Vec<bool>),
    Int(Vec<i32>),
    Float(Vec<f32>),
    String(Vec<String>),
    Vector3(Vec<Vec3>),
    Vector4(Vec<Vec4>),
}

impl AttributeValues {
    /// Semantic type matching this variant.
    pub fn attribute_type(&self) -> AttributeType {
        match self {
            Self::Bool(_) => AttributeType::Bool,
            Self::Int(_) => AttributeType::Int,
            Self::Float(_) => AttributeType::Float,
            Self::String(_) => AttributeType::String,
            Self::Vector3(_) => AttributeType::Vector3,
            Self::Vector4(_) => AttributeType::Vector4,
        }
    }

    /// Number of stored values (scalars for flat types, vectors otherwise).
    pub fn len(&self) -> usize {
        match self {
            Self::Bool(v) => v.len(),
            Self::Int(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::String(v) => v.len(),
            Self::Vector3(v) => v.len(),
            Self::Vector4(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Immutable snapshot of one named attribute.
///
/// A synced record carries exactly one value array; the default record
/// (see [`AttributeRecord::undefined`]) carries none.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttributeRecord {
    name: String,
    info: AttributeInfo,
    values: Option<AttributeValues>,
}

impl AttributeRecord {
    /// Record standing in for an attribute that was never stored.
    pub fn undefined() -> Self {
        Self::default()
    }

    /// Build a synced record from fetched values.
    pub fn synced(name: impl Into<String>, info: AttributeInfo, values: AttributeValues) -> Self {
        Self {
            name: name.into(),
            info,
            values: Some(values),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Semantic type, `Undefined` when no values are held.
    pub fn attribute_type(&self) -> AttributeType {
        self.values
            .as_ref()
            .map_or(AttributeType::Undefined, AttributeValues::attribute_type)
    }

    pub fn state(&self) -> AttributeState {
        if self.values.is_some() {
            AttributeState::Synced
        } else {
            AttributeState::Unsynced
        }
    }

    pub fn info(&self) -> AttributeInfo {
        self.info
    }

    pub fn owner(&self) -> AttributeOwner {
        self.info.owner
    }

    /// Number of elements reported by the session.
    pub fn count(&self) -> usize {
        self.info.count
    }

    /// Scalars per element reported by the session.
    pub fn tuple_size(&self) -> i32 {
        self.info.tuple_size
    }

    pub fn values(&self) -> Option<&AttributeValues> {
        self.values.as_ref()
    }

    pub fn bool_values(&self) -> Option<&[bool]> {
        match &self.values {
            Some(AttributeValues::Bool(v)) => Some(v),
            _ => None,
        }
    }

    pub fn int_values(&self) -> Option<&[i32]> {
        match &self.values {
            Some(AttributeValues::Int(v)) => Some(v),
            _ => None,
        }
    }

    pub fn float_values(&self) -> Option<&[f32]> {
        match &self.values {
            Some(AttributeValues::Float(v)) => Some(v),
            _ => None,
        }
    }

    pub fn string_values(&self) -> Option<&[String]> {
        match &self.values {
            Some(AttributeValues::String(v)) => Some(v),
            _ => None,
        }
    }

    pub fn vector3_values(&self) -> Option<&[Vec3]> {
        match &self.values {
            Some(AttributeValues::Vector3(v)) => Some(v),
            _ => None,
        }
    }

    pub fn vector4_values(&self) -> Option<&[Vec4]> {
        match &self.values {
            Some(AttributeValues::Vector4(v)) => Some(v),
            _ => None,
        }
    }
}
