//! In-memory geometry session, loadable from a JSON snapshot.

use serde::{Deserialize, Serialize};

use super::{AttributeInfo, AttributeOwner, AttributeQuery, GeometrySession, PartRef, SessionError};

/// Raw, tuple-packed attribute storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryData {
    Float(Vec<f32>),
    Int(Vec<i32>),
    String(Vec<String>),
}

impl MemoryData {
    fn kind_name(&self) -> &'static str {
        match self {
            MemoryData::Float(_) => "float",
            MemoryData::Int(_) => "int",
            MemoryData::String(_) => "string",
        }
    }
}

/// One named attribute on a [`MemoryPart`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryAttribute {
    pub name: String,
    #[serde(default)]
    pub owner: AttributeOwner,
    #[serde(default = "default_tuple_size")]
    pub tuple_size: i32,
    pub data: MemoryData,
}

fn default_tuple_size() -> i32 {
    1
}

impl MemoryAttribute {
    /// Metadata derived from the stored data.
    ///
    /// Numeric data holds `len / tuple_size` elements; strings hold one
    /// element per value.
    pub fn info(&self) -> AttributeInfo {
        let count = match &self.data {
            MemoryData::String(v) => v.len(),
            MemoryData::Float(v) if self.tuple_size > 0 => v.len() / self.tuple_size as usize,
            MemoryData::Int(v) if self.tuple_size > 0 => v.len() / self.tuple_size as usize,
            _ => 0,
        };
        AttributeInfo {
            owner: self.owner,
            count,
            tuple_size: self.tuple_size,
        }
    }
}

/// A geometry part held in memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryPart {
    pub geo_id: i32,
    pub part_id: i32,
    #[serde(default)]
    pub attributes: Vec<MemoryAttribute>,
}

impl MemoryPart {
    /// Create an empty part.
    pub fn new(geo_id: i32, part_id: i32) -> Self {
        Self {
            geo_id,
            part_id,
            attributes: Vec::new(),
        }
    }

    /// Identifier of this part.
    pub fn part_ref(&self) -> PartRef {
        PartRef::new(self.geo_id, self.part_id)
    }

    /// Add an attribute. An existing attribute with the same name is replaced.
    #[must_use]
    pub fn with_attribute(mut self, attribute: MemoryAttribute) -> Self {
        self.attributes.retain(|a| a.name != attribute.name);
        self.attributes.push(attribute);
        self
    }

    /// Add a point float attribute.
    #[must_use]
    pub fn with_float(self, name: impl Into<String>, tuple_size: i32, values: Vec<f32>) -> Self {
        self.with_attribute(MemoryAttribute {
            name: name.into(),
            owner: AttributeOwner::Point,
            tuple_size,
            data: MemoryData::Float(values),
        })
    }

    /// Add a point integer attribute.
    #[must_use]
    pub fn with_int(self, name: impl Into<String>, tuple_size: i32, values: Vec<i32>) -> Self {
        self.with_attribute(MemoryAttribute {
            name: name.into(),
            owner: AttributeOwner::Point,
            tuple_size,
            data: MemoryData::Int(values),
        })
    }

    /// Add a point string attribute.
    #[must_use]
    pub fn with_strings(self, name: impl Into<String>, values: Vec<String>) -> Self {
        self.with_attribute(MemoryAttribute {
            name: name.into(),
            owner: AttributeOwner::Point,
            tuple_size: 1,
            data: MemoryData::String(values),
        })
    }

    /// Add a single-valued detail string attribute.
    #[must_use]
    pub fn with_detail_string(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_attribute(MemoryAttribute {
            name: name.into(),
            owner: AttributeOwner::Detail,
            tuple_size: 1,
            data: MemoryData::String(vec![value.into()]),
        })
    }

    fn attribute(&self, name: &str) -> Option<&MemoryAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

/// In-memory geometry session for tests and captured snapshots.
///
/// Parts are kept in insertion order, which is the order reported by
/// [`MemorySession::parts`].
///
/// # Example
///
/// ```ignore
/// let session = MemorySession::new().with_part(
///     MemoryPart::new(0, 0)
///         .with_float("P", 3, vec![0.0, 1.0, 2.0])
///         .with_int("proto_index", 1, vec![0])
///         .with_detail_string("prototype0", "meshes/rock.obj"),
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemorySession {
    #[serde(default)]
    pub parts: Vec<MemoryPart>,
}

impl MemorySession {
    /// Create a session without parts.
    pub fn new() -> Self {
        Self { parts: Vec::new() }
    }

    /// Append a part.
    #[must_use]
    pub fn with_part(mut self, part: MemoryPart) -> Self {
        self.parts.push(part);
        self
    }

    /// Parse a snapshot document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Identifiers of all parts, in order.
    pub fn part_refs(&self) -> Vec<PartRef> {
        self.parts.iter().map(MemoryPart::part_ref).collect()
    }

    fn find(&self, part: PartRef, name: &str) -> Result<Option<&MemoryAttribute>, SessionError> {
        let part_data = self
            .parts
            .iter()
            .find(|p| p.part_ref() == part)
            .ok_or(SessionError::InvalidPart(part))?;
        Ok(part_data.attribute(name))
    }
}

fn mismatch(attribute: &MemoryAttribute, expected: &'static str) -> SessionError {
    log::debug!(
        "Attribute \"{}\" holds {} data, requested {}",
        attribute.name,
        attribute.data.kind_name(),
        expected
    );
    SessionError::StorageMismatch {
        name: attribute.name.clone(),
        expected,
    }
}

impl GeometrySession for MemorySession {
    fn query_float(
        &self,
        part: PartRef,
        name: &str,
    ) -> Result<Option<AttributeQuery<f32>>, SessionError> {
        let Some(attribute) = self.find(part, name)? else {
            return Ok(None);
        };
        match &attribute.data {
            MemoryData::Float(values) => Ok(Some(AttributeQuery {
                info: attribute.info(),
                values: values.clone(),
            })),
            _ => Err(mismatch(attribute, "float")),
        }
    }

    fn query_int(
        &self,
        part: PartRef,
        name: &str,
    ) -> Result<Option<AttributeQuery<i32>>, SessionError> {
        let Some(attribute) = self.find(part, name)? else {
            return Ok(None);
        };
        match &attribute.data {
            MemoryData::Int(values) => Ok(Some(AttributeQuery {
                info: attribute.info(),
                values: values.clone(),
            })),
            _ => Err(mismatch(attribute, "int")),
        }
    }

    fn query_string(
        &self,
        part: PartRef,
        name: &str,
    ) -> Result<Option<AttributeQuery<String>>, SessionError> {
        let Some(attribute) = self.find(part, name)? else {
            return Ok(None);
        };
        match &attribute.data {
            MemoryData::String(values) => Ok(Some(AttributeQuery {
                info: attribute.info(),
                values: values.clone(),
            })),
            _ => Err(mismatch(attribute, "string")),
        }
    }
}
