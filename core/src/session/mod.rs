//! Geometry-session capability consumed by the attribute layer.
//!
//! A session exposes the cooked output of a procedural geometry network as
//! a set of parts, each with its own named attributes. Attribute data comes
//! back tuple-packed: a flat array of `count * tuple_size` scalars (or one
//! string per element) plus the metadata describing how to regroup it.
//!
//! # Providers
//!
//! - [`MemorySession`] - In-memory parts for tests and captured snapshots
//!
//! Bindings to a live cooking engine implement [`GeometrySession`] directly.

mod error;
mod memory;

pub use error::SessionError;
pub use memory::{MemoryAttribute, MemoryData, MemoryPart, MemorySession};

use serde::{Deserialize, Serialize};

/// Identifies one part of one geometry node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartRef {
    /// Geometry node id.
    pub geo_id: i32,
    /// Part id within the geometry node.
    pub part_id: i32,
}

impl PartRef {
    pub const fn new(geo_id: i32, part_id: i32) -> Self {
        Self { geo_id, part_id }
    }
}

impl std::fmt::Display for PartRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "geo {} part {}", self.geo_id, self.part_id)
    }
}

/// Element class an attribute is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeOwner {
    Vertex,
    #[default]
    Point,
    Primitive,
    /// One value for the whole part.
    Detail,
}

/// Attribute metadata reported alongside the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AttributeInfo {
    /// Element class the attribute lives on.
    pub owner: AttributeOwner,
    /// Number of elements.
    pub count: usize,
    /// Scalars per element. Zero or negative means "no data".
    pub tuple_size: i32,
}

impl AttributeInfo {
    /// Whether the query describes at least one non-empty element.
    pub fn has_data(&self) -> bool {
        self.tuple_size > 0 && self.count > 0
    }
}

/// Result of one successful attribute query.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeQuery<T> {
    pub info: AttributeInfo,
    /// Flat, tuple-packed values.
    pub values: Vec<T>,
}

/// Read access to the attributes of a cooked geometry.
///
/// Every query returns `Ok(None)` when the attribute does not exist on the
/// given part. `Err` is reserved for a failing session call.
pub trait GeometrySession {
    /// Query a float attribute.
    fn query_float(
        &self,
        part: PartRef,
        name: &str,
    ) -> Result<Option<AttributeQuery<f32>>, SessionError>;

    /// Query an integer attribute.
    fn query_int(
        &self,
        part: PartRef,
        name: &str,
    ) -> Result<Option<AttributeQuery<i32>>, SessionError>;

    /// Query a string attribute. Strings are never tuple-packed: one value
    /// per element.
    fn query_string(
        &self,
        part: PartRef,
        name: &str,
    ) -> Result<Option<AttributeQuery<String>>, SessionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_info_has_data() {
        let info = AttributeInfo {
            owner: AttributeOwner::Point,
            count: 3,
            tuple_size: 3,
        };
        assert!(info.has_data());
        assert!(!AttributeInfo { count: 0, ..info }.has_data());
        assert!(!AttributeInfo { tuple_size: 0, ..info }.has_data());
        assert!(!AttributeInfo { tuple_size: -1, ..info }.has_data());
    }

    #[test]
    fn part_ref_display() {
        assert_eq!(PartRef::new(4, 1).to_string(), "geo 4 part 1");
    }
}
