use serde::{Deserialize, Serialize};

/// Names of the attributes the transform builder reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceAttributeNames {
    /// Point position (vector3, required).
    pub position: String,
    /// Point scale (vector3).
    pub scale: String,
    /// Point orientation quaternion `(x, y, z, w)` (vector4).
    pub orientation: String,
    /// Point normal (vector3). Used only when no orientation is present.
    pub normal: String,
    /// Prototype index per point (int, required).
    pub prototype_index: String,
    /// Prefix of the detail string attributes listing prototype paths,
    /// numbered from zero: `prototype0`, `prototype1`, ...
    pub prototype_prefix: String,
}

impl InstanceAttributeNames {
    /// Name of the `index`-th prototype path attribute.
    pub fn prototype_name(&self, index: usize) -> String {
        format!("{}{}", self.prototype_prefix, index)
    }
}

impl Default for InstanceAttributeNames {
    fn default() -> Self {
        Self {
            position: "P".into(),
            scale: "scale".into(),
            orientation: "orient".into(),
            normal: "N".into(),
            prototype_index: "proto_index".into(),
            prototype_prefix: "prototype".into(),
        }
    }
}

/// How a point normal becomes a rotation when no orientation is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalRotationMode {
    /// Shortest arc from +Y to the normalized normal.
    #[default]
    ShortestArc,
    /// Both directions are scaled by the radians-to-degrees factor before
    /// the arc is built, matching exports made by older tooling. The arc
    /// only depends on direction, so results agree with `ShortestArc` up to
    /// float rounding.
    LegacyDegrees,
}
