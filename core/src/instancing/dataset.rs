//! Instancing output types.

use crate::math::{Mat4, Vec3};

/// One placement of a prototype mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstancePoint {
    /// Model-to-world transform (translation ∘ rotation ∘ scale).
    pub model_to_world: Mat4,
    /// Index into [`InstanceDataset::prototypes`].
    pub prototype_index: usize,
    /// World position, identical to the translation column of
    /// `model_to_world`.
    pub position: Vec3,
}

/// Ordered table of prototype mesh identifiers.
///
/// Entry `i` is the mesh for every point whose `prototype_index == i`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrototypeTable {
    entries: Vec<String>,
}

impl PrototypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: impl Into<String>) {
        self.entries.push(path.into());
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.entries
    }
}

impl<S: Into<String>> FromIterator<S> for PrototypeTable {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Result of one extraction run: per-point placements plus the prototype
/// table they index into.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstanceDataset {
    pub points: Vec<InstancePoint>,
    pub prototypes: PrototypeTable,
}

impl InstanceDataset {
    pub fn new(points: Vec<InstancePoint>, prototypes: PrototypeTable) -> Self {
        Self { points, prototypes }
    }

    /// A dataset is usable only with at least one point and one prototype.
    pub fn is_valid(&self) -> bool {
        !self.points.is_empty() && !self.prototypes.is_empty()
    }

    /// Number of points referencing each prototype, indexed like the table.
    pub fn prototype_usage(&self) -> Vec<usize> {
        let mut usage = vec![0; self.prototypes.len()];
        for point in &self.points {
            if let Some(slot) = usage.get_mut(point.prototype_index) {
                *slot += 1;
            }
        }
        usage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(index: usize) -> InstancePoint {
        InstancePoint {
            model_to_world: Mat4::identity(),
            prototype_index: index,
            position: Vec3::zeros(),
        }
    }

    #[test]
    fn validity_requires_points_and_prototypes() {
        assert!(!InstanceDataset::default().is_valid());
        assert!(!InstanceDataset::new(vec![point(0)], PrototypeTable::new()).is_valid());
        assert!(!InstanceDataset::new(Vec::new(), ["a"].into_iter().collect()).is_valid());
        assert!(InstanceDataset::new(vec![point(0)], ["a"].into_iter().collect()).is_valid());
    }

    #[test]
    fn prototype_table_lookup() {
        let table: PrototypeTable = ["rock", "tree"].into_iter().collect();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(1), Some("tree"));
        assert_eq!(table.get(2), None);
        assert_eq!(table.iter().collect::<Vec<_>>(), vec!["rock", "tree"]);
    }

    #[test]
    fn usage_counts_points_per_prototype() {
        let dataset = InstanceDataset::new(
            vec![point(0), point(1), point(1)],
            ["rock", "tree", "bush"].into_iter().collect(),
        );
        assert_eq!(dataset.prototype_usage(), vec![1, 2, 0]);
    }
}
