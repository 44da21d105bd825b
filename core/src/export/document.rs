//! On-disk JSON layout of an instance dataset.

use serde::{Deserialize, Serialize};

use crate::instancing::{InstanceDataset, InstancePoint, PrototypeTable};
use crate::math::{Vec3, mat4_from_cols_array, mat4_to_cols_array};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(super) struct PointRecord {
    /// Column-major 4x4 model-to-world matrix.
    #[serde(rename = "modelToWorldMat")]
    pub model_to_world: [f32; 16],
    #[serde(rename = "protoIndex")]
    pub proto_index: usize,
    pub pos: [f32; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(super) struct DatasetDocument {
    pub points: Vec<PointRecord>,
    pub proto: Vec<String>,
}

impl From<&InstanceDataset> for DatasetDocument {
    fn from(dataset: &InstanceDataset) -> Self {
        Self {
            points: dataset
                .points
                .iter()
                .map(|p| PointRecord {
                    model_to_world: mat4_to_cols_array(&p.model_to_world),
                    proto_index: p.prototype_index,
                    pos: [p.position.x, p.position.y, p.position.z],
                })
                .collect(),
            proto: dataset.prototypes.as_slice().to_vec(),
        }
    }
}

impl From<DatasetDocument> for InstanceDataset {
    fn from(doc: DatasetDocument) -> Self {
        let points = doc
            .points
            .iter()
            .map(|p| InstancePoint {
                model_to_world: mat4_from_cols_array(&p.model_to_world),
                prototype_index: p.proto_index,
                position: Vec3::new(p.pos[0], p.pos[1], p.pos[2]),
            })
            .collect();
        InstanceDataset::new(points, doc.proto.into_iter().collect::<PrototypeTable>())
    }
}
