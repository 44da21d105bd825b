//! Instance dataset synthesis.
//!
//! This module provides:
//! - [`TransformBuilder`] - Turns point attributes into per-point model matrices
//! - [`InstanceDataset`] - Points plus the prototype table they reference
//! - [`InstanceAttributeNames`] - Which attributes feed the builder

mod builder;
mod dataset;
mod names;

pub use builder::{BuildError, TransformBuilder};
pub use dataset::{InstanceDataset, InstancePoint, PrototypeTable};
pub use names::{InstanceAttributeNames, NormalRotationMode};
