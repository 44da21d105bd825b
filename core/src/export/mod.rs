//! JSON export of instance datasets.
//!
//! The document has two arrays:
//!
//! ```text
//! {
//!   "points": [ { "modelToWorldMat": [16 floats, column-major],
//!                 "protoIndex": 0,
//!                 "pos": [x, y, z] }, ... ],
//!   "proto":  [ "meshes/rock", ... ]
//! }
//! ```
//!
//! `protoIndex` indexes `proto`. Point order is the geometry's point order.
//!
//! # Invalid datasets
//!
//! A dataset with no points or no prototypes has no JSON form: [`to_json`]
//! returns `None`. [`write_json`] still writes the file, leaving it empty,
//! and logs a warning so downstream tools see a fresh (but empty) payload
//! instead of a stale one.

mod document;
mod error;

pub use error::ExportError;

use std::path::Path;

use crate::instancing::InstanceDataset;

use document::DatasetDocument;

/// Where instance data is written when no path is configured.
pub const DEFAULT_OUTPUT_PATH: &str = "cache/instancing/instance_data.json";

/// Encode `dataset` as compact JSON, or `None` if it is not valid.
pub fn to_json(dataset: &InstanceDataset) -> Option<String> {
    encode(dataset, false)
}

/// Encode `dataset` as indented JSON, or `None` if it is not valid.
pub fn to_json_pretty(dataset: &InstanceDataset) -> Option<String> {
    encode(dataset, true)
}

fn encode(dataset: &InstanceDataset, pretty: bool) -> Option<String> {
    if !dataset.is_valid() {
        return None;
    }
    let doc = DatasetDocument::from(dataset);
    let result = if pretty {
        serde_json::to_string_pretty(&doc)
    } else {
        serde_json::to_string(&doc)
    };
    match result {
        Ok(json) => Some(json),
        Err(e) => {
            log::error!("Failed to encode instance data: {e}");
            None
        }
    }
}

/// Write `dataset` as compact JSON to `path`, replacing any existing file.
///
/// Missing parent directories are created. An invalid dataset produces an
/// empty file and a warning.
pub fn write_json(dataset: &InstanceDataset, path: impl AsRef<Path>) -> Result<(), ExportError> {
    write_payload(to_json(dataset), path.as_ref())
}

/// Same as [`write_json`], with indented output.
pub fn write_json_pretty(
    dataset: &InstanceDataset,
    path: impl AsRef<Path>,
) -> Result<(), ExportError> {
    write_payload(to_json_pretty(dataset), path.as_ref())
}

fn write_payload(payload: Option<String>, path: &Path) -> Result<(), ExportError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let payload = payload.unwrap_or_else(|| {
        log::warn!("Invalid instance data, writing empty {}", path.display());
        String::new()
    });
    std::fs::write(path, payload)?;
    log::debug!("Wrote instance data to {}", path.display());
    Ok(())
}

/// Read a dataset written by [`write_json`].
///
/// Returns `Ok(None)` for an empty file (the invalid-dataset payload).
pub fn read_json(path: impl AsRef<Path>) -> Result<Option<InstanceDataset>, ExportError> {
    let content = std::fs::read_to_string(path.as_ref())?;
    if content.trim().is_empty() {
        return Ok(None);
    }
    let doc: DatasetDocument = serde_json::from_str(&content)?;
    Ok(Some(doc.into()))
}
