//! # Instancer Core
//!
//! Extracts typed point attributes from a cooked procedural geometry and
//! turns them into an instancing dataset: one model matrix and prototype
//! index per point, plus the ordered table of prototype meshes.
//!
//! The pipeline is [`session`] → [`attribute`] → [`instancing`] → [`export`]:
//!
//! ```ignore
//! use instancer_core::export::{DEFAULT_OUTPUT_PATH, write_json};
//! use instancer_core::instancing::TransformBuilder;
//!
//! let mut builder = TransformBuilder::new(&session, session.part_refs());
//! if builder.build().is_ok() {
//!     write_json(builder.dataset(), DEFAULT_OUTPUT_PATH)?;
//! }
//! ```

pub mod attribute;
pub mod export;
pub mod instancing;
pub mod math;
pub mod session;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
