//! Typed attribute retrieval.
//!
//! This module provides:
//! - [`AttributeRecord`] - Immutable typed snapshot of one named attribute
//! - [`AttributeStore`] - Name-keyed, insert-once cache of records
//! - [`AttributeFetcher`] - Reads attributes from geometry parts into a store
//!
//! The geometry session speaks in flat, tuple-packed float/int/string
//! arrays. The fetcher turns those into one of the [`AttributeValues`]
//! variants selected by an [`AttributeType`].

mod fetch;
mod record;
mod store;

pub use fetch::{AttributeFetcher, DEFAULT_PART_POLICY, FetchError, Fetched, PartPolicy};
pub use record::{AttributeRecord, AttributeState, AttributeType, AttributeValues};
pub use store::AttributeStore;
