//! Pulling named attributes out of a geometry session into typed records.

use std::fmt;

use crate::math::{Vec3, Vec4};
use crate::session::{AttributeInfo, GeometrySession, PartRef};

use super::record::{AttributeRecord, AttributeType, AttributeValues};
use super::store::AttributeStore;

/// How an attribute is resolved when several parts are available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartPolicy {
    /// Parts are probed in order; the first part that has the attribute
    /// supplies all of its data. Later parts are never consulted.
    #[default]
    FirstMatch,
}

impl PartPolicy {
    fn resolve<T>(self, parts: &[PartRef], probe: impl FnMut(&PartRef) -> Option<T>) -> Option<T> {
        match self {
            PartPolicy::FirstMatch => parts.iter().find_map(probe),
        }
    }
}

/// Policy used by [`AttributeFetcher::new`].
pub const DEFAULT_PART_POLICY: PartPolicy = PartPolicy::FirstMatch;

/// Successful fetch outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fetched {
    /// A synced record was inserted into the store.
    Stored,
    /// The attribute exists but reported no elements or a non-positive
    /// tuple size. Nothing was stored, so `store.get(name)` stays undefined.
    Vacuous,
}

/// Why a fetch stored nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The store already holds a record under this name.
    Duplicate(String),
    /// No part has the attribute.
    Missing(String),
    /// The requested semantic type cannot be fetched.
    Unsupported(AttributeType),
    /// The fetcher has no parts to probe.
    NoParts,
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Duplicate(name) => write!(f, "attribute \"{name}\" already fetched"),
            FetchError::Missing(name) => write!(f, "missing attribute \"{name}\""),
            FetchError::Unsupported(ty) => write!(f, "unsupported attribute type {ty:?}"),
            FetchError::NoParts => write!(f, "no geometry parts to fetch from"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Reads attributes from a fixed list of geometry parts.
pub struct AttributeFetcher<'a, S: GeometrySession + ?Sized> {
    session: &'a S,
    parts: Vec<PartRef>,
    policy: PartPolicy,
}

impl<'a, S: GeometrySession + ?Sized> AttributeFetcher<'a, S> {
    /// Create a fetcher over `parts`, probed in the given order.
    pub fn new(session: &'a S, parts: impl Into<Vec<PartRef>>) -> Self {
        Self {
            session,
            parts: parts.into(),
            policy: DEFAULT_PART_POLICY,
        }
    }

    /// Use a different part policy.
    #[must_use]
    pub fn with_policy(mut self, policy: PartPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn parts(&self) -> &[PartRef] {
        &self.parts
    }

    /// Fetch `name` as `ty` and store it.
    ///
    /// Rejects names already present in `store`. When no part has the
    /// attribute a warning is logged (if `log_on_miss`) and the store is
    /// left unchanged.
    pub fn fetch(
        &self,
        store: &mut AttributeStore,
        name: &str,
        ty: AttributeType,
        log_on_miss: bool,
    ) -> Result<Fetched, FetchError> {
        if store.contains(name) {
            return Err(FetchError::Duplicate(name.to_owned()));
        }
        if ty == AttributeType::Undefined {
            return Err(FetchError::Unsupported(ty));
        }
        if self.parts.is_empty() {
            return Err(FetchError::NoParts);
        }

        let Some((info, values)) = self
            .policy
            .resolve(&self.parts, |part| self.query_part(*part, name, ty))
        else {
            if log_on_miss {
                log::warn!("Missing attribute \"{}\"", name);
            }
            return Err(FetchError::Missing(name.to_owned()));
        };

        if !info.has_data() {
            log::debug!(
                "Attribute \"{}\" is empty (count {}, tuple size {})",
                name,
                info.count,
                info.tuple_size
            );
            return Ok(Fetched::Vacuous);
        }

        store.try_insert(name, AttributeRecord::synced(name, info, values));
        Ok(Fetched::Stored)
    }

    /// Query one part. Session errors count as a miss on that part.
    fn query_part(
        &self,
        part: PartRef,
        name: &str,
        ty: AttributeType,
    ) -> Option<(AttributeInfo, AttributeValues)> {
        let result = match ty {
            AttributeType::Bool => self.session.query_int(part, name).map(|q| {
                q.map(|q| {
                    let values = q.values.iter().map(|v| *v != 0).collect();
                    (q.info, AttributeValues::Bool(values))
                })
            }),
            AttributeType::Int => self
                .session
                .query_int(part, name)
                .map(|q| q.map(|q| (q.info, AttributeValues::Int(q.values)))),
            AttributeType::Float => self
                .session
                .query_float(part, name)
                .map(|q| q.map(|q| (q.info, AttributeValues::Float(q.values)))),
            AttributeType::String => self
                .session
                .query_string(part, name)
                .map(|q| q.map(|q| (q.info, AttributeValues::String(q.values)))),
            AttributeType::Vector3 | AttributeType::Vector4 => {
                self.session.query_float(part, name).map(|q| {
                    q.and_then(|q| {
                        let values = regroup_vectors(name, ty, q.info, &q.values)?;
                        Some((q.info, values))
                    })
                })
            }
            AttributeType::Undefined => Ok(None),
        };

        match result {
            Ok(found) => {
                if found.is_none() {
                    log::debug!("Attribute \"{}\" not found on {}", name, part);
                }
                found
            }
            Err(e) => {
                log::warn!("Failed to query attribute \"{}\" on {}: {}", name, part, e);
                None
            }
        }
    }
}

/// Regroup a flat float array into `info.count` vectors of the width `ty`
/// expects. Returns `None` when the reported tuple size does not match or
/// the array is too short for `info.count` vectors.
fn regroup_vectors(
    name: &str,
    ty: AttributeType,
    info: AttributeInfo,
    flat: &[f32],
) -> Option<AttributeValues> {
    let width = ty.vector_width()?;
    if !info.has_data() {
        // Vacuous: keep the variant, no elements.
        return Some(match ty {
            AttributeType::Vector3 => AttributeValues::Vector3(Vec::new()),
            _ => AttributeValues::Vector4(Vec::new()),
        });
    }
    if info.tuple_size as usize != width {
        log::debug!(
            "Attribute \"{}\" has tuple size {}, expected {}",
            name,
            info.tuple_size,
            width
        );
        return None;
    }
    if flat.len() < info.count * width {
        log::debug!(
            "Attribute \"{}\" holds {} values, expected {}",
            name,
            flat.len(),
            info.count * width
        );
        return None;
    }

    let chunks = flat.chunks_exact(width).take(info.count);
    Some(match ty {
        AttributeType::Vector3 => {
            AttributeValues::Vector3(chunks.map(|c| Vec3::new(c[0], c[1], c[2])).collect())
        }
        _ => AttributeValues::Vector4(chunks.map(|c| Vec4::new(c[0], c[1], c[2], c[3])).collect()),
    })
}
