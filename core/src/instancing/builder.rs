//! Per-point transform synthesis.
//!
//! The [`TransformBuilder`] reads the well-known point attributes through an
//! [`AttributeFetcher`], converts them from the right-handed source frame to
//! the renderer's mirrored frame, and composes one model matrix per point.

use std::fmt;

use crate::attribute::{AttributeFetcher, AttributeStore, AttributeType};
use crate::math::{
    Quat, RAD_TO_DEG, Vec3, convert_normal, convert_orientation, convert_position,
    mat4_from_scale_rotation_translation, quat_from_rotation_arc, quat_from_vec4,
};
use crate::session::{GeometrySession, PartRef};

use super::dataset::{InstanceDataset, InstancePoint, PrototypeTable};
use super::names::{InstanceAttributeNames, NormalRotationMode};

/// Canonical up axis that normals are measured against.
fn up() -> Vec3 {
    Vec3::new(0.0, 1.0, 0.0)
}

/// Why a build produced no dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// The position attribute is missing or has no points.
    NoPoints,
    /// The prototype-index attribute is missing.
    MissingPrototypeIndex,
    /// A prototype path attribute exists but holds no string value.
    MalformedPrototype(String),
    /// A point attribute holds fewer elements than there are points.
    AttributeTooShort {
        name: String,
        len: usize,
        points: usize,
    },
    /// A point references a prototype outside the table.
    PrototypeIndexOutOfRange {
        point: usize,
        index: i32,
        prototypes: usize,
    },
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoPoints => write!(f, "no point output in geometry"),
            Self::MissingPrototypeIndex => write!(f, "missing prototype index attribute"),
            Self::MalformedPrototype(name) => write!(f, "invalid attribute \"{name}\""),
            Self::AttributeTooShort { name, len, points } => write!(
                f,
                "attribute \"{name}\" has {len} elements for {points} points"
            ),
            Self::PrototypeIndexOutOfRange {
                point,
                index,
                prototypes,
            } => write!(
                f,
                "point {point} references prototype {index}, table has {prototypes} entries"
            ),
        }
    }
}

impl std::error::Error for BuildError {}

/// Builds an [`InstanceDataset`] from the point attributes of a geometry.
///
/// # Example
///
/// ```ignore
/// let mut builder = TransformBuilder::new(&session, session.part_refs());
/// match builder.build() {
///     Ok(()) => write_json(builder.dataset(), DEFAULT_OUTPUT_PATH)?,
///     Err(e) => log::warn!("no instances: {e}"),
/// }
/// ```
pub struct TransformBuilder<'a, S: GeometrySession + ?Sized> {
    fetcher: AttributeFetcher<'a, S>,
    store: AttributeStore,
    names: InstanceAttributeNames,
    normal_mode: NormalRotationMode,
    log_missing: bool,
    dataset: InstanceDataset,
}

impl<'a, S: GeometrySession + ?Sized> TransformBuilder<'a, S> {
    pub fn new(session: &'a S, parts: impl Into<Vec<PartRef>>) -> Self {
        Self {
            fetcher: AttributeFetcher::new(session, parts),
            store: AttributeStore::new(),
            names: InstanceAttributeNames::default(),
            normal_mode: NormalRotationMode::default(),
            log_missing: true,
            dataset: InstanceDataset::default(),
        }
    }

    #[must_use]
    pub fn with_names(mut self, names: InstanceAttributeNames) -> Self {
        self.names = names;
        self
    }

    #[must_use]
    pub fn with_normal_mode(mut self, mode: NormalRotationMode) -> Self {
        self.normal_mode = mode;
        self
    }

    /// Whether missing optional point attributes are logged.
    #[must_use]
    pub fn with_log_missing(mut self, log_missing: bool) -> Self {
        self.log_missing = log_missing;
        self
    }

    /// The dataset produced by the last successful [`build`](Self::build).
    /// Empty until then.
    pub fn dataset(&self) -> &InstanceDataset {
        &self.dataset
    }

    pub fn into_dataset(self) -> InstanceDataset {
        self.dataset
    }

    /// Attributes fetched by the last build.
    pub fn store(&self) -> &AttributeStore {
        &self.store
    }

    /// Fetch all attributes and synthesize the dataset.
    ///
    /// On error the dataset keeps its previous contents and the cause is
    /// logged as a warning.
    pub fn build(&mut self) -> Result<(), BuildError> {
        match self.synthesize() {
            Ok(dataset) => {
                log::info!(
                    "Built {} instance points over {} prototypes",
                    dataset.points.len(),
                    dataset.prototypes.len()
                );
                self.dataset = dataset;
                Ok(())
            }
            Err(e) => {
                log::warn!("Instance build aborted: {e}");
                Err(e)
            }
        }
    }

    /// Fetch an attribute into the store. Returns whether the fetch succeeded.
    fn ensure(&mut self, name: &str, ty: AttributeType, log_on_miss: bool) -> bool {
        self.fetcher
            .fetch(&mut self.store, name, ty, log_on_miss)
            .is_ok()
    }

    fn synthesize(&mut self) -> Result<InstanceDataset, BuildError> {
        let names = self.names.clone();
        // Every build reads the current cook.
        self.store = AttributeStore::new();

        self.ensure(&names.position, AttributeType::Vector3, true);
        let point_count = self.store.get(&names.position).count();
        if point_count == 0 {
            return Err(BuildError::NoPoints);
        }

        self.ensure(&names.scale, AttributeType::Vector3, self.log_missing);
        self.ensure(&names.orientation, AttributeType::Vector4, self.log_missing);
        self.ensure(&names.normal, AttributeType::Vector3, self.log_missing);
        self.ensure(&names.prototype_index, AttributeType::Int, true);

        let prototypes = self.collect_prototypes(&names)?;

        let store = &self.store;
        let positions = checked_len(
            &names.position,
            store.get(&names.position).vector3_values(),
            point_count,
        )?;
        let scales = checked_len(
            &names.scale,
            store.get(&names.scale).vector3_values(),
            point_count,
        )?;
        let orientations = checked_len(
            &names.orientation,
            store.get(&names.orientation).vector4_values(),
            point_count,
        )?;
        // Normals are only read when there is no orientation.
        let normals = match orientations {
            Some(_) => None,
            None => checked_len(
                &names.normal,
                store.get(&names.normal).vector3_values(),
                point_count,
            )?,
        };
        let indices = checked_len(
            &names.prototype_index,
            store.get(&names.prototype_index).int_values(),
            point_count,
        )?
        .ok_or(BuildError::MissingPrototypeIndex)?;

        let mut points = Vec::with_capacity(point_count);
        for i in 0..point_count {
            let rotation = match (orientations, normals) {
                (Some(o), _) => convert_orientation(quat_from_vec4(&o[i])),
                (None, Some(n)) => normal_rotation(convert_normal(n[i]), self.normal_mode),
                (None, None) => Quat::identity(),
            };
            let position = positions.map_or_else(Vec3::zeros, |p| convert_position(p[i]));
            let scale = scales.map_or_else(|| Vec3::new(1.0, 1.0, 1.0), |s| s[i]);

            let raw_index = indices[i];
            let prototype_index = usize::try_from(raw_index)
                .ok()
                .filter(|idx| *idx < prototypes.len())
                .ok_or(BuildError::PrototypeIndexOutOfRange {
                    point: i,
                    index: raw_index,
                    prototypes: prototypes.len(),
                })?;

            points.push(InstancePoint {
                model_to_world: mat4_from_scale_rotation_translation(scale, rotation, position),
                prototype_index,
                position,
            });
        }

        Ok(InstanceDataset::new(points, prototypes))
    }

    /// Read `prototype0`, `prototype1`, ... until the first missing suffix.
    fn collect_prototypes(
        &mut self,
        names: &InstanceAttributeNames,
    ) -> Result<PrototypeTable, BuildError> {
        let mut table = PrototypeTable::new();
        loop {
            let name = names.prototype_name(table.len());
            if !self.ensure(&name, AttributeType::String, false) {
                break;
            }
            let Some(first) = self
                .store
                .get(&name)
                .string_values()
                .and_then(|values| values.first())
            else {
                return Err(BuildError::MalformedPrototype(name));
            };
            table.push(first.clone());
        }
        log::debug!("Collected {} prototypes", table.len());
        Ok(table)
    }
}

/// Ensure an optional per-point array covers every point.
fn checked_len<'v, T>(
    name: &str,
    values: Option<&'v [T]>,
    points: usize,
) -> Result<Option<&'v [T]>, BuildError> {
    match values {
        Some(v) if v.len() < points => Err(BuildError::AttributeTooShort {
            name: name.to_owned(),
            len: v.len(),
            points,
        }),
        other => Ok(other),
    }
}

/// Rotation taking +Y onto the (already handedness-converted) normal.
fn normal_rotation(normal: Vec3, mode: NormalRotationMode) -> Quat {
    let direction = normal.try_normalize(1e-6).unwrap_or_else(Vec3::zeros);
    match mode {
        NormalRotationMode::ShortestArc => quat_from_rotation_arc(&up(), &direction),
        NormalRotationMode::LegacyDegrees => {
            quat_from_rotation_arc(&(up() * RAD_TO_DEG), &(direction * RAD_TO_DEG))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Mat4, quat_rotate_vec3, to_scale_rotation_translation};
    use crate::session::{AttributeQuery, MemoryPart, MemorySession, SessionError};
    use rstest::rstest;
    use std::cell::RefCell;

    fn base_part() -> MemoryPart {
        MemoryPart::new(0, 0)
            .with_detail_string("prototype0", "meshes/rock")
            .with_detail_string("prototype1", "meshes/tree")
    }

    fn build(session: &MemorySession) -> (Result<(), BuildError>, InstanceDataset) {
        let mut builder = TransformBuilder::new(session, session.part_refs());
        let result = builder.build();
        (result, builder.into_dataset())
    }

    #[test]
    fn orientation_identity_with_position() {
        let session = MemorySession::new().with_part(
            base_part()
                .with_float("P", 3, vec![1.0, 2.0, 3.0])
                .with_float("orient", 4, vec![0.0, 0.0, 0.0, 1.0])
                .with_float("scale", 3, vec![1.0, 1.0, 1.0])
                .with_int("proto_index", 1, vec![1]),
        );
        let (result, dataset) = build(&session);
        result.unwrap();

        let point = &dataset.points[0];
        let expected = Mat4::new_translation(&Vec3::new(-1.0, 2.0, 3.0));
        assert!((point.model_to_world - expected).norm() < 1e-6);
        assert_eq!(point.position, Vec3::new(-1.0, 2.0, 3.0));
        assert_eq!(point.prototype_index, 1);
    }

    #[test]
    fn normal_along_up_is_identity_rotation() {
        let session = MemorySession::new().with_part(
            base_part()
                .with_float("P", 3, vec![0.0, 0.0, 0.0])
                .with_float("N", 3, vec![0.0, 1.0, 0.0])
                .with_int("proto_index", 1, vec![0]),
        );
        let (result, dataset) = build(&session);
        result.unwrap();
        assert!((dataset.points[0].model_to_world - Mat4::identity()).norm() < 1e-6);
    }

    #[rstest]
    #[case::shortest_arc(NormalRotationMode::ShortestArc)]
    #[case::legacy_degrees(NormalRotationMode::LegacyDegrees)]
    fn normal_rotates_up_onto_mirrored_normal(#[case] mode: NormalRotationMode) {
        let session = MemorySession::new().with_part(
            base_part()
                .with_float("P", 3, vec![0.0, 0.0, 0.0])
                .with_float("N", 3, vec![2.0, 0.0, 0.0])
                .with_int("proto_index", 1, vec![0]),
        );
        let mut builder =
            TransformBuilder::new(&session, session.part_refs()).with_normal_mode(mode);
        builder.build().unwrap();

        let matrix = builder.dataset().points[0].model_to_world;
        let (_, rotation, _) = to_scale_rotation_translation(&matrix);
        let rotated_up = quat_rotate_vec3(rotation, up());
        assert!((rotated_up - Vec3::new(-1.0, 0.0, 0.0)).norm() < 1e-4);
    }

    #[test]
    fn orientation_wins_over_normal() {
        let session = MemorySession::new().with_part(
            base_part()
                .with_float("P", 3, vec![0.0, 0.0, 0.0])
                .with_float("orient", 4, vec![0.0, 0.0, 0.0, 1.0])
                .with_float("N", 3, vec![1.0, 0.0, 0.0])
                .with_int("proto_index", 1, vec![0]),
        );
        let (result, dataset) = build(&session);
        result.unwrap();
        assert!((dataset.points[0].model_to_world - Mat4::identity()).norm() < 1e-6);
    }

    #[test]
    fn orientation_y_and_z_are_negated() {
        // 90 degrees about +Y in the source frame.
        let half = std::f32::consts::FRAC_1_SQRT_2;
        let session = MemorySession::new().with_part(
            base_part()
                .with_float("P", 3, vec![0.0, 0.0, 0.0])
                .with_float("orient", 4, vec![0.0, half, 0.0, half])
                .with_int("proto_index", 1, vec![0]),
        );
        let (result, dataset) = build(&session);
        result.unwrap();

        // Mirrored: 90 degrees about -Y, so +X maps to +Z.
        let (_, rotation, _) = to_scale_rotation_translation(&dataset.points[0].model_to_world);
        let x = quat_rotate_vec3(rotation, Vec3::new(1.0, 0.0, 0.0));
        assert!((x - Vec3::new(0.0, 0.0, 1.0)).norm() < 1e-5);
    }

    #[test]
    fn defaults_for_missing_optional_attributes() {
        let session = MemorySession::new().with_part(
            base_part()
                .with_float("P", 3, vec![4.0, 5.0, 6.0, 0.0, 0.0, 0.0])
                .with_int("proto_index", 1, vec![0, 1]),
        );
        let (result, dataset) = build(&session);
        result.unwrap();

        assert_eq!(dataset.points.len(), 2);
        let (scale, _, translation) =
            to_scale_rotation_translation(&dataset.points[0].model_to_world);
        assert!((scale - Vec3::new(1.0, 1.0, 1.0)).norm() < 1e-6);
        assert_eq!(translation, Vec3::new(-4.0, 5.0, 6.0));
        assert_eq!(dataset.points[1].prototype_index, 1);
    }

    #[test]
    fn scale_is_applied_before_translation() {
        let session = MemorySession::new().with_part(
            base_part()
                .with_float("P", 3, vec![1.0, 0.0, 0.0])
                .with_float("scale", 3, vec![2.0, 3.0, 4.0])
                .with_int("proto_index", 1, vec![0]),
        );
        let (result, dataset) = build(&session);
        result.unwrap();

        let m = dataset.points[0].model_to_world;
        let p = m.transform_point(&nalgebra::Point3::new(1.0, 1.0, 1.0));
        assert!((p.coords - Vec3::new(1.0, 3.0, 4.0)).norm() < 1e-6);
    }

    #[test]
    fn no_points_leaves_dataset_empty() {
        let session = MemorySession::new().with_part(
            base_part()
                .with_float("P", 3, vec![])
                .with_int("proto_index", 1, vec![]),
        );
        let (result, dataset) = build(&session);
        assert_eq!(result, Err(BuildError::NoPoints));
        assert!(dataset.points.is_empty());
        assert!(dataset.prototypes.is_empty());
    }

    #[test]
    fn missing_position_is_no_points() {
        let session = MemorySession::new()
            .with_part(base_part().with_int("proto_index", 1, vec![0]));
        let (result, _) = build(&session);
        assert_eq!(result, Err(BuildError::NoPoints));
    }

    #[test]
    fn missing_prototype_index_aborts() {
        let session =
            MemorySession::new().with_part(base_part().with_float("P", 3, vec![0.0, 0.0, 0.0]));
        let (result, dataset) = build(&session);
        assert_eq!(result, Err(BuildError::MissingPrototypeIndex));
        assert!(dataset.points.is_empty());
    }

    #[test]
    fn prototype_table_stops_at_first_gap() {
        let session = MemorySession::new().with_part(
            MemoryPart::new(0, 0)
                .with_float("P", 3, vec![0.0, 0.0, 0.0])
                .with_int("proto_index", 1, vec![0])
                .with_detail_string("prototype0", "a")
                .with_detail_string("prototype1", "b")
                .with_detail_string("prototype3", "d"),
        );
        let (result, dataset) = build(&session);
        result.unwrap();
        assert_eq!(dataset.prototypes.as_slice(), &["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn empty_prototype_attribute_is_malformed() {
        let session = MemorySession::new().with_part(
            MemoryPart::new(0, 0)
                .with_float("P", 3, vec![0.0, 0.0, 0.0])
                .with_int("proto_index", 1, vec![0])
                .with_detail_string("prototype0", "a")
                .with_strings("prototype1", Vec::new()),
        );
        let (result, dataset) = build(&session);
        assert_eq!(
            result,
            Err(BuildError::MalformedPrototype("prototype1".into()))
        );
        assert!(dataset.prototypes.is_empty());
    }

    #[rstest]
    #[case::negative(-1)]
    #[case::past_table(2)]
    fn out_of_range_prototype_index_fails_build(#[case] index: i32) {
        let session = MemorySession::new().with_part(
            base_part()
                .with_float("P", 3, vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0])
                .with_int("proto_index", 1, vec![0, index]),
        );
        let (result, dataset) = build(&session);
        assert_eq!(
            result,
            Err(BuildError::PrototypeIndexOutOfRange {
                point: 1,
                index,
                prototypes: 2
            })
        );
        assert!(dataset.points.is_empty());
    }

    #[test]
    fn short_prototype_index_array_fails_build() {
        let session = MemorySession::new().with_part(
            base_part()
                .with_float("P", 3, vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0])
                .with_int("proto_index", 1, vec![0]),
        );
        let (result, _) = build(&session);
        assert_eq!(
            result,
            Err(BuildError::AttributeTooShort {
                name: "proto_index".into(),
                len: 1,
                points: 2
            })
        );
    }

    #[test]
    fn custom_attribute_names() {
        let session = MemorySession::new().with_part(
            MemoryPart::new(0, 0)
                .with_float("pos", 3, vec![1.0, 0.0, 0.0])
                .with_int("variant", 1, vec![0])
                .with_detail_string("mesh0", "meshes/bush"),
        );
        let names = InstanceAttributeNames {
            position: "pos".into(),
            prototype_index: "variant".into(),
            prototype_prefix: "mesh".into(),
            ..Default::default()
        };
        let mut builder = TransformBuilder::new(&session, session.part_refs()).with_names(names);
        builder.build().unwrap();
        assert_eq!(builder.dataset().prototypes.get(0), Some("meshes/bush"));
        assert_eq!(builder.dataset().points[0].position, Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn unused_short_normals_do_not_fail_build() {
        let session = MemorySession::new().with_part(
            base_part()
                .with_float("P", 3, vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0])
                .with_float("orient", 4, vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0])
                .with_float("N", 3, vec![1.0, 0.0, 0.0])
                .with_int("proto_index", 1, vec![0, 0]),
        );
        let (result, dataset) = build(&session);
        result.unwrap();
        assert_eq!(dataset.points.len(), 2);
        let linear = dataset.points[1].model_to_world.fixed_view::<3, 3>(0, 0).into_owned();
        assert!((linear - nalgebra::Matrix3::identity()).norm() < 1e-6);
    }

    #[test]
    fn short_normals_fail_build_without_orientation() {
        let session = MemorySession::new().with_part(
            base_part()
                .with_float("P", 3, vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0])
                .with_float("N", 3, vec![1.0, 0.0, 0.0])
                .with_int("proto_index", 1, vec![0, 0]),
        );
        let (result, _) = build(&session);
        assert_eq!(
            result,
            Err(BuildError::AttributeTooShort {
                name: "N".into(),
                len: 1,
                points: 2
            })
        );
    }

    /// Session whose cook can be replaced while a builder borrows it.
    struct RecookSession {
        cook: RefCell<MemorySession>,
    }

    impl GeometrySession for RecookSession {
        fn query_float(
            &self,
            part: PartRef,
            name: &str,
        ) -> Result<Option<AttributeQuery<f32>>, SessionError> {
            self.cook.borrow().query_float(part, name)
        }

        fn query_int(
            &self,
            part: PartRef,
            name: &str,
        ) -> Result<Option<AttributeQuery<i32>>, SessionError> {
            self.cook.borrow().query_int(part, name)
        }

        fn query_string(
            &self,
            part: PartRef,
            name: &str,
        ) -> Result<Option<AttributeQuery<String>>, SessionError> {
            self.cook.borrow().query_string(part, name)
        }
    }

    fn cook(x: f32, mesh: &str) -> MemorySession {
        MemorySession::new().with_part(
            MemoryPart::new(0, 0)
                .with_float("P", 3, vec![x, 0.0, 0.0])
                .with_int("proto_index", 1, vec![0])
                .with_detail_string("prototype0", mesh),
        )
    }

    #[test]
    fn rebuild_reads_the_current_cook() {
        let session = RecookSession {
            cook: RefCell::new(cook(1.0, "meshes/rock")),
        };
        let mut builder = TransformBuilder::new(&session, vec![PartRef::new(0, 0)]);
        builder.build().unwrap();
        assert_eq!(builder.dataset().points[0].position.x, -1.0);

        *session.cook.borrow_mut() = cook(5.0, "meshes/tree");
        builder.build().unwrap();
        assert_eq!(builder.dataset().points[0].position.x, -5.0);
        assert_eq!(builder.dataset().prototypes.get(0), Some("meshes/tree"));
        assert_eq!(builder.store().get("P").vector3_values().unwrap().len(), 1);
    }

    #[test]
    fn rebuild_after_attribute_removed_fails() {
        let session = RecookSession {
            cook: RefCell::new(cook(1.0, "meshes/rock")),
        };
        let mut builder = TransformBuilder::new(&session, vec![PartRef::new(0, 0)]);
        builder.build().unwrap();

        session.cook.borrow_mut().parts[0]
            .attributes
            .retain(|a| a.name != "proto_index");
        assert_eq!(builder.build(), Err(BuildError::MissingPrototypeIndex));
        assert!(builder.store().lookup("proto_index").is_none());
        // The previous dataset is kept on failure.
        assert_eq!(builder.dataset().points.len(), 1);
    }
}
