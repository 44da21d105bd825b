//! Math type aliases and helper functions.
//!
//! All instancing math is f32 and backed by nalgebra. Matrices follow the
//! nalgebra convention (column vectors, column-major storage).

pub use nalgebra;

use nalgebra::UnitQuaternion;

pub type Vec3 = nalgebra::Vector3<f32>;
pub type Vec4 = nalgebra::Vector4<f32>;
pub type Mat4 = nalgebra::Matrix4<f32>;

/// Quaternion (f32). Coordinates are laid out `(x, y, z, w)`;
/// `Quaternion::new` takes `w` first.
pub type Quat = nalgebra::Quaternion<f32>;

/// Directions shorter than this are treated as zero.
const MIN_DIRECTION_NORM: f32 = 1e-6;

/// Radians to degrees, used by the legacy normal-to-rotation mode.
pub const RAD_TO_DEG: f32 = 180.0 / std::f32::consts::PI;

// ===== Rotation =====

/// Quaternion from a point attribute laid out as `(x, y, z, w)`.
pub fn quat_from_vec4(v: &Vec4) -> Quat {
    Quat::from_vector(*v)
}

/// Unit quaternion for `q`, or identity when `q` is (near) zero.
pub fn quat_normalize_or_identity(q: Quat) -> UnitQuaternion<f32> {
    UnitQuaternion::try_new(q, MIN_DIRECTION_NORM).unwrap_or_else(UnitQuaternion::identity)
}

/// Shortest-arc rotation taking direction `from` onto direction `to`.
///
/// Inputs need not be unit length. A zero-length input yields identity.
/// Antiparallel inputs yield a half turn about the X axis.
pub fn quat_from_rotation_arc(from: &Vec3, to: &Vec3) -> Quat {
    if from.norm() < MIN_DIRECTION_NORM || to.norm() < MIN_DIRECTION_NORM {
        return Quat::identity();
    }
    UnitQuaternion::rotation_between(from, to)
        .unwrap_or_else(|| UnitQuaternion::from_axis_angle(&Vec3::x_axis(), std::f32::consts::PI))
        .into_inner()
}

#[cfg(test)]
pub(crate) fn quat_rotate_vec3(q: Quat, v: Vec3) -> Vec3 {
    quat_normalize_or_identity(q) * v
}

// ===== Matrices =====

/// Model matrix applying `scale`, then `rotation`, then `translation`.
///
/// The rotation is normalized first, so a scaled quaternion does not shear
/// or scale the model; a zero quaternion means no rotation.
pub fn mat4_from_scale_rotation_translation(
    scale: Vec3,
    rotation: Quat,
    translation: Vec3,
) -> Mat4 {
    Mat4::new_translation(&translation)
        * quat_normalize_or_identity(rotation).to_homogeneous()
        * Mat4::new_nonuniform_scaling(&scale)
}

/// The 16 matrix entries, column by column.
pub fn mat4_to_cols_array(m: &Mat4) -> [f32; 16] {
    let mut out = [0.0; 16];
    out.copy_from_slice(m.as_slice());
    out
}

pub fn mat4_from_cols_array(a: &[f32; 16]) -> Mat4 {
    Mat4::from_column_slice(a)
}

/// Split a model matrix built by [`mat4_from_scale_rotation_translation`]
/// back into `(scale, rotation, translation)`. Scale is assumed positive.
#[cfg(test)]
pub(crate) fn to_scale_rotation_translation(m: &Mat4) -> (Vec3, Quat, Vec3) {
    let linear = m.fixed_view::<3, 3>(0, 0).into_owned();
    let translation: Vec3 = m.fixed_view::<3, 1>(0, 3).into_owned();
    let scale = Vec3::from_iterator(linear.column_iter().map(|c| c.norm()));

    let mut unscaled = linear;
    for (mut column, s) in unscaled.column_iter_mut().zip(scale.iter()) {
        if *s > MIN_DIRECTION_NORM {
            column /= *s;
        }
    }
    let rotation = UnitQuaternion::from_rotation_matrix(
        &nalgebra::Rotation3::from_matrix_unchecked(unscaled),
    );
    (scale, rotation.into_inner(), translation)
}

// ===== Handedness conversion =====
//
// Source geometry is right-handed; the target renderer is left-handed with
// the X axis mirrored.

/// Mirror a position across the YZ plane (negate x).
pub fn convert_position(p: Vec3) -> Vec3 {
    Vec3::new(-p.x, p.y, p.z)
}

/// Mirror a direction across the YZ plane (negate x).
pub fn convert_normal(n: Vec3) -> Vec3 {
    Vec3::new(-n.x, n.y, n.z)
}

/// Mirror an orientation across the YZ plane (negate y and z).
pub fn convert_orientation(q: Quat) -> Quat {
    Quat::new(q.w, q.i, -q.j, -q.k)
}
