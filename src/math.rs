use std::f32::consts::{PI, TAU};

use nalgebra::{Isometry3, Matrix3, Rotation3, Translation3, UnitQuaternion, Vector2, Vector3};

/// Wraps an angle into `(-pi, pi]` so rotations take the shorter path.
pub fn wrap_angle(angle: f32) -> f32 {
    PI - (PI - angle).rem_euclid(TAU)
}

/// Rotation for an Euler pair applied X first, then Y, in intrinsic order.
pub fn euler_xy_rotation(x: f32, y: f32) -> UnitQuaternion<f32> {
    let rotation_x = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), x);
    let rotation_y = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), y);
    rotation_x * rotation_y
}

/// Scales a 2D velocity down so its magnitude does not exceed `max`.
pub fn clamp_magnitude(velocity: Vector2<f32>, max: f32) -> Vector2<f32> {
    let magnitude = velocity.norm();
    if magnitude > max {
        velocity * (max / magnitude)
    } else {
        velocity
    }
}

/// Rounds a rotation to the nearest axis-aligned orientation.
///
/// Only meaningful for rotations already within a small error of one of the
/// 24 cube symmetries.
pub fn snap_rotation(rotation: &UnitQuaternion<f32>) -> UnitQuaternion<f32> {
    let matrix = rotation.to_rotation_matrix().into_inner();
    let rounded = Matrix3::from_fn(|row, col| matrix[(row, col)].round());
    UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(rounded))
}

/// Rounds each component of a translation to a multiple of `pitch`.
pub fn snap_translation(translation: &Translation3<f32>, pitch: f32) -> Translation3<f32> {
    let snapped = translation.vector.map(|v| (v / pitch).round() * pitch);
    Translation3::from(snapped)
}

/// Settles an isometry onto the piece lattice.
pub fn snap_isometry(isometry: &Isometry3<f32>, pitch: f32) -> Isometry3<f32> {
    Isometry3::from_parts(
        snap_translation(&isometry.translation, pitch),
        snap_rotation(&isometry.rotation),
    )
}
