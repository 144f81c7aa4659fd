//! Coordinate frame conventions shared by alignment and guidance.
//!
//! # World Frame (Y-up, left-handed engine convention)
//!
//! ```text
//!        +Y (up)
//!         |
//!         |   +Z (forward)
//!         |  /
//!         | /
//!         +------ +X (right)
//! ```
//! - X: Right
//! - Y: Up (gravity points along -Y)
//! - Z: Forward
//!
//! Tracked marker poses, the environment origin, path corners and the
//! observer position all live in this frame. Map-local coordinates (anchor
//! offsets, destinations, planner output) use the same axes, relative to
//! the environment origin.
//!
//! # Horizontal Plane
//!
//! "Flattening" a vector zeroes its Y component. A heading is a rotation
//! about +Y only; the heading that looks along direction `d` maps +Z onto
//! the horizontal projection of `d`:
//!
//! ```text
//! yaw = atan2(d.x, d.z)
//! q   = R_y(yaw)
//! ```
//!
//! so yaw 0 faces +Z and yaw +90° faces +X.

use nalgebra::{Unit, UnitQuaternion, Vector3};

/// World up axis.
pub fn up() -> Vector3<f64> {
    Vector3::new(0.0, 1.0, 0.0)
}

/// Axis a zero-yaw heading looks along.
pub fn forward() -> Vector3<f64> {
    Vector3::new(0.0, 0.0, 1.0)
}

/// Unit up axis, for building yaw rotations.
pub fn up_axis() -> Unit<Vector3<f64>> {
    Vector3::y_axis()
}

/// Project a vector onto the horizontal plane (zero the vertical component).
#[inline]
pub fn horizontal(v: &Vector3<f64>) -> Vector3<f64> {
    Vector3::new(v.x, 0.0, v.z)
}

/// Rotation about +Y by `yaw` radians.
#[inline]
pub fn yaw_rotation(yaw: f64) -> UnitQuaternion<f64> {
    UnitQuaternion::from_axis_angle(&up_axis(), yaw)
}

/// Heading that looks along the horizontal projection of `direction`.
///
/// Returns `None` when the projected direction has squared length below
/// `min_norm_sq` (e.g. the target is straight above or below, or coincides
/// with the reference point).
pub fn look_rotation_horizontal(
    direction: &Vector3<f64>,
    min_norm_sq: f64,
) -> Option<UnitQuaternion<f64>> {
    let flat = horizontal(direction);
    if flat.norm_squared() < min_norm_sq {
        return None;
    }
    Some(yaw_rotation(flat.x.atan2(flat.z)))
}
