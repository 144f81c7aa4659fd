//! Yaw extraction, flattening and panic-free spherical interpolation.
//!
//! A tracked marker's rotation carries the detector's pitch and roll. The
//! map must stay level, so only the yaw (rotation about +Y) survives.
//! Yaw is read from the rotated forward axis:
//!
//! ```text
//! f   = R * (0, 0, 1)
//! yaw = atan2(f.x, f.z)
//! ```
//!
//! This matches an Y-X-Z Euler decomposition. It is undefined when `f` is
//! (nearly) vertical, i.e. pitch ≈ ±90°; such rotations are reported as
//! degenerate and callers fall back to the identity heading.

use nalgebra::UnitQuaternion;

use super::frames::{forward, horizontal, yaw_rotation};

/// Squared horizontal length of the forward axis below which yaw is undefined.
const DEGENERATE_FORWARD_SQ: f64 = 1e-8;

/// Epsilon passed to nalgebra's `try_slerp`.
const SLERP_EPSILON: f64 = 1e-9;

/// Outcome of removing pitch and roll from a rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum YawFlatten {
    /// Yaw-only rotation.
    Level(UnitQuaternion<f64>),
    /// Forward axis was vertical; yaw is undefined.
    Degenerate,
}

impl YawFlatten {
    /// The flattened rotation, or identity for a degenerate input.
    pub fn rotation(&self) -> UnitQuaternion<f64> {
        match self {
            YawFlatten::Level(q) => *q,
            YawFlatten::Degenerate => UnitQuaternion::identity(),
        }
    }

    pub fn is_degenerate(&self) -> bool {
        matches!(self, YawFlatten::Degenerate)
    }
}

/// Heading angle (radians) of a rotation, or `None` if undefined.
///
/// Undefined when the forward axis is vertical or the rotation is not finite.
pub fn yaw_angle(q: &UnitQuaternion<f64>) -> Option<f64> {
    let f = horizontal(&(q * forward()));
    let len_sq = f.norm_squared();
    if !len_sq.is_finite() || len_sq < DEGENERATE_FORWARD_SQ {
        return None;
    }
    Some(f.x.atan2(f.z))
}

/// Remove pitch and roll, keeping only the rotation about +Y.
pub fn flatten_yaw(q: &UnitQuaternion<f64>) -> YawFlatten {
    match yaw_angle(q) {
        Some(yaw) => YawFlatten::Level(yaw_rotation(yaw)),
        None => YawFlatten::Degenerate,
    }
}

/// Spherical interpolation that never panics.
///
/// nalgebra's `slerp` panics when the two rotations are within floating
/// noise of each other; there the normalized linear blend is used instead.
pub fn slerp(from: &UnitQuaternion<f64>, to: &UnitQuaternion<f64>, t: f64) -> UnitQuaternion<f64> {
    if t <= 0.0 {
        return *from;
    }
    if t >= 1.0 {
        return *to;
    }
    from.try_slerp(to, t, SLERP_EPSILON)
        .unwrap_or_else(|| from.nlerp(to, t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

    #[test]
    fn test_flatten_removes_pitch_and_roll() {
        let yaw = 0.8;
        let tilted = yaw_rotation(yaw)
            * UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 0.3)
            * UnitQuaternion::from_axis_angle(&Vector3::z_axis(), -0.2);

        let flat = flatten_yaw(&tilted);
        assert!(!flat.is_degenerate());
        assert_relative_eq!(flat.rotation().angle_to(&yaw_rotation(yaw)), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_flatten_keeps_level_rotation() {
        let q = yaw_rotation(-2.5);
        assert_relative_eq!(flatten_yaw(&q).rotation().angle_to(&q), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_flatten_vertical_forward_is_degenerate() {
        // Pitch 90°: forward points straight down.
        let q = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), FRAC_PI_2);
        let flat = flatten_yaw(&q);

        assert!(flat.is_degenerate());
        assert_eq!(flat.rotation(), UnitQuaternion::identity());
        assert!(yaw_angle(&q).is_none());
    }

    #[test]
    fn test_non_finite_rotation_is_degenerate() {
        let nan = UnitQuaternion::new_normalize(nalgebra::Quaternion::new(0.0, 0.0, 0.0, 0.0));
        assert!(yaw_angle(&nan).is_none());
        assert!(flatten_yaw(&nan).is_degenerate());
    }

    #[test]
    fn test_slerp_identical_rotations_does_not_panic() {
        let q = yaw_rotation(0.3);
        let nearly = yaw_rotation(0.3 + 1e-15);
        let out = slerp(&q, &nearly, 0.5);
        assert_relative_eq!(out.angle_to(&q), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_slerp_fraction_of_angle() {
        let a = yaw_rotation(0.0);
        let b = yaw_rotation(FRAC_PI_2);
        let out = slerp(&a, &b, 0.5);
        assert_relative_eq!(yaw_angle(&out).unwrap(), FRAC_PI_4, epsilon = 1e-9);
    }

    #[test]
    fn test_slerp_half_turn() {
        let a = yaw_rotation(0.0);
        let b = yaw_rotation(std::f64::consts::PI);
        let out = slerp(&a, &b, 0.25);
        assert_relative_eq!(out.angle_to(&b), 0.75 * std::f64::consts::PI, epsilon = 1e-9);
    }
}
