//! SE3: rigid-body pose (rotation + translation).
//!
//! Transforms points as: p' = R * p + t
//!
//! Composition follows the usual convention: `a.compose(&b)` applies `b`
//! first, then `a`. A map anchored at pose `O` places its local point `p`
//! at `O.transform_point(p)` in world space.

use nalgebra::{Matrix3, Matrix4, Rotation3, UnitQuaternion, Vector3};

use super::yaw;

/// 6-DOF rigid transformation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SE3 {
    pub rotation: UnitQuaternion<f64>,
    pub translation: Vector3<f64>,
}

impl SE3 {
    /// Identity transformation.
    pub fn identity() -> Self {
        Self {
            rotation: UnitQuaternion::identity(),
            translation: Vector3::zeros(),
        }
    }

    pub fn new(rotation: UnitQuaternion<f64>, translation: Vector3<f64>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// Pure translation.
    pub fn from_translation(translation: Vector3<f64>) -> Self {
        Self {
            rotation: UnitQuaternion::identity(),
            translation,
        }
    }

    /// Construct from quaternion (w, x, y, z) and translation.
    ///
    /// The quaternion is normalized, so slightly drifted inputs from a
    /// tracker or a text file are accepted.
    pub fn from_quaternion(qw: f64, qx: f64, qy: f64, qz: f64, translation: Vector3<f64>) -> Self {
        let rotation =
            UnitQuaternion::from_quaternion(nalgebra::Quaternion::new(qw, qx, qy, qz));
        Self {
            rotation,
            translation,
        }
    }

    /// Construct from homogeneous 4x4 matrix of form [R | t; 0 | 1].
    pub fn from_matrix(mat: Matrix4<f64>) -> Self {
        let rot: Matrix3<f64> = mat.fixed_view::<3, 3>(0, 0).into_owned();
        let translation = Vector3::new(mat[(0, 3)], mat[(1, 3)], mat[(2, 3)]);
        let rot3 = Rotation3::from_matrix(&rot);
        Self {
            rotation: UnitQuaternion::from_rotation_matrix(&rot3),
            translation,
        }
    }

    /// Inverse transformation.
    ///
    /// For T = [R | t]: T^{-1} = [R^T | -R^T * t]
    pub fn inverse(&self) -> Self {
        let rot_inv = self.rotation.inverse();
        Self {
            rotation: rot_inv,
            translation: -(rot_inv * self.translation),
        }
    }

    /// Compose two transforms: self ∘ other (apply `other`, then `self`).
    ///
    /// [R1 | t1] ∘ [R2 | t2] = [R1*R2 | R1*t2 + t1]
    pub fn compose(&self, other: &SE3) -> Self {
        Self {
            rotation: self.rotation * other.rotation,
            translation: self.rotation * other.translation + self.translation,
        }
    }

    /// Transform a point from this pose's local frame into the parent frame.
    pub fn transform_point(&self, p: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * p + self.translation
    }

    /// Transform a point from the parent frame into this pose's local frame.
    pub fn inverse_transform_point(&self, p: &Vector3<f64>) -> Vector3<f64> {
        self.rotation.inverse() * (p - self.translation)
    }

    /// Transform multiple points.
    pub fn transform_points(&self, pts: &[Vector3<f64>]) -> Vec<Vector3<f64>> {
        pts.iter().map(|p| self.transform_point(p)).collect()
    }

    /// Blend toward `target`: linear on translation, spherical on rotation.
    ///
    /// `t` is clamped to [0, 1]. `t = 0` returns `self`, `t = 1` returns `target`.
    pub fn interpolate(&self, target: &SE3, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            rotation: yaw::slerp(&self.rotation, &target.rotation, t),
            translation: self.translation.lerp(&target.translation, t),
        }
    }

    /// Euclidean distance between the two translations.
    pub fn translation_distance(&self, other: &SE3) -> f64 {
        (self.translation - other.translation).norm()
    }

    /// Rotation angle (radians) between the two orientations.
    pub fn angle_to(&self, other: &SE3) -> f64 {
        self.rotation.angle_to(&other.rotation)
    }
}

impl Default for SE3 {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn yaw_pose(angle: f64, t: Vector3<f64>) -> SE3 {
        SE3::new(
            UnitQuaternion::from_axis_angle(&Vector3::y_axis(), angle),
            t,
        )
    }

    #[test]
    fn test_identity_transform() {
        let p = Vector3::new(1.0, 2.0, 3.0);
        assert_relative_eq!(SE3::identity().transform_point(&p), p, epsilon = 1e-12);
    }

    #[test]
    fn test_inverse_composes_to_identity() {
        let pose = yaw_pose(0.7, Vector3::new(1.0, -2.0, 0.5));
        let composed = pose.compose(&pose.inverse());

        assert_relative_eq!(composed.translation, Vector3::zeros(), epsilon = 1e-12);
        assert_relative_eq!(composed.rotation.angle(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_compose_applies_right_operand_first() {
        // Rotate +90° about Y, then translate by (10, 0, 0).
        let a = SE3::from_translation(Vector3::new(10.0, 0.0, 0.0));
        let b = yaw_pose(FRAC_PI_2, Vector3::zeros());
        let p = Vector3::new(0.0, 0.0, 1.0);

        // +Z rotated +90° about +Y lands on +X.
        let out = a.compose(&b).transform_point(&p);
        assert_relative_eq!(out, Vector3::new(11.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_inverse_transform_point_round_trip() {
        let pose = yaw_pose(-1.2, Vector3::new(3.0, 0.0, 4.0));
        let p = Vector3::new(0.3, 1.1, -2.0);
        let back = pose.inverse_transform_point(&pose.transform_point(&p));
        assert_relative_eq!(back, p, epsilon = 1e-12);
    }

    #[test]
    fn test_from_matrix_matches_components() {
        let pose = yaw_pose(0.4, Vector3::new(1.0, 2.0, 3.0));
        let mut mat = Matrix4::identity();
        mat.fixed_view_mut::<3, 3>(0, 0)
            .copy_from(pose.rotation.to_rotation_matrix().matrix());
        mat[(0, 3)] = 1.0;
        mat[(1, 3)] = 2.0;
        mat[(2, 3)] = 3.0;

        let rebuilt = SE3::from_matrix(mat);
        assert_relative_eq!(rebuilt.translation, pose.translation, epsilon = 1e-12);
        assert_relative_eq!(rebuilt.angle_to(&pose), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_interpolate_endpoints() {
        let a = yaw_pose(0.0, Vector3::zeros());
        let b = yaw_pose(1.0, Vector3::new(2.0, 0.0, 0.0));

        let none = a.interpolate(&b, 0.0);
        assert_relative_eq!(none.translation, a.translation, epsilon = 1e-12);
        assert_relative_eq!(none.angle_to(&a), 0.0, epsilon = 1e-6);

        let full = a.interpolate(&b, 1.0);
        assert_relative_eq!(full.translation, b.translation, epsilon = 1e-12);
        assert_relative_eq!(full.angle_to(&b), 0.0, epsilon = 1e-6);

        let half = a.interpolate(&b, 0.5);
        assert_relative_eq!(half.translation, Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(half.angle_to(&a), 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_interpolate_clamps_factor() {
        let a = SE3::identity();
        let b = SE3::from_translation(Vector3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(
            a.interpolate(&b, 3.0).translation,
            b.translation,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            a.interpolate(&b, -1.0).translation,
            a.translation,
            epsilon = 1e-12
        );
    }
}
