//! Environment origin from a detected marker and its anchor offset.
//!
//! Given the marker's world pose `W` and the anchor's pose `A` relative to
//! the map's local origin, the origin `O` must satisfy `O ∘ A = W`:
//!
//! ```text
//! O = W ∘ A⁻¹
//! ```
//!
//! Both rotations are flattened to yaw before combining, so a tilted
//! camera view never tilts the map.

use crate::geometry::{SE3, flatten_yaw};

/// Result of an origin computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OriginEstimate {
    /// World-space pose of the map's local origin.
    pub origin: SE3,
    /// True when a rotation could not be flattened and identity yaw was used.
    pub degenerate: bool,
}

/// Replace a pose's rotation with its yaw-only part.
fn level(pose: &SE3) -> (SE3, bool) {
    let flat = flatten_yaw(&pose.rotation);
    (
        SE3::new(flat.rotation(), pose.translation),
        flat.is_degenerate(),
    )
}

/// Compute where the map origin must sit so the anchor lands on the marker.
///
/// When `flatten_anchor` is false the anchor offset rotation is used as-is.
pub fn compute_origin(real_world: &SE3, anchor_offset: &SE3, flatten_anchor: bool) -> OriginEstimate {
    let (real_flat, real_degenerate) = level(real_world);
    let (anchor, anchor_degenerate) = if flatten_anchor {
        level(anchor_offset)
    } else {
        (*anchor_offset, false)
    };

    OriginEstimate {
        origin: real_flat.compose(&anchor.inverse()),
        degenerate: real_degenerate || anchor_degenerate,
    }
}

/// [`compute_origin`] with both rotations flattened, returning only the pose.
pub fn compute_origin_pose(real_world: &SE3, anchor_offset: &SE3) -> SE3 {
    compute_origin(real_world, anchor_offset, true).origin
}

/// Blend the current origin toward the origin implied by a new observation.
///
/// `smoothing` is clamped to [0, 1]. At 1 the result equals a fresh
/// [`compute_origin`]; at 0 the current origin is returned unchanged.
pub fn recalibrate(
    current: &SE3,
    real_world: &SE3,
    anchor_offset: &SE3,
    smoothing: f64,
    flatten_anchor: bool,
) -> SE3 {
    let ideal = compute_origin(real_world, anchor_offset, flatten_anchor).origin;
    current.interpolate(&ideal, smoothing)
}

/// Positional and angular gap between two origins.
pub fn origin_error(a: &SE3, b: &SE3) -> (f64, f64) {
    (a.translation_distance(b), a.angle_to(b))
}
