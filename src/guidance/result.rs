//! Guidance output for one update tick.

use nalgebra::Vector3;

use crate::geometry::SE3;

/// Result of one guidance update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuideOutput {
    /// Segment the observer is on, `None` if every segment was degenerate.
    pub segment_index: Option<usize>,
    /// Corner currently being steered toward.
    pub target_point: Vector3<f64>,
    /// Smoothed indicator pose (yaw-only rotation).
    pub indicator: SE3,
    /// False when the raw direction was too short and the previous heading was kept.
    pub heading_updated: bool,
    /// Along-path distance left to the final corner (m).
    pub remaining_distance: f64,
}
