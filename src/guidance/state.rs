//! Guidance filter state and status.

use nalgebra::{UnitQuaternion, Vector3};

/// Per-tick state of the directional indicator filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuideState {
    /// Segment selected on the last update.
    pub segment_index: Option<usize>,
    /// Smoothed heading (yaw-only).
    pub heading: UnitQuaternion<f64>,
    /// Smoothed indicator position.
    pub position: Vector3<f64>,
    /// False until the first update seeds heading and position.
    pub initialized: bool,
}

impl GuideState {
    pub fn new() -> Self {
        Self {
            segment_index: None,
            heading: UnitQuaternion::identity(),
            position: Vector3::zeros(),
            initialized: false,
        }
    }

    /// Forget path progress but keep the indicator where it is.
    ///
    /// Used when a new path replaces the old one: the indicator keeps
    /// turning smoothly from its current heading.
    pub fn reset_progress(&mut self) {
        self.segment_index = None;
    }

    /// Forget everything; the next update snaps to the computed target.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for GuideState {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether guidance is currently being produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GuidanceStatus {
    /// No navigation in progress, or the path had fewer than two corners.
    #[default]
    Inactive,
    /// A path has been requested and has not arrived yet.
    Pending,
    /// The planner could not produce a complete path.
    NoPath,
    /// Following a path.
    Active,
}
