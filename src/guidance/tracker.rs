//! Path guidance tracker: keeps the directional indicator pointed along
//! the current path as the observer moves.
//!
//! Each update:
//! 1. Find the segment the observer is on (with look-ahead near corners)
//! 2. Pick the target corner at the end of that segment
//! 3. Derive a horizontal heading toward the target
//! 4. Blend the previous heading/position toward the new ones
//!
//! Step 4 is an exponential low-pass filter: every tick closes a fixed
//! fraction of the remaining angle, so the indicator never snaps.

use nalgebra::Vector3;
use tracing::debug;

use crate::config::{GuidanceConfig, HeadingReference};
use crate::geometry::frames::up;
use crate::geometry::{SE3, horizontal, look_rotation_horizontal, slerp};

use super::path::GuidePath;
use super::result::GuideOutput;
use super::state::{GuideState, GuidanceStatus};

/// One guidance step: advance `state` and return the indicator pose.
///
/// Returns `None` (and leaves `state` untouched) for paths with fewer than
/// two corners.
pub fn compute_guidance(
    observer: &Vector3<f64>,
    path: &GuidePath,
    state: &mut GuideState,
    config: &GuidanceConfig,
) -> Option<GuideOutput> {
    if !path.is_navigable() {
        return None;
    }

    let segment = path.closest_segment(
        observer,
        config.min_distance_to_next_node,
        config.degenerate_segment_epsilon,
    );
    let target_point = path.target_point(segment)?;

    // Indicator floats slightly above the observer, pushed toward the target.
    let base = observer + up() * config.indicator_height_offset;
    let toward = horizontal(&(target_point - observer));
    let target_position = if toward.norm_squared() > config.min_heading_direction_sq {
        base + toward.normalize() * config.indicator_forward_offset
    } else {
        base
    };

    let reference = match config.heading_reference {
        HeadingReference::Observer => *observer,
        HeadingReference::Indicator if state.initialized => state.position,
        HeadingReference::Indicator => target_position,
    };
    let raw_heading =
        look_rotation_horizontal(&(target_point - reference), config.min_heading_direction_sq);
    let target_heading = raw_heading.unwrap_or(state.heading);

    if state.initialized {
        state.heading = slerp(&state.heading, &target_heading, config.smoothing_factor);
        state.position = state
            .position
            .lerp(&target_position, config.smoothing_factor);
    } else {
        state.heading = target_heading;
        state.position = target_position;
        state.initialized = true;
    }

    if state.segment_index != segment {
        debug!("Guidance segment {:?} -> {:?}", state.segment_index, segment);
    }
    state.segment_index = segment;

    Some(GuideOutput {
        segment_index: segment,
        target_point,
        indicator: SE3::new(state.heading, state.position),
        heading_updated: raw_heading.is_some(),
        remaining_distance: path.remaining_distance(
            observer,
            segment,
            config.degenerate_segment_epsilon,
        ),
    })
}

/// Owns the current path and the indicator filter for one navigation target.
pub struct GuideTracker {
    config: GuidanceConfig,
    path: Option<GuidePath>,
    state: GuideState,
    status: GuidanceStatus,
}

impl GuideTracker {
    pub fn new(config: GuidanceConfig) -> Self {
        Self {
            config,
            path: None,
            state: GuideState::new(),
            status: GuidanceStatus::Inactive,
        }
    }

    pub fn config(&self) -> &GuidanceConfig {
        &self.config
    }

    pub fn status(&self) -> GuidanceStatus {
        self.status
    }

    pub fn path(&self) -> Option<&GuidePath> {
        self.path.as_ref()
    }

    pub fn state(&self) -> &GuideState {
        &self.state
    }

    /// Replace the path wholesale.
    ///
    /// Paths with fewer than two corners disable guidance.
    pub fn set_path(&mut self, path: GuidePath) {
        self.state.reset_progress();
        if path.is_navigable() {
            self.path = Some(path);
            self.status = GuidanceStatus::Active;
        } else {
            self.path = None;
            self.state.reset();
            self.status = GuidanceStatus::Inactive;
        }
    }

    /// A new path has been requested. Any previous path keeps guiding
    /// until the new one arrives.
    pub fn mark_pending(&mut self) {
        if self.status != GuidanceStatus::Active || self.path.is_none() {
            self.status = GuidanceStatus::Pending;
        }
    }

    /// The planner could not reach the destination.
    pub fn mark_no_path(&mut self) {
        self.path = None;
        self.state.reset();
        self.status = GuidanceStatus::NoPath;
    }

    /// Stop guiding entirely.
    pub fn clear(&mut self) {
        self.path = None;
        self.state.reset();
        self.status = GuidanceStatus::Inactive;
    }

    /// Advance the indicator for the observer's current position.
    ///
    /// Returns `None` whenever no usable path is held.
    pub fn update(&mut self, observer: &Vector3<f64>) -> Option<GuideOutput> {
        let path = self.path.as_ref()?;
        compute_guidance(observer, path, &mut self.state, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{yaw_angle, yaw_rotation};
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn l_path() -> GuidePath {
        GuidePath::new(vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(10.0, 0.0, 0.0),
            Vector3::new(10.0, 0.0, 10.0),
        ])
    }

    #[test]
    fn test_first_update_snaps_to_target() {
        let mut state = GuideState::new();
        let config = GuidanceConfig::default();
        let out = compute_guidance(&Vector3::new(5.0, 0.0, 0.0), &l_path(), &mut state, &config)
            .unwrap();

        assert_eq!(out.segment_index, Some(0));
        assert_eq!(out.target_point, Vector3::new(10.0, 0.0, 0.0));
        // Facing +X is yaw +90°.
        assert_relative_eq!(yaw_angle(&out.indicator.rotation).unwrap(), FRAC_PI_2, epsilon = 1e-9);
        assert_relative_eq!(
            out.indicator.translation,
            Vector3::new(5.5, 0.1, 0.0),
            epsilon = 1e-12
        );
        assert!(state.initialized);
    }

    #[test]
    fn test_heading_converges_monotonically() {
        let config = GuidanceConfig::default();
        let mut state = GuideState {
            heading: yaw_rotation(-2.0),
            position: Vector3::new(5.0, 0.1, 0.0),
            initialized: true,
            segment_index: None,
        };
        let observer = Vector3::new(5.0, 0.0, 0.0);
        let target = yaw_rotation(FRAC_PI_2);

        let mut prev = state.heading.angle_to(&target);
        let mut ticks = 0;
        while prev > 1e-3 {
            compute_guidance(&observer, &l_path(), &mut state, &config).unwrap();
            let err = state.heading.angle_to(&target);
            assert!(err < prev, "tick {}: {} !< {}", ticks, err, prev);
            prev = err;
            ticks += 1;
            assert!(ticks < 100);
        }
        // Shortest arc is 2π - 3.57 ≈ 2.71 rad; 0.85^n * 2.71 < 1e-3 after 49 ticks.
        assert!(ticks <= 55);
    }

    #[test]
    fn test_heading_is_always_level_unit_rotation() {
        let config = GuidanceConfig::default();
        let mut state = GuideState::new();
        let observer = Vector3::new(3.0, 1.6, 0.2);
        for _ in 0..10 {
            let out = compute_guidance(&observer, &l_path(), &mut state, &config).unwrap();
            let q = out.indicator.rotation;
            assert_relative_eq!(q.into_inner().norm(), 1.0, epsilon = 1e-12);
            assert_relative_eq!(q * Vector3::y(), Vector3::y(), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_zero_direction_keeps_previous_heading() {
        let config = GuidanceConfig::default();
        let previous = yaw_rotation(0.7);
        let mut state = GuideState {
            heading: previous,
            position: Vector3::new(10.0, 0.1, 10.0),
            initialized: true,
            segment_index: Some(1),
        };
        // Standing on the final corner.
        let out = compute_guidance(&Vector3::new(10.0, 0.0, 10.0), &l_path(), &mut state, &config)
            .unwrap();

        assert!(!out.heading_updated);
        assert_relative_eq!(out.indicator.rotation.angle_to(&previous), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_short_path_yields_nothing() {
        let config = GuidanceConfig::default();
        let mut state = GuideState::new();
        let single = GuidePath::new(vec![Vector3::new(1.0, 0.0, 1.0)]);

        assert!(compute_guidance(&Vector3::zeros(), &single, &mut state, &config).is_none());
        assert!(!state.initialized);
    }

    #[test]
    fn test_indicator_reference_uses_smoothed_position() {
        let config = GuidanceConfig {
            heading_reference: HeadingReference::Indicator,
            ..GuidanceConfig::default()
        };
        let mut state = GuideState {
            heading: yaw_rotation(0.0),
            position: Vector3::new(10.0, 0.1, -5.0),
            initialized: true,
            segment_index: None,
        };
        // Observer on segment 0; indicator sits directly "behind" corner 1 along -Z.
        let out = compute_guidance(&Vector3::new(2.0, 0.0, 0.0), &l_path(), &mut state, &config)
            .unwrap();

        // Measured from the indicator the target lies straight along +Z.
        assert_relative_eq!(yaw_angle(&out.indicator.rotation).unwrap(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_tracker_lifecycle() {
        let mut tracker = GuideTracker::new(GuidanceConfig::default());
        assert_eq!(tracker.status(), GuidanceStatus::Inactive);
        assert!(tracker.update(&Vector3::zeros()).is_none());

        tracker.mark_pending();
        assert_eq!(tracker.status(), GuidanceStatus::Pending);

        tracker.set_path(l_path());
        assert_eq!(tracker.status(), GuidanceStatus::Active);
        assert!(tracker.update(&Vector3::new(1.0, 0.0, 0.0)).is_some());

        // A refresh request keeps guiding on the stale path.
        tracker.mark_pending();
        assert_eq!(tracker.status(), GuidanceStatus::Active);
        assert!(tracker.update(&Vector3::new(2.0, 0.0, 0.0)).is_some());

        tracker.mark_no_path();
        assert_eq!(tracker.status(), GuidanceStatus::NoPath);
        assert!(tracker.update(&Vector3::new(2.0, 0.0, 0.0)).is_none());

        tracker.set_path(GuidePath::new(vec![Vector3::zeros()]));
        assert_eq!(tracker.status(), GuidanceStatus::Inactive);

        tracker.set_path(l_path());
        tracker.clear();
        assert_eq!(tracker.status(), GuidanceStatus::Inactive);
        assert!(tracker.path().is_none());
        assert!(!tracker.state().initialized);
    }

    #[test]
    fn test_new_path_keeps_indicator_heading() {
        let mut tracker = GuideTracker::new(GuidanceConfig::default());
        tracker.set_path(l_path());
        let before = tracker.update(&Vector3::new(5.0, 0.0, 0.0)).unwrap();

        // Replacement path turns the other way; the indicator turns gradually.
        tracker.set_path(GuidePath::new(vec![
            Vector3::new(5.0, 0.0, 0.0),
            Vector3::new(5.0, 0.0, 10.0),
        ]));
        let after = tracker.update(&Vector3::new(5.0, 0.0, 0.0)).unwrap();

        let turned = after.indicator.rotation.angle_to(&before.indicator.rotation);
        assert_relative_eq!(turned, 0.15 * FRAC_PI_2, epsilon = 1e-6);
    }
}
