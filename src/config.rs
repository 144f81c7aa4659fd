//! Configuration for alignment, guidance and the session loop.
//!
//! All parameters have defaults tuned for handheld AR navigation indoors,
//! so a YAML file only needs the keys it wants to override:
//!
//! ```yaml
//! guidance:
//!   smoothing_factor: 0.2
//!   heading_reference: indicator
//! session:
//!   update_interval_s: 0.1
//! ```

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Which point the heading is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadingReference {
    /// Direction from the observer to the target corner.
    #[default]
    Observer,
    /// Direction from the indicator's own smoothed position.
    Indicator,
}

/// Environment placement and recalibration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    /// Blend factor per re-observation, in (0, 1]. 1 snaps to the new estimate.
    pub recalibration_smoothing: f64,
    /// Also strip pitch/roll from the anchor offset, keeping the map level.
    pub flatten_anchor_offset: bool,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            recalibration_smoothing: 0.1,
            flatten_anchor_offset: true,
        }
    }
}

/// Directional indicator behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuidanceConfig {
    /// Per-tick blend toward the target heading/position, in (0, 1].
    pub smoothing_factor: f64,
    /// Distance (m) to a segment's end at which guidance moves on to the next segment.
    pub min_distance_to_next_node: f64,
    /// Indicator height above the observer (m).
    pub indicator_height_offset: f64,
    /// Indicator distance ahead of the observer toward the target (m).
    pub indicator_forward_offset: f64,
    /// Segments with squared length below this are skipped.
    pub degenerate_segment_epsilon: f64,
    /// Heading directions with squared horizontal length below this keep the previous heading.
    pub min_heading_direction_sq: f64,
    pub heading_reference: HeadingReference,
    /// Vertical lift applied to the rendered path polyline (m).
    pub path_height_offset: f64,
}

impl Default for GuidanceConfig {
    fn default() -> Self {
        Self {
            smoothing_factor: 0.15,
            min_distance_to_next_node: 0.4,
            indicator_height_offset: 0.1,
            indicator_forward_offset: 0.5,
            degenerate_segment_epsilon: 1e-3,
            min_heading_direction_sq: 1e-3,
            heading_reference: HeadingReference::Observer,
            path_height_offset: 0.02,
        }
    }
}

/// Tick loop throttling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Minimum time between guidance recomputations (s).
    pub update_interval_s: f64,
    /// Observer displacement (m) since the last path request that triggers a new one.
    pub recalculate_distance_threshold: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            update_interval_s: 0.25,
            recalculate_distance_threshold: 1.0,
        }
    }
}

/// Complete configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    pub alignment: AlignmentConfig,
    pub guidance: GuidanceConfig,
    pub session: SessionConfig,
}

impl NavConfig {
    /// Load from a YAML file and validate.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut text = String::new();
        File::open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?
            .read_to_string(&mut text)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml_str(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Parse from YAML text and validate.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let mut config: NavConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject negative distances/intervals; clamp smoothing factors into (0, 1].
    pub fn validate(&mut self) -> Result<()> {
        let distances = [
            ("guidance.min_distance_to_next_node", self.guidance.min_distance_to_next_node),
            ("guidance.indicator_forward_offset", self.guidance.indicator_forward_offset),
            ("guidance.degenerate_segment_epsilon", self.guidance.degenerate_segment_epsilon),
            ("guidance.min_heading_direction_sq", self.guidance.min_heading_direction_sq),
            ("session.update_interval_s", self.session.update_interval_s),
            (
                "session.recalculate_distance_threshold",
                self.session.recalculate_distance_threshold,
            ),
        ];
        for (name, value) in distances {
            if !value.is_finite() || value < 0.0 {
                bail!("{} must be a non-negative number, got {}", name, value);
            }
        }

        self.guidance.smoothing_factor =
            clamp_smoothing("guidance.smoothing_factor", self.guidance.smoothing_factor);
        self.alignment.recalibration_smoothing = clamp_smoothing(
            "alignment.recalibration_smoothing",
            self.alignment.recalibration_smoothing,
        );
        Ok(())
    }
}

/// Smallest accepted smoothing factor; zero would freeze the filter.
const MIN_SMOOTHING: f64 = 1e-3;

fn clamp_smoothing(name: &str, value: f64) -> f64 {
    if !value.is_finite() {
        warn!("{} is not finite, using 1.0", name);
        return 1.0;
    }
    let clamped = value.clamp(MIN_SMOOTHING, 1.0);
    if clamped != value {
        warn!("{} = {} outside (0, 1], clamped to {}", name, value, clamped);
    }
    clamped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_field_tuning() {
        let config = NavConfig::default();
        assert_eq!(config.guidance.smoothing_factor, 0.15);
        assert_eq!(config.guidance.min_distance_to_next_node, 0.4);
        assert_eq!(config.session.update_interval_s, 0.25);
        assert_eq!(config.session.recalculate_distance_threshold, 1.0);
        assert_eq!(config.guidance.heading_reference, HeadingReference::Observer);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = NavConfig::from_yaml_str(
            "guidance:\n  smoothing_factor: 0.3\n  heading_reference: indicator\n",
        )
        .unwrap();

        assert_eq!(config.guidance.smoothing_factor, 0.3);
        assert_eq!(config.guidance.heading_reference, HeadingReference::Indicator);
        assert_eq!(config.guidance.min_distance_to_next_node, 0.4);
        assert_eq!(config.alignment, AlignmentConfig::default());
    }

    #[test]
    fn test_smoothing_is_clamped() {
        let config = NavConfig::from_yaml_str(
            "guidance:\n  smoothing_factor: 4.0\nalignment:\n  recalibration_smoothing: 0.0\n",
        )
        .unwrap();

        assert_eq!(config.guidance.smoothing_factor, 1.0);
        assert_eq!(config.alignment.recalibration_smoothing, MIN_SMOOTHING);
    }

    #[test]
    fn test_negative_threshold_rejected() {
        let err = NavConfig::from_yaml_str("session:\n  recalculate_distance_threshold: -1.0\n");
        assert!(err.is_err());
    }
}
