//! Pose aligner: owns the environment origin for one navigation session.

use nalgebra::Vector3;
use tracing::{debug, info, warn};

use crate::config::AlignmentConfig;
use crate::geometry::SE3;

use super::anchors::{AnchorDatabase, MarkerId};
use super::error::AlignmentError;
use super::origin::{compute_origin, origin_error};
use super::state::{AlignmentState, Placement};

/// Places a static map so a marker's virtual anchor coincides with the
/// detected marker, then keeps refining that placement.
pub struct PoseAligner {
    config: AlignmentConfig,
    anchors: AnchorDatabase,
    state: AlignmentState,
}

impl PoseAligner {
    pub fn new(config: AlignmentConfig, anchors: AnchorDatabase) -> Self {
        Self {
            config,
            anchors,
            state: AlignmentState::Unplaced,
        }
    }

    pub fn state(&self) -> &AlignmentState {
        &self.state
    }

    pub fn anchors(&self) -> &AnchorDatabase {
        &self.anchors
    }

    pub fn is_placed(&self) -> bool {
        self.state.is_placed()
    }

    /// Current environment origin, if placed.
    pub fn origin(&self) -> Option<&SE3> {
        self.state.origin()
    }

    /// Marker used for the current placement.
    pub fn active_marker(&self) -> Option<&MarkerId> {
        match &self.state {
            AlignmentState::Placed(p) => Some(&p.marker),
            AlignmentState::Unplaced => None,
        }
    }

    pub fn recalibration_count(&self) -> usize {
        match &self.state {
            AlignmentState::Placed(p) => p.recalibrations,
            AlignmentState::Unplaced => 0,
        }
    }

    fn anchor_for(&self, marker: &MarkerId) -> Result<SE3, AlignmentError> {
        self.anchors
            .get(marker)
            .copied()
            .ok_or_else(|| AlignmentError::UnknownMarker(marker.clone()))
    }

    /// Place the environment from a detected marker pose.
    ///
    /// Replaces any existing placement. Fails only if the marker has no
    /// anchor offset configured; the current state is left untouched then.
    pub fn place(&mut self, marker: &MarkerId, real_world: &SE3) -> Result<SE3, AlignmentError> {
        let anchor = match self.anchor_for(marker) {
            Ok(a) => a,
            Err(e) => {
                warn!("Placement aborted: {}", e);
                return Err(e);
            }
        };

        let estimate = compute_origin(real_world, &anchor, self.config.flatten_anchor_offset);
        if estimate.degenerate {
            warn!(
                "Marker '{}' viewed edge-on or from directly above; using identity yaw",
                marker
            );
        }

        info!(
            "Map aligned via '{}' at origin [{:.2}, {:.2}, {:.2}]",
            marker,
            estimate.origin.translation.x,
            estimate.origin.translation.y,
            estimate.origin.translation.z
        );

        self.state = AlignmentState::Placed(Placement {
            origin: estimate.origin,
            marker: marker.clone(),
            recalibrations: 0,
        });
        Ok(estimate.origin)
    }

    /// Refine the placed origin from a new observation of any known marker.
    ///
    /// Returns `Ok(Some(origin))` only when the origin was updated. While
    /// unplaced, and for degenerate views (edge-on or from directly above),
    /// nothing changes and `Ok(None)` is returned.
    pub fn recalibrate(
        &mut self,
        marker: &MarkerId,
        real_world: &SE3,
    ) -> Result<Option<SE3>, AlignmentError> {
        if !self.state.is_placed() {
            return Ok(None);
        }
        let anchor = self.anchor_for(marker)?;
        let estimate = compute_origin(real_world, &anchor, self.config.flatten_anchor_offset);
        if estimate.degenerate {
            debug!("Skipping recalibration from degenerate view of '{}'", marker);
            return Ok(None);
        }

        let AlignmentState::Placed(placement) = &mut self.state else {
            return Ok(None);
        };
        let updated = placement
            .origin
            .interpolate(&estimate.origin, self.config.recalibration_smoothing);
        let (dp, da) = origin_error(&placement.origin, &updated);
        debug!(
            "Recalibrated via '{}': moved {:.3} m, {:.2} deg",
            marker,
            dp,
            da.to_degrees()
        );

        placement.origin = updated;
        placement.recalibrations += 1;
        Ok(Some(updated))
    }

    /// Drop the placement (end of session).
    pub fn reset(&mut self) {
        if self.state.is_placed() {
            info!("Environment placement reset");
        }
        self.state = AlignmentState::Unplaced;
    }

    /// Map-local point to world space.
    pub fn to_world(&self, local: &Vector3<f64>) -> Option<Vector3<f64>> {
        self.origin().map(|o| o.transform_point(local))
    }

    /// World point to map-local space.
    pub fn to_local(&self, world: &Vector3<f64>) -> Option<Vector3<f64>> {
        self.origin().map(|o| o.inverse_transform_point(world))
    }
}
