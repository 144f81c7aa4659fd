//! Session input events and outgoing path requests.
//!
//! Collaborators never call into the session directly. The marker detector,
//! the UI and the path planner each hold a `Sender<SessionEvent>` and the
//! session drains the queue at the start of every tick.

use std::fmt;

use nalgebra::Vector3;

use crate::alignment::MarkerId;
use crate::geometry::SE3;
use crate::planning::PlanOutcome;

/// Monotonic identifier of a path request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PathRequestId(pub u64);

impl PathRequestId {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for PathRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One marker detector sample.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerObservation {
    pub marker: MarkerId,
    /// World pose of the marker.
    pub pose: SE3,
    /// False when the detector only has a stale/limited estimate.
    pub tracked: bool,
}

impl MarkerObservation {
    pub fn tracked(marker: impl Into<MarkerId>, pose: SE3) -> Self {
        Self {
            marker: marker.into(),
            pose,
            tracked: true,
        }
    }
}

/// Input queue message.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Marker detector produced a pose.
    MarkerObserved(MarkerObservation),
    /// Marker detector dropped a marker.
    MarkerLost(MarkerId),
    /// User confirmed placement on the current candidate marker.
    ConfirmPlacement,
    /// User picked a destination by name.
    SelectDestination(String),
    /// User cancelled navigation.
    StopNavigation,
    /// Planner answer for an earlier request.
    PathResult {
        request: PathRequestId,
        outcome: PlanOutcome,
    },
    /// End the session: drop placement, navigation and candidate.
    Reset,
}

/// Path query for the external planner, in map-local coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct PathRequest {
    pub id: PathRequestId,
    pub start_local: Vector3<f64>,
    pub goal_local: Vector3<f64>,
}
