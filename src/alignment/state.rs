//! Alignment state machine.
//!
//! ```text
//! Unplaced --place()--> Placed --recalibrate()*--> Placed
//!    ^                    |
//!    +------reset()-------+
//! ```
//!
//! Recalibration from `Unplaced` is ignored; only `place` leaves it.

use crate::geometry::SE3;

use super::anchors::MarkerId;

/// An environment origin that has been placed in the world.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    /// World pose of the map's local origin.
    pub origin: SE3,
    /// Marker used for the initial placement.
    pub marker: MarkerId,
    /// Number of recalibration steps applied since placement.
    pub recalibrations: usize,
}

/// State of the environment alignment.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AlignmentState {
    /// No origin yet (waiting for a confirmed marker scan).
    #[default]
    Unplaced,
    /// Origin placed; may be refined by recalibration.
    Placed(Placement),
}

impl AlignmentState {
    pub fn is_placed(&self) -> bool {
        matches!(self, AlignmentState::Placed(_))
    }

    pub fn origin(&self) -> Option<&SE3> {
        match self {
            AlignmentState::Placed(p) => Some(&p.origin),
            AlignmentState::Unplaced => None,
        }
    }
}
