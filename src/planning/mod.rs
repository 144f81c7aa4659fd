//! Path planning seam.
//!
//! The session never plans itself: it issues a [`PathRequest`](crate::session::PathRequest)
//! in map-local coordinates and waits for a result event. Anything that
//! implements [`PathPlanner`] can answer those requests, synchronously or
//! from another thread.

pub mod waypoint_graph;

use nalgebra::Vector3;

pub use waypoint_graph::{WaypointGraph, WaypointGraphPlanner};

/// Planner answer for one start/goal query.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanOutcome {
    /// Reaches the goal.
    Complete(Vec<Vector3<f64>>),
    /// Ends short of the goal. Treated as "no path".
    Partial(Vec<Vector3<f64>>),
    /// Nothing could be planned.
    Failed,
}

impl PlanOutcome {
    /// Corners usable for guidance: a complete path with at least two corners.
    pub fn usable_corners(&self) -> Option<&[Vector3<f64>]> {
        match self {
            PlanOutcome::Complete(corners) if corners.len() >= 2 => Some(corners),
            _ => None,
        }
    }

    pub fn into_usable_corners(self) -> Option<Vec<Vector3<f64>>> {
        match self {
            PlanOutcome::Complete(corners) if corners.len() >= 2 => Some(corners),
            _ => None,
        }
    }
}

/// Produces a walkable polyline between two map-local points.
pub trait PathPlanner {
    fn plan(&self, start: &Vector3<f64>, goal: &Vector3<f64>) -> PlanOutcome;
}

/// Direct line from start to goal; for open floors and replays without a graph.
#[derive(Debug, Clone, Copy, Default)]
pub struct StraightLinePlanner;

impl PathPlanner for StraightLinePlanner {
    fn plan(&self, start: &Vector3<f64>, goal: &Vector3<f64>) -> PlanOutcome {
        PlanOutcome::Complete(vec![*start, *goal])
    }
}
