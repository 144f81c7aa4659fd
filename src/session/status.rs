//! User-facing status line.

use std::fmt;

use crate::alignment::MarkerId;

/// Status shown to the user, updated as the session progresses.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StatusMessage {
    /// Nothing to show (right after a reset).
    #[default]
    Idle,
    /// Waiting for a marker.
    ScanTarget,
    /// A known marker is tracked and placement can be confirmed.
    MarkerFound(MarkerId),
    /// Placement was confirmed on a marker with no anchor offset.
    UnknownMarker(MarkerId),
    /// Placement was confirmed with no tracked candidate.
    TargetLost,
    /// Placed; waiting for a destination.
    EnvironmentReady,
    Navigating(String),
    NoPath(String),
    NavigationStopped,
    /// Destination name not in the store.
    UnknownDestination(String),
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusMessage::Idle => Ok(()),
            StatusMessage::ScanTarget => write!(f, "Scan a target image."),
            StatusMessage::MarkerFound(m) => write!(
                f,
                "Image '{}' found! Position your camera and press the button.",
                m
            ),
            StatusMessage::UnknownMarker(m) => write!(
                f,
                "Error: Scanned image '{}' is not defined in the database.",
                m
            ),
            StatusMessage::TargetLost => write!(f, "Target image lost. Please scan again."),
            StatusMessage::EnvironmentReady => {
                write!(f, "Environment Ready. Select Destination.")
            }
            StatusMessage::Navigating(d) => write!(f, "Navigating to {}", d),
            StatusMessage::NoPath(d) => write!(f, "Cannot find path to {}", d),
            StatusMessage::NavigationStopped => write!(f, "Navigation Stopped."),
            StatusMessage::UnknownDestination(d) => {
                write!(f, "Error: Location '{}' is unknown.", d)
            }
        }
    }
}
