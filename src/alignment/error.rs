//! Placement errors.

use thiserror::Error;

use super::anchors::MarkerId;

/// Failure to place or recalibrate the environment.
///
/// Degenerate geometry never shows up here: it is absorbed by fallbacks.
/// The only abort condition is missing configuration data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AlignmentError {
    #[error("Scanned image '{0}' is not defined in the anchor database")]
    UnknownMarker(MarkerId),
}
