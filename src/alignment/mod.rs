//! Pose alignment: places the static map so a virtual anchor coincides
//! with a detected real-world marker, and keeps refining that placement as
//! the marker is re-observed.

pub mod aligner;
pub mod anchors;
pub mod error;
pub mod origin;
pub mod state;

pub use aligner::PoseAligner;
pub use anchors::{AnchorDatabase, MarkerId};
pub use error::AlignmentError;
pub use origin::{OriginEstimate, compute_origin, compute_origin_pose, recalibrate};
pub use state::{AlignmentState, Placement};
