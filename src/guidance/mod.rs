//! Path guidance: segment selection along the navigation polyline and the
//! smoothed directional indicator.

pub mod path;
pub mod result;
pub mod state;
pub mod tracker;

pub use path::{GuidePath, SegmentProjection, project_onto_segment};
pub use result::GuideOutput;
pub use state::{GuideState, GuidanceStatus};
pub use tracker::{GuideTracker, compute_guidance};
