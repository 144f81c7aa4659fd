//! File loaders: anchors, destinations, waypoint graphs and recorded sessions.

pub mod anchors;
pub mod destinations;
pub mod recording;
pub mod waypoints;

pub use anchors::{anchors_from_str, load_anchors};
pub use destinations::{destinations_from_reader, load_destinations};
pub use recording::{Command, Recording};
pub use waypoints::{load_waypoints, waypoints_from_str};
