//! Geometry utilities: SE3 poses, frame conventions, yaw handling.

pub mod frames;
pub mod se3;
pub mod yaw;

pub use frames::{horizontal, look_rotation_horizontal, yaw_rotation};
pub use se3::SE3;
pub use yaw::{YawFlatten, flatten_yaw, slerp, yaw_angle};
