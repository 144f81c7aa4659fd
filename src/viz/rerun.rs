//! Rerun-based visualization of a navigation session.
//!
//! Entity hierarchy:
//!     status               - Status line
//!     world/
//!         origin           - Environment origin (placed map frame)
//!         indicator        - Directional indicator pose
//!         observer         - Observer trail
//!         path             - Path polyline
//!     plots/
//!         remaining        - Remaining distance along the path

use anyhow::Result;
use nalgebra::Vector3;
use rerun::{RecordingStream, external::glam};

use crate::geometry::SE3;
use crate::session::TickOutput;

use super::RenderSink;

/// Observer trail length kept for drawing.
const MAX_TRAIL: usize = 2000;

pub struct RerunSink {
    rec: RecordingStream,
    start_timestamp_ns: Option<u64>,
    trail: Vec<Vector3<f64>>,
    /// `world/origin` currently holds a pose.
    origin_shown: bool,
}

impl RerunSink {
    /// Spawn a viewer process and connect to it.
    pub fn spawn(app_name: &str) -> Result<Self> {
        let rec = rerun::RecordingStreamBuilder::new(app_name).spawn()?;
        Self::from_stream(rec)
    }

    /// Wrap an existing recording stream.
    pub fn from_stream(rec: RecordingStream) -> Result<Self> {
        // Engine frame: X right, Y up, Z forward
        rec.log_static("world", &rerun::ViewCoordinates::RUF())?;

        Ok(Self {
            rec,
            start_timestamp_ns: None,
            trail: Vec::new(),
            origin_shown: false,
        })
    }

    pub fn origin_shown(&self) -> bool {
        self.origin_shown
    }

    /// Set the timeline relative to the first rendered tick.
    pub fn set_time(&mut self, timestamp_ns: u64) {
        let start_ns = *self.start_timestamp_ns.get_or_insert(timestamp_ns);
        let relative_sec = timestamp_ns.saturating_sub(start_ns) as f64 / 1e9;
        self.rec.set_duration_secs("time", relative_sec);
    }

    fn log_pose(&self, entity: &str, pose: &SE3) {
        let translation = glam::Vec3::new(
            pose.translation.x as f32,
            pose.translation.y as f32,
            pose.translation.z as f32,
        );
        let rotation = glam::Quat::from_xyzw(
            pose.rotation.coords.x as f32,
            pose.rotation.coords.y as f32,
            pose.rotation.coords.z as f32,
            pose.rotation.w as f32,
        );
        self.rec
            .log(
                entity,
                &rerun::Transform3D::from_translation_rotation(translation, rotation),
            )
            .ok();
    }

    fn log_polyline(&self, entity: &str, points: &[Vector3<f64>], color: [u8; 3], radius: f32) {
        if points.len() < 2 {
            self.rec.log(entity, &rerun::Clear::flat()).ok();
            return;
        }
        let pts: Vec<[f32; 3]> = points
            .iter()
            .map(|p| [p.x as f32, p.y as f32, p.z as f32])
            .collect();
        self.rec
            .log(
                entity,
                &rerun::LineStrips3D::new([pts])
                    .with_colors([color])
                    .with_radii([radius]),
            )
            .ok();
    }
}

impl RenderSink for RerunSink {
    fn render(&mut self, timestamp_ns: u64, output: &TickOutput) {
        self.set_time(timestamp_ns);

        if output.status_changed {
            self.rec
                .log(
                    "status",
                    &rerun::TextDocument::new(output.status.to_string()),
                )
                .ok();
        }
        match &output.origin {
            Some(origin) => {
                self.log_pose("world/origin", origin);
                self.origin_shown = true;
            }
            None if self.origin_shown => {
                self.rec.log("world/origin", &rerun::Clear::flat()).ok();
                self.origin_shown = false;
            }
            None => {}
        }
        match &output.indicator {
            Some(indicator) => self.log_pose("world/indicator", indicator),
            None => {
                self.rec.log("world/indicator", &rerun::Clear::flat()).ok();
            }
        }
        let path = output.path_polyline.as_deref().unwrap_or(&[]);
        self.log_polyline("world/path", path, [0, 160, 255], 0.03);

        if let Some(remaining) = output.remaining_distance {
            self.rec
                .log("plots/remaining", &rerun::Scalars::new([remaining]))
                .ok();
        }
    }

    fn observer(&mut self, position: &Vector3<f64>) {
        if self.trail.len() == MAX_TRAIL {
            self.trail.remove(0);
        }
        self.trail.push(*position);
        self.log_polyline("world/observer", &self.trail, [128, 128, 128], 0.01);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guidance::GuidanceStatus;
    use crate::session::{SessionPhase, StatusMessage};

    fn output(origin: Option<SE3>) -> TickOutput {
        TickOutput {
            phase: if origin.is_some() {
                SessionPhase::Placed
            } else {
                SessionPhase::Scanning
            },
            status: StatusMessage::default(),
            status_changed: true,
            path_request: None,
            indicator: None,
            path_polyline: None,
            remaining_distance: None,
            origin,
            guidance_status: GuidanceStatus::Inactive,
        }
    }

    #[test]
    fn test_origin_cleared_after_reset() {
        let (rec, _storage) = rerun::RecordingStreamBuilder::new("rust_arnav_test")
            .memory()
            .unwrap();
        let mut sink = RerunSink::from_stream(rec).unwrap();

        sink.render(0, &output(None));
        assert!(!sink.origin_shown());

        sink.render(100, &output(Some(SE3::from_translation(Vector3::new(1.0, 0.0, 2.0)))));
        assert!(sink.origin_shown());

        sink.render(200, &output(None));
        assert!(!sink.origin_shown());
    }
}
