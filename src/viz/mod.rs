//! Rendering sinks.
//!
//! The session never draws anything; after each tick the frontend hands the
//! [`TickOutput`] to a sink, which shows the indicator pose, the path
//! polyline and the status line however it likes.

#[cfg(feature = "rerun")]
pub mod rerun;

use nalgebra::Vector3;
use tracing::{debug, info};

use crate::session::TickOutput;

/// Consumer of per-tick session output.
pub trait RenderSink {
    fn render(&mut self, timestamp_ns: u64, output: &TickOutput);

    /// Raw observer position, for sinks that draw a trail.
    fn observer(&mut self, _position: &Vector3<f64>) {}
}

/// Writes status changes and indicator updates to the log.
#[derive(Debug, Default)]
pub struct LogSink {
    frames: u64,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of ticks rendered.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl RenderSink for LogSink {
    fn render(&mut self, timestamp_ns: u64, output: &TickOutput) {
        self.frames += 1;
        if output.status_changed {
            info!("[{:.2}s] {}", timestamp_ns as f64 * 1e-9, output.status);
        }
        if let Some(request) = &output.path_request {
            debug!(
                "Path request {} from [{:.2}, {:.2}, {:.2}]",
                request.id, request.start_local.x, request.start_local.y, request.start_local.z
            );
        }
        if let (Some(indicator), Some(remaining)) = (output.indicator, output.remaining_distance) {
            debug!(
                "Indicator at [{:.2}, {:.2}, {:.2}], {:.1} m to go",
                indicator.translation.x, indicator.translation.y, indicator.translation.z, remaining
            );
        }
    }
}
