//! Update throttling and path recalculation triggers.
//!
//! Guidance runs at most once per `update_interval`. On each such update a
//! new path is requested when any of these hold:
//! - a recalculation was forced (new destination, recalibration)
//! - there is no path and none is in flight
//! - the observer moved more than `distance_threshold` since the last
//!   issued request

use nalgebra::Vector3;

use crate::config::SessionConfig;

#[derive(Debug, Clone)]
pub struct RecalcGate {
    interval_ns: u64,
    distance_threshold: f64,
    last_update_ns: Option<u64>,
    last_request_position: Option<Vector3<f64>>,
    forced: bool,
}

impl RecalcGate {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            interval_ns: (config.update_interval_s * 1e9) as u64,
            distance_threshold: config.recalculate_distance_threshold,
            last_update_ns: None,
            last_request_position: None,
            forced: false,
        }
    }

    /// True (and the interval restarts) if an update is due at `now_ns`.
    ///
    /// The first call always fires. A clock that jumps backwards also fires
    /// rather than stalling until it catches up.
    pub fn tick(&mut self, now_ns: u64) -> bool {
        let due = match self.last_update_ns {
            None => true,
            Some(last) => now_ns < last || now_ns - last >= self.interval_ns,
        };
        if due {
            self.last_update_ns = Some(now_ns);
        }
        due
    }

    /// Request a recalculation on the next due update.
    pub fn force(&mut self) {
        self.forced = true;
    }

    pub fn is_forced(&self) -> bool {
        self.forced
    }

    /// Whether a new path request should be issued now.
    ///
    /// `has_path` covers both a held path and one in flight.
    pub fn needs_request(&self, observer: &Vector3<f64>, has_path: bool) -> bool {
        if self.forced || !has_path {
            return true;
        }
        match self.last_request_position {
            Some(p) => (observer - p).norm() > self.distance_threshold,
            None => true,
        }
    }

    /// Note that a request was issued from `observer`.
    pub fn record_request(&mut self, observer: &Vector3<f64>) {
        self.last_request_position = Some(*observer);
        self.forced = false;
    }

    /// Forget request history; keeps the update clock.
    pub fn reset(&mut self) {
        self.last_request_position = None;
        self.forced = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: u64 = 1_000_000;

    fn gate() -> RecalcGate {
        RecalcGate::new(&SessionConfig::default())
    }

    #[test]
    fn test_interval_throttles_updates() {
        let mut g = gate();
        assert!(g.tick(0));
        assert!(!g.tick(100 * MS));
        assert!(!g.tick(249 * MS));
        assert!(g.tick(250 * MS));
        assert!(!g.tick(300 * MS));
        // Clock went backwards.
        assert!(g.tick(10 * MS));
    }

    #[test]
    fn test_distance_trigger_uses_last_request_position() {
        let mut g = gate();
        let start = Vector3::new(0.0, 0.0, 0.0);
        assert!(g.needs_request(&start, true));

        g.record_request(&start);
        assert!(!g.needs_request(&Vector3::new(0.9, 0.0, 0.0), true));
        assert!(g.needs_request(&Vector3::new(1.1, 0.0, 0.0), true));
        // Without a path, always request.
        assert!(g.needs_request(&start, false));
    }

    #[test]
    fn test_force_clears_after_request() {
        let mut g = gate();
        let p = Vector3::new(2.0, 0.0, 2.0);
        g.record_request(&p);
        g.force();
        assert!(g.needs_request(&p, true));

        g.record_request(&p);
        assert!(!g.is_forced());
        assert!(!g.needs_request(&p, true));
    }
}
