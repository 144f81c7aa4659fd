//! Navigation session: the state machine driving alignment and guidance.
//!
//! ```text
//!            ConfirmPlacement             SelectDestination
//! Scanning ------------------> Placed ----------------------> Navigating
//!    ^                           ^  <------StopNavigation------   |
//!    +----------Reset------------+-------------Reset--------------+
//! ```
//!
//! All inputs arrive as [`SessionEvent`]s on a channel and are applied at
//! the start of [`NavigationSession::tick`], in arrival order, on the
//! caller's thread. Path planning is external: the session emits a
//! [`PathRequest`] and later accepts only the result whose id matches the
//! most recent request.

use crossbeam_channel::{Receiver, Sender, unbounded};
use nalgebra::Vector3;
use tracing::{debug, info, warn};

use crate::alignment::{AlignmentError, AnchorDatabase, MarkerId, PoseAligner};
use crate::config::NavConfig;
use crate::geometry::SE3;
use crate::guidance::{GuidePath, GuideTracker, GuidanceStatus};
use crate::planning::PlanOutcome;

use super::destinations::{Destination, DestinationStore};
use super::gate::RecalcGate;
use super::messages::{MarkerObservation, PathRequest, PathRequestId, SessionEvent};
use super::status::StatusMessage;

/// Coarse session phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// Looking for a marker to place the environment on.
    #[default]
    Scanning,
    /// Environment placed, no destination.
    Placed,
    /// Guiding toward a destination.
    Navigating,
}

/// Everything a frontend needs after one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutput {
    pub phase: SessionPhase,
    pub status: StatusMessage,
    /// True if `status` changed during this tick.
    pub status_changed: bool,
    /// Path query to hand to the planner, if one was issued this tick.
    pub path_request: Option<PathRequest>,
    /// Directional indicator pose in world space.
    pub indicator: Option<SE3>,
    /// Path polyline in world space, lifted for drawing.
    pub path_polyline: Option<Vec<Vector3<f64>>>,
    pub remaining_distance: Option<f64>,
    /// Current environment origin.
    pub origin: Option<SE3>,
    pub guidance_status: GuidanceStatus,
}

/// Marker seen while scanning, waiting for the user to confirm placement.
#[derive(Debug, Clone)]
struct PlacementCandidate {
    marker: MarkerId,
    pose: SE3,
    known: bool,
}

/// Active navigation target.
#[derive(Debug, Clone)]
struct Navigation {
    destination: Destination,
    /// Latest issued request; results for any other id are stale.
    pending: Option<PathRequestId>,
    /// Accepted path in map-local coordinates, kept for re-projection after recalibration.
    local_path: Option<GuidePath>,
}

pub struct NavigationSession {
    config: NavConfig,
    aligner: PoseAligner,
    destinations: DestinationStore,
    tracker: GuideTracker,
    gate: RecalcGate,

    phase: SessionPhase,
    status: StatusMessage,
    status_changed: bool,
    candidate: Option<PlacementCandidate>,
    navigation: Option<Navigation>,
    next_request: PathRequestId,
    indicator: Option<SE3>,
    remaining_distance: Option<f64>,

    events_tx: Sender<SessionEvent>,
    events_rx: Receiver<SessionEvent>,
}

impl NavigationSession {
    pub fn new(config: NavConfig, anchors: AnchorDatabase, destinations: DestinationStore) -> Self {
        let (events_tx, events_rx) = unbounded();
        Self {
            aligner: PoseAligner::new(config.alignment, anchors),
            tracker: GuideTracker::new(config.guidance),
            gate: RecalcGate::new(&config.session),
            config,
            destinations,
            phase: SessionPhase::Scanning,
            status: StatusMessage::ScanTarget,
            status_changed: true,
            candidate: None,
            navigation: None,
            next_request: PathRequestId::default(),
            indicator: None,
            remaining_distance: None,
            events_tx,
            events_rx,
        }
    }

    /// Handle for producers (detector, UI, planner) to feed the input queue.
    pub fn event_sender(&self) -> Sender<SessionEvent> {
        self.events_tx.clone()
    }

    /// Queue an event from the owning thread.
    pub fn push(&self, event: SessionEvent) {
        // The receiver lives in `self`, so the channel cannot be disconnected.
        let _ = self.events_tx.send(event);
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn status(&self) -> &StatusMessage {
        &self.status
    }

    pub fn aligner(&self) -> &PoseAligner {
        &self.aligner
    }

    pub fn tracker(&self) -> &GuideTracker {
        &self.tracker
    }

    pub fn destinations(&self) -> &DestinationStore {
        &self.destinations
    }

    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    /// Current destination name, if navigating.
    pub fn destination(&self) -> Option<&str> {
        self.navigation.as_ref().map(|n| n.destination.name.as_str())
    }

    /// Id of the request the session is waiting on.
    pub fn pending_request(&self) -> Option<PathRequestId> {
        self.navigation.as_ref().and_then(|n| n.pending)
    }

    fn set_status(&mut self, status: StatusMessage) {
        if self.status != status {
            self.status = status;
            self.status_changed = true;
        }
    }

    /// Run one update: apply queued events, then throttle-gated guidance.
    pub fn tick(&mut self, timestamp_ns: u64, observer: &Vector3<f64>) -> TickOutput {
        let events: Vec<SessionEvent> = self.events_rx.try_iter().collect();
        for event in events {
            self.handle_event(event);
        }

        let mut path_request = None;
        if self.phase == SessionPhase::Navigating && self.gate.tick(timestamp_ns) {
            path_request = self.maybe_request_path(observer);
            if let Some(out) = self.tracker.update(observer) {
                self.indicator = Some(out.indicator);
                self.remaining_distance = Some(out.remaining_distance);
            }
        }

        let output = TickOutput {
            phase: self.phase,
            status: self.status.clone(),
            status_changed: self.status_changed,
            path_request,
            indicator: self.indicator,
            path_polyline: self
                .tracker
                .path()
                .map(|p| p.lifted(self.config.guidance.path_height_offset)),
            remaining_distance: self.remaining_distance,
            origin: self.aligner.origin().copied(),
            guidance_status: self.tracker.status(),
        };
        self.status_changed = false;
        output
    }

    fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::MarkerObserved(obs) if obs.tracked => self.on_marker_observed(obs),
            SessionEvent::MarkerObserved(obs) => self.on_marker_lost(&obs.marker),
            SessionEvent::MarkerLost(marker) => self.on_marker_lost(&marker),
            SessionEvent::ConfirmPlacement => self.on_confirm_placement(),
            SessionEvent::SelectDestination(name) => self.on_select_destination(&name),
            SessionEvent::StopNavigation => self.stop_navigation(),
            SessionEvent::PathResult { request, outcome } => self.on_path_result(request, outcome),
            SessionEvent::Reset => self.reset(),
        }
    }

    fn on_marker_observed(&mut self, obs: MarkerObservation) {
        if self.phase == SessionPhase::Scanning {
            let known = self.aligner.anchors().contains(&obs.marker);
            // A known marker always wins over an unknown one.
            let replace = match &self.candidate {
                None => true,
                Some(c) => c.marker == obs.marker || (known && !c.known),
            };
            if !replace {
                return;
            }
            let is_new = self.candidate.as_ref().is_none_or(|c| c.marker != obs.marker);
            if is_new {
                debug!("Placement candidate '{}'", obs.marker);
                self.set_status(StatusMessage::MarkerFound(obs.marker.clone()));
            }
            self.candidate = Some(PlacementCandidate {
                marker: obs.marker,
                pose: obs.pose,
                known,
            });
            return;
        }

        match self.aligner.recalibrate(&obs.marker, &obs.pose) {
            Ok(Some(origin)) => self.reproject_path(&origin),
            Ok(None) => {}
            Err(AlignmentError::UnknownMarker(m)) => {
                debug!("Ignoring unknown marker '{}' for recalibration", m);
            }
        }
    }

    /// Move the held path with the updated origin and ask for a fresh one.
    fn reproject_path(&mut self, origin: &SE3) {
        let Some(nav) = &self.navigation else {
            return;
        };
        if let Some(local) = &nav.local_path {
            self.tracker.set_path(local.transformed(origin));
        }
        self.gate.force();
    }

    fn on_marker_lost(&mut self, marker: &MarkerId) {
        if self.phase != SessionPhase::Scanning {
            return;
        }
        if self.candidate.as_ref().is_some_and(|c| &c.marker == marker) {
            debug!("Placement candidate '{}' lost", marker);
            self.candidate = None;
            self.set_status(StatusMessage::ScanTarget);
        }
    }

    fn on_confirm_placement(&mut self) {
        if self.phase != SessionPhase::Scanning {
            debug!("Placement already confirmed");
            return;
        }
        let Some(candidate) = self.candidate.clone() else {
            self.set_status(StatusMessage::TargetLost);
            return;
        };
        match self.aligner.place(&candidate.marker, &candidate.pose) {
            Ok(_) => {
                self.candidate = None;
                self.phase = SessionPhase::Placed;
                self.set_status(StatusMessage::EnvironmentReady);
            }
            Err(AlignmentError::UnknownMarker(m)) => {
                self.set_status(StatusMessage::UnknownMarker(m));
            }
        }
    }

    fn on_select_destination(&mut self, name: &str) {
        if self.phase == SessionPhase::Scanning {
            warn!("Destination '{}' selected before placement; ignored", name);
            return;
        }
        let Some(destination) = self.destinations.get(name).cloned() else {
            warn!("Unknown destination '{}'", name);
            self.stop_navigation();
            self.set_status(StatusMessage::UnknownDestination(name.to_string()));
            return;
        };

        info!("Starting navigation to '{}'", destination.name);
        self.tracker.clear();
        self.indicator = None;
        self.remaining_distance = None;
        self.gate.reset();
        self.gate.force();
        self.navigation = Some(Navigation {
            destination,
            pending: None,
            local_path: None,
        });
        self.phase = SessionPhase::Navigating;
    }

    fn maybe_request_path(&mut self, observer: &Vector3<f64>) -> Option<PathRequest> {
        let nav = self.navigation.as_ref()?;
        let has_path = self.tracker.path().is_some() || nav.pending.is_some();
        if !self.gate.needs_request(observer, has_path) {
            return None;
        }
        let start_local = self.aligner.to_local(observer)?;
        let goal_local = nav.destination.position;

        let id = self.next_request.next();
        self.next_request = id;
        self.gate.record_request(observer);
        self.tracker.mark_pending();
        if let Some(nav) = self.navigation.as_mut() {
            nav.pending = Some(id);
        }
        debug!("Path request {} toward '{}'", id, self.destination().unwrap_or_default());

        Some(PathRequest {
            id,
            start_local,
            goal_local,
        })
    }

    fn on_path_result(&mut self, request: PathRequestId, outcome: PlanOutcome) {
        let Some(nav) = self.navigation.as_mut() else {
            debug!("Path result {} after navigation ended; dropped", request);
            return;
        };
        if nav.pending != Some(request) {
            debug!("Stale path result {} dropped", request);
            return;
        }
        nav.pending = None;
        let name = nav.destination.name.clone();

        match outcome.into_usable_corners() {
            Some(corners) => {
                let local = GuidePath::new(corners);
                let world = match self.aligner.origin() {
                    Some(origin) => local.transformed(origin),
                    None => local.clone(),
                };
                nav.local_path = Some(local);
                self.tracker.set_path(world);
                self.set_status(StatusMessage::Navigating(name));
            }
            None => {
                info!("No path to '{}'", name);
                nav.local_path = None;
                self.tracker.mark_no_path();
                self.indicator = None;
                self.remaining_distance = None;
                self.set_status(StatusMessage::NoPath(name));
            }
        }
    }

    fn stop_navigation(&mut self) {
        if self.navigation.take().is_some() {
            info!("Navigation stopped");
            self.set_status(StatusMessage::NavigationStopped);
        }
        self.tracker.clear();
        self.gate.reset();
        self.indicator = None;
        self.remaining_distance = None;
        if self.phase == SessionPhase::Navigating {
            self.phase = SessionPhase::Placed;
        }
    }

    fn reset(&mut self) {
        self.stop_navigation();
        self.aligner.reset();
        self.candidate = None;
        self.phase = SessionPhase::Scanning;
        self.set_status(StatusMessage::ScanTarget);
    }
}
