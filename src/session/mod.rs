//! Navigation session: event queue, state machine and update throttling.

pub mod destinations;
pub mod gate;
pub mod messages;
pub mod navigation_session;
pub mod status;

pub use destinations::{Destination, DestinationStore};
pub use gate::RecalcGate;
pub use messages::{MarkerObservation, PathRequest, PathRequestId, SessionEvent};
pub use navigation_session::{NavigationSession, SessionPhase, TickOutput};
pub use status::StatusMessage;
