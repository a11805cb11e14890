//! Live delivery tracking: the courier-side position publisher and the screen-scoped tracking
//! session that observes one order record.
mod publisher;
mod session;

pub use publisher::PositionPublisher;
pub use session::{TrackingSession, TrackingUpdate};
