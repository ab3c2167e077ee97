use std::{error, fmt, sync::Arc};

use actors::actor::ActorError;
use tokio::sync::broadcast;
use utility::id::IdSequence;

pub mod clock;
pub mod config;
pub mod events;
pub mod geocode;
pub mod handle;
pub mod position;
pub mod store;
pub mod tracker;

pub use config::{GeocoderConfig, TrackerConfig};
pub use events::TrackerEvent;
pub use handle::TrackerHandle;
pub use tracker::{FixDecision, Ports};

#[derive(Debug)]
pub enum TrackerError {
    /// The tracker actor is not reachable.
    Actor(ActorError),
}

impl error::Error for TrackerError {}

impl fmt::Display for TrackerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TrackerError::Actor(e) => write!(f, "tracker unavailable: {}", e),
        }
    }
}

impl From<ActorError> for TrackerError {
    fn from(e: ActorError) -> Self {
        TrackerError::Actor(e)
    }
}

pub type TrackerResult<T> = Result<T, TrackerError>;

/// Spawns the tracker. It restores the saved route before handling anything
/// else; the returned receiver is subscribed early enough to see that.
///
/// Must be called from within a tokio runtime.
pub fn start(
    config: TrackerConfig,
    ports: Ports,
) -> (TrackerHandle, broadcast::Receiver<TrackerEvent>) {
    let (events, receiver) = broadcast::channel(config.event_capacity.max(1));
    let ids = Arc::new(IdSequence::new());
    let geocoder = ports.geocoder.clone();

    let actor = {
        let events = events.clone();
        actors::run_with_capacity(config.mailbox_capacity, move || {
            tracker::RouteTracker::new(config.clone(), ports.clone(), events.clone(), ids.clone())
        })
    };
    (TrackerHandle::new(actor, events, geocoder), receiver)
}
