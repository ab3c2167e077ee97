use std::sync::Arc;

use actors::actor_ref::ActorRef;
use model::{GeoPoint, RouteStatistics, SavedLocation};
use tokio::sync::broadcast;

use crate::{
    events::TrackerEvent,
    geocode::{resolve_detailed_address, Geocoder},
    position::{AuthorizationStatus, Fix},
    tracker::{
        AuthorizationChanged, ComputeStatistics, FixDecision, GetPath, IsAtStartingPosition,
        PendingLookups, PositionFailed, RawPosition, Reset, RouteTracker, SetTracking,
    },
    TrackerResult,
};

/// Cheap to clone front door of a running tracker.
#[derive(Clone)]
pub struct TrackerHandle {
    actor: ActorRef<RouteTracker>,
    events: broadcast::Sender<TrackerEvent>,
    geocoder: Arc<dyn Geocoder>,
}

impl TrackerHandle {
    pub(crate) fn new(
        actor: ActorRef<RouteTracker>,
        events: broadcast::Sender<TrackerEvent>,
        geocoder: Arc<dyn Geocoder>,
    ) -> Self {
        Self {
            actor,
            events,
            geocoder,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TrackerEvent> {
        self.events.subscribe()
    }

    pub async fn set_tracking(&self, enabled: bool) -> TrackerResult<()> {
        Ok(self.actor.tell(SetTracking(enabled)).await?)
    }

    /// Queues a fix from the positioning service.
    pub async fn on_raw_position(&self, fix: Fix) -> TrackerResult<()> {
        Ok(self.actor.tell(RawPosition(fix)).await?)
    }

    /// Queues a fix without waiting, for use from synchronous callbacks.
    /// Fails if the mailbox is full.
    pub fn try_on_raw_position(&self, fix: Fix) -> TrackerResult<()> {
        Ok(self.actor.try_tell(RawPosition(fix))?)
    }

    /// Feeds a fix and waits for the decision.
    pub async fn record_fix(&self, fix: Fix) -> TrackerResult<FixDecision> {
        Ok(self.actor.ask(RawPosition(fix)).await?)
    }

    pub async fn reset(&self) -> TrackerResult<()> {
        Ok(self.actor.ask(Reset).await?)
    }

    pub async fn statistics(&self) -> TrackerResult<RouteStatistics> {
        Ok(self.actor.ask(ComputeStatistics).await?)
    }

    pub async fn path(&self) -> TrackerResult<Vec<SavedLocation>> {
        Ok(self.actor.ask(GetPath).await?)
    }

    /// `true` until the first point of a route is recorded.
    pub async fn is_at_starting_position(&self) -> TrackerResult<bool> {
        Ok(self.actor.ask(IsAtStartingPosition).await?)
    }

    /// Number of address lookups that have not reported back yet.
    pub async fn pending_lookups(&self) -> TrackerResult<usize> {
        Ok(self.actor.ask(PendingLookups).await?)
    }

    pub async fn authorization_changed(&self, status: AuthorizationStatus) -> TrackerResult<()> {
        Ok(self.actor.tell(AuthorizationChanged(status)).await?)
    }

    pub async fn position_failed<S: Into<String>>(&self, reason: S) -> TrackerResult<()> {
        Ok(self.actor.tell(PositionFailed(reason.into())).await?)
    }

    /// Full address of an arbitrary position, e.g. a point the user tapped.
    /// Does not touch the route.
    pub async fn detailed_address(&self, position: GeoPoint) -> String {
        resolve_detailed_address(self.geocoder.as_ref(), position).await
    }
}
