use std::{collections::HashSet, sync::Arc};

use actors::{
    actor::Actor,
    actor_ref::WeakActorRef,
    handler::{Handler, Message},
};
use async_trait::async_trait;
use model::{GeoPoint, Route, RouteStatistics, SavedLocation};
use tokio::sync::broadcast;
use utility::id::{Id, IdSequence};

use crate::{
    clock::{seconds_between, Clock, SystemClock},
    config::TrackerConfig,
    events::TrackerEvent,
    geocode::{resolve_address, Geocoder},
    position::{AuthorizationStatus, Fix, NoopPositionService, PositionService},
    store::{RouteStore, StoreError},
};

pub const PERMISSION_MESSAGE: &str = "Location access is needed to record your \
    route. You can allow it in the system settings.";

/// The collaborators of the tracker.
#[derive(Clone)]
pub struct Ports {
    pub store: Arc<dyn RouteStore>,
    pub geocoder: Arc<dyn Geocoder>,
    pub positions: Arc<dyn PositionService>,
    pub clock: Arc<dyn Clock>,
}

impl Ports {
    pub fn new(store: Arc<dyn RouteStore>, geocoder: Arc<dyn Geocoder>) -> Self {
        Self {
            store,
            geocoder,
            positions: Arc::new(NoopPositionService),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_position_service(mut self, positions: Arc<dyn PositionService>) -> Self {
        self.positions = positions;
        self
    }
}

/// What happened to a fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FixDecision {
    Accepted { id: Id<SavedLocation> },
    TrackingDisabled,
    InvalidAccuracy,
    /// Latitude or longitude is not a finite number.
    InvalidPosition,
    Stale { age_seconds: f64 },
    BelowThreshold { distance: f64 },
}

impl FixDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, FixDecision::Accepted { .. })
    }
}

/// Owns the recorded route. All state changes happen inside the actor, one
/// message at a time; address lookups run in spawned tasks and report back
/// through the mailbox.
pub struct RouteTracker {
    config: TrackerConfig,
    ports: Ports,
    events: broadcast::Sender<TrackerEvent>,
    ids: Arc<IdSequence<SavedLocation>>,
    myself: Option<WeakActorRef<RouteTracker>>,

    route: Route,
    last_accepted: Option<GeoPoint>,
    tracking_enabled: bool,
    pending_lookups: HashSet<Id<SavedLocation>>,
}

impl RouteTracker {
    pub fn new(
        config: TrackerConfig,
        ports: Ports,
        events: broadcast::Sender<TrackerEvent>,
        ids: Arc<IdSequence<SavedLocation>>,
    ) -> Self {
        let tracking_enabled = config.tracking_enabled_on_start;
        Self {
            config,
            ports,
            events,
            ids,
            myself: None,
            route: Route::new(),
            last_accepted: None,
            tracking_enabled,
            pending_lookups: HashSet::new(),
        }
    }

    fn emit(&self, event: TrackerEvent) {
        // an error only means nobody is listening right now
        let _ = self.events.send(event);
    }

    fn emit_path(&self) {
        self.emit(TrackerEvent::PathUpdated(self.route.as_slice().to_vec()));
    }

    async fn persist(&self) {
        if let Err(why) = self.ports.store.save(&self.route).await {
            log::error!(
                "could not persist route with {} points: {}",
                self.route.len(),
                why
            );
        }
    }

    async fn restore(&mut self) {
        let mut route = match self.ports.store.load().await {
            Ok(route) => route,
            Err(StoreError::NotFound) => {
                log::debug!("no saved route found");
                Route::new()
            }
            Err(why) => {
                log::warn!("could not load saved route, starting empty: {}", why);
                Route::new()
            }
        };
        for location in route.iter_mut() {
            location.id = self.ids.next_id();
        }
        self.last_accepted = route.last().map(|location| location.position);
        self.route = route;

        if !self.route.is_empty() {
            log::info!("restored route with {} points", self.route.len());
            self.emit_path();
        }

        // lookups still running for the previous ids can no longer match, ask
        // again for every point that has no address yet
        let unresolved = self
            .route
            .iter()
            .filter(|location| location.subtitle.is_none())
            .map(|location| (location.id, location.position))
            .collect::<Vec<_>>();
        for (id, position) in unresolved {
            self.lookup_address(id, position);
        }
    }

    /// Why the fix must be dropped, if it must.
    fn rejection(&self, fix: &Fix) -> Option<FixDecision> {
        if !self.tracking_enabled {
            return Some(FixDecision::TrackingDisabled);
        }
        if !fix.has_valid_accuracy() {
            return Some(FixDecision::InvalidAccuracy);
        }
        if !fix.has_valid_position() {
            return Some(FixDecision::InvalidPosition);
        }
        let age_seconds = seconds_between(fix.captured_at, self.ports.clock.now());
        if age_seconds > self.config.max_fix_age_seconds {
            return Some(FixDecision::Stale { age_seconds });
        }
        let last = self.last_accepted?;
        let distance = last.distance_to(&fix.position);
        // written so that a NaN distance is rejected as well
        if !(distance >= self.config.minimum_distance_threshold_meters) {
            return Some(FixDecision::BelowThreshold { distance });
        }
        None
    }

    async fn record(&mut self, fix: Fix) -> FixDecision {
        if let Some(rejection) = self.rejection(&fix) {
            log::debug!("dropping fix {:?}: {:?}", fix.position, rejection);
            return rejection;
        }

        let id = self.ids.next_id();
        let now = self.ports.clock.now();
        let location = match self.last_accepted {
            None => SavedLocation::starting_point(id, fix.position, now),
            Some(_) => SavedLocation::waypoint(id, fix.position, now),
        };
        log::info!(
            "recording point {} \"{}\" at ({}, {})",
            id,
            location.title,
            fix.position.latitude,
            fix.position.longitude
        );

        self.route.push(location);
        self.last_accepted = Some(fix.position);
        self.emit_path();
        self.persist().await;
        self.lookup_address(id, fix.position);

        FixDecision::Accepted { id }
    }

    fn lookup_address(&mut self, id: Id<SavedLocation>, position: GeoPoint) {
        let Some(myself) = self.myself.as_ref().and_then(WeakActorRef::upgrade) else {
            log::warn!("tracker is shutting down, no address for point {}", id);
            return;
        };
        self.pending_lookups.insert(id);
        let geocoder = self.ports.geocoder.clone();
        tokio::spawn(async move {
            let address = resolve_address(geocoder.as_ref(), position).await;
            if let Err(why) = myself.tell(AddressResolved { id, address }).await {
                log::debug!("address for point {} arrived too late: {}", id, why);
            }
        });
    }
}

#[async_trait]
impl Actor for RouteTracker {
    async fn started(&mut self, myself: WeakActorRef<Self>) {
        self.myself = Some(myself);
        self.restore().await;
    }
}

pub struct SetTracking(pub bool);

impl Message for SetTracking {
    type Response = ();
}

#[async_trait]
impl Handler<SetTracking> for RouteTracker {
    async fn handle(&mut self, SetTracking(enabled): SetTracking) {
        if enabled == self.tracking_enabled {
            return;
        }
        self.tracking_enabled = enabled;
        if enabled {
            self.ports.positions.start_updates();
        } else {
            self.ports.positions.stop_updates();
        }
        log::info!("tracking {}", if enabled { "enabled" } else { "disabled" });
        self.emit(TrackerEvent::TrackingStateChanged(enabled));
    }
}

pub struct RawPosition(pub Fix);

impl Message for RawPosition {
    type Response = FixDecision;
}

#[async_trait]
impl Handler<RawPosition> for RouteTracker {
    async fn handle(&mut self, RawPosition(fix): RawPosition) -> FixDecision {
        self.record(fix).await
    }
}

/// Result of an address lookup started when the point was recorded.
pub struct AddressResolved {
    pub id: Id<SavedLocation>,
    pub address: String,
}

impl Message for AddressResolved {
    /// Whether the address was attached to a point.
    type Response = bool;
}

#[async_trait]
impl Handler<AddressResolved> for RouteTracker {
    async fn handle(&mut self, message: AddressResolved) -> bool {
        self.pending_lookups.remove(&message.id);
        if !self.route.set_subtitle(&message.id, message.address) {
            log::debug!("discarding address of removed point {}", message.id);
            return false;
        }
        self.emit_path();
        self.persist().await;
        true
    }
}

pub struct Reset;

impl Message for Reset {
    type Response = ();
}

#[async_trait]
impl Handler<Reset> for RouteTracker {
    async fn handle(&mut self, _: Reset) {
        log::info!("resetting route with {} points", self.route.len());
        self.route.clear();
        self.last_accepted = None;
        self.persist().await;
        self.emit(TrackerEvent::RouteReset);
    }
}

pub struct ComputeStatistics;

impl Message for ComputeStatistics {
    type Response = RouteStatistics;
}

#[async_trait]
impl Handler<ComputeStatistics> for RouteTracker {
    async fn handle(&mut self, _: ComputeStatistics) -> RouteStatistics {
        let statistics = self.route.statistics();
        self.emit(TrackerEvent::StatisticsComputed(statistics.clone()));
        statistics
    }
}

pub struct GetPath;

impl Message for GetPath {
    type Response = Vec<SavedLocation>;
}

#[async_trait]
impl Handler<GetPath> for RouteTracker {
    async fn handle(&mut self, _: GetPath) -> Vec<SavedLocation> {
        self.route.as_slice().to_vec()
    }
}

pub struct IsAtStartingPosition;

impl Message for IsAtStartingPosition {
    type Response = bool;
}

#[async_trait]
impl Handler<IsAtStartingPosition> for RouteTracker {
    async fn handle(&mut self, _: IsAtStartingPosition) -> bool {
        self.last_accepted.is_none()
    }
}

pub struct PendingLookups;

impl Message for PendingLookups {
    type Response = usize;
}

#[async_trait]
impl Handler<PendingLookups> for RouteTracker {
    async fn handle(&mut self, _: PendingLookups) -> usize {
        self.pending_lookups.len()
    }
}

pub struct AuthorizationChanged(pub AuthorizationStatus);

impl Message for AuthorizationChanged {
    type Response = ();
}

#[async_trait]
impl Handler<AuthorizationChanged> for RouteTracker {
    async fn handle(&mut self, AuthorizationChanged(status): AuthorizationChanged) {
        log::debug!("location authorization is now {:?}", status);
        match status {
            AuthorizationStatus::NotDetermined => {
                self.ports.positions.request_permission();
            }
            AuthorizationStatus::Restricted | AuthorizationStatus::Denied => {
                self.emit(TrackerEvent::PermissionRequired(
                    PERMISSION_MESSAGE.to_owned(),
                ));
            }
            AuthorizationStatus::Authorized => {
                if self.tracking_enabled {
                    self.ports.positions.start_updates();
                }
            }
        }
    }
}

pub struct PositionFailed(pub String);

impl Message for PositionFailed {
    type Response = ();
}

#[async_trait]
impl Handler<PositionFailed> for RouteTracker {
    async fn handle(&mut self, PositionFailed(reason): PositionFailed) {
        log::warn!("positioning failed: {}", reason);
        self.emit(TrackerEvent::PositionFailed(reason));
    }
}
