use model::{RouteStatistics, SavedLocation};

/// Notifications for the presentation layer.
#[derive(Debug, Clone)]
pub enum TrackerEvent {
    /// The full, ordered list of recorded points after a change.
    PathUpdated(Vec<SavedLocation>),
    TrackingStateChanged(bool),
    RouteReset,
    StatisticsComputed(RouteStatistics),
    /// The user has to grant location access. Carries a message to show.
    PermissionRequired(String),
    /// The positioning service reported an error.
    PositionFailed(String),
}
