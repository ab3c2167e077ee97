use chrono::{DateTime, Utc};
use model::GeoPoint;

/// A single raw reading from the positioning service.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fix {
    pub position: GeoPoint,
    pub captured_at: DateTime<Utc>,
    /// Radius of uncertainty in meters. Negative values mark an invalid fix.
    pub horizontal_accuracy: f64,
}

impl Fix {
    pub fn new(
        position: GeoPoint,
        captured_at: DateTime<Utc>,
        horizontal_accuracy: f64,
    ) -> Self {
        Self {
            position,
            captured_at,
            horizontal_accuracy,
        }
    }

    pub fn has_valid_accuracy(&self) -> bool {
        // NaN counts as invalid as well
        self.horizontal_accuracy >= 0.0
    }

    pub fn has_valid_position(&self) -> bool {
        self.position.latitude.is_finite() && self.position.longitude.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationStatus {
    NotDetermined,
    Restricted,
    Denied,
    Authorized,
}

/// The device's positioning service. The tracker only switches it on and off;
/// fixes flow back in through the tracker handle.
pub trait PositionService: Send + Sync {
    fn start_updates(&self);
    fn stop_updates(&self);
    fn request_permission(&self);
}

/// For headless use, where fixes are fed in by hand.
pub struct NoopPositionService;

impl PositionService for NoopPositionService {
    fn start_updates(&self) {}

    fn stop_updates(&self) {}

    fn request_permission(&self) {}
}
