use chrono::{DateTime, Local, TimeZone, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::{
    geo,
    id::{HasId, Id},
};

use crate::{ExampleData, STARTING_POINT_TITLE, TIME_TITLE_FORMAT};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Surface distance in meters.
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        geo::haversine_distance_m(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
        )
    }
}

/// A recorded waypoint of a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SavedLocation {
    /// Assigned by the tracker when the point is recorded or restored.
    /// Never persisted.
    #[serde(skip)]
    pub id: Id<SavedLocation>,
    #[serde(flatten)]
    pub position: GeoPoint,
    pub title: String,
    /// Resolved address, `None` while the lookup is pending.
    pub subtitle: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl HasId for SavedLocation {
    type IdType = u64;
}

impl SavedLocation {
    pub fn new<S: Into<String>>(
        id: Id<SavedLocation>,
        position: GeoPoint,
        title: S,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            position,
            title: title.into(),
            subtitle: None,
            timestamp,
        }
    }

    pub fn starting_point(
        id: Id<SavedLocation>,
        position: GeoPoint,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::new(id, position, STARTING_POINT_TITLE, timestamp)
    }

    /// A point titled with its capture time in the local time zone.
    pub fn waypoint(
        id: Id<SavedLocation>,
        position: GeoPoint,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::new(id, position, time_title(&timestamp, &Local), timestamp)
    }

    pub fn with_subtitle<S: Into<String>>(mut self, subtitle: S) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    /// Compares everything that is persisted, ignoring the in-memory id.
    pub fn same_record_as(&self, other: &SavedLocation) -> bool {
        self.position == other.position
            && self.title == other.title
            && self.subtitle == other.subtitle
            && self.timestamp == other.timestamp
    }
}

pub fn time_title<Tz: TimeZone>(timestamp: &DateTime<Utc>, zone: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    timestamp
        .with_timezone(zone)
        .format(TIME_TITLE_FORMAT)
        .to_string()
}

impl ExampleData for SavedLocation {
    fn example_data() -> Self {
        SavedLocation {
            id: Id::default(),
            position: GeoPoint::new(54.323292, 10.122765),
            title: STARTING_POINT_TITLE.to_owned(),
            subtitle: Some("Holstenstraße, Altstadt, Kiel".to_owned()),
            timestamp: DateTime::from_timestamp(1_742_205_600, 123_456_789)
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;

    use super::*;

    #[test]
    fn serializes_flat_with_null_subtitle() {
        let location = SavedLocation {
            subtitle: None,
            ..SavedLocation::example_data()
        };
        let json = serde_json::to_value(&location).unwrap();
        assert_eq!(json["latitude"], 54.323292);
        assert_eq!(json["longitude"], 10.122765);
        assert_eq!(json["title"], "Starting point");
        assert!(json["subtitle"].is_null());
        assert_eq!(json["timestamp"], "2025-03-17T10:00:00.123456789Z");
        assert!(json.get("id").is_none());
    }

    #[test]
    fn deserialized_location_gets_default_id() {
        let json = r#"{
            "latitude": 41.0082,
            "longitude": 28.9784,
            "title": "12:30:00",
            "subtitle": null,
            "timestamp": "2025-03-17T12:30:00Z"
        }"#;
        let location: SavedLocation = serde_json::from_str(json).unwrap();
        assert_eq!(location.id, Id::default());
        assert_eq!(location.position, GeoPoint::new(41.0082, 28.9784));
        assert_eq!(location.subtitle, None);
    }

    #[test]
    fn waypoint_title_is_local_time() {
        let timestamp = DateTime::from_timestamp(1_742_214_645, 0).unwrap();
        let istanbul = FixedOffset::east_opt(3 * 3600).unwrap();
        assert_eq!(time_title(&timestamp, &istanbul), "15:30:45");
        assert_eq!(time_title(&timestamp, &Utc), "12:30:45");
    }

    #[test]
    fn same_record_ignores_id() {
        let a = SavedLocation::example_data();
        let b = SavedLocation {
            id: Id::new(99),
            ..a.clone()
        };
        assert_ne!(a, b);
        assert!(a.same_record_as(&b));
    }
}
