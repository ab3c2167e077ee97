use std::fmt;

use chrono::{DateTime, Utc};
use itertools::Itertools;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::SavedLocation;

/// Snapshot of a route's aggregates. Routes with fewer than two points have
/// all fields zeroed and no start or end time.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteStatistics {
    /// Meters along the recorded polyline.
    pub total_distance: f64,
    /// Seconds between the first and the last point.
    pub total_duration: f64,
    /// Meters per second.
    pub average_speed: f64,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl RouteStatistics {
    pub fn from_locations(locations: &[SavedLocation]) -> Self {
        if locations.len() < 2 {
            return Self::default();
        }

        // order by time, ties broken by position so the result does not
        // depend on the order the points were handed in
        let mut sorted = locations.iter().collect::<Vec<_>>();
        sorted.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.position.latitude.total_cmp(&b.position.latitude))
                .then_with(|| a.position.longitude.total_cmp(&b.position.longitude))
        });

        let start_time = sorted[0].timestamp;
        let end_time = sorted[sorted.len() - 1].timestamp;
        let total_duration = (end_time - start_time)
            .to_std()
            .map(|duration| duration.as_secs_f64())
            .unwrap_or(0.0);

        let total_distance = sorted
            .iter()
            .tuple_windows()
            .map(|(a, b)| a.position.distance_to(&b.position))
            .sum::<f64>();

        let average_speed = if total_duration > 0.0 {
            total_distance / total_duration
        } else {
            0.0
        };

        Self {
            total_distance,
            total_duration,
            average_speed,
            start_time: Some(start_time),
            end_time: Some(end_time),
        }
    }

    pub fn has_route(&self) -> bool {
        self.start_time.is_some()
    }
}

pub fn compute_statistics(locations: &[SavedLocation]) -> RouteStatistics {
    RouteStatistics::from_locations(locations)
}

/// Whole kilometers with two decimals from 1 km on, whole meters below.
pub fn format_distance(meters: f64) -> String {
    if meters >= 1000.0 {
        format!("{:.2} km", meters / 1000.0)
    } else {
        format!("{:.0} m", meters)
    }
}

pub fn format_duration(seconds: f64) -> String {
    let hours = (seconds / 3600.0) as u64;
    let minutes = ((seconds % 3600.0) / 60.0) as u64;
    if hours > 0 {
        format!("{} h {} min", hours, minutes)
    } else {
        format!("{} min", minutes)
    }
}

pub fn format_speed(meters_per_second: f64) -> String {
    format!("{:.2} km/h", meters_per_second * 3.6)
}

impl fmt::Display for RouteStatistics {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Duration: {}", format_duration(self.total_duration))?;
        writeln!(f, "Distance: {}", format_distance(self.total_distance))?;
        write!(f, "Average speed: {}", format_speed(self.average_speed))
    }
}
