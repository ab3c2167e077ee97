use std::{env, fmt::Display, str::FromStr};

pub const DEFAULT_ROUTE_SLOT: &str = "savedRoute";
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";

#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    /// A fix is recorded only if it is at least this far from the last
    /// recorded point.
    pub minimum_distance_threshold_meters: f64,
    /// Fixes older than this (relative to the tracker's clock) are dropped.
    pub max_fix_age_seconds: f64,
    pub tracking_enabled_on_start: bool,
    pub mailbox_capacity: usize,
    pub event_capacity: usize,
    /// Name of the storage slot holding the serialized route.
    pub route_slot: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            minimum_distance_threshold_meters: 100.0,
            max_fix_age_seconds: 5.0,
            tracking_enabled_on_start: true,
            mailbox_capacity: actors::DEFAULT_MAILBOX_CAPACITY,
            event_capacity: 64,
            route_slot: DEFAULT_ROUTE_SLOT.to_owned(),
        }
    }
}

impl TrackerConfig {
    /// Defaults, overridden by `TRACKER_*` environment variables where set.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            minimum_distance_threshold_meters: parse_or(
                &lookup,
                "TRACKER_MIN_DISTANCE_M",
                defaults.minimum_distance_threshold_meters,
            ),
            max_fix_age_seconds: parse_or(
                &lookup,
                "TRACKER_MAX_FIX_AGE_S",
                defaults.max_fix_age_seconds,
            ),
            tracking_enabled_on_start: parse_or(
                &lookup,
                "TRACKER_TRACKING_ON_START",
                defaults.tracking_enabled_on_start,
            ),
            mailbox_capacity: parse_or(
                &lookup,
                "TRACKER_MAILBOX_CAPACITY",
                defaults.mailbox_capacity,
            ),
            event_capacity: parse_or(
                &lookup,
                "TRACKER_EVENT_CAPACITY",
                defaults.event_capacity,
            ),
            route_slot: lookup("TRACKER_ROUTE_SLOT").unwrap_or(defaults.route_slot),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_seconds: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GEOCODER_URL.to_owned(),
            user_agent: concat!("route-tracker/", env!("CARGO_PKG_VERSION")).to_owned(),
            timeout_seconds: 10,
        }
    }
}

impl GeocoderConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            base_url: lookup("GEOCODER_URL").unwrap_or(defaults.base_url),
            user_agent: lookup("GEOCODER_USER_AGENT").unwrap_or(defaults.user_agent),
            timeout_seconds: parse_or(
                &lookup,
                "GEOCODER_TIMEOUT_S",
                defaults.timeout_seconds,
            ),
        }
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|why| {
            log::warn!("ignoring {}={:?}: {}", key, raw, why);
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(
        pairs: &[(&str, &str)],
    ) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = TrackerConfig::from_lookup(|_| None);
        assert_eq!(config, TrackerConfig::default());
        assert_eq!(config.minimum_distance_threshold_meters, 100.0);
        assert_eq!(config.max_fix_age_seconds, 5.0);
        assert_eq!(config.route_slot, "savedRoute");
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = TrackerConfig::from_lookup(lookup_from(&[
            ("TRACKER_MIN_DISTANCE_M", "25.5"),
            ("TRACKER_MAX_FIX_AGE_S", " 10 "),
            ("TRACKER_TRACKING_ON_START", "false"),
            ("TRACKER_ROUTE_SLOT", "commute"),
        ]));
        assert_eq!(config.minimum_distance_threshold_meters, 25.5);
        assert_eq!(config.max_fix_age_seconds, 10.0);
        assert!(!config.tracking_enabled_on_start);
        assert_eq!(config.route_slot, "commute");
    }

    #[test]
    fn unparsable_values_fall_back_to_defaults() {
        let config = TrackerConfig::from_lookup(lookup_from(&[
            ("TRACKER_MIN_DISTANCE_M", "far"),
            ("TRACKER_MAILBOX_CAPACITY", "-3"),
        ]));
        assert_eq!(config.minimum_distance_threshold_meters, 100.0);
        assert_eq!(config.mailbox_capacity, actors::DEFAULT_MAILBOX_CAPACITY);
    }

    #[test]
    fn geocoder_config_from_environment() {
        let config = GeocoderConfig::from_lookup(lookup_from(&[(
            "GEOCODER_URL",
            "http://localhost:8080",
        )]));
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.timeout_seconds, 10);
    }
}
