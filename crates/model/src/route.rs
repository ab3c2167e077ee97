use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::id::Id;

use crate::{ExampleData, GeoPoint, RouteStatistics, SavedLocation};

/// Ordered list of recorded points. Points are only ever appended or cleared
/// all at once; insertion order is significant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Route {
    locations: Vec<SavedLocation>,
}

impl Route {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn push(&mut self, location: SavedLocation) {
        self.locations.push(location);
    }

    pub fn clear(&mut self) {
        self.locations.clear();
    }

    pub fn last(&self) -> Option<&SavedLocation> {
        self.locations.last()
    }

    /// Sets the subtitle of the point with the given id. Returns `false` if no
    /// such point exists (anymore).
    pub fn set_subtitle<S: Into<String>>(
        &mut self,
        id: &Id<SavedLocation>,
        subtitle: S,
    ) -> bool {
        match self.locations.iter_mut().find(|location| &location.id == id) {
            Some(location) => {
                location.subtitle = Some(subtitle.into());
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &SavedLocation> {
        self.locations.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SavedLocation> {
        self.locations.iter_mut()
    }

    pub fn as_slice(&self) -> &[SavedLocation] {
        &self.locations
    }

    pub fn statistics(&self) -> RouteStatistics {
        RouteStatistics::from_locations(&self.locations)
    }
}

impl From<Vec<SavedLocation>> for Route {
    fn from(locations: Vec<SavedLocation>) -> Self {
        Self { locations }
    }
}

impl ExampleData for Route {
    fn example_data() -> Self {
        let start = SavedLocation::example_data();
        let next = SavedLocation {
            position: GeoPoint::new(54.324192, 10.122765),
            title: "10:01:30".to_owned(),
            subtitle: None,
            timestamp: start.timestamp + chrono::Duration::seconds(90),
            ..start.clone()
        };
        Route::from(vec![start, next])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_id(raw: u64) -> SavedLocation {
        SavedLocation {
            id: Id::new(raw),
            ..SavedLocation::example_data()
        }
    }

    #[test]
    fn set_subtitle_matches_by_id() {
        // same coordinates on purpose, only the id tells them apart
        let mut route = Route::from(vec![with_id(1), with_id(2)]);
        assert!(route.set_subtitle(&Id::new(2), "Kiel"));
        let subtitles = route
            .iter()
            .map(|location| location.subtitle.as_deref())
            .collect::<Vec<_>>();
        assert_eq!(subtitles, vec![Some("Holstenstraße, Altstadt, Kiel"), Some("Kiel")]);
    }

    #[test]
    fn set_subtitle_on_missing_point_changes_nothing() {
        let mut route = Route::from(vec![with_id(1)]);
        let before = route.clone();
        assert!(!route.set_subtitle(&Id::new(7), "nowhere"));
        assert_eq!(route, before);
    }

    #[test]
    fn serializes_as_plain_array() {
        let route = Route::example_data();
        let json = serde_json::to_value(&route).unwrap();
        assert_eq!(json.as_array().map(|array| array.len()), Some(2));
    }

    #[test]
    fn clear_empties_route() {
        let mut route = Route::example_data();
        route.clear();
        assert!(route.is_empty());
        assert_eq!(route.statistics(), RouteStatistics::default());
    }
}
