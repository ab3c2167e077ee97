use std::{error, fmt, sync::Arc};

use async_trait::async_trait;
use model::GeoPoint;

pub mod nominatim;

pub use nominatim::NominatimGeocoder;

/// Lookup failed (network, service error, unreadable answer).
pub const ADDRESS_UNAVAILABLE: &str = "Address unavailable";
/// Lookup succeeded but nothing is known about the place.
pub const ADDRESS_NOT_FOUND: &str = "Address not found";
/// A place was found, but none of its fields make up an address.
pub const UNKNOWN_ADDRESS: &str = "Unknown address";

/// Address fields of a reverse geocoding result. Any of them may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Placemark {
    pub name: Option<String>,
    pub thoroughfare: Option<String>,
    pub sub_thoroughfare: Option<String>,
    pub sub_locality: Option<String>,
    pub locality: Option<String>,
    pub administrative_area: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

fn present(field: &Option<String>) -> Option<&str> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

impl Placemark {
    /// `street, district, city` with missing parts left out. Falls back to the
    /// place name.
    pub fn short_address(&self) -> String {
        let parts = [&self.thoroughfare, &self.sub_locality, &self.locality]
            .into_iter()
            .filter_map(present)
            .collect::<Vec<_>>();
        if !parts.is_empty() {
            return parts.join(", ");
        }
        present(&self.name)
            .map(str::to_owned)
            .unwrap_or_else(|| UNKNOWN_ADDRESS.to_owned())
    }

    /// One labelled line per known field.
    pub fn detailed_address(&self) -> String {
        let mut lines = Vec::new();
        if let Some(name) = present(&self.name) {
            lines.push(format!("Place: {}", name));
        }
        if let Some(street) = present(&self.thoroughfare) {
            match present(&self.sub_thoroughfare) {
                Some(number) => lines.push(format!("Street: {} No: {}", street, number)),
                None => lines.push(format!("Street: {}", street)),
            }
        }
        let labelled = [
            ("District", &self.sub_locality),
            ("City", &self.locality),
            ("Region", &self.administrative_area),
            ("Postal code", &self.postal_code),
            ("Country", &self.country),
        ];
        for (label, field) in labelled {
            if let Some(value) = present(field) {
                lines.push(format!("{}: {}", label, value));
            }
        }
        if lines.is_empty() {
            return UNKNOWN_ADDRESS.to_owned();
        }
        lines.join("\n")
    }
}

#[derive(Debug, Clone)]
pub enum GeocodeError {
    RequestError(Arc<reqwest::Error>),
    InvalidResponse {
        status_code: reqwest::StatusCode,
        url: String,
    },
    Other(String),
}

impl error::Error for GeocodeError {}

impl fmt::Display for GeocodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GeocodeError::RequestError(e) => write!(f, "HTTP request error: {}", e),
            GeocodeError::InvalidResponse { status_code, url } => {
                write!(f, "Invalid Response ({}) {}", status_code, url)
            }
            GeocodeError::Other(e) => write!(f, "{e}"),
        }
    }
}

impl From<reqwest::Error> for GeocodeError {
    fn from(e: reqwest::Error) -> Self {
        GeocodeError::RequestError(Arc::new(e))
    }
}

/// Reverse geocoding backend.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `Ok(None)` if the service knows nothing about the position.
    async fn reverse(&self, position: GeoPoint) -> Result<Option<Placemark>, GeocodeError>;
}

/// Short address for a position. Never fails; problems turn into one of the
/// placeholder texts.
pub async fn resolve_address(geocoder: &dyn Geocoder, position: GeoPoint) -> String {
    match geocoder.reverse(position).await {
        Ok(Some(placemark)) => placemark.short_address(),
        Ok(None) => ADDRESS_NOT_FOUND.to_owned(),
        Err(why) => {
            log::warn!(
                "reverse geocoding ({}, {}) failed: {}",
                position.latitude,
                position.longitude,
                why
            );
            ADDRESS_UNAVAILABLE.to_owned()
        }
    }
}

/// Multi-line address for a position, with the same placeholders as
/// `resolve_address`.
pub async fn resolve_detailed_address(
    geocoder: &dyn Geocoder,
    position: GeoPoint,
) -> String {
    match geocoder.reverse(position).await {
        Ok(Some(placemark)) => placemark.detailed_address(),
        Ok(None) => ADDRESS_NOT_FOUND.to_owned(),
        Err(why) => {
            log::warn!(
                "detailed reverse geocoding ({}, {}) failed: {}",
                position.latitude,
                position.longitude,
                why
            );
            ADDRESS_UNAVAILABLE.to_owned()
        }
    }
}

/// Works without network access: names every place after its coordinates.
pub struct OfflineGeocoder;

#[async_trait]
impl Geocoder for OfflineGeocoder {
    async fn reverse(&self, position: GeoPoint) -> Result<Option<Placemark>, GeocodeError> {
        Ok(Some(Placemark {
            name: Some(format!(
                "Location: {:.6}, {:.6}",
                position.latitude, position.longitude
            )),
            ..Default::default()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Result<Option<Placemark>, GeocodeError>);

    #[async_trait]
    impl Geocoder for Fixed {
        async fn reverse(&self, _: GeoPoint) -> Result<Option<Placemark>, GeocodeError> {
            self.0.clone()
        }
    }

    fn kiel() -> Placemark {
        Placemark {
            name: Some("Kieler Rathaus".to_owned()),
            thoroughfare: Some("Fleethörn".to_owned()),
            sub_thoroughfare: Some("9".to_owned()),
            sub_locality: Some("Altstadt".to_owned()),
            locality: Some("Kiel".to_owned()),
            administrative_area: Some("Schleswig-Holstein".to_owned()),
            postal_code: Some("24103".to_owned()),
            country: Some("Deutschland".to_owned()),
        }
    }

    #[test]
    fn short_address_joins_known_parts() {
        assert_eq!(kiel().short_address(), "Fleethörn, Altstadt, Kiel");
        let partial = Placemark {
            sub_locality: None,
            thoroughfare: Some("  ".to_owned()),
            ..kiel()
        };
        assert_eq!(partial.short_address(), "Kiel");
    }

    #[test]
    fn short_address_falls_back_to_name_then_placeholder() {
        let named = Placemark {
            name: Some("Kieler Förde".to_owned()),
            ..Default::default()
        };
        assert_eq!(named.short_address(), "Kieler Förde");
        assert_eq!(Placemark::default().short_address(), UNKNOWN_ADDRESS);
    }

    #[test]
    fn detailed_address_lists_labelled_lines() {
        assert_eq!(
            kiel().detailed_address(),
            "Place: Kieler Rathaus\nStreet: Fleethörn No: 9\nDistrict: Altstadt\n\
             City: Kiel\nRegion: Schleswig-Holstein\nPostal code: 24103\n\
             Country: Deutschland"
        );
        assert_eq!(Placemark::default().detailed_address(), UNKNOWN_ADDRESS);
    }

    #[tokio::test]
    async fn failures_become_placeholders() {
        let point = GeoPoint::new(54.32, 10.14);
        let failing = Fixed(Err(GeocodeError::Other("offline".to_owned())));
        assert_eq!(resolve_address(&failing, point).await, ADDRESS_UNAVAILABLE);
        assert_eq!(
            resolve_detailed_address(&failing, point).await,
            ADDRESS_UNAVAILABLE
        );

        let empty = Fixed(Ok(None));
        assert_eq!(resolve_address(&empty, point).await, ADDRESS_NOT_FOUND);

        let found = Fixed(Ok(Some(kiel())));
        assert_eq!(resolve_address(&found, point).await, "Fleethörn, Altstadt, Kiel");
    }

    #[tokio::test]
    async fn offline_geocoder_names_coordinates() {
        let address = resolve_address(&OfflineGeocoder, GeoPoint::new(41.0, 29.0)).await;
        assert_eq!(address, "Location: 41.000000, 29.000000");
    }
}
