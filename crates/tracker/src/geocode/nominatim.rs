use std::time::Duration;

use async_trait::async_trait;
use model::GeoPoint;
use serde::Deserialize;

use crate::config::GeocoderConfig;

use super::{GeocodeError, Geocoder, Placemark};

/// Reverse geocoding through a Nominatim instance (`/reverse?format=jsonv2`).
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NominatimResponse {
    pub name: Option<String>,
    pub error: Option<String>,
    pub address: Option<NominatimAddress>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NominatimAddress {
    pub road: Option<String>,
    pub pedestrian: Option<String>,
    pub house_number: Option<String>,
    pub suburb: Option<String>,
    pub quarter: Option<String>,
    pub neighbourhood: Option<String>,
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub municipality: Option<String>,
    pub state: Option<String>,
    pub postcode: Option<String>,
    pub country: Option<String>,
}

impl NominatimResponse {
    /// `None` when the service reported that it could not geocode the
    /// position.
    pub fn into_placemark(self) -> Option<Placemark> {
        if self.error.is_some() {
            return None;
        }
        let address = self.address.unwrap_or_default();
        Some(Placemark {
            name: self.name,
            thoroughfare: address.road.or(address.pedestrian),
            sub_thoroughfare: address.house_number,
            sub_locality: address
                .suburb
                .or(address.quarter)
                .or(address.neighbourhood),
            locality: address
                .city
                .or(address.town)
                .or(address.village)
                .or(address.municipality),
            administrative_area: address.state,
            postal_code: address.postcode,
            country: address.country,
        })
    }
}

impl NominatimGeocoder {
    pub fn new(config: &GeocoderConfig) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn reverse(&self, position: GeoPoint) -> Result<Option<Placemark>, GeocodeError> {
        let url = format!("{}/reverse", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("format", "jsonv2".to_owned()),
                ("addressdetails", "1".to_owned()),
                ("lat", position.latitude.to_string()),
                ("lon", position.longitude.to_string()),
            ])
            .send()
            .await?;

        let status_code = response.status();
        if !status_code.is_success() {
            return Err(GeocodeError::InvalidResponse { status_code, url });
        }

        let body: NominatimResponse = response.json().await?;
        Ok(body.into_placemark())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_maps_to_placemark() {
        let json = r#"{
            "place_id": 1234,
            "name": "Kieler Rathaus",
            "display_name": "Kieler Rathaus, 9, Fleethörn, Altstadt, Kiel, 24103",
            "address": {
                "road": "Fleethörn",
                "house_number": "9",
                "suburb": "Altstadt",
                "city": "Kiel",
                "state": "Schleswig-Holstein",
                "postcode": "24103",
                "country": "Deutschland",
                "country_code": "de"
            }
        }"#;
        let response: NominatimResponse = serde_json::from_str(json).unwrap();
        let placemark = response.into_placemark().unwrap();
        assert_eq!(placemark.short_address(), "Fleethörn, Altstadt, Kiel");
        assert_eq!(placemark.sub_thoroughfare.as_deref(), Some("9"));
    }

    #[test]
    fn villages_count_as_locality() {
        let json = r#"{
            "name": "",
            "address": { "village": "Raisdorf", "state": "Schleswig-Holstein" }
        }"#;
        let response: NominatimResponse = serde_json::from_str(json).unwrap();
        let placemark = response.into_placemark().unwrap();
        assert_eq!(placemark.short_address(), "Raisdorf");
    }

    #[test]
    fn error_response_means_not_found() {
        let json = r#"{ "error": "Unable to geocode" }"#;
        let response: NominatimResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.into_placemark(), None);
    }

    #[test]
    fn base_url_without_trailing_slash() {
        let geocoder = NominatimGeocoder::new(&GeocoderConfig {
            base_url: "http://localhost:8080/".to_owned(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(geocoder.base_url, "http://localhost:8080");
    }
}
