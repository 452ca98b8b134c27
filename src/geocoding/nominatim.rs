use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{Coordinates, GeocodingClient, GeocodingError};
use crate::config::Config;
use crate::utils::geo::{is_valid_latitude, is_valid_longitude};

/// One entry of a Nominatim `format=json` search response. Coordinates come
/// back as decimal strings.
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Clone)]
pub struct NominatimGeocodingClient {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimGeocodingClient {
    pub fn new(
        base_url: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, GeocodingError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| GeocodingError::Unavailable(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, GeocodingError> {
        Self::new(
            config.geocoder_url.clone(),
            &config.geocoder_user_agent,
            config.geocoder_timeout(),
        )
    }
}

#[async_trait]
impl GeocodingClient for NominatimGeocodingClient {
    async fn lookup(&self, place: &str) -> Result<Coordinates, GeocodingError> {
        let url = format!("{}/search", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("city", place), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GeocodingError::Unavailable("request timed out".to_string())
                } else {
                    GeocodingError::Unavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodingError::Unavailable(format!(
                "unexpected status {}",
                status
            )));
        }

        let places: Vec<NominatimPlace> = response
            .json()
            .await
            .map_err(|e| GeocodingError::Unavailable(format!("malformed response: {}", e)))?;

        let coordinates = best_match(place, places)?;
        tracing::debug!(place, lon = coordinates.lon, lat = coordinates.lat, "Geocoded place");
        Ok(coordinates)
    }
}

fn best_match(place: &str, places: Vec<NominatimPlace>) -> Result<Coordinates, GeocodingError> {
    let first = places
        .into_iter()
        .next()
        .ok_or_else(|| GeocodingError::NotFound(place.to_string()))?;

    let lon = first.lon.trim().parse::<f64>().ok();
    let lat = first.lat.trim().parse::<f64>().ok();

    match (lon, lat) {
        (Some(lon), Some(lat)) if is_valid_longitude(lon) && is_valid_latitude(lat) => {
            Ok(Coordinates { lon, lat })
        }
        _ => {
            tracing::warn!(
                place,
                display_name = ?first.display_name,
                lon = %first.lon,
                lat = %first.lat,
                "Geocoder returned unusable coordinates"
            );
            Err(GeocodingError::NotFound(place.to_string()))
        }
    }
}
