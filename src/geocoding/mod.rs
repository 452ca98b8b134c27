//! Place-name to coordinate lookup.
//!
//! [`GeocodingClient`] is the seam the handlers depend on; the production
//! implementation is [`NominatimGeocodingClient`], which talks to an
//! OpenStreetMap Nominatim instance.

mod nominatim;

use async_trait::async_trait;
use thiserror::Error;

pub use nominatim::NominatimGeocodingClient;

/// WGS-84 position in degrees
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coordinates {
    pub lon: f64,
    pub lat: f64,
}

#[derive(Debug, Error)]
pub enum GeocodingError {
    /// The provider answered but knows no such place
    #[error("No place named '{0}' was found")]
    NotFound(String),
    /// The provider could not be reached or answered with an error
    #[error("Geocoding service unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait GeocodingClient: Send + Sync {
    /// Resolve a free-text place name to its single best match
    async fn lookup(&self, place: &str) -> Result<Coordinates, GeocodingError>;
}
