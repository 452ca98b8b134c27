use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::utils::geo::{is_valid_latitude, is_valid_longitude};

/// Upper bound of the `name` column (`VARCHAR(255)`)
pub const MAX_NAME_LEN: usize = 255;

/// A stored city. `lon`/`lat` are WGS-84 degrees.
#[derive(Clone, Debug, PartialEq, FromQueryResult, Serialize, Deserialize)]
pub struct City {
    pub id: i32,
    pub name: String,
    pub lon: f64,
    pub lat: f64,
}

/// A city returned by a nearest-neighbor query, with its geodesic distance in
/// meters from the query point.
#[derive(Clone, Debug, PartialEq, FromQueryResult, Serialize, Deserialize)]
pub struct NearbyCity {
    pub id: i32,
    pub name: String,
    pub lon: f64,
    pub lat: f64,
    pub distance: f64,
}

impl NearbyCity {
    pub fn new(city: City, distance: f64) -> Self {
        Self {
            id: city.id,
            name: city.name,
            lon: city.lon,
            lat: city.lat,
            distance,
        }
    }
}

/// Validated input for `CityStore::insert`
#[derive(Clone, Debug, PartialEq)]
pub struct NewCity {
    pub name: String,
    pub lon: f64,
    pub lat: f64,
}

impl NewCity {
    pub fn new(name: &str, lon: f64, lat: f64) -> AppResult<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest("'name' is required".to_string()));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(AppError::BadRequest(format!(
                "'name' must be at most {} characters",
                MAX_NAME_LEN
            )));
        }
        validate_point(lon, lat)?;

        Ok(Self {
            name: name.to_string(),
            lon,
            lat,
        })
    }
}

/// Reject coordinates outside the SRID 4326 domain
pub fn validate_point(lon: f64, lat: f64) -> AppResult<()> {
    if !is_valid_longitude(lon) {
        return Err(AppError::BadRequest(format!(
            "longitude {} is out of range [-180, 180]",
            lon
        )));
    }
    if !is_valid_latitude(lat) {
        return Err(AppError::BadRequest(format!(
            "latitude {} is out of range [-90, 90]",
            lat
        )));
    }
    Ok(())
}
