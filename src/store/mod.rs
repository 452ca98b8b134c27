//! Persistent storage of cities and nearest-neighbor lookup.
//!
//! Both implementations order nearest results by WGS-84 geodesic distance and
//! break ties by ascending id, so callers never observe index scan order.

mod memory;
mod postgres;

use async_trait::async_trait;

pub use memory::MemoryCityStore;
pub use postgres::PgCityStore;

use crate::entities::{City, NearbyCity};
use crate::error::{AppError, AppResult};

#[async_trait]
pub trait CityStore: Send + Sync {
    /// Validate and persist a new city, returning it with its assigned id.
    ///
    /// Fails with `AppError::BadRequest` for an empty name or coordinates
    /// outside SRID 4326.
    async fn insert(&self, name: &str, lon: f64, lat: f64) -> AppResult<City>;

    /// Remove a city. Removing an id that does not exist is not an error.
    async fn delete(&self, id: i32) -> AppResult<()>;

    /// Fails with `AppError::NotFound` if no city has this id
    async fn get(&self, id: i32) -> AppResult<City>;

    /// All cities in insertion order
    async fn list(&self) -> AppResult<Vec<City>>;

    /// Up to `k` cities closest to (lon, lat), nearest first
    async fn nearest(&self, lon: f64, lat: f64, k: u64) -> AppResult<Vec<NearbyCity>>;

    /// Check that the backing store is reachable
    async fn ping(&self) -> AppResult<()>;
}

pub(crate) fn city_not_found(id: i32) -> AppError {
    AppError::NotFound(format!("City {} not found", id))
}
