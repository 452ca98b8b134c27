pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod geocoding;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod store;
pub mod utils;

use std::sync::Arc;

pub use config::Config;
pub use error::{AppError, AppResult};

use geocoding::GeocodingClient;
use store::CityStore;

/// Handles shared by every request. Built once in `main` and cloned into each
/// handler; the store and geocoder are the only shared resources.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CityStore>,
    pub geocoder: Arc<dyn GeocodingClient>,
    pub config: Config,
}
