use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::handlers::{city, health};
use crate::middleware::logging::log_request;
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    // `/city/nearest` is a static segment and takes priority over `/city/{city_id}`
    Router::new()
        .route("/health", get(health::health))
        .route("/city", post(city::create_city).get(city::list_cities))
        .route("/city/nearest", get(city::nearest_cities))
        .route("/city/{city_id}", get(city::get_city).delete(city::delete_city))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
