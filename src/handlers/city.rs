use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::entities::{City, NearbyCity};
use crate::error::{AppError, AppResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCityRequest {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NearestQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub limit: Option<u64>,
}

fn parse_city_id(raw: &str) -> AppResult<i32> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::BadRequest("city_id must be an integer".to_string()))
}

/// Geocode a city by name and store it
pub async fn create_city(
    State(state): State<AppState>,
    payload: Result<Json<CreateCityRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<City>)> {
    let Json(payload) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let name = payload
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| AppError::BadRequest("'name' is required".to_string()))?;

    // Nothing is written unless the lookup succeeded
    let coordinates = state.geocoder.lookup(name).await?;
    let city = state
        .store
        .insert(name, coordinates.lon, coordinates.lat)
        .await?;

    tracing::info!(
        city_id = city.id,
        name = %city.name,
        lon = city.lon,
        lat = city.lat,
        "City created"
    );
    Ok((StatusCode::CREATED, Json(city)))
}

/// Delete a city. Unknown ids are accepted.
pub async fn delete_city(
    State(state): State<AppState>,
    Path(city_id): Path<String>,
) -> AppResult<Json<Value>> {
    let id = parse_city_id(&city_id)?;
    state.store.delete(id).await?;

    Ok(Json(json!({ "message": "City deleted" })))
}

/// Get a single city
pub async fn get_city(
    State(state): State<AppState>,
    Path(city_id): Path<String>,
) -> AppResult<Json<City>> {
    let id = parse_city_id(&city_id)?;
    let city = state.store.get(id).await?;

    Ok(Json(city))
}

/// List all cities
pub async fn list_cities(State(state): State<AppState>) -> AppResult<Json<Vec<City>>> {
    let cities = state.store.list().await?;
    Ok(Json(cities))
}

/// Cities closest to `?lat=&lon=`, nearest first
pub async fn nearest_cities(
    State(state): State<AppState>,
    query: Result<Query<NearestQuery>, QueryRejection>,
) -> AppResult<Json<Vec<NearbyCity>>> {
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let (Some(lat), Some(lon)) = (query.lat, query.lon) else {
        return Err(AppError::BadRequest(
            "'lat' and 'lon' query parameters are required".to_string(),
        ));
    };

    let max = state.config.nearest_max_limit;
    let limit = query.limit.unwrap_or(state.config.nearest_default_limit);
    if limit == 0 || limit > max {
        return Err(AppError::BadRequest(format!(
            "'limit' must be between 1 and {}",
            max
        )));
    }

    let cities = state.store.nearest(lon, lat, limit).await?;
    Ok(Json(cities))
}
