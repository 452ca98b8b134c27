//! Router-level tests: the full HTTP surface over the in-memory store and a
//! canned geocoder.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt; // for oneshot

use city_locator::{
    geocoding::{Coordinates, GeocodingClient, GeocodingError},
    routes,
    store::{MemoryCityStore, PgCityStore},
    AppState, Config,
};
use sea_orm::{sqlx, DatabaseBackend, DbErr, MockDatabase, RuntimeErr};

/// Answers from a fixed table; the place "Offline" simulates an unreachable
/// provider.
struct StubGeocoder {
    places: HashMap<&'static str, Coordinates>,
    calls: AtomicUsize,
}

impl StubGeocoder {
    fn new() -> Self {
        let places = HashMap::from([
            ("Paris", Coordinates { lon: 2.3522, lat: 48.8566 }),
            ("Berlin", Coordinates { lon: 13.405, lat: 52.52 }),
            ("Rome", Coordinates { lon: 12.4964, lat: 41.9028 }),
        ]);
        Self {
            places,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl GeocodingClient for StubGeocoder {
    async fn lookup(&self, place: &str) -> Result<Coordinates, GeocodingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if place == "Offline" {
            return Err(GeocodingError::Unavailable("connection refused".to_string()));
        }
        self.places
            .get(place)
            .copied()
            .ok_or_else(|| GeocodingError::NotFound(place.to_string()))
    }
}

struct TestApp {
    router: Router,
    geocoder: Arc<StubGeocoder>,
}

fn test_app() -> TestApp {
    let geocoder = Arc::new(StubGeocoder::new());
    let state = AppState {
        store: Arc::new(MemoryCityStore::new()),
        geocoder: geocoder.clone(),
        config: Config::default(),
    };
    TestApp {
        router: routes::create_router(state),
        geocoder,
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("Response body is not JSON")
    };
    (status, json)
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(router, request).await
}

async fn delete(router: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(router, request).await
}

async fn post_json(router: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(router, request).await
}

#[tokio::test]
async fn test_create_city_geocodes_and_stores() {
    let app = test_app();

    let (status, body) = post_json(&app.router, "/city", r#"{"name": "Paris"}"#).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Paris");
    assert_eq!(body["lon"], 2.3522);
    assert_eq!(body["lat"], 48.8566);

    let id = body["id"].as_i64().unwrap();
    let (status, fetched) = get(&app.router, &format!("/city/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, body);
}

#[tokio::test]
async fn test_create_city_requires_name() {
    let app = test_app();

    for payload in [r#"{}"#, r#"{"name": ""}"#, r#"{"name": "   "}"#, r#"{"name": null}"#] {
        let (status, body) = post_json(&app.router, "/city", payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {}", payload);
        assert_eq!(body["error"], "'name' is required");
    }

    // Validation happens before any lookup
    assert_eq!(app.geocoder.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_create_city_rejects_malformed_body() {
    let app = test_app();

    let (status, body) = post_json(&app.router, "/city", "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_create_city_unknown_place_is_not_found() {
    let app = test_app();

    let (status, _) = post_json(&app.router, "/city", r#"{"name": "Atlantis"}"#).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, cities) = get(&app.router, "/city").await;
    assert_eq!(cities, Value::Array(vec![]));
}

#[tokio::test]
async fn test_create_city_geocoder_down_is_unavailable() {
    let app = test_app();

    let (status, body) = post_json(&app.router, "/city", r#"{"name": "Offline"}"#).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("unavailable"));

    // Nothing persisted after a failed lookup
    let (_, cities) = get(&app.router, "/city").await;
    assert_eq!(cities, Value::Array(vec![]));
}

#[tokio::test]
async fn test_get_city_errors() {
    let app = test_app();

    let (status, body) = get(&app.router, "/city/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "city_id must be an integer");

    let (status, _) = get(&app.router, "/city/999999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_city() {
    let app = test_app();
    let (_, paris) = post_json(&app.router, "/city", r#"{"name": "Paris"}"#).await;
    let uri = format!("/city/{}", paris["id"]);

    let (status, _) = delete(&app.router, &uri).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = get(&app.router, &uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Deleting again, or deleting an id that never existed, still succeeds
    let (status, _) = delete(&app.router, &uri).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = delete(&app.router, "/city/424242").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = delete(&app.router, "/city/twelve").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_cities() {
    let app = test_app();
    post_json(&app.router, "/city", r#"{"name": "Paris"}"#).await;
    post_json(&app.router, "/city", r#"{"name": "Berlin"}"#).await;

    let (status, body) = get(&app.router, "/city").await;
    assert_eq!(status, StatusCode::OK);

    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Paris", "Berlin"]);
}

#[tokio::test]
async fn test_nearest_cities_defaults_to_two() {
    let app = test_app();
    for name in ["Paris", "Berlin", "Rome"] {
        post_json(&app.router, "/city", &format!(r#"{{"name": "{}"}}"#, name)).await;
    }

    let (status, body) = get(&app.router, "/city/nearest?lat=48.0&lon=2.0").await;
    assert_eq!(status, StatusCode::OK);

    let cities = body.as_array().unwrap();
    assert_eq!(cities.len(), 2);
    assert_eq!(cities[0]["name"], "Paris");
    assert_eq!(cities[1]["name"], "Berlin");

    let d0 = cities[0]["distance"].as_f64().unwrap();
    let d1 = cities[1]["distance"].as_f64().unwrap();
    assert!(d0 <= d1);
    assert!(d0 > 90_000.0 && d0 < 110_000.0);
    for key in ["id", "name", "lon", "lat", "distance"] {
        assert!(cities[0].get(key).is_some(), "missing {}", key);
    }
}

#[tokio::test]
async fn test_nearest_cities_limit() {
    let app = test_app();
    for name in ["Paris", "Berlin", "Rome"] {
        post_json(&app.router, "/city", &format!(r#"{{"name": "{}"}}"#, name)).await;
    }

    let (status, body) = get(&app.router, "/city/nearest?lat=48.0&lon=2.0&limit=3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);

    let (status, _) = get(&app.router, "/city/nearest?lat=48.0&lon=2.0&limit=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(&app.router, "/city/nearest?lat=48.0&lon=2.0&limit=1000").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_nearest_cities_empty_table() {
    let app = test_app();

    let (status, body) = get(&app.router, "/city/nearest?lat=0&lon=0").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Array(vec![]));
}

#[tokio::test]
async fn test_nearest_cities_bad_query() {
    let app = test_app();

    for uri in [
        "/city/nearest",
        "/city/nearest?lat=48.0",
        "/city/nearest?lat=north&lon=2.0",
        "/city/nearest?lat=95.0&lon=2.0",
        "/city/nearest?lat=10.0&lon=-181.0",
    ] {
        let (status, _) = get(&app.router, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "uri {}", uri);
    }
}

#[tokio::test]
async fn test_health() {
    let app = test_app();

    let (status, body) = get(&app.router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_store_connection_loss_is_unavailable() {
    let reset = std::io::Error::from(std::io::ErrorKind::ConnectionReset);
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_errors([DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Io(reset)))])
        .into_connection();
    let state = AppState {
        store: Arc::new(PgCityStore::new(db)),
        geocoder: Arc::new(StubGeocoder::new()),
        config: Config::default(),
    };
    let router = routes::create_router(state);

    let (status, body) = get(&router, "/city").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("unavailable"));
}
