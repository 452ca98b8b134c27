use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use city_locator::{
    config::{Config, StoreBackend},
    db,
    geocoding::NominatimGeocodingClient,
    routes,
    store::{CityStore, MemoryCityStore, PgCityStore},
    AppState,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "city_locator=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().expect("Invalid configuration");
    tracing::info!("Starting server at {}", config.server_addr());

    let store = build_store(&config).await;

    let geocoder =
        NominatimGeocodingClient::from_config(&config).expect("Failed to build geocoder client");
    tracing::info!(url = %config.geocoder_url, "Geocoder configured");

    // Create app state
    let state = AppState {
        store,
        geocoder: Arc::new(geocoder),
        config: config.clone(),
    };

    // Create router with middleware
    let app = routes::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any));

    let addr: SocketAddr = config.server_addr().parse().expect("Invalid address");
    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Failed to start server");

    tracing::info!("Server stopped");
}

async fn build_store(config: &Config) -> Arc<dyn CityStore> {
    match config.store_backend {
        StoreBackend::Postgres => {
            // Connect to database
            let db = db::connect(config)
                .await
                .expect("Failed to connect to database");
            tracing::info!("Connected to database");

            // Run migrations
            db::migrate(&db).await.expect("Failed to run migrations");
            tracing::info!("Migrations complete");

            Arc::new(PgCityStore::new(db))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory city store; data is lost on shutdown");
            Arc::new(MemoryCityStore::new())
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
