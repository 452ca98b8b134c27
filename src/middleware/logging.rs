use axum::{
    extract::{ConnectInfo, Request},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::time::{Duration, Instant};

fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// Middleware to log request details and outcome
pub async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    // Absent when the router is driven without a socket, e.g. in tests
    let client_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "-".to_string());

    tracing::debug!(
        client_ip = %client_ip,
        method = %method,
        uri = %uri,
        "Incoming request"
    );

    let started = Instant::now();
    let response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = millis(started.elapsed());

    if status.is_client_error() || status.is_server_error() {
        tracing::warn!(
            client_ip = %client_ip,
            method = %method,
            uri = %uri,
            status = %status,
            elapsed_ms,
            "Request failed"
        );
    } else {
        tracing::debug!(
            client_ip = %client_ip,
            method = %method,
            uri = %uri,
            status = %status,
            elapsed_ms,
            "Request completed"
        );
    }

    response
}
