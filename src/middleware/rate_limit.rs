use axum::{
    body::Body,
    extract::{ConnectInfo, Request},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

/// IP-keyed rate limiting layer
pub type IpGovernorLayer = GovernorLayer<
    tower_governor::key_extractor::PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware<governor::clock::QuantaInstant>,
    Body,
>;

/// Per-IP quota for the whole API
/// - 1000 requests per minute (one token every 60ms)
pub fn create_global_governor() -> IpGovernorLayer {
    let config = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(60)
            .burst_size(1000)
            .finish()
            .expect("global rate limit config is valid"),
    );

    GovernorLayer::new(config)
}

/// Per-IP quota for login and registration
/// - 5 requests per minute (one token every 12s)
pub fn create_auth_governor() -> IpGovernorLayer {
    let config = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(12)
            .burst_size(5)
            .finish()
            .expect("auth rate limit config is valid"),
    );

    GovernorLayer::new(config)
}

/// Per-request access log keyed by client IP. Throttled requests are called out separately.
pub async fn log_request(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let started = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match status {
        StatusCode::TOO_MANY_REQUESTS => tracing::warn!(
            client_ip = %addr.ip(),
            %method,
            %path,
            "rate limited"
        ),
        s if s.is_server_error() => tracing::error!(
            client_ip = %addr.ip(),
            %method,
            %path,
            status = s.as_u16(),
            elapsed_ms,
            "request failed"
        ),
        s => tracing::debug!(
            client_ip = %addr.ip(),
            %method,
            %path,
            status = s.as_u16(),
            elapsed_ms,
            "request handled"
        ),
    }

    response
}
