//! Cross-cutting layers for the API router.
use axum::http::{HeaderName, HeaderValue, Request};
use axum::middleware::Next;
use axum::{body::Body, response::Response};
use claimsight_core::CLAIMSIGHT_VERSION;
use tower_http::cors::CorsLayer;

pub const VERSION_HEADER: &str = "x-claimsight-version";

pub fn cors() -> CorsLayer {
    CorsLayer::permissive()
}

/// Stamps every response with the engine version
pub async fn version_header(req: Request<Body>, next: Next) -> Response {
    let mut response = next.run(req).await;
    response.headers_mut().insert(
        HeaderName::from_static(VERSION_HEADER),
        HeaderValue::from_static(CLAIMSIGHT_VERSION),
    );
    response
}
