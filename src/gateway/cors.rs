//! Uniform cross-origin headers and preflight short-circuit.
//!
//! The three `Access-Control-*` headers are written with override semantics
//! on every response leaving the gateway, including error responses and
//! upstream responses that carried CORS headers of their own.

use axum::{
    Router,
    body::Body,
    extract::Request,
    http::{
        HeaderValue, Method, StatusCode,
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN,
        },
    },
    middleware::{self, Next},
    response::Response,
};
use tower::ServiceBuilder;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::debug;

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type, Authorization";

/// Wraps `router` so every response carries the CORS headers and every
/// `OPTIONS` request is answered before routing.
pub fn apply<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    // Outermost first: the header layers also see the preflight response.
    router.layer(
        ServiceBuilder::new()
            .layer(SetResponseHeaderLayer::overriding(
                ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static(ALLOW_ORIGIN),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static(ALLOW_METHODS),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static(ALLOW_HEADERS),
            ))
            .layer(middleware::from_fn(short_circuit_preflight)),
    )
}

/// Answers `OPTIONS` with an empty 200; everything else continues inward.
pub async fn short_circuit_preflight(req: Request, next: Next) -> Response {
    if req.method() == Method::OPTIONS {
        debug!(path = %req.uri().path(), "Answering CORS preflight");
        return preflight_response();
    }
    next.run(req).await
}

pub fn preflight_response() -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::OK;
    response
}
