//! HTTP gateway (Axum) fronting the AI and UI services.
//!
//! Every request passes through the CORS layer, then the route table picks
//! one of: passthrough to the AI service, the processing forwarder, the
//! health aggregator, or passthrough to the UI service.

pub mod context;
pub mod cors;
pub mod error;
pub mod handler;
pub mod health;
pub mod payload;
pub mod process;
pub mod proxy;
pub mod route;
pub mod state;


use axum::Router;
use tower_http::trace::TraceLayer;

pub use context::UpstreamContext;
pub use error::GatewayError;
pub use handler::dispatch;
pub use health::{HealthReport, ServiceHealth, ServiceStatus};
pub use route::{Matcher, Route, RouteTable};
pub use state::GatewayState;

/// Response header naming the class of a gateway-generated error.
pub const GLOW_STATUS_HEADER: &str = "x-glow-status";

/// Builds the gateway router. Constructed once and handed to `axum::serve`.
pub fn create_router(state: GatewayState) -> Router {
    let router = Router::new().fallback(dispatch);

    cors::apply(router)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
