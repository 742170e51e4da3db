use axum::{
    extract::{Request, State},
    response::{IntoResponse, Response},
};
use tracing::{info, instrument};

use crate::gateway::context::UpstreamContext;
use crate::gateway::route::Route;
use crate::gateway::state::GatewayState;
use crate::gateway::{cors, health, process, proxy};

/// Single entry point for every request that survives the CORS layer.
///
/// Looks the request up in the route table and runs exactly one strategy.
#[instrument(
    skip(state, req),
    fields(method = %req.method(), path = %req.uri().path(), route = tracing::field::Empty)
)]
pub async fn dispatch(State(state): State<GatewayState>, req: Request) -> Response {
    let route = state.routes.decide(req.method(), req.uri().path());
    tracing::Span::current().record("route", route.as_str());

    let ctx = UpstreamContext::with_timeout(state.upstream_timeout);

    let result = match route {
        Route::Preflight => Ok(cors::preflight_response()),
        Route::AiPassthrough => {
            info!("Proxying API request");
            proxy::forward(&state.client, &state.backends.ai, ctx, req).await
        }
        Route::ProcessingForward => process::forward(&state, ctx, req).await,
        Route::HealthCheck => Ok(health::health_response(&state, ctx).await),
        Route::UiPassthrough => {
            info!("Proxying UI request");
            proxy::forward(&state.client, &state.backends.ui, ctx, req).await
        }
    };

    result.unwrap_or_else(IntoResponse::into_response)
}
