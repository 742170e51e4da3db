//! Forwarder for the processing endpoint.
//!
//! Unlike passthrough, the inbound path is discarded: every accepted request
//! becomes a `POST` to the AI service's [`AI_PROCESS_ENDPOINT`].

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderValue, Method, header::CONTENT_TYPE},
    response::Response,
};
use futures_util::TryStreamExt;
use tracing::{debug, info, warn};

use crate::gateway::context::UpstreamContext;
use crate::gateway::error::GatewayError;
use crate::gateway::payload::extract_source_type;
use crate::gateway::state::GatewayState;

/// Fixed AI service endpoint that receives processing requests.
pub const AI_PROCESS_ENDPOINT: &str = "/api/process";

const APPLICATION_JSON: HeaderValue = HeaderValue::from_static("application/json");

pub async fn forward(
    state: &GatewayState,
    ctx: UpstreamContext,
    req: Request,
) -> Result<Response, GatewayError> {
    if req.method() != Method::POST {
        return Err(GatewayError::MethodNotAllowed {
            method: req.method().clone(),
            allowed: Method::POST,
        });
    }

    let body = axum::body::to_bytes(req.into_body(), state.max_process_body_bytes)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to read processing request body");
            GatewayError::InvalidBody(e.to_string())
        })?;

    let backend = state.backends.ai.name();
    match extract_source_type(&body) {
        Some(source_type) => {
            info!(source_type = %source_type, bytes = body.len(), "Forwarding processing request")
        }
        None => debug!(bytes = body.len(), "Forwarding unrecognised processing body"),
    }

    if ctx.is_expired() {
        return Err(GatewayError::UpstreamTimeout { backend });
    }

    let upstream = state
        .client
        .post(state.backends.ai.url_for(AI_PROCESS_ENDPOINT))
        .header(CONTENT_TYPE, APPLICATION_JSON)
        .timeout(ctx.remaining())
        .body(body)
        .send()
        .await
        .map_err(|e| {
            warn!(backend, error = %e, "Error forwarding to AI service");
            GatewayError::from_forward(backend, e)
        })?;

    let status = upstream.status();
    debug!(backend, status = status.as_u16(), "AI service responded");

    let stream = upstream.bytes_stream().inspect_err(move |e| {
        warn!(backend, error = %e, "AI service body ended early");
    });

    let mut response = Response::new(Body::from_stream(stream));
    *response.status_mut() = status;
    response.headers_mut().insert(CONTENT_TYPE, APPLICATION_JSON);
    Ok(response)
}
