//! Composite health report across the gateway and both backends.
//!
//! The gateway always reports itself healthy and always answers 200; backend
//! state is reported, never used to gate the response.

use std::time::Duration;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::config::BackendTarget;
use crate::gateway::context::UpstreamContext;
use crate::gateway::route::HEALTH_PATH;
use crate::gateway::state::GatewayState;

/// Status the gateway reports for itself.
pub const GATEWAY_STATUS_HEALTHY: &str = "healthy";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Healthy,
    Unhealthy,
}

impl ServiceStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, ServiceStatus::Healthy)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceHealth {
    pub ai_service: ServiceStatus,
    pub web_ui: ServiceStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub timestamp: String,
    pub services: ServiceHealth,
}

impl HealthReport {
    pub fn new(services: ServiceHealth) -> Self {
        Self {
            status: GATEWAY_STATUS_HEALTHY,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            services,
        }
    }
}

/// GETs `{target}/health`; healthy only on a 200 within `timeout`.
pub async fn probe(
    client: &reqwest::Client,
    target: &BackendTarget,
    timeout: Duration,
) -> ServiceStatus {
    if timeout.is_zero() {
        debug!(backend = target.name(), "No time left to probe");
        return ServiceStatus::Unhealthy;
    }

    match client
        .get(target.url_for(HEALTH_PATH))
        .timeout(timeout)
        .send()
        .await
    {
        Ok(resp) if resp.status() == StatusCode::OK => ServiceStatus::Healthy,
        Ok(resp) => {
            debug!(
                backend = target.name(),
                status = resp.status().as_u16(),
                "Health probe returned non-200"
            );
            ServiceStatus::Unhealthy
        }
        Err(e) => {
            debug!(backend = target.name(), error = %e, "Health probe failed");
            ServiceStatus::Unhealthy
        }
    }
}

/// Probes both backends concurrently and builds a fresh report.
#[instrument(skip_all)]
pub async fn aggregate(state: &GatewayState, ctx: UpstreamContext) -> HealthReport {
    let timeout = ctx.bounded(state.health_probe_timeout);

    let (ai_service, web_ui) = tokio::join!(
        probe(&state.client, &state.backends.ai, timeout),
        probe(&state.client, &state.backends.ui, timeout),
    );

    debug!(ai_service = ?ai_service, web_ui = ?web_ui, "Health probes complete");

    HealthReport::new(ServiceHealth { ai_service, web_ui })
}

pub async fn health_response(state: &GatewayState, ctx: UpstreamContext) -> Response {
    (StatusCode::OK, Json(aggregate(state, ctx).await)).into_response()
}
