use axum::{
    Json,
    http::{HeaderMap, HeaderValue, Method, StatusCode, header::ALLOW},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::gateway::GLOW_STATUS_HEADER;

/// Per-request failures. None of them outlive the request that raised them.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("method {method} not allowed, expected {allowed}")]
    MethodNotAllowed { method: Method, allowed: Method },

    #[error("failed to read request body: {0}")]
    InvalidBody(String),

    #[error("{backend} unreachable: {detail}")]
    BadGateway {
        backend: &'static str,
        detail: String,
    },

    #[error("{backend} unavailable: {detail}")]
    ServiceUnavailable {
        backend: &'static str,
        detail: String,
    },

    #[error("{backend} did not respond before the deadline")]
    UpstreamTimeout { backend: &'static str },
}

impl GatewayError {
    /// Classifies a failed passthrough call.
    pub fn from_proxy(backend: &'static str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::UpstreamTimeout { backend }
        } else {
            GatewayError::BadGateway {
                backend,
                detail: err.to_string(),
            }
        }
    }

    /// Classifies a failed processing forward.
    pub fn from_forward(backend: &'static str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::UpstreamTimeout { backend }
        } else {
            GatewayError::ServiceUnavailable {
                backend,
                detail: err.to_string(),
            }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            GatewayError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            GatewayError::BadGateway { .. } => StatusCode::BAD_GATEWAY,
            GatewayError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::UpstreamTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    fn glow_status(&self) -> &'static str {
        match self {
            GatewayError::MethodNotAllowed { .. } => "method_not_allowed",
            GatewayError::InvalidBody(_) => "invalid_request",
            GatewayError::BadGateway { .. } => "bad_gateway",
            GatewayError::ServiceUnavailable { .. } => "service_unavailable",
            GatewayError::UpstreamTimeout { .. } => "upstream_timeout",
        }
    }
}

#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let mut headers = HeaderMap::new();
        headers.insert(
            GLOW_STATUS_HEADER,
            HeaderValue::from_static(self.glow_status()),
        );
        if let GatewayError::MethodNotAllowed { allowed, .. } = &self {
            headers.insert(
                ALLOW,
                HeaderValue::from_str(allowed.as_str())
                    .unwrap_or(HeaderValue::from_static("POST")),
            );
        }

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: status.as_u16(),
        });

        (status, headers, body).into_response()
    }
}
