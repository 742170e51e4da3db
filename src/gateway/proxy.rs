//! Transparent passthrough to a single backend.
//!
//! Method, path, query, headers and body go upstream as received (minus
//! hop-by-hop headers and `Host`). The backend's status, headers and body
//! are streamed back without buffering.

use std::net::{IpAddr, SocketAddr};

use axum::{
    body::{Body, HttpBody},
    extract::{ConnectInfo, Request},
    http::{
        HeaderMap, HeaderName, HeaderValue,
        header::{
            CONNECTION, HOST, PROXY_AUTHENTICATE, PROXY_AUTHORIZATION, TE, TRAILER,
            TRANSFER_ENCODING, UPGRADE,
        },
    },
    response::Response,
};
use futures_util::TryStreamExt;
use tracing::{debug, warn};

use crate::config::BackendTarget;
use crate::gateway::context::UpstreamContext;
use crate::gateway::error::GatewayError;

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");

const KEEP_ALIVE: HeaderName = HeaderName::from_static("keep-alive");
const PROXY_CONNECTION: HeaderName = HeaderName::from_static("proxy-connection");

const HOP_BY_HOP: [HeaderName; 9] = [
    CONNECTION,
    KEEP_ALIVE,
    PROXY_CONNECTION,
    PROXY_AUTHENTICATE,
    PROXY_AUTHORIZATION,
    TE,
    TRAILER,
    TRANSFER_ENCODING,
    UPGRADE,
];

/// Forwards `req` to `target`, preserving path and query.
pub async fn forward(
    client: &reqwest::Client,
    target: &BackendTarget,
    ctx: UpstreamContext,
    req: Request,
) -> Result<Response, GatewayError> {
    if ctx.is_expired() {
        return Err(GatewayError::UpstreamTimeout {
            backend: target.name(),
        });
    }

    let (parts, body) = req.into_parts();

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let url = target.url_for(path_and_query);

    let peer = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let headers = upstream_headers(&parts.headers, peer);

    debug!(backend = target.name(), method = %parts.method, url = %url, "Forwarding request");

    let mut builder = client
        .request(parts.method, url)
        .headers(headers)
        .timeout(ctx.remaining());

    if body.size_hint().exact() != Some(0) {
        builder = builder.body(reqwest::Body::wrap_stream(body.into_data_stream()));
    }

    let upstream = builder.send().await.map_err(|e| {
        warn!(backend = target.name(), error = %e, "Upstream request failed");
        GatewayError::from_proxy(target.name(), e)
    })?;

    Ok(relay(target.name(), upstream))
}

/// Streams an upstream response back to the caller unchanged.
pub fn relay(backend: &'static str, upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let mut headers = upstream.headers().clone();
    strip_hop_by_hop(&mut headers);

    let stream = upstream.bytes_stream().inspect_err(move |e| {
        warn!(backend, error = %e, "Upstream body ended early");
    });

    let mut response = Response::new(Body::from_stream(stream));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

/// Copies inbound headers for the upstream request.
///
/// Drops `Host` (the client sets the backend's) and hop-by-hop headers, then
/// records the peer address and original host in `X-Forwarded-*`.
pub fn upstream_headers(inbound: &HeaderMap, peer: Option<IpAddr>) -> HeaderMap {
    let mut headers = inbound.clone();
    strip_hop_by_hop(&mut headers);
    headers.remove(HOST);

    if let Some(host) = inbound.get(HOST) {
        headers.insert(X_FORWARDED_HOST, host.clone());
    }

    if let Some(ip) = peer {
        // Earlier hops may arrive as several header lines; fold them into one.
        let prior: Vec<&str> = inbound
            .get_all(X_FORWARDED_FOR)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .collect();
        let forwarded_for = if prior.is_empty() {
            ip.to_string()
        } else {
            format!("{}, {}", prior.join(", "), ip)
        };
        if let Ok(value) = HeaderValue::from_str(&forwarded_for) {
            headers.insert(X_FORWARDED_FOR, value);
        }
    }

    headers
}

/// Removes hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}
