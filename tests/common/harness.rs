//! Test server harness.
//!
//! Spawns the gateway on an ephemeral port, plus mock backends that record
//! every request they receive.

use axum::{
    Router,
    body::{Body, Bytes},
    extract::Request,
    http::{HeaderMap, Method},
    middleware::{self, Next},
    response::Response,
};
use glow::config::{BackendTarget, Backends, Config};
use glow::gateway::{GatewayState, create_router};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

const STARTUP_WAIT_TIMEOUT_SECS: u64 = 5;
const STARTUP_POLL_INTERVAL_MS: u64 = 50;

#[derive(Debug, Clone)]
pub struct TestServerConfig {
    pub port: u16,
    pub upstream_timeout: Duration,
    pub health_probe_timeout: Duration,
    pub max_process_body_bytes: usize,
}

impl Default for TestServerConfig {
    fn default() -> Self {
        let defaults = Config::default();
        Self {
            port: 0,
            upstream_timeout: defaults.upstream_timeout,
            health_probe_timeout: defaults.health_probe_timeout,
            max_process_body_bytes: defaults.max_process_body_bytes,
        }
    }
}

impl TestServerConfig {
    pub fn upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = timeout;
        self
    }

    pub fn health_probe_timeout(mut self, timeout: Duration) -> Self {
        self.health_probe_timeout = timeout;
        self
    }

    fn to_config(&self) -> Config {
        Config {
            port: self.port,
            upstream_timeout: self.upstream_timeout,
            health_probe_timeout: self.health_probe_timeout,
            max_process_body_bytes: self.max_process_body_bytes,
            ..Default::default()
        }
    }
}

pub struct TestServer {
    pub addr: SocketAddr,
    _server_handle: JoinHandle<()>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

pub async fn find_available_port() -> std::io::Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    Ok(addr.port())
}

pub async fn wait_for_server_ready(
    addr: SocketAddr,
    timeout: Duration,
    interval: Duration,
) -> Result<(), ServerStartupError> {
    let start = std::time::Instant::now();

    loop {
        if start.elapsed() > timeout {
            return Err(ServerStartupError::Timeout);
        }

        match tokio::net::TcpStream::connect(addr).await {
            Ok(_) => return Ok(()),
            Err(_) => {
                tokio::time::sleep(interval).await;
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServerStartupError {
    #[error("Server failed to start within timeout")]
    Timeout,
    #[error("Failed to bind to address: {0}")]
    BindError(#[from] std::io::Error),
    #[error("Server startup failed: {0}")]
    StartupFailed(String),
}

/// One request as seen by a mock backend.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: Method,
    pub uri: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Shared log of requests that reached a mock backend.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<SeenRequest>>>,
}

impl CallLog {
    pub fn calls(&self) -> Vec<SeenRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Requests other than health probes.
    pub fn traffic(&self) -> Vec<SeenRequest> {
        self.calls()
            .into_iter()
            .filter(|call| call.uri != "/health")
            .collect()
    }
}

async fn record(log: CallLog, req: Request, next: Next) -> Response {
    let (parts, body) = req.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();

    log.calls.lock().unwrap().push(SeenRequest {
        method: parts.method.clone(),
        uri: parts.uri.to_string(),
        headers: parts.headers.clone(),
        body: body.clone(),
    });

    next.run(Request::from_parts(parts, Body::from(body))).await
}

async fn serve(
    listener: TcpListener,
    app: Router,
) -> Result<TestServer, ServerStartupError> {
    let local_addr = listener.local_addr()?;
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let server_handle = tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        })
        .await
        .unwrap();
    });

    wait_for_server_ready(
        local_addr,
        Duration::from_secs(STARTUP_WAIT_TIMEOUT_SECS),
        Duration::from_millis(STARTUP_POLL_INTERVAL_MS),
    )
    .await?;

    Ok(TestServer {
        addr: local_addr,
        _server_handle: server_handle,
        shutdown_tx: Some(shutdown_tx),
    })
}

/// Spawns `app` as a mock backend; every request it receives lands in the
/// returned [`CallLog`].
pub async fn spawn_backend(app: Router) -> Result<(TestServer, CallLog), ServerStartupError> {
    let log = CallLog::default();
    let recorder = log.clone();
    let app = app.layer(middleware::from_fn(move |req: Request, next: Next| {
        record(recorder.clone(), req, next)
    }));

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let server = serve(listener, app).await?;
    Ok((server, log))
}

/// Backends pointing at the given ports on the loopback interface.
pub fn loopback_backends(ai_port: u16, ui_port: u16) -> Result<Backends, ServerStartupError> {
    let ai = BackendTarget::new("ai_service", "127.0.0.1", ai_port)
        .map_err(|e| ServerStartupError::StartupFailed(e.to_string()))?;
    let ui = BackendTarget::new("web_ui", "127.0.0.1", ui_port)
        .map_err(|e| ServerStartupError::StartupFailed(e.to_string()))?;
    Ok(Backends { ai, ui })
}

/// Spawns the gateway in front of `backends`.
pub async fn spawn_gateway(
    backends: Backends,
    config: TestServerConfig,
) -> Result<TestServer, ServerStartupError> {
    let state = GatewayState::new(backends, &config.to_config())
        .map_err(|e| ServerStartupError::StartupFailed(e.to_string()))?;
    spawn_gateway_with_state(state, config.port).await
}

/// Spawns the gateway from a prepared state (e.g. one built from the environment).
pub async fn spawn_gateway_with_state(
    state: GatewayState,
    port: u16,
) -> Result<TestServer, ServerStartupError> {
    let port = if port == 0 {
        find_available_port().await?
    } else {
        port
    };

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = TcpListener::bind(addr).await?;
    serve(listener, create_router(state)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_find_available_port() {
        let port = find_available_port()
            .await
            .expect("Should find available port");
        assert!(port > 0);
    }

    #[tokio::test]
    async fn test_server_config_defaults() {
        let config = TestServerConfig::default();
        assert_eq!(config.port, 0);
        assert_eq!(config.upstream_timeout, Duration::from_secs(300));
    }
}
