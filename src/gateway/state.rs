use std::sync::Arc;
use std::time::Duration;

use crate::config::{Backends, Config, ConfigError};
use crate::gateway::route::RouteTable;

/// Read-only state shared by every request.
///
/// Built once at startup; cloning is cheap (the HTTP client is pooled and
/// reference counted internally).
#[derive(Clone)]
pub struct GatewayState {
    pub backends: Arc<Backends>,

    pub routes: Arc<RouteTable>,

    pub client: reqwest::Client,

    pub upstream_timeout: Duration,

    pub health_probe_timeout: Duration,

    pub max_process_body_bytes: usize,
}

impl GatewayState {
    /// Resolves backends from `config` and builds the upstream client.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Self::new(config.backends()?, config)
    }

    /// Uses explicit backends with the rest of the settings from `config`.
    pub fn new(backends: Backends, config: &Config) -> Result<Self, ConfigError> {
        // Redirects are relayed to the caller, never followed here.
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .no_proxy()
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self {
            backends: Arc::new(backends),
            routes: Arc::new(RouteTable::default()),
            client,
            upstream_timeout: config.upstream_timeout,
            health_probe_timeout: config.health_probe_timeout,
            max_process_body_bytes: config.max_process_body_bytes,
        })
    }

    /// Replaces the route table.
    pub fn with_routes(mut self, routes: RouteTable) -> Self {
        self.routes = Arc::new(routes);
        self
    }
}
