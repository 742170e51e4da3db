//! Environment-backed configuration.
//!
//! Every setting has a default. Ports follow the keys shared with the rest of
//! the deployment (`GO_PORT`, `PYTHON_PORT`, `WEBUI_PORT`) with `GLOW_*`
//! equivalents as fallbacks; the remaining settings use `GLOW_*` keys.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use tracing::warn;
use url::Url;

/// Default listen port of the gateway.
pub const DEFAULT_PORT: u16 = 50575;

/// Default port of the AI processing service.
pub const DEFAULT_AI_SERVICE_PORT: u16 = 59147;

/// Default port of the web UI service.
pub const DEFAULT_WEBUI_PORT: u16 = 8000;

/// Default host both backends are reached on.
pub const DEFAULT_BACKEND_HOST: &str = "localhost";

/// Gateway configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `GLOW_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listen port. Default: `50575`.
    pub port: u16,

    /// IP address to bind to. Default: `0.0.0.0`.
    pub bind_addr: IpAddr,

    /// Host name or address of both backends. Default: `localhost`.
    pub backend_host: String,

    /// AI service port. Default: `59147`.
    pub ai_service_port: u16,

    /// Web UI port. Default: `8000`.
    pub webui_port: u16,

    /// Deadline for passthrough and processing calls. Default: 300s.
    pub upstream_timeout: Duration,

    /// Deadline for each backend health probe. Default: 5s.
    pub health_probe_timeout: Duration,

    /// Largest accepted body on the processing endpoint. Default: 10 MiB.
    pub max_process_body_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            backend_host: DEFAULT_BACKEND_HOST.to_string(),
            ai_service_port: DEFAULT_AI_SERVICE_PORT,
            webui_port: DEFAULT_WEBUI_PORT,
            upstream_timeout: Duration::from_secs(300),
            health_probe_timeout: Duration::from_secs(5),
            max_process_body_bytes: 10 * 1024 * 1024,
        }
    }
}

/// A named backend and the base URL every forwarded request is joined onto.
///
/// Resolved once at startup and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendTarget {
    name: &'static str,
    base_url: Url,
}

impl BackendTarget {
    /// Builds `http://{host}:{port}` for the named backend.
    pub fn new(name: &'static str, host: &str, port: u16) -> Result<Self, ConfigError> {
        let raw = format!("http://{}:{}", host, port);
        let base_url = Url::parse(&raw).map_err(|e| ConfigError::InvalidBackendUrl {
            backend: name,
            url: raw,
            source: e,
        })?;

        Ok(Self { name, base_url })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the absolute URL for `path_and_query` on this backend.
    ///
    /// The path is appended verbatim; it is not resolved relative to the base.
    pub fn url_for(&self, path_and_query: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        if path_and_query.starts_with('/') {
            format!("{}{}", base, path_and_query)
        } else {
            format!("{}/{}", base, path_and_query)
        }
    }
}

/// The two backends the gateway fronts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backends {
    pub ai: BackendTarget,
    pub ui: BackendTarget,
}

impl Config {
    // Port keys are tried in order; the shared deployment keys come first so
    // the gateway and the backends agree on the same environment.
    const ENV_PORT: &'static [&'static str] = &["GO_PORT", "GLOW_PORT"];
    const ENV_AI_SERVICE_PORT: &'static [&'static str] =
        &["PYTHON_PORT", "AI_SERVICE_PORT", "GLOW_AI_SERVICE_PORT"];
    const ENV_WEBUI_PORT: &'static [&'static str] = &["WEBUI_PORT", "GLOW_WEBUI_PORT"];
    const ENV_BIND_ADDR: &'static str = "GLOW_BIND_ADDR";
    const ENV_BACKEND_HOST: &'static str = "GLOW_BACKEND_HOST";
    const ENV_UPSTREAM_TIMEOUT_SECS: &'static str = "GLOW_UPSTREAM_TIMEOUT_SECS";
    const ENV_HEALTH_PROBE_TIMEOUT_SECS: &'static str = "GLOW_HEALTH_PROBE_TIMEOUT_SECS";
    const ENV_MAX_PROCESS_BODY_BYTES: &'static str = "GLOW_MAX_PROCESS_BODY_BYTES";

    /// Loads configuration from environment variables (falling back to defaults).
    ///
    /// Numeric settings that are missing, unparsable or zero take their default.
    /// Only a malformed bind address is an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = Self::parse_port_from_env(Self::ENV_PORT, defaults.port);
        let bind_addr = Self::parse_bind_addr_from_env(defaults.bind_addr)?;
        let backend_host =
            Self::parse_string_from_env(Self::ENV_BACKEND_HOST, defaults.backend_host);
        let ai_service_port =
            Self::parse_port_from_env(Self::ENV_AI_SERVICE_PORT, defaults.ai_service_port);
        let webui_port = Self::parse_port_from_env(Self::ENV_WEBUI_PORT, defaults.webui_port);
        let upstream_timeout =
            Self::parse_secs_from_env(Self::ENV_UPSTREAM_TIMEOUT_SECS, defaults.upstream_timeout);
        let health_probe_timeout = Self::parse_secs_from_env(
            Self::ENV_HEALTH_PROBE_TIMEOUT_SECS,
            defaults.health_probe_timeout,
        );
        let max_process_body_bytes = Self::parse_usize_from_env(
            Self::ENV_MAX_PROCESS_BODY_BYTES,
            defaults.max_process_body_bytes,
        );

        Ok(Self {
            port,
            bind_addr,
            backend_host,
            ai_service_port,
            webui_port,
            upstream_timeout,
            health_probe_timeout,
            max_process_body_bytes,
        })
    }

    /// Checks that both backend URLs can be built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.backends().map(|_| ())
    }

    /// Resolves the AI and UI backend targets.
    pub fn backends(&self) -> Result<Backends, ConfigError> {
        Ok(Backends {
            ai: BackendTarget::new("ai_service", &self.backend_host, self.ai_service_port)?,
            ui: BackendTarget::new("web_ui", &self.backend_host, self.webui_port)?,
        })
    }

    /// Returns `"{bind_addr}:{port}"` (useful for logging/binding).
    pub fn socket_addr(&self) -> String {
        match self.bind_addr {
            IpAddr::V4(addr) => format!("{}:{}", addr, self.port),
            IpAddr::V6(addr) => format!("[{}]:{}", addr, self.port),
        }
    }

    /// First valid port among `keys`; invalid values are skipped with a warning.
    fn parse_port_from_env(keys: &[&str], default: u16) -> u16 {
        for key in keys {
            let Ok(value) = env::var(key) else {
                continue;
            };
            match value.trim().parse::<u16>() {
                Ok(port) if port != 0 => return port,
                _ => warn!(key, value = %value, "Ignoring invalid port"),
            }
        }
        default
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::var(Self::ENV_BIND_ADDR) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            Err(_) => Ok(default),
        }
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(default)
    }

    fn parse_secs_from_env(var_name: &str, default: Duration) -> Duration {
        env::var(var_name)
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(default)
    }

    fn parse_usize_from_env(var_name: &str, default: usize) -> usize {
        env::var(var_name)
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(default)
    }
}
