//! Configuration error types.

use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
///
/// All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Bind address string could not be parsed.
    #[error("failed to parse bind address '{value}': {source}")]
    InvalidBindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },

    /// A backend base URL could not be built from host and port.
    #[error("invalid {backend} URL '{url}': {source}")]
    InvalidBackendUrl {
        backend: &'static str,
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The upstream HTTP client could not be constructed.
    #[error("failed to build upstream HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}
