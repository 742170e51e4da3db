//! Glow gateway library crate (used by the server binary and integration tests).
//!
//! A single HTTP front door for the KnowledgeGlow services:
//!
//! ```text
//!                 ┌──────────────────────────────┐
//!   client ──────▶│ CORS layer (OPTIONS → 200)   │
//!                 │ route table                  │
//!                 └──┬─────────┬─────────┬───────┘
//!          /api/*    │ /process│ /health │ everything else
//!                    ▼         ▼         ▼         ▼
//!              [AI service] [AI /api/process] [probe both] [web UI]
//! ```
//!
//! - [`Config`], [`ConfigError`] - environment configuration and backend resolution
//! - [`gateway::create_router`], [`GatewayState`] - the Axum application
//! - [`RouteTable`] - ordered routing rules

pub mod config;
pub mod gateway;

pub use config::{BackendTarget, Backends, Config, ConfigError};
pub use gateway::{
    GatewayError, GatewayState, HealthReport, Route, RouteTable, ServiceStatus, create_router,
};
