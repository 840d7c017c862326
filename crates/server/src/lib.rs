//! HTTP server infrastructure for buswatch
//!
//! - [`HttpServer`]: axum server with tracing, CORS, timeout and metrics layers
//! - [`Server`] / [`ServerExt`]: lifecycle with cooperative shutdown
//! - [`health`]: liveness and readiness routes
//! - [`port_validator`]: early port checks

pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod middleware;
pub mod port_validator;
pub mod shutdown;
pub mod traits;

pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use health::{health_routes, HealthState, ReadinessCheck};
pub use http::HttpServer;
pub use shutdown::ShutdownController;
pub use traits::{Server, ServerExt};
