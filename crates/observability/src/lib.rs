//! Observability infrastructure for buswatch
//!
//! This crate provides:
//! - Structured logging via tracing
//! - Prometheus metrics
//! - HTTP request metric helpers
//!
//! # Quick Start
//!
//! ```ignore
//! use observability::{init_logging, LogFormat};
//!
//! init_logging("buswatch", LogFormat::Pretty)?;
//!
//! // Optional Prometheus exporter
//! observability::metrics::init_metrics(9100)?;
//! ```

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LogFormat};
pub use metrics::{init_metrics, ServerMetrics};
