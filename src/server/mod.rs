//! HTTP server.
//!
//! This module provides:
//! - REST API using axum (chat, scan, status)
//! - Health and metrics endpoints
//! - Tracing setup and request spans

mod app;
pub mod metrics;
pub mod observability;
mod rest;

pub use app::{App, ServerConfig};
pub use metrics::init_metrics;
pub use observability::init_tracing;
pub use rest::{create_rest_router, ApiError, ChatRequest, ErrorResponse, HealthResponse};
