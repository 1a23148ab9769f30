//! Structured logging and tracing configuration.
//!
//! Provides setup for observability using the `tracing` crate with:
//! - Structured logging with JSON output option
//! - Request tracing middleware integration
//! - Configurable log levels

use tracing_subscriber::{
    filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Registry,
};

/// Initialize tracing with the given level and output format.
///
/// `RUST_LOG`, when set, takes precedence over `level`.
///
/// # Panics
///
/// Panics if tracing subscriber has already been initialized in this process.
pub fn init_tracing(level: &str, json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        let json_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);

        Registry::default().with(env_filter).with(json_layer).init();
    } else {
        let fmt_layer = fmt::layer().with_target(true).with_thread_ids(true);

        Registry::default().with(env_filter).with(fmt_layer).init();
    }

    tracing::debug!(level, json, "Tracing initialized");
}

/// Span helpers shared by handlers and background tasks.
pub mod spans {
    use tracing::{info_span, Span};

    /// Create a new request span with common fields.
    #[must_use]
    pub fn request_span(method: &str, uri: &str, request_id: &str) -> Span {
        info_span!(
            "request",
            method = %method,
            uri = %uri,
            request_id = %request_id,
        )
    }

    /// Span for one rescan attempt, tagged with what triggered it.
    #[must_use]
    pub fn scan_span(trigger: &str) -> Span {
        info_span!("scan", trigger = %trigger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_creation() {
        let span = spans::request_span("POST", "/chat", "req-123");
        let _guard = span.enter();
    }

    #[test]
    fn test_scan_span() {
        let span = spans::scan_span("timer");
        let _guard = span.enter();
    }
}
