//! Prometheus metrics definitions.

use once_cell::sync::Lazy;
use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter_vec, register_int_gauge,
    Encoder, Histogram, HistogramVec, IntCounterVec, IntGauge, TextEncoder,
};

/// Scans by outcome (busy, skipped, unchanged, rebuilt, loaded, error).
pub static SCANS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "docqa_scans_total",
        "Total number of scan attempts by outcome",
        &["outcome"]
    )
    .unwrap()
});

/// Time spent building or loading an index.
pub static REBUILD_DURATION: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "docqa_rebuild_duration_seconds",
        "Index rebuild duration in seconds",
        vec![0.1, 0.5, 1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0]
    )
    .unwrap()
});

/// Files with a recorded digest.
pub static INDEXED_FILES: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("docqa_indexed_files", "Number of documents with a recorded digest")
        .unwrap()
});

/// Windows in the live index.
pub static INDEXED_WINDOWS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("docqa_indexed_windows", "Number of text windows in the live index")
        .unwrap()
});

/// Chat requests by response status.
pub static CHAT_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "docqa_chat_requests_total",
        "Total number of chat requests",
        &["status"]
    )
    .unwrap()
});

/// Chat latency histogram.
pub static CHAT_LATENCY: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "docqa_chat_duration_seconds",
        "Chat request latency in seconds",
        &["status"],
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .unwrap()
});

/// Initialize all metrics (call once at startup).
pub fn init_metrics() {
    // Access lazy statics to register them
    let _ = &*SCANS_TOTAL;
    let _ = &*REBUILD_DURATION;
    let _ = &*INDEXED_FILES;
    let _ = &*INDEXED_WINDOWS;
    let _ = &*CHAT_REQUESTS;
    let _ = &*CHAT_LATENCY;

    tracing::debug!("Prometheus metrics initialized");
}

/// Render the default registry in the Prometheus text format.
#[must_use]
pub fn render() -> String {
    let mut buffer = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&prometheus::gather(), &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_init() {
        init_metrics();

        INDEXED_WINDOWS.set(100);
        assert_eq!(INDEXED_WINDOWS.get(), 100);

        SCANS_TOTAL.with_label_values(&["skipped"]).inc();
        assert!(SCANS_TOTAL.with_label_values(&["skipped"]).get() >= 1);
    }

    #[test]
    fn test_render_contains_metrics() {
        init_metrics();
        CHAT_REQUESTS.with_label_values(&["200"]).inc();

        let text = render();
        assert!(text.contains("docqa_chat_requests_total"));
    }
}
