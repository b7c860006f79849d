//! Route sync metrics
//!
//! Duration and outcome of every synchronizer mutation, per operation.

use lazy_static::lazy_static;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

lazy_static! {
    /// Controller metrics registry
    pub static ref CONTROLLER_METRICS_REGISTRY: Registry = Registry::new();

    /// Route sync duration
    static ref ROUTE_SYNC_DURATION: HistogramVec = {
        let opts = HistogramOpts::new(
            "route_sync_duration_seconds",
            "Route sync duration in seconds (cluster and record store)",
        );
        let histogram = HistogramVec::new(opts, &["operation"])
            .expect("Failed to create histogram");
        CONTROLLER_METRICS_REGISTRY
            .register(Box::new(histogram.clone()))
            .expect("Failed to register histogram");
        histogram
    };

    /// Route syncs total
    static ref ROUTE_SYNC_TOTAL: IntCounterVec = {
        let opts = Opts::new(
            "route_sync_total",
            "Total number of route sync operations",
        );
        let counter = IntCounterVec::new(opts, &["operation", "result"])
            .expect("Failed to create counter");
        CONTROLLER_METRICS_REGISTRY
            .register(Box::new(counter.clone()))
            .expect("Failed to register counter");
        counter
    };
}

/// Record one route sync operation
///
/// `operation` is add, update or delete; `result` is "created", "exists",
/// "success" or an error kind.
pub fn record_route_sync(operation: &str, duration_secs: f64, result: &str) {
    ROUTE_SYNC_DURATION
        .with_label_values(&[operation])
        .observe(duration_secs);

    ROUTE_SYNC_TOTAL
        .with_label_values(&[operation, result])
        .inc();
}

/// Gather controller metrics in Prometheus text format
pub fn gather_controller_metrics() -> Result<String, String> {
    // Force registration so the families show up before the first sync
    let _ = &*ROUTE_SYNC_DURATION;
    let _ = &*ROUTE_SYNC_TOTAL;

    let mut buffer = vec![];
    let encoder = TextEncoder::new();
    let metric_families = CONTROLLER_METRICS_REGISTRY.gather();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| format!("Failed to encode metrics: {}", e))?;

    String::from_utf8(buffer).map_err(|e| format!("Failed to convert to UTF-8: {}", e))
}
