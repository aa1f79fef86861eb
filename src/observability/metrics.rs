//! Metrics for the item use case.
//!
//! Recording goes through the `metrics` facade and is a no-op until a
//! recorder is installed with [`init_metrics`].

use std::fmt;
use std::net::SocketAddr;
use std::time::Instant;
use tracing::{info, warn};

use crate::error::InventoryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    ItemOperations,
    ItemOperationDuration,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::ItemOperations => "inventory_item_operations_total",
            MetricName::ItemOperationDuration => "inventory_item_operation_duration_seconds",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Install the Prometheus exporter with an HTTP listener on `port`.
pub fn init_metrics(port: u16) {
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => info!("Prometheus exporter listening on http://{}/metrics", addr),
        Err(e) => warn!("Prometheus exporter install failed (possibly already installed): {}", e),
    }
}

/// Records one item operation: a counter labelled with its outcome and a
/// duration histogram.
pub fn record_item_operation<T>(
    operation: &'static str,
    started: Instant,
    result: &Result<T, InventoryError>,
) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(e) => e.kind().as_str(),
    };

    ::metrics::counter!(
        MetricName::ItemOperations.as_str(),
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
    ::metrics::histogram!(
        MetricName::ItemOperationDuration.as_str(),
        "operation" => operation
    )
    .record(started.elapsed().as_secs_f64());
}
