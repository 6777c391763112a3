//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_publishes_total` (counter): routing decisions by exchange kind
//! - `router_unroutable_total` (counter): decisions with no destination, by kind
//! - `router_route_errors_total` (counter): failed decisions by error
//! - `router_route_duration_seconds` (histogram): decision latency
//! - `router_binding_changes_total` (counter): bind/unbind operations by op
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Labels are low-cardinality (kind, op, error), never exchange or queue names

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::routing::types::{ExchangeKind, RoutingError};

/// Install the Prometheus exporter with an HTTP listener on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics endpoint"),
    }
}

pub fn record_route(kind: ExchangeKind, destinations: usize, start: Instant) {
    let kind = kind.as_str();
    metrics::counter!("router_publishes_total", "kind" => kind).increment(1);
    if destinations == 0 {
        metrics::counter!("router_unroutable_total", "kind" => kind).increment(1);
    }
    metrics::histogram!("router_route_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_route_error(error: &RoutingError) {
    let label = match error {
        RoutingError::UnknownExchange(_) => "unknown_exchange",
        _ => "other",
    };
    metrics::counter!("router_route_errors_total", "error" => label).increment(1);
}

pub fn record_binding_change(op: &'static str) {
    metrics::counter!("router_binding_changes_total", "op" => op).increment(1);
}
