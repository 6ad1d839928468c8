//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define routing metrics
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `subdomain_dispatch_total` (counter): requests dispatched, by table
//! - `subdomain_misconfigured_host_total` (counter): hosts outside the base domain
//! - `subdomain_reverse_failures_total` (counter): failed reverse lookups, by kind
//! - `subdomain_append_slash_redirects_total` (counter): trailing-slash redirects, by table
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Labels are table ids and error kinds only (bounded cardinality)

use std::net::SocketAddr;

use metrics::counter;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_dispatch(table: &str) {
    counter!("subdomain_dispatch_total", "table" => table.to_string()).increment(1);
}

pub fn record_misconfigured_host() {
    counter!("subdomain_misconfigured_host_total").increment(1);
}

pub fn record_reverse_failure(kind: &'static str) {
    counter!("subdomain_reverse_failures_total", "kind" => kind).increment(1);
}

pub fn record_append_slash_redirect(table: &str) {
    counter!("subdomain_append_slash_redirects_total", "table" => table.to_string()).increment(1);
}
