//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): session requests by outcome
//! - `relay_upstream_duration_seconds` (histogram): upstream call latency
//! - `relay_origin_rejections_total` (counter): requests refused by CORS
//!
//! Updates go through the `metrics` facade and are no-ops until a recorder
//! is installed with [`init_metrics`].

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Terminal state of a session request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    MethodNotAllowed,
    ClientError,
    UpstreamError,
}

impl Outcome {
    fn as_str(self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::MethodNotAllowed => "method_not_allowed",
            Outcome::ClientError => "client_error",
            Outcome::UpstreamError => "upstream_error",
        }
    }
}

/// Install the Prometheus recorder and scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(outcome: Outcome) {
    metrics::counter!("relay_requests_total", "outcome" => outcome.as_str()).increment(1);
}

pub fn record_upstream_call(start: Instant, ok: bool) {
    metrics::histogram!(
        "relay_upstream_duration_seconds",
        "result" => if ok { "ok" } else { "error" }
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_origin_rejected() {
    metrics::counter!("relay_origin_rejections_total").increment(1);
}
