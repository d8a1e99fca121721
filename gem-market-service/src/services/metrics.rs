//! Metrics collection and Prometheus export.

use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

/// Global handle to the Prometheus recorder.
pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the metrics recorder.
///
/// Must be called once at startup before any metrics are recorded.
/// Panics if called more than once.
pub fn init_metrics() {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    if METRICS_HANDLE.set(handle).is_err() {
        panic!("failed to set metrics handle: already initialized");
    }
}

/// Current metrics in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

pub fn record_ticket_created(inquiry_type: &str) {
    counter!("gem_market_tickets_created_total", "inquiry_type" => inquiry_type.to_string())
        .increment(1);
}

pub fn record_payment_event(kind: &'static str, status: &str) {
    counter!(
        "gem_market_payments_total",
        "kind" => kind,
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_otp_verification(outcome: &'static str) {
    counter!("gem_market_otp_verifications_total", "outcome" => outcome).increment(1);
}

pub fn record_bid(accepted: bool) {
    let result = if accepted { "accepted" } else { "rejected" };
    counter!("gem_market_bids_total", "result" => result).increment(1);
}
