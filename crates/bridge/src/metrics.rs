//! Login counters
//!
//! - `bridge_login_started_total` (counter): label `branch`
//! - `bridge_login_completed_total` (counter): label `branch`
//! - `bridge_login_failures_total` (counter): label `kind`
//!
//! Recorded through the `metrics` facade; the binary installs the exporter.

/// `branch` is `"desktop"` or `"standard"`.
pub fn record_login_started(branch: &'static str) {
    metrics::counter!("bridge_login_started_total", "branch" => branch).increment(1);
}

pub fn record_login_completed(branch: &'static str) {
    metrics::counter!("bridge_login_completed_total", "branch" => branch).increment(1);
}

pub fn record_login_failure(kind: &'static str) {
    metrics::counter!("bridge_login_failures_total", "kind" => kind).increment(1);
}
