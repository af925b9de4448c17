//! Prometheus metrics exposition
//!
//! Service-level gauges live here; login counters are recorded by the
//! `bridge` crate and the pending-state gauge by `state-store`:
//!
//! - `bridge_enabled` (gauge): 1 when provider discovery succeeded
//! - `bridge_login_started_total`, `bridge_login_completed_total`,
//!   `bridge_login_failures_total` (counters)
//! - `bridge_pending_states` (gauge)

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return a handle for rendering metrics.
pub fn install_recorder() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder")
}

pub fn set_bridge_enabled(enabled: bool) {
    metrics::gauge!("bridge_enabled").set(if enabled { 1.0 } else { 0.0 });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gauge_without_recorder_is_noop() {
        set_bridge_enabled(true);
    }

    #[test]
    fn bridge_enabled_gauge_renders() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let _guard = metrics::set_default_local_recorder(&recorder);

        set_bridge_enabled(false);
        assert!(handle.render().contains("bridge_enabled 0"));
        set_bridge_enabled(true);
        assert!(handle.render().contains("bridge_enabled 1"));
    }
}
