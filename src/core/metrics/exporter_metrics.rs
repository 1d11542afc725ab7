use std::time::Duration;

use chrono::Utc;
use lazy_static::lazy_static;
use prometheus::{CounterVec, IntGauge, IntGaugeVec, Opts, Registry};
use tokio_util::sync::CancellationToken;
use tracing::warn;

lazy_static! {
    pub static ref EXPORTER_REGISTRY: Registry = Registry::new();
    pub static ref EXPORTER_HTTP_REQUESTS: CounterVec = CounterVec::new(
        Opts::new(
            "grpc_views_exporter_http_requests",
            "grpc views exporter http requests"
        ),
        &["path", "status_code"]
    )
    .unwrap();
    pub static ref EXPORTER_BUILD_INFO: IntGaugeVec = IntGaugeVec::new(
        Opts::new(
            "grpc_views_exporter_build_info",
            "grpc views exporter build information"
        ),
        &["version", "commit", "build_date", "network"]
    )
    .unwrap();
    pub static ref EXPORTER_HEARTBEAT: IntGauge = IntGauge::new(
        "grpc_views_exporter_heartbeat_timestamp",
        "Unix timestamp of the last exporter heartbeat"
    )
    .unwrap();
}

pub fn register_exporter_metrics() {
    EXPORTER_REGISTRY
        .register(Box::new(EXPORTER_HTTP_REQUESTS.clone()))
        .unwrap_or_else(|e| warn!("Error registering EXPORTER_HTTP_REQUESTS: {}", e));
    EXPORTER_REGISTRY
        .register(Box::new(EXPORTER_BUILD_INFO.clone()))
        .unwrap_or_else(|e| warn!("Error registering EXPORTER_BUILD_INFO: {}", e));
    EXPORTER_REGISTRY
        .register(Box::new(EXPORTER_HEARTBEAT.clone()))
        .unwrap_or_else(|e| warn!("Error registering EXPORTER_HEARTBEAT: {}", e));
}

/// Exposes package version, git commit and build date as labels on a
/// constant gauge. Commit and date come from build.rs.
pub fn register_app_version_info(network: &str) {
    EXPORTER_BUILD_INFO
        .with_label_values(&[
            env!("CARGO_PKG_VERSION"),
            env!("GIT_COMMIT_HASH"),
            env!("BUILD_DATE"),
            network,
        ])
        .set(1);
}

/// Spawns a task that refreshes the heartbeat gauge until the token is
/// cancelled.
pub fn start_heartbeat(token: CancellationToken) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(30));
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    EXPORTER_HEARTBEAT.set(Utc::now().timestamp());
                }
                _ = token.cancelled() => break,
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exporter_metrics_register_once() {
        register_exporter_metrics();
        register_exporter_metrics();
        register_app_version_info("testnet");

        let families = EXPORTER_REGISTRY.gather();
        let build_info = families
            .iter()
            .find(|f| f.get_name() == "grpc_views_exporter_build_info")
            .expect("build info gauge missing");
        let labels = build_info.get_metric()[0].get_label();
        assert!(labels
            .iter()
            .any(|l| l.get_name() == "version" && l.get_value() == env!("CARGO_PKG_VERSION")));
    }
}
