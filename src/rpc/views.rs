use lazy_static::lazy_static;
use prometheus::core::Collector;
use prometheus::{CounterVec, HistogramOpts, HistogramVec, Opts, Registry};
use tracing::warn;

/// Bucket boundaries for the latency and elapsed-time views, in milliseconds.
pub const MILLIS_BUCKETS: &[f64] = &[
    0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 8.0, 10.0, 13.0, 16.0, 20.0, 25.0, 30.0, 40.0, 50.0, 65.0,
    80.0, 100.0, 130.0, 160.0, 200.0, 250.0, 300.0, 400.0, 500.0, 650.0, 800.0, 1000.0, 2000.0,
    5000.0, 10000.0, 20000.0, 50000.0, 100000.0,
];

/// Bucket boundaries for the payload size views, in bytes.
pub const BYTES_BUCKETS: &[f64] = &[
    0.0,
    1024.0,
    2048.0,
    4096.0,
    16384.0,
    65536.0,
    262144.0,
    1048576.0,
    4194304.0,
    16777216.0,
    67108864.0,
    268435456.0,
    1073741824.0,
    4294967296.0,
];

/// Bucket boundaries for the per-RPC message count views.
pub const COUNT_BUCKETS: &[f64] = &[
    0.0, 1.0, 2.0, 4.0, 8.0, 16.0, 32.0, 64.0, 128.0, 256.0, 512.0, 1024.0, 2048.0, 4096.0,
    8192.0, 16384.0, 32768.0, 65536.0,
];

fn millis_view(name: &str, help: &str, label: &str) -> HistogramVec {
    HistogramVec::new(
        HistogramOpts::new(name, help).buckets(MILLIS_BUCKETS.to_vec()),
        &[label],
    )
    .unwrap()
}

fn bytes_view(name: &str, help: &str, label: &str) -> HistogramVec {
    HistogramVec::new(
        HistogramOpts::new(name, help).buckets(BYTES_BUCKETS.to_vec()),
        &[label],
    )
    .unwrap()
}

fn count_view(name: &str, help: &str, label: &str) -> HistogramVec {
    HistogramVec::new(
        HistogramOpts::new(name, help).buckets(COUNT_BUCKETS.to_vec()),
        &[label],
    )
    .unwrap()
}

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // Client side views
    pub static ref GRPC_CLIENT_ERROR_COUNT: CounterVec = CounterVec::new(
        Opts::new("grpc_io_client_error_count", "RPC errors observed on the client"),
        &["grpc_client_method", "grpc_client_status"]
    ).unwrap();

    pub static ref GRPC_CLIENT_ROUNDTRIP_LATENCY: HistogramVec = millis_view(
        "grpc_io_client_roundtrip_latency",
        "End-to-end latency of client RPCs",
        "grpc_client_method",
    );

    pub static ref GRPC_CLIENT_SERVER_ELAPSED_TIME: HistogramVec = millis_view(
        "grpc_io_client_server_elapsed_time",
        "Server elapsed time as seen by the client",
        "grpc_client_method",
    );

    pub static ref GRPC_CLIENT_REQUEST_BYTES: HistogramVec = bytes_view(
        "grpc_io_client_request_bytes",
        "Request payload size of client RPCs",
        "grpc_client_method",
    );

    pub static ref GRPC_CLIENT_RESPONSE_BYTES: HistogramVec = bytes_view(
        "grpc_io_client_response_bytes",
        "Response payload size of client RPCs",
        "grpc_client_method",
    );

    pub static ref GRPC_CLIENT_UNCOMPRESSED_REQUEST_BYTES: HistogramVec = bytes_view(
        "grpc_io_client_uncompressed_request_bytes",
        "Uncompressed request payload size of client RPCs",
        "grpc_client_method",
    );

    pub static ref GRPC_CLIENT_UNCOMPRESSED_RESPONSE_BYTES: HistogramVec = bytes_view(
        "grpc_io_client_uncompressed_response_bytes",
        "Uncompressed response payload size of client RPCs",
        "grpc_client_method",
    );

    pub static ref GRPC_CLIENT_REQUEST_COUNT: HistogramVec = count_view(
        "grpc_io_client_request_count",
        "Number of request messages per client RPC",
        "grpc_client_method",
    );

    pub static ref GRPC_CLIENT_RESPONSE_COUNT: HistogramVec = count_view(
        "grpc_io_client_response_count",
        "Number of response messages per client RPC",
        "grpc_client_method",
    );

    // Server side views
    pub static ref GRPC_SERVER_ERROR_COUNT: CounterVec = CounterVec::new(
        Opts::new("grpc_io_server_error_count", "RPC errors observed on the server"),
        &["grpc_server_method", "grpc_server_status"]
    ).unwrap();

    pub static ref GRPC_SERVER_SERVER_LATENCY: HistogramVec = millis_view(
        "grpc_io_server_server_latency",
        "Latency of server RPCs",
        "grpc_server_method",
    );

    pub static ref GRPC_SERVER_SERVER_ELAPSED_TIME: HistogramVec = millis_view(
        "grpc_io_server_server_elapsed_time",
        "Server elapsed time of server RPCs",
        "grpc_server_method",
    );

    pub static ref GRPC_SERVER_REQUEST_BYTES: HistogramVec = bytes_view(
        "grpc_io_server_request_bytes",
        "Request payload size of server RPCs",
        "grpc_server_method",
    );

    pub static ref GRPC_SERVER_RESPONSE_BYTES: HistogramVec = bytes_view(
        "grpc_io_server_response_bytes",
        "Response payload size of server RPCs",
        "grpc_server_method",
    );

    pub static ref GRPC_SERVER_UNCOMPRESSED_REQUEST_BYTES: HistogramVec = bytes_view(
        "grpc_io_server_uncompressed_request_bytes",
        "Uncompressed request payload size of server RPCs",
        "grpc_server_method",
    );

    pub static ref GRPC_SERVER_UNCOMPRESSED_RESPONSE_BYTES: HistogramVec = bytes_view(
        "grpc_io_server_uncompressed_response_bytes",
        "Uncompressed response payload size of server RPCs",
        "grpc_server_method",
    );

    pub static ref GRPC_SERVER_REQUEST_COUNT: HistogramVec = count_view(
        "grpc_io_server_request_count",
        "Number of request messages per server RPC",
        "grpc_server_method",
    );

    pub static ref GRPC_SERVER_RESPONSE_COUNT: HistogramVec = count_view(
        "grpc_io_server_response_count",
        "Number of response messages per server RPC",
        "grpc_server_method",
    );
}

/// The fixed set of predefined gRPC views, paired with the metric name each
/// one registers under.
pub fn rpc_view_set() -> Vec<(&'static str, Box<dyn Collector>)> {
    vec![
        (
            "grpc_io_client_error_count",
            Box::new(GRPC_CLIENT_ERROR_COUNT.clone()),
        ),
        (
            "grpc_io_client_roundtrip_latency",
            Box::new(GRPC_CLIENT_ROUNDTRIP_LATENCY.clone()),
        ),
        (
            "grpc_io_client_server_elapsed_time",
            Box::new(GRPC_CLIENT_SERVER_ELAPSED_TIME.clone()),
        ),
        (
            "grpc_io_client_request_bytes",
            Box::new(GRPC_CLIENT_REQUEST_BYTES.clone()),
        ),
        (
            "grpc_io_client_response_bytes",
            Box::new(GRPC_CLIENT_RESPONSE_BYTES.clone()),
        ),
        (
            "grpc_io_client_uncompressed_request_bytes",
            Box::new(GRPC_CLIENT_UNCOMPRESSED_REQUEST_BYTES.clone()),
        ),
        (
            "grpc_io_client_uncompressed_response_bytes",
            Box::new(GRPC_CLIENT_UNCOMPRESSED_RESPONSE_BYTES.clone()),
        ),
        (
            "grpc_io_client_request_count",
            Box::new(GRPC_CLIENT_REQUEST_COUNT.clone()),
        ),
        (
            "grpc_io_client_response_count",
            Box::new(GRPC_CLIENT_RESPONSE_COUNT.clone()),
        ),
        (
            "grpc_io_server_error_count",
            Box::new(GRPC_SERVER_ERROR_COUNT.clone()),
        ),
        (
            "grpc_io_server_server_latency",
            Box::new(GRPC_SERVER_SERVER_LATENCY.clone()),
        ),
        (
            "grpc_io_server_server_elapsed_time",
            Box::new(GRPC_SERVER_SERVER_ELAPSED_TIME.clone()),
        ),
        (
            "grpc_io_server_request_bytes",
            Box::new(GRPC_SERVER_REQUEST_BYTES.clone()),
        ),
        (
            "grpc_io_server_response_bytes",
            Box::new(GRPC_SERVER_RESPONSE_BYTES.clone()),
        ),
        (
            "grpc_io_server_uncompressed_request_bytes",
            Box::new(GRPC_SERVER_UNCOMPRESSED_REQUEST_BYTES.clone()),
        ),
        (
            "grpc_io_server_uncompressed_response_bytes",
            Box::new(GRPC_SERVER_UNCOMPRESSED_RESPONSE_BYTES.clone()),
        ),
        (
            "grpc_io_server_request_count",
            Box::new(GRPC_SERVER_REQUEST_COUNT.clone()),
        ),
        (
            "grpc_io_server_response_count",
            Box::new(GRPC_SERVER_RESPONSE_COUNT.clone()),
        ),
    ]
}

/// Registers every predefined gRPC view with the registry. Duplicate
/// registration is reported by the registry and logged, so calling this more
/// than once is harmless.
pub fn register_rpc_views() {
    for (name, view) in rpc_view_set() {
        REGISTRY
            .register(view)
            .unwrap_or_else(|e| warn!("Error registering {}: {}", name, e));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::record::{
        record_client_rpc, record_server_rpc, ClientRpcMeasurement, ServerRpcMeasurement,
    };

    fn touch_all_views(method: &str) {
        record_client_rpc(&ClientRpcMeasurement {
            method,
            status: "UNAVAILABLE",
            roundtrip_latency_ms: 7.5,
            server_elapsed_time_ms: 5.0,
            request_bytes: 128.0,
            response_bytes: 256.0,
            uncompressed_request_bytes: 300.0,
            uncompressed_response_bytes: 600.0,
            request_count: 1,
            response_count: 1,
        });
        record_server_rpc(&ServerRpcMeasurement {
            method,
            status: "UNAVAILABLE",
            server_latency_ms: 5.0,
            server_elapsed_time_ms: 4.0,
            request_bytes: 128.0,
            response_bytes: 256.0,
            uncompressed_request_bytes: 300.0,
            uncompressed_response_bytes: 600.0,
            request_count: 1,
            response_count: 1,
        });
    }

    #[test]
    fn test_all_views_registered() {
        register_rpc_views();
        touch_all_views("test.Echo/AllViews");

        let families = REGISTRY.gather();
        let names: Vec<&str> = families.iter().map(|f| f.get_name()).collect();
        for (name, _) in rpc_view_set() {
            assert!(names.contains(&name), "view {} not registered", name);
        }
    }

    #[test]
    fn test_registration_is_idempotent() {
        register_rpc_views();
        touch_all_views("test.Echo/Idempotent");
        let before = REGISTRY.gather().len();

        register_rpc_views();
        touch_all_views("test.Echo/Idempotent");

        assert_eq!(REGISTRY.gather().len(), before);
    }

    #[test]
    fn test_re_registering_a_view_is_rejected() {
        register_rpc_views();
        let result = REGISTRY.register(Box::new(GRPC_CLIENT_ROUNDTRIP_LATENCY.clone()));
        assert!(result.is_err());
    }

    #[test]
    fn test_latency_view_bucket_boundaries() {
        register_rpc_views();
        touch_all_views("test.Echo/Buckets");

        let families = REGISTRY.gather();
        let family = families
            .iter()
            .find(|f| f.get_name() == "grpc_io_client_roundtrip_latency")
            .expect("latency view missing");
        let histogram = family.get_metric()[0].get_histogram();
        assert_eq!(histogram.get_bucket().len(), MILLIS_BUCKETS.len());
        assert_eq!(histogram.get_bucket()[0].get_upper_bound(), 0.0);
    }

    #[test]
    fn test_bucket_boundaries_are_sorted() {
        for buckets in [MILLIS_BUCKETS, BYTES_BUCKETS, COUNT_BUCKETS] {
            for pair in buckets.windows(2) {
                assert!(pair[0] < pair[1]);
            }
        }
    }
}
