use crate::rpc::views::{
    GRPC_CLIENT_ERROR_COUNT, GRPC_CLIENT_REQUEST_BYTES, GRPC_CLIENT_REQUEST_COUNT,
    GRPC_CLIENT_RESPONSE_BYTES, GRPC_CLIENT_RESPONSE_COUNT, GRPC_CLIENT_ROUNDTRIP_LATENCY,
    GRPC_CLIENT_SERVER_ELAPSED_TIME, GRPC_CLIENT_UNCOMPRESSED_REQUEST_BYTES,
    GRPC_CLIENT_UNCOMPRESSED_RESPONSE_BYTES, GRPC_SERVER_ERROR_COUNT, GRPC_SERVER_REQUEST_BYTES,
    GRPC_SERVER_REQUEST_COUNT, GRPC_SERVER_RESPONSE_BYTES, GRPC_SERVER_RESPONSE_COUNT,
    GRPC_SERVER_SERVER_ELAPSED_TIME, GRPC_SERVER_SERVER_LATENCY,
    GRPC_SERVER_UNCOMPRESSED_REQUEST_BYTES, GRPC_SERVER_UNCOMPRESSED_RESPONSE_BYTES,
};

/// Canonical status string for a successful RPC.
pub const STATUS_OK: &str = "OK";

/// Measurements taken for one finished client RPC.
#[derive(Debug, Clone)]
pub struct ClientRpcMeasurement<'a> {
    pub method: &'a str,
    pub status: &'a str,
    pub roundtrip_latency_ms: f64,
    pub server_elapsed_time_ms: f64,
    pub request_bytes: f64,
    pub response_bytes: f64,
    pub uncompressed_request_bytes: f64,
    pub uncompressed_response_bytes: f64,
    pub request_count: u64,
    pub response_count: u64,
}

/// Measurements taken for one finished server RPC.
#[derive(Debug, Clone)]
pub struct ServerRpcMeasurement<'a> {
    pub method: &'a str,
    pub status: &'a str,
    pub server_latency_ms: f64,
    pub server_elapsed_time_ms: f64,
    pub request_bytes: f64,
    pub response_bytes: f64,
    pub uncompressed_request_bytes: f64,
    pub uncompressed_response_bytes: f64,
    pub request_count: u64,
    pub response_count: u64,
}

/// Forwards the measurements of a finished client RPC into the client views.
pub fn record_client_rpc(m: &ClientRpcMeasurement) {
    let labels = &[m.method];
    GRPC_CLIENT_ROUNDTRIP_LATENCY
        .with_label_values(labels)
        .observe(m.roundtrip_latency_ms);
    GRPC_CLIENT_SERVER_ELAPSED_TIME
        .with_label_values(labels)
        .observe(m.server_elapsed_time_ms);
    GRPC_CLIENT_REQUEST_BYTES
        .with_label_values(labels)
        .observe(m.request_bytes);
    GRPC_CLIENT_RESPONSE_BYTES
        .with_label_values(labels)
        .observe(m.response_bytes);
    GRPC_CLIENT_UNCOMPRESSED_REQUEST_BYTES
        .with_label_values(labels)
        .observe(m.uncompressed_request_bytes);
    GRPC_CLIENT_UNCOMPRESSED_RESPONSE_BYTES
        .with_label_values(labels)
        .observe(m.uncompressed_response_bytes);
    GRPC_CLIENT_REQUEST_COUNT
        .with_label_values(labels)
        .observe(m.request_count as f64);
    GRPC_CLIENT_RESPONSE_COUNT
        .with_label_values(labels)
        .observe(m.response_count as f64);

    if m.status != STATUS_OK {
        GRPC_CLIENT_ERROR_COUNT
            .with_label_values(&[m.method, m.status])
            .inc();
    }
}

/// Forwards the measurements of a finished server RPC into the server views.
pub fn record_server_rpc(m: &ServerRpcMeasurement) {
    let labels = &[m.method];
    GRPC_SERVER_SERVER_LATENCY
        .with_label_values(labels)
        .observe(m.server_latency_ms);
    GRPC_SERVER_SERVER_ELAPSED_TIME
        .with_label_values(labels)
        .observe(m.server_elapsed_time_ms);
    GRPC_SERVER_REQUEST_BYTES
        .with_label_values(labels)
        .observe(m.request_bytes);
    GRPC_SERVER_RESPONSE_BYTES
        .with_label_values(labels)
        .observe(m.response_bytes);
    GRPC_SERVER_UNCOMPRESSED_REQUEST_BYTES
        .with_label_values(labels)
        .observe(m.uncompressed_request_bytes);
    GRPC_SERVER_UNCOMPRESSED_RESPONSE_BYTES
        .with_label_values(labels)
        .observe(m.uncompressed_response_bytes);
    GRPC_SERVER_REQUEST_COUNT
        .with_label_values(labels)
        .observe(m.request_count as f64);
    GRPC_SERVER_RESPONSE_COUNT
        .with_label_values(labels)
        .observe(m.response_count as f64);

    if m.status != STATUS_OK {
        GRPC_SERVER_ERROR_COUNT
            .with_label_values(&[m.method, m.status])
            .inc();
    }
}
