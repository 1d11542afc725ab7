use std::{net::SocketAddr, sync::Arc};

use hyper::{
    service::{make_service_fn, service_fn},
    Body, Request, Response, Server, StatusCode,
};
use prometheus::{Encoder, TextEncoder};
use tracing::error;

use crate::rpc::views::REGISTRY as rpc_registry;

use super::exporter_metrics::{EXPORTER_HTTP_REQUESTS, EXPORTER_REGISTRY};

/// Encodes the gRPC views and the exporter's own metrics in Prometheus text
/// format. Returns the content type and the encoded payload.
pub fn render_metrics() -> (String, Vec<u8>) {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();

    let mut metric_families = rpc_registry.gather();
    metric_families.extend(EXPORTER_REGISTRY.gather());

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!("Error encoding metrics: {}", e);
    }
    (encoder.format_type().to_string(), buffer)
}

///
/// Serves the registered gRPC views and exporter metrics with Prometheus
/// format.
///
pub async fn serve_metrics(prometheus_ip: String, prometheus_port: String, prometheus_path: String) {
    let addr: SocketAddr = format!("{}:{}", prometheus_ip, prometheus_port)
        .parse()
        .expect("Unable to parse IP and port");

    let metrics_path = Arc::new(prometheus_path);

    let make_svc = make_service_fn(move |_| {
        let metrics_path = metrics_path.clone();
        async move {
            Ok::<_, hyper::Error>(service_fn(move |req: Request<Body>| {
                let metrics_path = metrics_path.clone();
                async move {
                    if req.uri().path() != metrics_path.as_str() {
                        EXPORTER_HTTP_REQUESTS
                            .with_label_values(&[req.uri().path(), "404"])
                            .inc();
                        return Ok::<_, hyper::Error>(
                            Response::builder()
                                .status(StatusCode::NOT_FOUND)
                                .body(Body::empty())
                                .unwrap(),
                        );
                    }

                    let (format_type, buffer) = render_metrics();
                    EXPORTER_HTTP_REQUESTS
                        .with_label_values(&[metrics_path.as_str(), "200"])
                        .inc();
                    Ok::<_, hyper::Error>(
                        Response::builder()
                            .status(200)
                            .header("Content-Type", format_type)
                            .body(Body::from(buffer))
                            .unwrap(),
                    )
                }
            }))
        }
    });

    let server = Server::bind(&addr).serve(make_svc);
    if let Err(e) = server.await {
        error!("Error initializing metrics server: {:?}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metrics::exporter_metrics::{
        register_app_version_info, register_exporter_metrics,
    };
    use crate::rpc::record::{record_client_rpc, ClientRpcMeasurement};
    use crate::rpc::views::register_rpc_views;

    #[test]
    fn test_render_contains_registered_views() {
        register_rpc_views();
        register_exporter_metrics();
        register_app_version_info("testnet");
        record_client_rpc(&ClientRpcMeasurement {
            method: "test.Echo/Render",
            status: "OK",
            roundtrip_latency_ms: 1.0,
            server_elapsed_time_ms: 1.0,
            request_bytes: 1.0,
            response_bytes: 1.0,
            uncompressed_request_bytes: 1.0,
            uncompressed_response_bytes: 1.0,
            request_count: 1,
            response_count: 1,
        });

        let (format_type, buffer) = render_metrics();
        let body = String::from_utf8(buffer).unwrap();

        assert!(format_type.starts_with("text/plain"));
        assert!(body.contains("grpc_io_client_roundtrip_latency"));
        assert!(body.contains("grpc_views_exporter_build_info"));
    }
}
