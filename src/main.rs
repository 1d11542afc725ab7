use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use grpc_views_exporter::core::config::AppConfig;
use grpc_views_exporter::core::metrics::exporter_metrics::{
    register_app_version_info, register_exporter_metrics, start_heartbeat,
};
use grpc_views_exporter::core::metrics::serve_metrics::serve_metrics;
use grpc_views_exporter::rpc::views::register_rpc_views;

#[tokio::main]
async fn main() {
    // Initialize tracing subscriber for logging (no spans, just log messages)
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .with_ansi(true)
        .with_span_events(tracing_subscriber::fmt::format::FmtSpan::NONE)
        .init();

    // Load environment variables from .env file if it exists
    if let Err(_) = dotenv::dotenv() {
        // It's okay if .env doesn't exist
    }

    println!("{}", banner());

    // Parse --config flag
    let mut args = std::env::args().skip(1);
    let mut config_path = "config.yaml".to_string();
    while let Some(arg) = args.next() {
        if arg == "--config" {
            if let Some(path) = args.next() {
                config_path = path;
            } else {
                error!("--config flag provided but no file specified");
                std::process::exit(1);
            }
        }
    }

    let config = match AppConfig::load(&config_path) {
        Ok(cfg) => cfg,
        Err(err) => {
            error!("Startup failed:");
            for (i, cause) in anyhow::Error::new(err).chain().enumerate() {
                error!("  {}: {}", i, cause);
            }
            std::process::exit(1);
        }
    };
    info!("[main] Config loaded successfully");

    // Register the predefined gRPC view set with the registry
    info!("[main] Registering gRPC views...");
    register_rpc_views();

    // Exporter internal metrics
    info!("[main] Registering exporter metrics...");
    register_exporter_metrics();
    register_app_version_info(&config.general.network);

    let token = CancellationToken::new();
    start_heartbeat(token.clone());

    let prometheus_ip = config.general.metrics.address.clone();
    let prometheus_port = config.general.metrics.port.to_string();
    let prometheus_path = config.general.metrics.path.clone();

    info!(
        "[main] Serving metrics on {}:{}{}",
        prometheus_ip, prometheus_port, prometheus_path
    );
    tokio::select! {
        _ = serve_metrics(
            prometheus_ip,
            prometheus_port,
            prometheus_path,
        ) => {
            error!("Hyper server exited.");
        },
        _ = listen_for_shutdown(token.clone()) => {
            info!("Gracefully shut down server.")
        }
    }
}

pub async fn listen_for_shutdown(cancel_token: CancellationToken) {
    let sigint = signal::ctrl_c();
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate()).unwrap();

    tokio::select! {
        _ = sigint => info!("Received SIGINT"),
        _ = sigterm.recv() => info!("Received SIGTERM"),
    }

    cancel_token.cancel();
}

fn banner() -> &'static str {
    r#"
  ____ ____  ____   ____  __     _____ _______        ______
 / ___|  _ \|  _ \ / ___| \ \   / /_ _| ____\ \      / / ___|
| |  _| |_) | |_) | |      \ \ / / | ||  _|  \ \ /\ / /\___ \
| |_| |  _ <|  __/| |___    \ V /  | || |___  \ V  V /  ___) |
 \____|_| \_\_|    \____|    \_/  |___|_____|  \_/\_/  |____/

                    gRPC views exporter
    "#
}
