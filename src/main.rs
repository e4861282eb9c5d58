use std::net::SocketAddr;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod api;
mod config;
mod data_source;
mod error;
mod monitoring;
mod processing;
mod protocol;
mod service;

use config::Cli;
use data_source::serial::SerialDataSource;
use monitoring::MetricsClient;
use processing::baseline::{BaselineStore, JsonFileStore, MemoryStore};
use service::data_loop::DataProcessingLoop;
use service::state::create_shared_state;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing with colors and stderr output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(true)
                .with_writer(std::io::stderr),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "air_quality_service=info".into()),
        )
        .init();

    let cli = Cli::parse();

    // Handle --list-ports
    if cli.list_ports {
        list_serial_ports();
        return Ok(());
    }

    // Require a mode if not listing ports
    let Some(data_source_config) = cli.to_data_source_config() else {
        eprintln!("Error: Please specify a mode (serial or playback)");
        eprintln!("Use --help for usage information");
        std::process::exit(1);
    };

    let baseline_config = cli.to_baseline_config();
    baseline_config.validate()?;

    tracing::info!(
        "Starting air quality service on {}:{}",
        cli.host,
        cli.listen
    );

    // Create baseline store
    let store: Box<dyn BaselineStore> = if cli.no_persist {
        Box::new(MemoryStore::new())
    } else {
        Box::new(JsonFileStore::new(cli.baseline_file.clone()))
    };
    tracing::info!("Baseline persistence: {}", store.describe());

    // Create estimator
    let estimator = cli.to_estimator_method().create(baseline_config, store);
    tracing::info!("Using {} estimator", estimator.name());

    // Create shared state
    let state = create_shared_state(cli.device_id.clone(), cli.metrics_url.clone(), estimator);

    let metrics_client = match &cli.metrics_url {
        Some(url) => {
            tracing::info!("Pushing metrics to {}", url);
            Some(MetricsClient::new()?)
        }
        None => None,
    };

    // Create data source
    let mut data_source = data_source_config.create_source();
    tracing::info!("Reading samples from {}", data_source.name());

    // Start data source and get sample receiver
    let sample_rx = data_source.start().await?;

    // Create and spawn data processing loop
    let processing_loop = DataProcessingLoop::new(state.clone(), metrics_client);

    let processing_handle = tokio::spawn(async move {
        if let Err(e) = processing_loop.run(sample_rx).await {
            tracing::error!("Data processing loop error: {}", e);
        }
    });

    // Create and run HTTP server
    let router = api::create_router(state);
    let addr: SocketAddr = format!("{}:{}", cli.host, cli.listen).parse()?;

    tracing::info!("HTTP server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Run server with graceful shutdown
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Cleanup
    tracing::info!("Shutting down...");
    data_source.stop().await?;
    processing_handle.abort();

    Ok(())
}

/// List available serial ports
fn list_serial_ports() {
    match SerialDataSource::list_available_ports() {
        Ok(ports) => {
            if ports.is_empty() {
                println!("No serial ports found");
            } else {
                println!("Available serial ports:");
                for port in ports {
                    let port_type = match port.port_type {
                        serialport::SerialPortType::UsbPort(info) => {
                            format!(
                                "USB - {}",
                                info.product.unwrap_or_else(|| "Unknown".to_string())
                            )
                        }
                        serialport::SerialPortType::BluetoothPort => "Bluetooth".to_string(),
                        serialport::SerialPortType::PciPort => "PCI".to_string(),
                        serialport::SerialPortType::Unknown => "Unknown".to_string(),
                    };
                    println!("  {} - {}", port.port_name, port_type);
                }
            }
        }
        Err(e) => {
            eprintln!("Error listing serial ports: {}", e);
        }
    }
}

/// Wait for shutdown signal (Ctrl+C)
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Received shutdown signal");
}
