// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! fieldsync - Readiness-Barrier Sensor Aggregator
//!
//! Runs one producer task per configured sensor and a single aggregator
//! that emits a consistent snapshot each time every required sensor has
//! fresh data. With `--listen` it instead receives UDP snapshots.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tokio::sync::broadcast;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use fieldsync::transport::{self, TransportKind};
use fieldsync::{sensors, Config, Engine, VERSION};

/// fieldsync - Readiness-Barrier Sensor Aggregator
#[derive(Parser, Debug)]
#[command(name = "fieldsync")]
#[command(version = VERSION)]
#[command(about = "Aggregate periodic sensor readings into consistent snapshots")]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace-level logging
    #[arg(long)]
    trace: bool,

    /// Transport override (console, http, mqtt, udp, file)
    #[arg(long)]
    transport: Option<TransportKind>,

    /// Collector URL for the http transport
    #[arg(long)]
    http_url: Option<String>,

    /// MQTT broker address
    #[arg(long)]
    mqtt_broker: Option<String>,

    /// Peer address for the udp transport
    #[arg(long)]
    udp_target: Option<String>,

    /// Receive UDP snapshots on this address instead of running the hub
    #[arg(long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // The hub mode reads its default log level from the config file
    let config_path = args.config.clone().unwrap_or_else(Config::default_path);
    let config = match args.listen {
        Some(_) => None,
        None => Some(Config::load_or_create(&config_path)?),
    };

    // Initialize logging
    let log_level = if args.trace {
        Level::TRACE
    } else if args.debug {
        Level::DEBUG
    } else {
        match &config {
            Some(config) => config.log_level()?,
            None => Level::INFO,
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(args.debug)
        .with_line_number(args.debug)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("fieldsync v{}", VERSION);

    let Some(mut config) = config else {
        let bind = args.listen.unwrap_or_default();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let receiver = tokio::spawn(async move { transport::udp::listen(&bind, shutdown_rx).await });
        tokio::signal::ctrl_c().await?;
        let _ = shutdown_tx.send(());
        return receiver.await?;
    };

    // Override with command line args
    if let Some(kind) = args.transport {
        config.transport.kind = kind;
    }
    if let Some(url) = args.http_url {
        config.transport.http_url = url;
    }
    if let Some(broker) = args.mqtt_broker {
        config.transport.mqtt_broker = broker;
    }
    if let Some(target) = args.udp_target {
        config.transport.udp_target = target;
    }

    info!("Configuration loaded from {:?}", config_path);
    run(config).await
}

/// Bootstrap the hub and run until Ctrl+C
async fn run(config: Config) -> Result<()> {
    let sensors = sensors::build_simulated(&config);
    let transport = transport::build(&config.transport).await?;
    info!("Transport: {}", transport.name());

    let mut engine = Engine::new(config)?;
    engine.start(sensors, transport).await?;

    info!("fieldsync running, press Ctrl+C to shutdown");
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received, cleaning up...");
    engine.stop().await;

    let state = engine.state();
    info!(
        "Emitted {} snapshots ({} sent, {} failed, {} stalls)",
        state.stats.cycles, state.stats.sent, state.stats.failed, state.stats.stalls
    );
    for health in state.sensors {
        info!(
            "  {} ({}): {} readings, {} unavailable, {} errors",
            health.sensor_id, health.kind, health.readings_count, health.unavailable_count, health.error_count
        );
    }

    Ok(())
}
