// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Outbound transports - where snapshots go once the barrier releases

mod console;
mod export;
mod http;
mod mqtt;
pub mod udp;

pub use console::ConsoleTransport;
pub use export::FileTransport;
pub use http::HttpTransport;
pub use mqtt::MqttTransport;
pub use udp::UdpTransport;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::Snapshot;
use crate::error::{ConfigError, TransportError};

/// One delivery attempt per call, no internal retry
#[async_trait]
pub trait Transport: Send + Sync {
    /// Short name used in logs and events
    fn name(&self) -> &str;

    async fn send(&self, snapshot: &Snapshot) -> Result<(), TransportError>;
}

/// Transport selection
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Console,
    Http,
    Mqtt,
    Udp,
    File,
}

impl std::str::FromStr for TransportKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "console" => Ok(TransportKind::Console),
            "http" => Ok(TransportKind::Http),
            "mqtt" => Ok(TransportKind::Mqtt),
            "udp" => Ok(TransportKind::Udp),
            "file" => Ok(TransportKind::File),
            other => Err(ConfigError::Transport(format!("unknown transport '{}'", other))),
        }
    }
}

/// Export format for the file transport
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
}

/// Transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub kind: TransportKind,

    /// Collector endpoint for HTTP POST
    pub http_url: String,
    pub http_timeout_ms: u64,

    pub mqtt_broker: String,
    pub mqtt_port: u16,
    pub mqtt_client_id: String,
    pub mqtt_topic_prefix: String,
    pub mqtt_username: Option<String>,
    pub mqtt_password: Option<String>,

    /// Peer address for point-to-point datagrams
    pub udp_target: String,

    pub export_path: String,
    pub export_format: ExportFormat,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            kind: TransportKind::Http,

            http_url: "http://127.0.0.1:5000/data".to_string(),
            http_timeout_ms: 2000,

            mqtt_broker: "localhost".to_string(),
            mqtt_port: 1883,
            mqtt_client_id: "fieldsync".to_string(),
            mqtt_topic_prefix: "fieldsync".to_string(),
            mqtt_username: None,
            mqtt_password: None,

            udp_target: "127.0.0.1:4210".to_string(),

            export_path: "./data".to_string(),
            export_format: ExportFormat::Json,
        }
    }
}

/// Build the configured transport. Errors here are bootstrap failures.
pub async fn build(config: &TransportConfig) -> Result<Arc<dyn Transport>> {
    let transport: Arc<dyn Transport> = match config.kind {
        TransportKind::Console => Arc::new(ConsoleTransport::new()),
        TransportKind::Http => Arc::new(HttpTransport::new(config)?),
        TransportKind::Mqtt => Arc::new(MqttTransport::new(config).await?),
        TransportKind::Udp => Arc::new(UdpTransport::connect(&config.udp_target).await?),
        TransportKind::File => Arc::new(FileTransport::new(&config.export_path, config.export_format)?),
    };
    Ok(transport)
}
