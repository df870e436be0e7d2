// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! HTTP transport - POSTs each snapshot as JSON to a collector

use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use super::{Transport, TransportConfig};
use crate::core::Snapshot;
use crate::error::TransportError;

/// JSON body sent to the collector
#[derive(Debug, Serialize)]
struct SnapshotBody<'a> {
    sequence: u64,
    timestamp: String,
    temperature: f32,
    humidity: f32,
    luminosity: i32,
    gas: i32,
    distance: f32,
    accel: &'a [f32; 3],
    gyro: &'a [f32; 3],
}

impl<'a> From<&'a Snapshot> for SnapshotBody<'a> {
    fn from(s: &'a Snapshot) -> Self {
        Self {
            sequence: s.sequence,
            timestamp: s.taken_at().to_rfc3339(),
            temperature: s.record.temperature,
            humidity: s.record.humidity,
            luminosity: s.record.luminosity,
            gas: s.record.gas,
            distance: s.record.distance,
            accel: &s.record.accel,
            gyro: &s.record.gyro,
        }
    }
}

pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
}

impl HttpTransport {
    pub fn new(config: &TransportConfig) -> Result<Self> {
        let url = reqwest::Url::parse(&config.http_url)
            .map_err(|e| anyhow!("invalid collector URL '{}': {}", config.http_url, e))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.http_timeout_ms))
            .build()?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    async fn send(&self, snapshot: &Snapshot) -> Result<(), TransportError> {
        let response = self
            .client
            .post(&self.url)
            .json(&SnapshotBody::from(snapshot))
            .send()
            .await?;

        let status = response.status();
        debug!("Collector answered {} for snapshot #{}", status, snapshot.sequence);
        if !status.is_success() {
            return Err(TransportError::Rejected { status: status.as_u16() });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_url() {
        let config = TransportConfig {
            http_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(HttpTransport::new(&config).is_err());
    }

    #[test]
    fn test_body_fields() {
        let snapshot = Snapshot {
            sequence: 9,
            taken_at_ms: 1_700_000_000_000,
            record: crate::core::SensorRecord { gas: 410, ..Default::default() },
        };
        let json = serde_json::to_value(SnapshotBody::from(&snapshot)).unwrap();
        assert_eq!(json["sequence"], 9);
        assert_eq!(json["gas"], 410);
        assert_eq!(json["accel"].as_array().unwrap().len(), 3);
        assert!(json["timestamp"].as_str().unwrap().starts_with("2023-11-14"));
    }
}
