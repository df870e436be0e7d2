// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Producer loop - one periodic task per sensor

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::broadcast;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::event_bus::{EventBus, HubEvent};
use super::hub::Hub;
use crate::error::ReadError;
use crate::sensors::{Reading, Sensor, SensorKind};

/// What one acquire/publish cycle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Fields written and readiness bit set
    Published,
    /// No data; previous values kept and the bit still set
    Unavailable,
    /// Sensor or wiring fault; previous values kept and the bit still set
    Failed,
}

/// Periodically reads one sensor and publishes into the hub
pub struct Producer {
    sensor: Box<dyn Sensor>,
    kind: SensorKind,
    period: Duration,
    hub: Arc<Hub>,
    events: Arc<EventBus>,
}

impl Producer {
    pub fn new(sensor: Box<dyn Sensor>, period: Duration, hub: Arc<Hub>, events: Arc<EventBus>) -> Self {
        let kind = sensor.kind();
        hub.register(sensor.id(), kind);
        Self {
            sensor,
            kind,
            period,
            hub,
            events,
        }
    }

    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    /// ACQUIRE then PUBLISH, once
    pub async fn cycle(&mut self) -> CycleOutcome {
        let result = self.sensor.read().await;
        self.handle(result)
    }

    fn handle(&self, result: Result<Reading, ReadError>) -> CycleOutcome {
        match result {
            Ok(reading) if reading.kind() != self.kind => {
                warn!(
                    "Sensor {} returned a {} reading, expected {}; dropped",
                    self.sensor.id(),
                    reading.kind(),
                    self.kind
                );
                self.hub.note_unavailable(self.kind, Some("reading of wrong kind".to_string()));
                self.hub.mark_fresh(self.kind);
                CycleOutcome::Failed
            }
            Ok(reading) if reading.is_empty() => self.unavailable(),
            Ok(reading) => {
                self.hub.publish(&reading);
                debug!("{} published {:?}", self.kind, reading);
                CycleOutcome::Published
            }
            Err(ReadError::Unavailable) => self.unavailable(),
            Err(e) => {
                warn!("Read error for {}: {}", self.sensor.id(), e);
                self.hub.note_unavailable(self.kind, Some(e.to_string()));
                self.hub.mark_fresh(self.kind);
                self.events.publish(HubEvent::ReadingUnavailable { kind: self.kind });
                CycleOutcome::Failed
            }
        }
    }

    fn unavailable(&self) -> CycleOutcome {
        debug!("{} had no reading, keeping previous value", self.kind);
        self.hub.note_unavailable(self.kind, None);
        self.hub.mark_fresh(self.kind);
        self.events.publish(HubEvent::ReadingUnavailable { kind: self.kind });
        CycleOutcome::Unavailable
    }

    /// Run until shutdown. Both the read and the period sleep observe the
    /// shutdown signal.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> Result<()> {
        info!(
            "Producer {} ({}) started, period {:?}",
            self.sensor.id(),
            self.kind,
            self.period
        );

        loop {
            tokio::select! {
                _ = self.cycle() => {}
                _ = shutdown.recv() => break,
            }
            tokio::select! {
                _ = sleep(self.period) => {}
                _ = shutdown.recv() => break,
            }
        }

        info!("Producer {} stopped", self.sensor.id());
        Ok(())
    }
}
