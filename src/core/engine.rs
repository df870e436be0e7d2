//! Engine - bootstraps the hub and owns its tasks

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use tracing::{error, info};

use super::aggregator::{Aggregator, AggregatorStats};
use super::event_bus::EventBus;
use super::hub::Hub;
use super::producer::Producer;
use super::scheduler::Scheduler;
use super::HubState;
use crate::config::Config;
use crate::sensors::{Sensor, SensorKind};
use crate::transport::Transport;

/// Main fieldsync engine
pub struct Engine {
    pub config: Arc<Config>,
    hub: Arc<Hub>,
    events: Arc<EventBus>,
    scheduler: Scheduler,
    stats: Arc<AggregatorStats>,
    start_time: Option<Instant>,
}

impl Engine {
    /// Validate the configuration and build the hub. Nothing runs yet.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let hub = Arc::new(Hub::new(config.required_mask()));

        Ok(Self {
            config: Arc::new(config),
            hub,
            events: Arc::new(EventBus::default()),
            scheduler: Scheduler::new(),
            stats: Arc::new(AggregatorStats::default()),
            start_time: None,
        })
    }

    pub fn hub(&self) -> Arc<Hub> {
        self.hub.clone()
    }

    pub fn events(&self) -> Arc<EventBus> {
        self.events.clone()
    }

    /// Connect every sensor, then spawn one producer per sensor and the
    /// aggregator.
    ///
    /// Any connect failure aborts the start before a single task exists.
    pub async fn start(&mut self, mut sensors: Vec<Box<dyn Sensor>>, transport: Arc<dyn Transport>) -> Result<()> {
        if self.start_time.is_some() {
            bail!("engine already started");
        }
        info!("Starting fieldsync engine...");

        let mut periods = Vec::with_capacity(sensors.len());
        let mut seen = HashSet::new();
        for sensor in sensors.iter() {
            if !seen.insert(sensor.kind()) {
                bail!("sensor {} duplicates the {} producer", sensor.id(), sensor.kind());
            }
            let Some(producer) = self.config.producer(sensor.kind()) else {
                bail!("sensor {} has no enabled {} producer configured", sensor.id(), sensor.kind());
            };
            periods.push(Duration::from_millis(producer.period_ms));
        }

        let required = SensorKind::in_mask(self.config.required_mask());
        for kind in &required {
            if !sensors.iter().any(|s| s.kind() == *kind) {
                bail!("required producer {} has no sensor", kind);
            }
        }

        for sensor in sensors.iter_mut() {
            if let Err(e) = sensor.connect().await {
                error!("Failed to connect sensor {}: {}", sensor.id(), e);
                bail!("bootstrap failed: sensor {} ({}): {}", sensor.id(), sensor.kind(), e);
            }
            info!("Connected sensor: {} ({})", sensor.id(), sensor.kind());
        }

        for (sensor, period) in sensors.into_iter().zip(periods) {
            let name = format!("producer-{}", sensor.kind());
            let producer = Producer::new(sensor, period, self.hub.clone(), self.events.clone());
            self.scheduler.spawn(&name, move |shutdown| producer.run(shutdown));
        }

        let aggregator = Aggregator::new(
            self.hub.clone(),
            transport,
            self.events.clone(),
            Duration::from_millis(self.config.aggregator.emit_interval_ms),
            self.config.aggregator.stall_timeout_ms.map(Duration::from_millis),
        );
        self.stats = aggregator.stats();
        self.scheduler.spawn("aggregator", move |shutdown| aggregator.run(shutdown));

        self.start_time = Some(Instant::now());
        info!("fieldsync engine started with {} tasks", self.scheduler.len());
        Ok(())
    }

    /// Signal every task and wait for them to finish
    pub async fn stop(&mut self) {
        info!("Stopping fieldsync engine...");
        self.scheduler.shutdown().await;
        self.start_time = None;
        info!("fieldsync engine stopped");
    }

    pub fn is_running(&self) -> bool {
        self.start_time.is_some()
    }

    pub fn uptime(&self) -> u64 {
        self.start_time.map(|t| t.elapsed().as_secs()).unwrap_or(0)
    }

    pub fn state(&self) -> HubState {
        HubState {
            running: self.is_running(),
            uptime_seconds: self.uptime(),
            required: SensorKind::in_mask(self.hub.required()),
            stats: self.stats.snapshot(),
            record: self.hub.current(),
            sensors: self.hub.health(),
        }
    }
}
