// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Aggregator loop - waits on the barrier, snapshots, transmits

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::event_bus::{EventBus, HubEvent};
use super::hub::Hub;
use crate::sensors::SensorKind;
use crate::transport::Transport;

/// Counters kept by the aggregator
#[derive(Debug, Default)]
pub struct AggregatorStats {
    cycles: AtomicU64,
    sent: AtomicU64,
    failed: AtomicU64,
    stalls: AtomicU64,
}

/// Point-in-time copy of [`AggregatorStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub cycles: u64,
    pub sent: u64,
    pub failed: u64,
    pub stalls: u64,
}

impl AggregatorStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            sent: self.sent.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            stalls: self.stalls.load(Ordering::Relaxed),
        }
    }
}

/// Result of one EMIT step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitOutcome {
    Sent(u64),
    Failed(u64),
}

/// The single consumer of the hub
pub struct Aggregator {
    hub: Arc<Hub>,
    transport: Arc<dyn Transport>,
    events: Arc<EventBus>,
    stats: Arc<AggregatorStats>,
    emit_interval: Duration,
    stall_timeout: Option<Duration>,
}

impl Aggregator {
    pub fn new(
        hub: Arc<Hub>,
        transport: Arc<dyn Transport>,
        events: Arc<EventBus>,
        emit_interval: Duration,
        stall_timeout: Option<Duration>,
    ) -> Self {
        Self {
            hub,
            transport,
            events,
            stats: Arc::new(AggregatorStats::default()),
            emit_interval,
            stall_timeout,
        }
    }

    pub fn stats(&self) -> Arc<AggregatorStats> {
        self.stats.clone()
    }

    /// WAIT: block until every required producer has published.
    ///
    /// With a stall timeout, each elapsed timeout is reported and the wait
    /// resumes; a partial snapshot is never emitted.
    pub async fn wait_ready(&self) {
        let Some(timeout) = self.stall_timeout else {
            self.hub.await_ready().await;
            return;
        };

        while let Err(stalled) = self.hub.await_ready_timeout(timeout).await {
            let missing = SensorKind::in_mask(stalled.missing);
            self.stats.stalls.fetch_add(1, Ordering::Relaxed);
            warn!("No fresh data from {:?} for {:?}", missing, timeout);
            self.events.publish(HubEvent::Stalled { missing });
        }
    }

    /// EMIT: snapshot and hand to the transport once. Failures are
    /// reported, never retried.
    pub async fn emit(&self) -> EmitOutcome {
        let snapshot = self.hub.snapshot();
        self.stats.cycles.fetch_add(1, Ordering::Relaxed);
        let transport = self.transport.name().to_string();

        match self.transport.send(&snapshot).await {
            Ok(()) => {
                self.stats.sent.fetch_add(1, Ordering::Relaxed);
                debug!("Snapshot #{} sent via {}", snapshot.sequence, transport);
                self.events.publish(HubEvent::SnapshotSent {
                    sequence: snapshot.sequence,
                    transport,
                });
                EmitOutcome::Sent(snapshot.sequence)
            }
            Err(e) => {
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                warn!("Failed to send snapshot #{} via {}: {}", snapshot.sequence, transport, e);
                self.events.publish(HubEvent::SendFailed {
                    sequence: snapshot.sequence,
                    transport,
                    error: e.to_string(),
                });
                EmitOutcome::Failed(snapshot.sequence)
            }
        }
    }

    /// Run WAIT -> EMIT -> sleep until shutdown
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) -> Result<()> {
        info!(
            "Aggregator started: waiting on {:?}, emitting every {:?} via {}",
            SensorKind::in_mask(self.hub.required()),
            self.emit_interval,
            self.transport.name()
        );

        loop {
            tokio::select! {
                _ = self.wait_ready() => {}
                _ = shutdown.recv() => break,
            }
            tokio::select! {
                _ = self.emit() => {}
                _ = shutdown.recv() => break,
            }
            tokio::select! {
                _ = sleep(self.emit_interval) => {}
                _ = shutdown.recv() => break,
            }
        }

        let stats = self.stats.snapshot();
        info!(
            "Aggregator stopped after {} cycles ({} sent, {} failed)",
            stats.cycles, stats.sent, stats.failed
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Snapshot;
    use crate::error::TransportError;
    use crate::core::Producer;
    use crate::error::ReadError;
    use crate::sensors::{Reading, Sensor};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashSet;

    /// Records every snapshot; fails the sequence numbers listed
    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<Snapshot>>,
        fail_on: HashSet<u64>,
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        fn name(&self) -> &str {
            "recording"
        }

        async fn send(&self, snapshot: &Snapshot) -> Result<(), TransportError> {
            self.sent.lock().push(*snapshot);
            if self.fail_on.contains(&snapshot.sequence) {
                return Err(TransportError::Rejected { status: 503 });
            }
            Ok(())
        }
    }

    fn abc() -> crate::core::ReadinessMask {
        SensorKind::Climate.mask() | SensorKind::Light.mask() | SensorKind::Gas.mask()
    }

    fn setup(transport: Arc<RecordingTransport>, stall: Option<Duration>) -> (Aggregator, Arc<Hub>, Arc<EventBus>) {
        let hub = Arc::new(Hub::new(abc()));
        let events = Arc::new(EventBus::default());
        let aggregator = Aggregator::new(
            hub.clone(),
            transport,
            events.clone(),
            Duration::from_millis(10),
            stall,
        );
        (aggregator, hub, events)
    }

    #[tokio::test]
    async fn test_emits_once_after_all_required() {
        let transport = Arc::new(RecordingTransport::default());
        let (aggregator, hub, _) = setup(transport.clone(), None);
        let (tx, rx) = broadcast::channel(1);
        let task = tokio::spawn(aggregator.run(rx));

        hub.publish(&Reading::Climate { temperature: Some(26.0), humidity: Some(70.0) });
        hub.publish(&Reading::Light(300));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(transport.sent.lock().is_empty());

        hub.publish(&Reading::Gas(512));
        tokio::time::sleep(Duration::from_millis(50)).await;

        {
            let sent = transport.sent.lock();
            assert_eq!(sent.len(), 1);
            assert_eq!(sent[0].record.temperature, 26.0);
            assert_eq!(sent[0].record.humidity, 70.0);
            assert_eq!(sent[0].record.luminosity, 300);
            assert_eq!(sent[0].record.gas, 512);
        }

        tx.send(()).unwrap();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_failure_does_not_block_next_cycle() {
        let transport = Arc::new(RecordingTransport {
            fail_on: HashSet::from([1]),
            ..Default::default()
        });
        let (aggregator, hub, events) = setup(transport.clone(), None);
        let mut rx = events.subscribe();

        hub.publish(&Reading::Climate { temperature: Some(20.0), humidity: Some(50.0) });
        hub.publish(&Reading::Light(1));
        hub.publish(&Reading::Gas(1));
        aggregator.wait_ready().await;
        assert_eq!(aggregator.emit().await, EmitOutcome::Failed(1));

        hub.publish(&Reading::Climate { temperature: Some(21.0), humidity: None });
        hub.publish(&Reading::Light(2));
        hub.publish(&Reading::Gas(2));
        aggregator.wait_ready().await;
        assert_eq!(aggregator.emit().await, EmitOutcome::Sent(2));

        let sent = transport.sent.lock();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].record.temperature, 21.0);
        assert_eq!(sent[1].record.humidity, 50.0);
        assert_eq!(sent[1].record.luminosity, 2);

        let stats = aggregator.stats().snapshot();
        assert_eq!(stats, StatsSnapshot { cycles: 2, sent: 1, failed: 1, stalls: 0 });

        assert!(matches!(rx.try_recv().unwrap().payload, HubEvent::SendFailed { sequence: 1, .. }));
        assert!(matches!(rx.try_recv().unwrap().payload, HubEvent::SnapshotSent { sequence: 2, .. }));
    }

    #[tokio::test]
    async fn test_stall_is_reported_and_wait_resumes() {
        let transport = Arc::new(RecordingTransport::default());
        let (aggregator, hub, events) = setup(transport, Some(Duration::from_millis(20)));
        let mut rx = events.subscribe();

        hub.publish(&Reading::Climate { temperature: Some(20.0), humidity: Some(50.0) });
        hub.publish(&Reading::Gas(1));

        let aggregator = Arc::new(aggregator);
        let waiter = {
            let aggregator = aggregator.clone();
            tokio::spawn(async move { aggregator.wait_ready().await })
        };

        let event = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.payload, HubEvent::Stalled { missing: vec![SensorKind::Light] });
        assert!(!waiter.is_finished());

        hub.publish(&Reading::Light(9));
        tokio::time::timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();
        assert!(aggregator.stats().snapshot().stalls >= 1);
    }

    #[tokio::test]
    async fn test_consumed_bits_require_fresh_signals() {
        let transport = Arc::new(RecordingTransport::default());
        let (aggregator, hub, _) = setup(transport, None);

        hub.publish(&Reading::Climate { temperature: Some(20.0), humidity: Some(50.0) });
        hub.publish(&Reading::Light(1));
        hub.publish(&Reading::Gas(1));
        aggregator.wait_ready().await;

        assert!(tokio::time::timeout(Duration::from_millis(50), aggregator.wait_ready())
            .await
            .is_err());
    }

    /// One good gas sample, then nothing but dropouts
    struct FlakyGasSensor {
        first: bool,
    }

    #[async_trait]
    impl Sensor for FlakyGasSensor {
        fn id(&self) -> &str { "mq2-flaky" }
        fn kind(&self) -> SensorKind { SensorKind::Gas }
        async fn connect(&mut self) -> Result<(), ReadError> { Ok(()) }
        async fn read(&mut self) -> Result<Reading, ReadError> {
            if std::mem::take(&mut self.first) {
                Ok(Reading::Gas(250))
            } else {
                Err(ReadError::Unavailable)
            }
        }
    }

    #[tokio::test]
    async fn test_dropouts_still_emit_last_good_value() {
        let transport = Arc::new(RecordingTransport::default());
        let hub = Arc::new(Hub::new(SensorKind::Gas.mask()));
        let events = Arc::new(EventBus::default());
        let mut producer = Producer::new(
            Box::new(FlakyGasSensor { first: true }),
            Duration::from_millis(1),
            hub.clone(),
            events.clone(),
        );
        let aggregator = Aggregator::new(hub.clone(), transport.clone(), events, Duration::from_millis(1), None);

        producer.cycle().await;
        aggregator.wait_ready().await;
        assert_eq!(aggregator.emit().await, EmitOutcome::Sent(1));

        for expected in 2..=6 {
            producer.cycle().await;
            tokio::time::timeout(Duration::from_millis(200), aggregator.wait_ready())
                .await
                .expect("dropout should not block the aggregator");
            assert_eq!(aggregator.emit().await, EmitOutcome::Sent(expected));
        }

        let sent = transport.sent.lock();
        assert_eq!(sent.len(), 6);
        assert!(sent.iter().all(|s| s.record.gas == 250));
        assert_eq!(hub.health_of(SensorKind::Gas).unwrap().unavailable_count, 5);
    }
}
