// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Hub - owns the shared record and the readiness barrier

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use parking_lot::RwLock;

use super::readiness::{ReadinessMask, ReadinessSet, Stalled};
use super::record::{SensorRecord, SharedRecord, Snapshot};
use crate::sensors::{Reading, SensorHealth, SensorKind};

/// Single handle shared by every producer and the aggregator.
///
/// Built once at startup and passed around as `Arc<Hub>`.
pub struct Hub {
    record: SharedRecord,
    readiness: ReadinessSet,
    required: ReadinessMask,
    sequence: AtomicU64,
    health: RwLock<BTreeMap<SensorKind, SensorHealth>>,
}

impl Hub {
    pub fn new(required: ReadinessMask) -> Self {
        Self {
            record: SharedRecord::new(),
            readiness: ReadinessSet::new(),
            required,
            sequence: AtomicU64::new(0),
            health: RwLock::new(BTreeMap::new()),
        }
    }

    /// Mask the aggregator waits on
    pub fn required(&self) -> ReadinessMask {
        self.required
    }

    pub fn register(&self, sensor_id: &str, kind: SensorKind) {
        self.health.write().insert(kind, SensorHealth::new(sensor_id, kind));
    }

    /// Write a reading's fields, then mark its kind ready.
    ///
    /// The signal is raised after the record lock is released.
    pub fn publish(&self, reading: &Reading) {
        let kind = reading.kind();
        self.record.write(reading);
        self.readiness.signal(kind.mask());

        if let Some(h) = self.health.write().get_mut(&kind) {
            h.readings_count += 1;
            h.last_update = Some(Utc::now());
        }
    }

    /// Mark `kind` as having completed a cycle without writing the record.
    /// The aggregator is then released on the retained values.
    pub fn mark_fresh(&self, kind: SensorKind) {
        self.readiness.signal(kind.mask());
    }

    /// Count a cycle that produced no data. The record is left untouched.
    pub fn note_unavailable(&self, kind: SensorKind, error: Option<String>) {
        if let Some(h) = self.health.write().get_mut(&kind) {
            match error {
                Some(e) => {
                    h.error_count += 1;
                    h.last_error = Some(e);
                }
                None => h.unavailable_count += 1,
            }
        }
    }

    /// Block until every required kind has published since the last call
    pub async fn await_ready(&self) {
        self.readiness.await_all(self.required).await
    }

    pub async fn await_ready_timeout(&self, timeout: Duration) -> Result<(), Stalled> {
        self.readiness.await_all_timeout(self.required, timeout).await
    }

    /// Kinds currently flagged fresh
    pub fn ready_now(&self) -> ReadinessMask {
        self.readiness.peek()
    }

    /// Take the next numbered snapshot
    pub fn snapshot(&self) -> Snapshot {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        self.record.snapshot(sequence)
    }

    /// Current record without consuming a sequence number
    pub fn current(&self) -> SensorRecord {
        self.record.read()
    }

    pub fn health(&self) -> Vec<SensorHealth> {
        self.health.read().values().cloned().collect()
    }

    pub fn health_of(&self, kind: SensorKind) -> Option<SensorHealth> {
        self.health.read().get(&kind).cloned()
    }
}
