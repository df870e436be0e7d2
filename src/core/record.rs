// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Shared sensor record and the snapshots taken from it

use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::sensors::Reading;

/// Latest known value of every field.
///
/// Starts zeroed and is only ever overwritten, so it always holds the last
/// good value of each field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorRecord {
    pub temperature: f32,
    pub humidity: f32,
    pub luminosity: i32,
    pub gas: i32,
    pub distance: f32,
    pub accel: [f32; 3],
    pub gyro: [f32; 3],
}

impl SensorRecord {
    /// Write the fields owned by the reading's kind. Missing climate
    /// channels keep their previous value.
    pub fn apply(&mut self, reading: &Reading) {
        match *reading {
            Reading::Climate { temperature, humidity } => {
                if let Some(t) = temperature {
                    self.temperature = t;
                }
                if let Some(h) = humidity {
                    self.humidity = h;
                }
            }
            Reading::Light(v) => self.luminosity = v,
            Reading::Gas(v) => self.gas = v,
            Reading::Sonar(d) => self.distance = d,
            Reading::Motion { accel, gyro } => {
                self.accel = accel;
                self.gyro = gyro;
            }
        }
    }
}

/// Immutable copy of the record taken under the lock.
///
/// Every field is fixed size, so the bincode encoding has a fixed layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Monotonic per-hub counter, starting at 1
    pub sequence: u64,
    /// Unix time in milliseconds
    pub taken_at_ms: i64,
    pub record: SensorRecord,
}

impl Snapshot {
    pub fn taken_at(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.taken_at_ms)
            .single()
            .unwrap_or_default()
    }
}

/// The record behind its lock.
///
/// Both operations hold the lock only while copying plain values, never
/// across an await and never while taking another lock.
pub struct SharedRecord {
    inner: Mutex<SensorRecord>,
}

impl SharedRecord {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(SensorRecord::default()),
        }
    }

    pub fn write(&self, reading: &Reading) {
        self.inner.lock().apply(reading);
    }

    /// Copy every field out in one lock-holding interval
    pub fn read(&self) -> SensorRecord {
        *self.inner.lock()
    }

    pub fn snapshot(&self, sequence: u64) -> Snapshot {
        let record = self.read();
        Snapshot {
            sequence,
            taken_at_ms: Utc::now().timestamp_millis(),
            record,
        }
    }
}

impl Default for SharedRecord {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_write_touches_only_owned_fields() {
        let record = SharedRecord::new();
        record.write(&Reading::Light(812));
        record.write(&Reading::Sonar(42.5));

        let r = record.read();
        assert_eq!(r.luminosity, 812);
        assert_eq!(r.distance, 42.5);
        assert_eq!(r.gas, 0);
        assert_eq!(r.temperature, 0.0);
        assert_eq!(r.accel, [0.0; 3]);
    }

    #[test]
    fn test_partial_climate_keeps_previous_channel() {
        let record = SharedRecord::new();
        record.write(&Reading::Climate { temperature: Some(24.0), humidity: Some(51.0) });
        record.write(&Reading::Climate { temperature: Some(25.5), humidity: None });

        let r = record.read();
        assert_eq!(r.temperature, 25.5);
        assert_eq!(r.humidity, 51.0);
    }

    #[test]
    fn test_zero_is_a_real_value() {
        let record = SharedRecord::new();
        record.write(&Reading::Gas(300));
        record.write(&Reading::Gas(0));
        assert_eq!(record.read().gas, 0);
    }

    #[test]
    fn test_snapshots_never_observe_torn_writes() {
        let record = Arc::new(SharedRecord::new());
        let stop = Arc::new(AtomicBool::new(false));

        // Each writer stores the same value in all six motion lanes; a
        // snapshot mixing two writes would show differing lanes.
        let writers: Vec<_> = (0..4)
            .map(|w| {
                let record = record.clone();
                let stop = stop.clone();
                thread::spawn(move || {
                    let mut n = 0u32;
                    while !stop.load(Ordering::Relaxed) {
                        let v = (w * 1_000_000 + n) as f32;
                        record.write(&Reading::Motion { accel: [v; 3], gyro: [v; 3] });
                        n = n.wrapping_add(1) % 1_000_000;
                    }
                })
            })
            .collect();

        let readers: Vec<_> = (0..2)
            .map(|_| {
                let record = record.clone();
                thread::spawn(move || {
                    for seq in 0..20_000 {
                        let snap = record.snapshot(seq);
                        let lanes = [snap.record.accel, snap.record.gyro].concat();
                        assert!(lanes.iter().all(|v| *v == lanes[0]), "torn snapshot: {:?}", lanes);
                    }
                })
            })
            .collect();

        for r in readers {
            r.join().unwrap();
        }
        stop.store(true, Ordering::Relaxed);
        for w in writers {
            w.join().unwrap();
        }
    }

    #[test]
    fn test_snapshot_timestamp() {
        let record = SharedRecord::new();
        let before = Utc::now().timestamp_millis();
        let snap = record.snapshot(7);
        assert_eq!(snap.sequence, 7);
        assert!(snap.taken_at_ms >= before);
        assert_eq!(snap.taken_at().timestamp_millis(), snap.taken_at_ms);
    }
}
