// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Sensor traits and common types

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::ReadinessMask;
use crate::error::ReadError;

/// Sensor kinds known to the hub. Each kind owns a disjoint slice of the
/// shared record and one readiness bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    Climate,    // DHT11: temperature + humidity
    Light,      // LDR on an ADC pin
    Gas,        // MQ-2 on an ADC pin
    Sonar,      // HC-SR04 distance
    Motion,     // MPU6050 accel + gyro
}

impl SensorKind {
    /// Every kind, in bit order
    pub const ALL: [SensorKind; 5] = [
        SensorKind::Climate,
        SensorKind::Light,
        SensorKind::Gas,
        SensorKind::Sonar,
        SensorKind::Motion,
    ];

    /// Readiness bit index
    pub fn bit(self) -> u8 {
        match self {
            SensorKind::Climate => 0,
            SensorKind::Light => 1,
            SensorKind::Gas => 2,
            SensorKind::Sonar => 3,
            SensorKind::Motion => 4,
        }
    }

    /// Single-bit readiness mask for this kind
    pub fn mask(self) -> ReadinessMask {
        ReadinessMask::bit(self.bit())
    }

    pub fn name(self) -> &'static str {
        match self {
            SensorKind::Climate => "climate",
            SensorKind::Light => "light",
            SensorKind::Gas => "gas",
            SensorKind::Sonar => "sonar",
            SensorKind::Motion => "motion",
        }
    }

    /// Default refresh period in milliseconds
    pub fn default_period_ms(self) -> u64 {
        match self {
            SensorKind::Climate => 2000,
            SensorKind::Light => 500,
            SensorKind::Gas => 500,
            SensorKind::Sonar => 100,
            SensorKind::Motion => 1000,
        }
    }

    /// Kinds whose bits are present in `mask`
    pub fn in_mask(mask: ReadinessMask) -> Vec<SensorKind> {
        Self::ALL
            .iter()
            .copied()
            .filter(|k| mask.contains(k.mask()))
            .collect()
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One acquisition result. The variant decides which record fields may be
/// written, so a producer can never touch fields it does not own.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Reading {
    /// Either channel may drop out independently
    Climate {
        temperature: Option<f32>,
        humidity: Option<f32>,
    },
    /// Raw ADC counts
    Light(i32),
    /// Raw ADC counts
    Gas(i32),
    /// Centimeters
    Sonar(f32),
    Motion {
        accel: [f32; 3],
        gyro: [f32; 3],
    },
}

impl Reading {
    pub fn kind(&self) -> SensorKind {
        match self {
            Reading::Climate { .. } => SensorKind::Climate,
            Reading::Light(_) => SensorKind::Light,
            Reading::Gas(_) => SensorKind::Gas,
            Reading::Sonar(_) => SensorKind::Sonar,
            Reading::Motion { .. } => SensorKind::Motion,
        }
    }

    /// A climate reading with both channels missing carries nothing
    pub fn is_empty(&self) -> bool {
        matches!(
            self,
            Reading::Climate { temperature: None, humidity: None }
        )
    }
}

/// Trait for all sensors
#[async_trait]
pub trait Sensor: Send + Sync {
    /// Get sensor unique identifier
    fn id(&self) -> &str;

    /// Kind of data this sensor produces
    fn kind(&self) -> SensorKind;

    /// Probe the device once at bootstrap. Failure is fatal for the hub.
    async fn connect(&mut self) -> Result<(), ReadError>;

    /// Acquire one reading
    async fn read(&mut self) -> Result<Reading, ReadError>;
}

/// Sensor health metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorHealth {
    pub sensor_id: String,
    pub kind: SensorKind,
    pub readings_count: u64,
    pub unavailable_count: u64,
    pub error_count: u64,
    pub last_update: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl SensorHealth {
    pub fn new(sensor_id: &str, kind: SensorKind) -> Self {
        Self {
            sensor_id: sensor_id.to_string(),
            kind,
            readings_count: 0,
            unavailable_count: 0,
            error_count: 0,
            last_update: None,
            last_error: None,
        }
    }
}
