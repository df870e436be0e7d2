// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Typed errors at the sensor, transport and configuration seams

use thiserror::Error;

use crate::sensors::SensorKind;

/// Failure to acquire a reading from a sensor.
///
/// `Unavailable` is the expected "no reading this cycle" outcome and is
/// recovered by the producer; it is never a zero value.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ReadError {
    /// Sensor answered but had no valid sample
    #[error("no reading available")]
    Unavailable,

    /// Device could not be found or addressed
    #[error("hardware error: {0}")]
    Hardware(String),
}

/// Failure of a single delivery attempt.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Socket or file I/O
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Request could not be completed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Collector answered with a non-success status
    #[error("collector rejected snapshot with status {status}")]
    Rejected { status: u16 },

    /// Broker client refused the publish
    #[error("MQTT publish failed: {0}")]
    Mqtt(String),

    /// Snapshot could not be serialized
    #[error("encode error: {0}")]
    Encode(String),
}

/// Invalid bootstrap configuration.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("no producers are enabled")]
    NoProducers,

    #[error("producer {0} is configured more than once")]
    DuplicateProducer(SensorKind),

    #[error("producer {0} has a zero period")]
    ZeroPeriod(SensorKind),

    #[error("emit interval must be greater than zero")]
    ZeroEmitInterval,

    #[error("no enabled producer is marked as required")]
    EmptyRequiredMask,

    #[error("dropout probability {0} is outside 0..=1")]
    Dropout(f64),

    #[error("unknown log level '{0}'")]
    LogLevel(String),

    #[error("invalid transport setting: {0}")]
    Transport(String),
}
