// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! fieldsync - Readiness-Barrier Sensor Aggregator
//!
//! Independent periodic producers refresh disjoint fields of one shared
//! record. A single aggregator waits until every required producer has
//! refreshed at least once since the last emission, snapshots the whole
//! record under its lock and hands the snapshot to a transport.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐ ┌──────────┐ ┌──────────┐
//! │ Producer │ │ Producer │ │ Producer │   one task per sensor,
//! │ climate  │ │  light   │ │   gas    │   each at its own period
//! └────┬─────┘ └────┬─────┘ └────┬─────┘
//!      │ write + signal bit      │
//!      ▼            ▼            ▼
//! ┌─────────────────────────────────────┐
//! │ Hub: SharedRecord  +  ReadinessSet  │
//! └──────────────────┬──────────────────┘
//!                    │ await_all(required), clear on wake
//!                    ▼
//!             ┌────────────┐  snapshot  ┌───────────┐
//!             │ Aggregator │ ─────────▶ │ Transport │
//!             └────────────┘            └───────────┘
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod sensors;
pub mod transport;

// Re-exports for convenience
pub use crate::config::Config;
pub use crate::core::{Engine, Hub, ReadinessMask, ReadinessSet, SensorRecord, Snapshot};
pub use crate::error::{ConfigError, ReadError, TransportError};
pub use crate::sensors::{Reading, Sensor, SensorKind};
pub use crate::transport::Transport;

/// fieldsync version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// fieldsync name
pub const NAME: &str = "fieldsync";
