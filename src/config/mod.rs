// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Configuration module

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{info, warn, Level};

use crate::core::ReadinessMask;
use crate::error::ConfigError;
use crate::sensors::SensorKind;
use crate::transport::TransportConfig;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level used when no CLI flag overrides it
    pub log_level: String,

    /// One entry per sensor kind
    pub producers: Vec<ProducerConfig>,

    /// Aggregator configuration
    pub aggregator: AggregatorConfig,

    /// Simulated sensor behaviour
    pub simulation: SimulationConfig,

    /// Outbound transport configuration
    pub transport: TransportConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            producers: vec![
                ProducerConfig::new(SensorKind::Climate, SensorKind::Climate.default_period_ms(), true),
                ProducerConfig::new(SensorKind::Light, SensorKind::Light.default_period_ms(), true),
                ProducerConfig::new(SensorKind::Gas, SensorKind::Gas.default_period_ms(), true),
                ProducerConfig::new(SensorKind::Sonar, SensorKind::Sonar.default_period_ms(), true),
                ProducerConfig {
                    enabled: false,
                    ..ProducerConfig::new(SensorKind::Motion, SensorKind::Motion.default_period_ms(), false)
                },
            ],
            aggregator: AggregatorConfig::default(),
            simulation: SimulationConfig::default(),
            transport: TransportConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Load or create default configuration
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let config = Self::default();

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            config.save(path)?;
            Ok(config)
        }
    }

    /// Get configuration directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("fieldsync"))
            .unwrap_or_else(|| PathBuf::from("./config"))
    }

    /// Get default configuration path
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    pub fn enabled_producers(&self) -> impl Iterator<Item = &ProducerConfig> {
        self.producers.iter().filter(|p| p.enabled)
    }

    /// Enabled producer entry for `kind`
    pub fn producer(&self, kind: SensorKind) -> Option<&ProducerConfig> {
        self.enabled_producers().find(|p| p.kind == kind)
    }

    /// Parsed `log_level`
    pub fn log_level(&self) -> Result<Level, ConfigError> {
        self.log_level
            .parse()
            .map_err(|_| ConfigError::LogLevel(self.log_level.clone()))
    }

    /// Bits of every enabled, required producer
    pub fn required_mask(&self) -> ReadinessMask {
        self.enabled_producers()
            .filter(|p| p.required)
            .fold(ReadinessMask::EMPTY, |mask, p| mask | p.kind.mask())
    }

    /// Bootstrap check, run once before any task starts
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.log_level()?;

        let mut seen = HashSet::new();
        for p in &self.producers {
            if !seen.insert(p.kind) {
                return Err(ConfigError::DuplicateProducer(p.kind));
            }
        }

        let enabled: Vec<&ProducerConfig> = self.enabled_producers().collect();
        if enabled.is_empty() {
            return Err(ConfigError::NoProducers);
        }
        if let Some(p) = enabled.iter().find(|p| p.period_ms == 0) {
            return Err(ConfigError::ZeroPeriod(p.kind));
        }
        if self.aggregator.emit_interval_ms == 0 {
            return Err(ConfigError::ZeroEmitInterval);
        }
        if self.required_mask().is_empty() {
            return Err(ConfigError::EmptyRequiredMask);
        }
        if !(0.0..=1.0).contains(&self.simulation.dropout_probability) {
            return Err(ConfigError::Dropout(self.simulation.dropout_probability));
        }

        // The aggregator paces itself to the slowest required producer
        for p in enabled.iter().filter(|p| p.required) {
            if p.period_ms > self.aggregator.emit_interval_ms {
                warn!(
                    "Required producer {} refreshes every {} ms, slower than the {} ms emit interval",
                    p.kind, p.period_ms, self.aggregator.emit_interval_ms
                );
            }
        }

        Ok(())
    }
}

/// Producer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProducerConfig {
    pub kind: SensorKind,

    /// Delay between two acquisitions
    pub period_ms: u64,

    /// Whether the aggregator waits for this producer
    #[serde(default = "default_true")]
    pub required: bool,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl ProducerConfig {
    pub fn new(kind: SensorKind, period_ms: u64, required: bool) -> Self {
        Self {
            kind,
            period_ms,
            required,
            enabled: true,
        }
    }
}

/// Aggregator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Pause after each emission
    pub emit_interval_ms: u64,

    /// Report missing producers after this long; unset waits forever
    pub stall_timeout_ms: Option<u64>,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            emit_interval_ms: 1000,
            stall_timeout_ms: None,
        }
    }
}

/// Simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Chance that a sample is reported unavailable
    pub dropout_probability: f64,

    /// Fixed seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            dropout_probability: 0.05,
            seed: None,
        }
    }
}
