// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Sensor simulator for demo/testing

use async_trait::async_trait;
use rand::prelude::*;
use rand_distr::Normal;

use super::{Reading, Sensor, SensorKind};
use crate::error::ReadError;

/// Simulates plausible readings for one sensor kind
pub struct SensorSimulator {
    id: String,
    kind: SensorKind,
    rng: StdRng,

    // Simulation state
    tick: u64,
    dropout_probability: f64,
    drift: f64,
    distance: f64,
}

impl SensorSimulator {
    pub fn new(kind: SensorKind) -> Self {
        Self {
            id: format!("sim-{}", kind),
            kind,
            rng: StdRng::from_entropy(),
            tick: 0,
            dropout_probability: 0.0,
            drift: 0.0,
            distance: 120.0,
        }
    }

    /// Deterministic sequence for reproducible runs
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed ^ u64::from(self.kind.bit()));
        self
    }

    /// Probability in `0..=1` that a sample is reported unavailable
    pub fn with_dropout(mut self, probability: f64) -> Self {
        self.dropout_probability = probability.clamp(0.0, 1.0);
        self
    }

    fn noise(&mut self, sigma: f64) -> f64 {
        match Normal::new(0.0, sigma) {
            Ok(n) => self.rng.sample(n),
            Err(_) => 0.0,
        }
    }

    fn generate(&mut self) -> Reading {
        self.tick += 1;
        self.drift += self.rng.gen_range(-0.01..0.01);

        match self.kind {
            SensorKind::Climate => self.generate_climate(),
            SensorKind::Light => self.generate_light(),
            SensorKind::Gas => self.generate_gas(),
            SensorKind::Sonar => self.generate_sonar(),
            SensorKind::Motion => self.generate_motion(),
        }
    }

    fn generate_climate(&mut self) -> Reading {
        let temperature = 24.0 + self.drift + self.noise(0.3);
        let humidity = (55.0 - self.drift * 2.0 + self.noise(1.5)).clamp(0.0, 100.0);

        // The DHT occasionally loses one channel on its own
        let humidity_ok = self.rng.gen::<f64>() >= self.dropout_probability / 2.0;

        Reading::Climate {
            temperature: Some(temperature as f32),
            humidity: humidity_ok.then_some(humidity as f32),
        }
    }

    fn generate_light(&mut self) -> Reading {
        // Slow day/night swing on a 12-bit ADC
        let phase = self.tick as f64 / 600.0;
        let level = 2048.0 + 1500.0 * phase.sin() + self.noise(40.0);
        Reading::Light(level.clamp(0.0, 4095.0) as i32)
    }

    fn generate_gas(&mut self) -> Reading {
        let mut level = 400.0 + self.noise(25.0);
        if self.rng.gen::<f64>() < 0.01 {
            level += self.rng.gen_range(300.0..1200.0);
        }
        Reading::Gas(level.clamp(0.0, 4095.0) as i32)
    }

    fn generate_sonar(&mut self) -> Reading {
        self.distance = (self.distance + self.noise(4.0)).clamp(2.0, 400.0);
        Reading::Sonar(self.distance as f32)
    }

    fn generate_motion(&mut self) -> Reading {
        let accel = [
            self.noise(0.05) as f32,
            self.noise(0.05) as f32,
            (9.81 + self.noise(0.05)) as f32,
        ];
        let gyro = [
            (self.noise(0.01) + self.drift * 0.1) as f32,
            self.noise(0.01) as f32,
            self.noise(0.01) as f32,
        ];
        Reading::Motion { accel, gyro }
    }
}

#[async_trait]
impl Sensor for SensorSimulator {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> SensorKind {
        self.kind
    }

    async fn connect(&mut self) -> Result<(), ReadError> {
        Ok(())
    }

    async fn read(&mut self) -> Result<Reading, ReadError> {
        if self.dropout_probability > 0.0 && self.rng.gen::<f64>() < self.dropout_probability {
            return Err(ReadError::Unavailable);
        }
        Ok(self.generate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_readings_match_kind() {
        for kind in SensorKind::ALL {
            let mut sim = SensorSimulator::new(kind).with_seed(1);
            for _ in 0..20 {
                assert_eq!(sim.read().await.unwrap().kind(), kind);
            }
        }
    }

    #[tokio::test]
    async fn test_full_dropout_is_always_unavailable() {
        let mut sim = SensorSimulator::new(SensorKind::Gas).with_dropout(1.0);
        for _ in 0..10 {
            assert_eq!(sim.read().await, Err(ReadError::Unavailable));
        }
    }

    #[tokio::test]
    async fn test_seeded_runs_repeat() {
        let mut a = SensorSimulator::new(SensorKind::Sonar).with_seed(99);
        let mut b = SensorSimulator::new(SensorKind::Sonar).with_seed(99);
        for _ in 0..5 {
            assert_eq!(a.read().await, b.read().await);
        }
    }

    #[tokio::test]
    async fn test_values_stay_in_range() {
        let mut sim = SensorSimulator::new(SensorKind::Light).with_seed(3);
        for _ in 0..200 {
            match sim.read().await.unwrap() {
                Reading::Light(v) => assert!((0..=4095).contains(&v)),
                other => panic!("unexpected reading {:?}", other),
            }
        }
    }
}
