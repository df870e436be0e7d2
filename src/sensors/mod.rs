//! Sensor module - reading interface and simulations

mod simulator;
mod traits;

pub use simulator::SensorSimulator;
pub use traits::{Reading, Sensor, SensorHealth, SensorKind};

use crate::config::Config;

/// One simulated sensor per enabled producer
pub fn build_simulated(config: &Config) -> Vec<Box<dyn Sensor>> {
    config
        .enabled_producers()
        .map(|p| {
            let mut sim = SensorSimulator::new(p.kind).with_dropout(config.simulation.dropout_probability);
            if let Some(seed) = config.simulation.seed {
                sim = sim.with_seed(seed);
            }
            Box::new(sim) as Box<dyn Sensor>
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builds_one_sensor_per_enabled_producer() {
        let config = Config::default();
        let kinds: Vec<SensorKind> = build_simulated(&config).iter().map(|s| s.kind()).collect();
        assert_eq!(
            kinds,
            vec![SensorKind::Climate, SensorKind::Light, SensorKind::Gas, SensorKind::Sonar]
        );
    }
}
