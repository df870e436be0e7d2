// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Console transport - logs each snapshot

use async_trait::async_trait;
use tracing::info;

use super::Transport;
use crate::core::Snapshot;
use crate::error::TransportError;

pub struct ConsoleTransport;

impl ConsoleTransport {
    pub fn new() -> Self {
        Self
    }

    pub fn format(snapshot: &Snapshot) -> String {
        let r = &snapshot.record;
        format!(
            "#{} T: {:.1}C | H: {:.1}% | Light: {} | Gas: {} | Dist: {:.1}cm | \
             Accel [X: {:.2} | Y: {:.2} | Z: {:.2}] Gyro [X: {:.2} | Y: {:.2} | Z: {:.2}]",
            snapshot.sequence,
            r.temperature,
            r.humidity,
            r.luminosity,
            r.gas,
            r.distance,
            r.accel[0],
            r.accel[1],
            r.accel[2],
            r.gyro[0],
            r.gyro[1],
            r.gyro[2],
        )
    }
}

impl Default for ConsoleTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for ConsoleTransport {
    fn name(&self) -> &str {
        "console"
    }

    async fn send(&self, snapshot: &Snapshot) -> Result<(), TransportError> {
        info!("{}", Self::format(snapshot));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SensorRecord;

    #[test]
    fn test_format_line() {
        let snapshot = Snapshot {
            sequence: 3,
            taken_at_ms: 0,
            record: SensorRecord {
                temperature: 23.46,
                luminosity: 900,
                accel: [0.0, 0.0, 9.81],
                ..Default::default()
            },
        };
        let line = ConsoleTransport::format(&snapshot);
        assert!(line.starts_with("#3 T: 23.5C"));
        assert!(line.contains("Light: 900"));
        assert!(line.contains("Z: 9.81]"));
    }
}
