// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! MQTT transport for streaming snapshots

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use tracing::{debug, info, warn};

use super::{Transport, TransportConfig};
use crate::core::Snapshot;
use crate::error::TransportError;

/// Publishes each snapshot once at QoS 0, matching the hub's
/// at-most-once delivery.
pub struct MqttTransport {
    client: AsyncClient,
    topic: String,
}

impl MqttTransport {
    pub async fn new(config: &TransportConfig) -> Result<Self> {
        let mut options = MqttOptions::new(
            &config.mqtt_client_id,
            &config.mqtt_broker,
            config.mqtt_port,
        );
        options.set_keep_alive(Duration::from_secs(30));

        if let (Some(username), Some(password)) = (&config.mqtt_username, &config.mqtt_password) {
            options.set_credentials(username, password);
        }

        let (client, mut eventloop) = AsyncClient::new(options, 16);

        // The event loop drives the connection; publishes only enqueue
        tokio::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        info!("MQTT connected");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("MQTT error: {:?}", e);
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }
            }
        });

        let topic = format!("{}/snapshot", config.mqtt_topic_prefix);
        info!(
            "MQTT transport for {}:{} on topic {}",
            config.mqtt_broker, config.mqtt_port, topic
        );

        Ok(Self { client, topic })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[async_trait]
impl Transport for MqttTransport {
    fn name(&self) -> &str {
        "mqtt"
    }

    async fn send(&self, snapshot: &Snapshot) -> Result<(), TransportError> {
        let json = serde_json::to_vec(snapshot).map_err(|e| TransportError::Encode(e.to_string()))?;

        // Must not wait on a full request queue
        self.client
            .try_publish(&self.topic, QoS::AtMostOnce, false, json)
            .map_err(|e| TransportError::Mqtt(e.to_string()))?;

        debug!("Queued snapshot #{} on {}", snapshot.sequence, self.topic);
        Ok(())
    }
}
