// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Point-to-point datagram transport and its receiver
//!
//! Each snapshot travels as one datagram: a 4-byte magic followed by the
//! bincode encoding of [`Snapshot`]. Every field is fixed size, so frames
//! are always [`FRAME_LEN`] bytes.

use std::net::SocketAddr;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use tokio::net::UdpSocket;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::{ConsoleTransport, Transport};
use crate::core::Snapshot;
use crate::error::TransportError;

pub const FRAME_MAGIC: [u8; 4] = *b"FSN1";

/// magic + sequence + timestamp + 5 scalars + 2 triples
pub const FRAME_LEN: usize = 4 + 8 + 8 + 5 * 4 + 6 * 4;

pub fn encode_frame(snapshot: &Snapshot) -> Result<Vec<u8>, TransportError> {
    let mut frame = Vec::with_capacity(FRAME_LEN);
    frame.extend_from_slice(&FRAME_MAGIC);
    bincode::serialize_into(&mut frame, snapshot).map_err(|e| TransportError::Encode(e.to_string()))?;
    Ok(frame)
}

pub fn decode_frame(frame: &[u8]) -> Result<Snapshot> {
    if frame.len() != FRAME_LEN {
        bail!("frame is {} bytes, expected {}", frame.len(), FRAME_LEN);
    }
    if frame[..4] != FRAME_MAGIC {
        bail!("bad frame magic");
    }
    bincode::deserialize(&frame[4..]).map_err(|e| anyhow!("malformed frame: {}", e))
}

/// Sends each snapshot as a single datagram to one peer
pub struct UdpTransport {
    socket: UdpSocket,
    peer: SocketAddr,
}

impl UdpTransport {
    pub async fn connect(target: &str) -> Result<Self> {
        let peer: SocketAddr = tokio::net::lookup_host(target)
            .await?
            .next()
            .ok_or_else(|| anyhow!("could not resolve UDP peer '{}'", target))?;

        let bind = if peer.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(bind).await?;
        socket.connect(peer).await?;
        info!("UDP transport sending to {}", peer);

        Ok(Self { socket, peer })
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }
}

#[async_trait]
impl Transport for UdpTransport {
    fn name(&self) -> &str {
        "udp"
    }

    async fn send(&self, snapshot: &Snapshot) -> Result<(), TransportError> {
        let frame = encode_frame(snapshot)?;
        let sent = self.socket.send(&frame).await?;
        if sent != frame.len() {
            return Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::WriteZero,
                format!("short datagram: {} of {} bytes", sent, frame.len()),
            )));
        }
        Ok(())
    }
}

/// Receive frames on `bind` and log each decoded snapshot until shutdown
pub async fn listen(bind: &str, mut shutdown: broadcast::Receiver<()>) -> Result<()> {
    let socket = UdpSocket::bind(bind).await?;
    info!("Listening for snapshots on udp://{}", socket.local_addr()?);

    let mut buf = [0u8; 512];
    loop {
        tokio::select! {
            received = socket.recv_from(&mut buf) => {
                let (len, from) = match received {
                    Ok(received) => received,
                    Err(e) => {
                        warn!("UDP receive failed: {}", e);
                        continue;
                    }
                };
                match decode_frame(&buf[..len]) {
                    Ok(snapshot) => info!("{} {}", from, ConsoleTransport::format(&snapshot)),
                    Err(e) => warn!("Dropped datagram from {}: {}", from, e),
                }
            }
            _ = shutdown.recv() => {
                debug!("UDP receiver shutting down");
                break;
            }
        }
    }

    Ok(())
}
