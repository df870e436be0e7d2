// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! File transport - appends snapshots to a JSON lines or CSV file

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use tracing::info;

use super::{ExportFormat, Transport};
use crate::core::Snapshot;
use crate::error::TransportError;

const CSV_HEADER: &str = "sequence,timestamp,temperature,humidity,luminosity,gas,distance,\
accel_x,accel_y,accel_z,gyro_x,gyro_y,gyro_z";

/// Snapshot exporter
pub struct FileTransport {
    path: PathBuf,
    format: ExportFormat,
    writer: Arc<Mutex<Option<BufWriter<File>>>>,
}

impl FileTransport {
    pub fn new(dir: &str, format: ExportFormat) -> Result<Self> {
        let dir = PathBuf::from(dir);
        std::fs::create_dir_all(&dir)?;

        let ext = match format {
            ExportFormat::Json => "jsonl",
            ExportFormat::Csv => "csv",
        };
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("snapshots_{}.{}", timestamp, ext));
        info!("Exporting snapshots to {:?}", path);

        Ok(Self {
            path,
            format,
            writer: Arc::new(Mutex::new(None)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn line(&self, snapshot: &Snapshot) -> Result<String, TransportError> {
        match self.format {
            ExportFormat::Json => {
                serde_json::to_string(snapshot).map_err(|e| TransportError::Encode(e.to_string()))
            }
            ExportFormat::Csv => {
                let r = &snapshot.record;
                Ok(format!(
                    "{},{},{},{},{},{},{},{},{},{},{},{},{}",
                    snapshot.sequence,
                    snapshot.taken_at().to_rfc3339(),
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
                ))
            }
        }
    }
}

#[async_trait]
impl Transport for FileTransport {
    fn name(&self) -> &str {
        "file"
    }

    async fn send(&self, snapshot: &Snapshot) -> Result<(), TransportError> {
        let line = self.line(snapshot)?;
        let writer = self.writer.clone();
        let path = self.path.clone();
        let format = self.format;

        // offload blocking file io
        tokio::task::spawn_blocking(move || append(&writer, &path, format, &line))
            .await
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, format!("task join error: {}", e)))??;
        Ok(())
    }
}

fn open(path: &Path, format: ExportFormat) -> std::io::Result<BufWriter<File>> {
    let existed = path.exists();
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = BufWriter::new(file);
    if format == ExportFormat::Csv && !existed {
        writeln!(writer, "{}", CSV_HEADER)?;
    }
    Ok(writer)
}

fn append(
    writer: &Mutex<Option<BufWriter<File>>>,
    path: &Path,
    format: ExportFormat,
    line: &str,
) -> std::io::Result<()> {
    let mut guard = writer.lock();
    if guard.is_none() {
        *guard = Some(open(path, format)?);
    }
    if let Some(writer) = guard.as_mut() {
        writeln!(writer, "{}", line)?;
        writer.flush()?;
    }
    Ok(())
}
