//! # Telemetry Module
//!
//! Journals link status and key referee telemetry to JSONL files.
//!
//! This module handles:
//! - Periodic snapshots of the state store
//! - Formatting as JSONL (JSON Lines)
//! - Writing to rotating journal segments (max N records per segment)
//! - Retaining only the last M segments

use chrono::Utc;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::TelemetryConfig;
use crate::error::Result;
use crate::referee::protocol::{LinkStatus, RefereeState};

/// One journaled line
#[derive(Debug, Serialize)]
pub struct TelemetrySnapshot {
    pub timestamp: String,
    pub link: &'static str,
    pub robot_id: u8,
    pub remain_hp: u16,
    pub chassis_watt: f32,
    pub power_buffer_j: u16,
    pub heat_17_id1: u16,
    pub heat_42: u16,
    pub last_speed_mps: f32,
}

impl TelemetrySnapshot {
    /// Condense the state store into one journal line
    pub fn capture(state: &RefereeState) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            link: match state.status {
                LinkStatus::Running => "running",
                LinkStatus::Offline => "offline",
            },
            robot_id: state.robot_status.robot_id,
            remain_hp: state.robot_status.remain_hp,
            chassis_watt: state.power_heat.chassis_watt,
            power_buffer_j: state.power_heat.power_buffer_j,
            heat_17_id1: state.power_heat.heat_17_id1,
            heat_42: state.power_heat.heat_42,
            last_speed_mps: state.launcher_data.speed_mps,
        }
    }
}

/// Rotating JSONL journal writer
pub struct TelemetryLogger {
    dir: PathBuf,
    max_records_per_file: usize,
    max_files_to_keep: usize,
    writer: BufWriter<File>,
    records_in_file: usize,
    next_segment: u32,
}

impl std::fmt::Debug for TelemetryLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryLogger")
            .field("dir", &self.dir)
            .field("records_in_file", &self.records_in_file)
            .finish_non_exhaustive()
    }
}

impl TelemetryLogger {
    /// Create the journal directory and open the first segment
    ///
    /// # Errors
    ///
    /// Returns error if the directory or segment file cannot be created
    pub fn new(config: &TelemetryConfig) -> Result<Self> {
        fs::create_dir_all(&config.log_dir)?;
        let dir = PathBuf::from(&config.log_dir);
        let writer = Self::open_segment(&dir, 0)?;

        Ok(Self {
            dir,
            max_records_per_file: config.max_records_per_file,
            max_files_to_keep: config.max_files_to_keep,
            writer,
            records_in_file: 0,
            next_segment: 1,
        })
    }

    /// Append one snapshot, rotating the segment when it fills up
    ///
    /// # Errors
    ///
    /// Returns error on serialization or write failure
    pub fn log(&mut self, snapshot: &TelemetrySnapshot) -> Result<()> {
        let line = serde_json::to_string(snapshot)?;
        writeln!(self.writer, "{}", line)?;
        self.writer.flush()?;
        self.records_in_file += 1;

        if self.records_in_file >= self.max_records_per_file {
            self.rotate()?;
        }
        Ok(())
    }

    fn rotate(&mut self) -> Result<()> {
        self.writer = Self::open_segment(&self.dir, self.next_segment)?;
        self.next_segment += 1;
        self.records_in_file = 0;
        self.prune()
    }

    fn open_segment(dir: &Path, index: u32) -> Result<BufWriter<File>> {
        let name = format!(
            "referee-{}-{:04}.jsonl",
            Utc::now().format("%Y%m%d-%H%M%S"),
            index
        );
        let file = File::create(dir.join(name))?;
        Ok(BufWriter::new(file))
    }

    /// Delete the oldest segments beyond the retention limit
    fn prune(&self) -> Result<()> {
        let mut segments: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().map_or(false, |ext| ext == "jsonl"))
            .collect();
        segments.sort();

        while segments.len() > self.max_files_to_keep {
            let oldest = segments.remove(0);
            debug!("Pruning telemetry segment {}", oldest.display());
            fs::remove_file(oldest)?;
        }
        Ok(())
    }
}
