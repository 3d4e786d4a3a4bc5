//! Configuration system for the OS simulator.
//!
//! This module defines all configuration structures and enums used to
//! parameterize the simulated machine. It provides:
//! 1. **Defaults:** The canonical machine (3×256-byte partitions, 4×8×8 disk).
//! 2. **Structures:** Hierarchical config for memory, disk, and scheduling.
//! 3. **Enums:** The scheduling algorithm selector with its shell spellings.
//!
//! Configuration is supplied as JSON (the CLI's `--config`) or via
//! `Config::default()`.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::common::constants;

/// Scheduling algorithm selector.
///
/// Determines ready-queue ordering and whether quantum expiry preempts the
/// running process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleAlgorithm {
    /// FIFO ordering with preemption on quantum expiry.
    #[default]
    #[serde(alias = "ROUND ROBIN", alias = "RoundRobin")]
    RoundRobin,
    /// FIFO ordering, run-to-completion (no preemption).
    #[serde(alias = "Fcfs")]
    Fcfs,
    /// Sorted ascending by priority (FIFO among equals), run-to-completion.
    #[serde(alias = "Priority")]
    Priority,
}

impl ScheduleAlgorithm {
    /// Returns `true` if quantum expiry preempts the running process.
    pub const fn preempts(self) -> bool {
        matches!(self, Self::RoundRobin)
    }
}

impl fmt::Display for ScheduleAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RoundRobin => write!(f, "ROUND ROBIN"),
            Self::Fcfs => write!(f, "FCFS"),
            Self::Priority => write!(f, "PRIORITY"),
        }
    }
}

impl FromStr for ScheduleAlgorithm {
    type Err = String;

    /// Parses the shell spellings of the algorithm names, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ROUND ROBIN" | "ROUND_ROBIN" | "RR" => Ok(Self::RoundRobin),
            "FCFS" => Ok(Self::Fcfs),
            "PRIORITY" => Ok(Self::Priority),
            other => Err(format!("unknown schedule algorithm: {other}")),
        }
    }
}

/// Root configuration structure containing all machine settings.
///
/// # Examples
///
/// Creating a default configuration:
///
/// ```
/// use osim_core::config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.memory.partition_count, 3);
/// assert_eq!(config.disk.tracks, 4);
/// ```
///
/// Deserializing from JSON (typical CLI usage):
///
/// ```
/// use osim_core::config::{Config, ScheduleAlgorithm};
///
/// let json = r#"{
///     "memory": { "partition_size": 256, "partition_count": 3 },
///     "disk": { "tracks": 4, "sectors": 8, "blocks": 8, "block_data_len": 60 },
///     "scheduler": { "quantum": 2, "algorithm": "FCFS" }
/// }"#;
///
/// let config: Config = serde_json::from_str(json).unwrap();
/// assert_eq!(config.scheduler.quantum, 2);
/// assert_eq!(config.scheduler.algorithm, ScheduleAlgorithm::Fcfs);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Physical memory and partition geometry.
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Disk geometry.
    #[serde(default)]
    pub disk: DiskConfig,
    /// Scheduler parameters.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// Physical memory and partition geometry.
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    /// Bytes per partition (the limit register).
    #[serde(default = "MemoryConfig::default_partition_size")]
    pub partition_size: u16,

    /// Number of fixed-size partitions.
    #[serde(default = "MemoryConfig::default_partition_count")]
    pub partition_count: usize,
}

impl MemoryConfig {
    /// Returns the canonical partition size.
    fn default_partition_size() -> u16 {
        constants::PARTITION_SIZE
    }

    /// Returns the canonical partition count.
    fn default_partition_count() -> usize {
        constants::PARTITION_COUNT
    }

    /// Total bytes of physical memory described by this configuration.
    pub const fn total_bytes(&self) -> usize {
        self.partition_size as usize * self.partition_count
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            partition_size: constants::PARTITION_SIZE,
            partition_count: constants::PARTITION_COUNT,
        }
    }
}

/// Disk geometry: tracks × sectors × blocks, with a fixed payload per block.
#[derive(Debug, Clone, Deserialize)]
pub struct DiskConfig {
    /// Number of tracks; track 0 is the directory.
    #[serde(default = "DiskConfig::default_tracks")]
    pub tracks: u8,

    /// Sectors per track.
    #[serde(default = "DiskConfig::default_sectors")]
    pub sectors: u8,

    /// Blocks per sector.
    #[serde(default = "DiskConfig::default_blocks")]
    pub blocks: u8,

    /// Payload bytes per block.
    #[serde(default = "DiskConfig::default_block_data_len")]
    pub block_data_len: usize,
}

impl DiskConfig {
    /// Returns the canonical track count.
    fn default_tracks() -> u8 {
        constants::DISK_TRACKS
    }

    /// Returns the canonical sector count.
    fn default_sectors() -> u8 {
        constants::DISK_SECTORS
    }

    /// Returns the canonical block count.
    fn default_blocks() -> u8 {
        constants::DISK_BLOCKS
    }

    /// Returns the canonical per-block payload size.
    fn default_block_data_len() -> usize {
        constants::BLOCK_DATA_LEN
    }
}

impl Default for DiskConfig {
    fn default() -> Self {
        Self {
            tracks: constants::DISK_TRACKS,
            sectors: constants::DISK_SECTORS,
            blocks: constants::DISK_BLOCKS,
            block_data_len: constants::BLOCK_DATA_LEN,
        }
    }
}

/// Scheduler parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// CPU pulses per quantum (must be at least 1).
    #[serde(default = "SchedulerConfig::default_quantum")]
    pub quantum: u32,

    /// Initial scheduling algorithm.
    #[serde(default)]
    pub algorithm: ScheduleAlgorithm,
}

impl SchedulerConfig {
    /// Returns the canonical quantum.
    fn default_quantum() -> u32 {
        constants::DEFAULT_QUANTUM
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            quantum: constants::DEFAULT_QUANTUM,
            algorithm: ScheduleAlgorithm::default(),
        }
    }
}
