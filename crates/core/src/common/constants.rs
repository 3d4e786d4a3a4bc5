//! Canonical machine geometry and default constants.
//!
//! These values define the baseline machine when not overridden through
//! [`crate::config::Config`]: three 256-byte memory partitions, a 4-track
//! disk with 8 sectors of 8 blocks each, and a 6-pulse scheduling quantum.

/// Size of one memory partition in bytes (the limit register).
pub const PARTITION_SIZE: u16 = 0x100;

/// Number of fixed-size memory partitions.
pub const PARTITION_COUNT: usize = 3;

/// Total bytes of physical memory (partition size × partition count).
pub const MEMORY_SIZE: usize = PARTITION_SIZE as usize * PARTITION_COUNT;

/// Default scheduling quantum in CPU pulses.
pub const DEFAULT_QUANTUM: u32 = 6;

/// Default process priority (lower value = higher priority).
pub const DEFAULT_PRIORITY: u8 = 32;

/// Number of disk tracks. Track 0 is the directory.
pub const DISK_TRACKS: u8 = 4;

/// Number of sectors per track.
pub const DISK_SECTORS: u8 = 8;

/// Number of blocks per sector.
pub const DISK_BLOCKS: u8 = 8;

/// Payload bytes per disk block.
pub const BLOCK_DATA_LEN: usize = 60;

/// Prefix of the hidden swap file created for disk-resident processes.
///
/// The full name is `.process<PID>.swp`. This naming convention is the
/// contract between the memory manager and the disk driver; both sides go
/// through [`swap_file_name`].
pub const SWAP_FILE_PREFIX: &str = ".process";

/// Suffix of the hidden swap file created for disk-resident processes.
pub const SWAP_FILE_SUFFIX: &str = ".swp";

/// Builds the swap-file name for a process id.
pub fn swap_file_name(pid: u32) -> String {
    format!("{SWAP_FILE_PREFIX}{pid}{SWAP_FILE_SUFFIX}")
}
