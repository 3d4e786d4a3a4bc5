//! Error and trap definitions.
//!
//! This module defines the error handling surface of the simulator:
//! 1. **Traps:** Software conditions that halt the offending process only.
//! 2. **Memory Errors:** Allocation failures surfaced to the user.
//! 3. **Disk Errors:** Filesystem failures; these never disturb processes.
//! 4. **Kernel Errors:** The union type returned by shell-facing operations.
//!
//! Traps terminate the process that raised them and nothing else; filesystem
//! errors and invalid user commands leave all machine state untouched.

use thiserror::Error;

use super::addr::PhysAddr;

/// Software traps raised by the CPU during execution.
///
/// A trap halts the running process (the kernel deallocates it) and is
/// reported on the console. The scheduler and all other processes continue
/// unaffected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Trap {
    /// The fetched opcode byte is not part of the instruction set.
    ///
    /// The associated value is the invalid opcode byte. The display string is
    /// the exact console message shown to the user.
    #[error("ERR: {0:02X} is not a valid instruction. Halting program...")]
    InvalidInstruction(u8),

    /// A memory access fell outside the running process's partition.
    ///
    /// Carries the offending physical address and the partition base.
    #[error("ERR: access at {addr} is outside the partition at {base}. Halting program...")]
    BoundsViolation {
        /// The physical address that was rejected.
        addr: PhysAddr,
        /// Base of the partition the process is confined to.
        base: PhysAddr,
    },

    /// An increment would carry the staged byte past 0xFF.
    ///
    /// Raised by the read-modify-write increment when the staged value is
    /// already at the byte maximum.
    #[error("ERR: increment past 0xFF at {0}. Halting program...")]
    IncrementOverflow(PhysAddr),
}

/// Memory-management errors reported to the user; no process is created.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// The program image is larger than one partition.
    #[error("program of {len} bytes exceeds the {limit}-byte partition limit")]
    ProgramTooLarge {
        /// Length of the rejected program image.
        len: usize,
        /// The partition limit register value.
        limit: u16,
    },
}

/// Filesystem errors surfaced as printable messages; resident processes are
/// never disturbed by any of these.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DiskError {
    /// A file operation was attempted before the disk was formatted.
    #[error("disk is not formatted")]
    NotFormatted,

    /// `create` or `rename` targeted a filename that already exists.
    #[error("filename already in use: {0}")]
    NameInUse(String),

    /// No inactive directory entry or data block is available.
    #[error("disk is full")]
    NoSpace,

    /// No active directory entry matches the filename.
    #[error("file not found: {0}")]
    NotFound(String),

    /// The filename does not fit in a directory entry's data field.
    #[error("filename too long: {0}")]
    NameTooLong(String),
}

/// Errors returned by the kernel's shell-facing operations.
///
/// Invalid commands never mutate state; the variants wrap the subsystem
/// errors plus the argument-validation failures of the shell surface.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum KernelError {
    /// A bad flag or argument value (e.g. `quantum 0`, unknown schedule).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No registered process has the given pid.
    #[error("no process with pid {0}")]
    UnknownProcess(u32),

    /// The operation requires the target process to be freshly loaded.
    #[error("process {0} is not resident")]
    NotResident(u32),

    /// Memory management failure.
    #[error(transparent)]
    Memory(#[from] MemoryError),

    /// Filesystem failure.
    #[error(transparent)]
    Disk(#[from] DiskError),

    /// Program image validation failure.
    #[error(transparent)]
    Load(#[from] crate::sim::loader::LoadError),
}
