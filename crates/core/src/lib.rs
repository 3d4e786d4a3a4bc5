//! Pedagogical operating-system simulator library.
//!
//! This crate implements a small operating system over a simulated machine:
//! 1. **CPU:** a single-accumulator, 6502-like core with an explicit
//!    seven-step pipeline and software-interrupt syscalls.
//! 2. **Memory:** a byte-addressed store carved into fixed partitions, with
//!    logical-to-physical translation through a dedicated MAR.
//! 3. **Disk:** a track/sector/block store carrying a directory track and
//!    chained data blocks, with swap files for overflowing processes.
//! 4. **Scheduling:** Round-Robin, FCFS, and non-preemptive Priority, with
//!    context switching through Process Control Blocks.
//!
//! The [`Kernel`] ties the components together; an external clock drives it
//! one pulse at a time and an external shell invokes its operations.

/// Common types and constants (addresses, geometry, errors).
pub mod common;
/// Machine configuration (defaults, enums, hierarchical structures).
pub mod config;
/// CPU core: registers, pipeline, syscalls.
pub mod cpu;
/// Disk device driver: TSB store, directory, chained files.
pub mod disk;
/// Instruction set architecture: opcodes and encoding.
pub mod isa;
/// The kernel context and the console collaborator.
pub mod kernel;
/// Memory: byte array, accessor/MAR, partition manager.
pub mod mem;
/// Processes: control blocks and the scheduler.
pub mod proc;
/// Simulation support: program-image loading.
pub mod sim;
/// Run statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Main CPU type; owns the MAR and the running partition window.
pub use crate::cpu::Cpu;
/// The disk device driver.
pub use crate::disk::DiskDriver;
/// Top-level kernel; owns every component and serves the shell.
pub use crate::kernel::Kernel;
