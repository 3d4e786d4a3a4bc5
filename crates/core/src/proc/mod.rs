//! Processes: control blocks and the CPU scheduler.
//!
//! 1. **[`Pcb`]:** saved register file plus process metadata; the single
//!    source of truth for a process's lifecycle state.
//! 2. **[`Scheduler`]:** the ready queue, quantum accounting, context
//!    switching, and the swap-in/out protocol for disk-resident processes.

/// Process Control Blocks and lifecycle states.
pub mod pcb;

/// The CPU scheduler.
pub mod scheduler;

pub use pcb::{Pcb, ProcessLocation, ProcessState};
pub use scheduler::Scheduler;
