//! Process Control Blocks.
//!
//! One [`Pcb`] exists per registered process, from `load` until the end of
//! the run (terminated PCBs stay in the registry for `ps`). The PCB is where
//! CPU state lives whenever the process is not running; the scheduler
//! snapshots into and restores out of it on every context switch.

use std::fmt;

use serde::Serialize;

use crate::common::addr::PhysAddr;
use crate::cpu::{Cpu, RegisterSet};

/// Process lifecycle state.
///
/// Transitions are performed only by the scheduler and the kernel's halt
/// path: `Resident → Ready → Running → {Ready, Terminated}`. A terminated
/// PCB never leaves that state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ProcessState {
    /// Loaded and registered, not yet scheduled.
    Resident,
    /// In the ready queue.
    Ready,
    /// Currently on the CPU.
    Running,
    /// Halted, killed, or trapped; final.
    Terminated,
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resident => write!(f, "RESIDENT"),
            Self::Ready => write!(f, "READY"),
            Self::Running => write!(f, "RUNNING"),
            Self::Terminated => write!(f, "TERMINATED"),
        }
    }
}

/// Where a process's program image currently lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ProcessLocation {
    /// In a memory partition.
    Ram,
    /// In a swap file on disk.
    Disk,
}

impl fmt::Display for ProcessLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ram => write!(f, "RAM"),
            Self::Disk => write!(f, "DSK"),
        }
    }
}

/// A Process Control Block.
#[derive(Clone, Debug)]
pub struct Pcb {
    /// Process id, unique and monotonically increasing across the run.
    pub pid: u32,
    /// Partition base while RAM-resident; `None` while swapped to disk.
    pub base: Option<PhysAddr>,
    /// Program image location.
    pub location: ProcessLocation,
    /// Lifecycle state.
    pub state: ProcessState,
    /// Saved CPU registers.
    pub registers: RegisterSet,
    /// Scheduling priority; lower value runs first under `PRIORITY`.
    pub priority: u8,
    /// CPU pulses consumed in the current dispatch (scheduler-internal).
    pub quantum_used: u32,
    /// Monotonic sequence number of the last dispatch; 0 = never dispatched.
    /// Drives least-recently-dispatched swap-victim selection.
    pub last_dispatch: u64,
}

impl Pcb {
    /// Creates a freshly loaded, resident PCB with cleared registers.
    pub fn new(pid: u32, base: Option<PhysAddr>, location: ProcessLocation, priority: u8) -> Self {
        Self {
            pid,
            base,
            location,
            state: ProcessState::Resident,
            registers: RegisterSet::default(),
            priority,
            quantum_used: 0,
            last_dispatch: 0,
        }
    }

    /// Copies the CPU's register file into this PCB.
    pub fn snapshot(&mut self, cpu: &Cpu) {
        self.registers = cpu.save_context();
    }

    /// Returns the saved registers for loading into the CPU.
    pub const fn restore(&self) -> RegisterSet {
        self.registers
    }

    /// Sets the lifecycle state.
    ///
    /// Termination is final: a state change away from
    /// [`ProcessState::Terminated`] is a logic error and is ignored with a
    /// trace event rather than corrupting the registry.
    pub fn set_state(&mut self, state: ProcessState) {
        if self.state == ProcessState::Terminated && state != ProcessState::Terminated {
            tracing::error!(pid = self.pid, ?state, "state change on a terminated process");
            return;
        }
        self.state = state;
    }

    /// `true` unless the process has terminated.
    pub fn is_live(&self) -> bool {
        self.state != ProcessState::Terminated
    }
}
