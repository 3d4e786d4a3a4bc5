//! The kernel context: every component, wired together explicitly.
//!
//! [`Kernel`] owns the machine (memory, disk, CPU, scheduler, memory
//! manager, console, and statistics) and is the only place they meet.
//! Components never reach each other through hidden state; every operation
//! threads the references it needs.
//!
//! The kernel exposes two surfaces:
//! 1. **The clock:** [`Kernel::pulse`] advances the machine one pulse and is
//!    the only way time passes. Each pulse is atomic: every shell-facing
//!    operation below runs between pulses.
//! 2. **Shell operations:** load/run/ps/kill and friends, plus disk
//!    passthroughs. These are the commands the (external) shell parser
//!    invokes; invalid arguments never mutate state.

/// The console collaborator trait and its implementations.
pub mod console;

use serde::Serialize;

use crate::common::constants::DEFAULT_PRIORITY;
use crate::common::error::KernelError;
use crate::config::{Config, ScheduleAlgorithm};
use crate::cpu::Cpu;
use crate::disk::DiskDriver;
use crate::mem::{MainMemory, MemoryManager};
use crate::proc::{ProcessLocation, ProcessState, Scheduler};
use crate::sim::loader;
use crate::stats::SimStats;

use console::Console;

/// One row of `ps` output.
#[derive(Clone, Debug, Serialize)]
pub struct ProcessReport {
    /// Process id.
    pub pid: u32,
    /// Lifecycle state.
    pub state: ProcessState,
    /// Where the program image lives.
    pub location: ProcessLocation,
    /// Scheduling priority.
    pub priority: u8,
    /// Saved (or live) program counter.
    pub pc: u16,
}

/// The operating system simulator.
pub struct Kernel {
    memory: MainMemory,
    disk: DiskDriver,
    cpu: Cpu,
    scheduler: Scheduler,
    manager: MemoryManager,
    console: Box<dyn Console>,
    stats: SimStats,
}

impl std::fmt::Debug for Kernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kernel")
            .field("running", &self.scheduler.running())
            .field("processes", &self.manager.processes().len())
            .field("formatted", &self.disk.is_formatted())
            .finish_non_exhaustive()
    }
}

impl Kernel {
    /// Builds a machine from configuration, writing output to `console`.
    pub fn new(config: &Config, console: Box<dyn Console>) -> Self {
        let memory = MainMemory::new(&config.memory);
        Self {
            cpu: Cpu::new(memory.partition_size()),
            memory,
            disk: DiskDriver::new(&config.disk),
            scheduler: Scheduler::new(config.scheduler.quantum, config.scheduler.algorithm),
            manager: MemoryManager::new(),
            console,
            stats: SimStats::default(),
        }
    }

    // --- clock ---------------------------------------------------------

    /// Advances the machine one clock pulse.
    ///
    /// Returns the pid that consumed the pulse, or `None` when the machine
    /// was idle.
    pub fn pulse(&mut self) -> Option<u32> {
        self.stats.pulses += 1;
        let pid = self.scheduler.tick(
            &mut self.cpu,
            &mut self.memory,
            &mut self.disk,
            &mut self.manager,
            self.console.as_mut(),
            &mut self.stats,
        );
        if pid.is_none() {
            self.stats.idle_pulses += 1;
        }
        pid
    }

    /// Pumps the clock until the scheduler goes idle or `max_pulses` pass.
    ///
    /// Returns the number of pulses delivered.
    pub fn run_until_idle(&mut self, max_pulses: u64) -> u64 {
        let mut delivered = 0;
        while delivered < max_pulses && !self.scheduler.is_idle() {
            let _ = self.pulse();
            delivered += 1;
        }
        delivered
    }

    // --- process operations --------------------------------------------

    /// Validates a hex program image and allocates a process for it.
    pub fn load(&mut self, source: &str, priority: Option<u8>) -> Result<u32, KernelError> {
        let program = loader::parse_program(source)?;
        self.manager.allocate(
            &mut self.memory,
            &mut self.disk,
            &program,
            priority.unwrap_or(DEFAULT_PRIORITY),
        )
    }

    /// Admits a resident process to the ready queue.
    pub fn run(&mut self, pid: u32) -> Result<(), KernelError> {
        let pcb = self
            .manager
            .pcb(pid)
            .ok_or(KernelError::UnknownProcess(pid))?;
        if pcb.state != ProcessState::Resident {
            return Err(KernelError::NotResident(pid));
        }
        self.scheduler.enqueue(&mut self.manager, pid)
    }

    /// Admits every resident process; returns the pids enqueued.
    pub fn run_all(&mut self) -> Vec<u32> {
        let pids: Vec<u32> = self
            .manager
            .processes()
            .iter()
            .filter(|p| p.state == ProcessState::Resident)
            .map(|p| p.pid)
            .collect();
        for pid in &pids {
            if let Err(err) = self.scheduler.enqueue(&mut self.manager, *pid) {
                tracing::error!(pid, %err, "runall could not enqueue process");
            }
        }
        pids
    }

    /// Reports every registered process.
    pub fn ps(&self) -> Vec<ProcessReport> {
        self.manager
            .processes()
            .iter()
            .map(|p| ProcessReport {
                pid: p.pid,
                state: p.state,
                location: p.location,
                priority: p.priority,
                pc: if self.scheduler.running() == Some(p.pid) {
                    self.cpu.pc
                } else {
                    p.registers.pc
                },
            })
            .collect()
    }

    /// Halts (if running) or extracts (if queued) a process, then
    /// deallocates it.
    pub fn kill(&mut self, pid: u32) -> Result<(), KernelError> {
        if self.manager.pcb(pid).is_none() {
            return Err(KernelError::UnknownProcess(pid));
        }
        if self.scheduler.take_running(pid) {
            self.cpu.is_executing = false;
        }
        self.scheduler.extract(pid);
        self.manager
            .deallocate(&mut self.memory, &mut self.disk, pid);
        tracing::debug!(pid, "process killed");
        Ok(())
    }

    /// Halts the running process, empties the queue, and deallocates every
    /// live process.
    pub fn kill_all(&mut self) {
        if let Some(pid) = self.scheduler.running() {
            let _ = self.scheduler.take_running(pid);
            self.cpu.is_executing = false;
        }
        self.scheduler.clear();
        let live: Vec<u32> = self
            .manager
            .processes()
            .iter()
            .filter(|p| p.is_live())
            .map(|p| p.pid)
            .collect();
        for pid in live {
            self.manager
                .deallocate(&mut self.memory, &mut self.disk, pid);
        }
        tracing::debug!("all processes killed");
    }

    /// Deallocates every live RAM-resident process.
    ///
    /// Refused while a process is running; queued processes being cleared
    /// are extracted from the ready queue as they go.
    pub fn clear_mem(&mut self) -> Result<(), KernelError> {
        if self.scheduler.running().is_some() {
            return Err(KernelError::InvalidArgument(
                "cannot clear memory while a process is running".into(),
            ));
        }
        let targets: Vec<u32> = self
            .manager
            .processes()
            .iter()
            .filter(|p| p.is_live() && p.location == ProcessLocation::Ram)
            .map(|p| p.pid)
            .collect();
        for pid in targets {
            self.scheduler.extract(pid);
            self.manager
                .deallocate(&mut self.memory, &mut self.disk, pid);
        }
        Ok(())
    }

    // --- scheduler configuration ---------------------------------------

    /// Sets the scheduling quantum; rejects values below 1.
    pub fn set_quantum(&mut self, quantum: u32) -> Result<(), KernelError> {
        if quantum < 1 {
            return Err(KernelError::InvalidArgument(
                "quantum must be at least 1".into(),
            ));
        }
        self.scheduler.set_quantum(quantum);
        Ok(())
    }

    /// The active scheduling algorithm.
    pub const fn schedule(&self) -> ScheduleAlgorithm {
        self.scheduler.algorithm()
    }

    /// Switches the scheduling algorithm.
    pub fn set_schedule(&mut self, algorithm: ScheduleAlgorithm) {
        self.scheduler.set_algorithm(&self.manager, algorithm);
    }

    // --- disk passthroughs ---------------------------------------------

    /// Formats the disk; `quick` preserves payload bytes.
    pub fn format(&mut self, quick: bool) -> Result<(), KernelError> {
        if quick {
            self.disk.format_quick()?;
        } else {
            self.disk.format();
        }
        self.stats.disk_writes += 1;
        Ok(())
    }

    /// Creates an empty file.
    pub fn create_file(&mut self, name: &str) -> Result<(), KernelError> {
        self.disk.create(name)?;
        self.stats.disk_writes += 1;
        Ok(())
    }

    /// Reads a file's contents.
    pub fn read_file(&mut self, name: &str) -> Result<String, KernelError> {
        let contents = self.disk.read(name)?;
        self.stats.disk_reads += 1;
        Ok(contents)
    }

    /// Writes a file's contents.
    pub fn write_file(&mut self, name: &str, data: &str) -> Result<(), KernelError> {
        self.disk.write(name, data)?;
        self.stats.disk_writes += 1;
        Ok(())
    }

    /// Deletes a file.
    pub fn delete_file(&mut self, name: &str) -> Result<(), KernelError> {
        self.disk.delete(name)?;
        self.stats.disk_writes += 1;
        Ok(())
    }

    /// Copies a file.
    pub fn copy_file(&mut self, existing: &str, new: &str) -> Result<(), KernelError> {
        self.disk.copy(existing, new)?;
        self.stats.disk_reads += 1;
        self.stats.disk_writes += 1;
        Ok(())
    }

    /// Renames a file.
    pub fn rename_file(&mut self, old: &str, new: &str) -> Result<(), KernelError> {
        self.disk.rename(old, new)?;
        self.stats.disk_writes += 1;
        Ok(())
    }

    /// Lists filenames; hidden entries only with `show_hidden`.
    pub fn list_files(&mut self, show_hidden: bool) -> Result<Vec<String>, KernelError> {
        let names = self.disk.ls(show_hidden)?;
        self.stats.disk_reads += 1;
        Ok(names)
    }

    // --- component access ----------------------------------------------

    /// Physical memory, read-only.
    pub const fn memory(&self) -> &MainMemory {
        &self.memory
    }

    /// The disk driver, read-only.
    pub const fn disk(&self) -> &DiskDriver {
        &self.disk
    }

    /// The CPU, read-only.
    pub const fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    /// The scheduler, read-only.
    pub const fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// The memory manager and process registry, read-only.
    pub const fn manager(&self) -> &MemoryManager {
        &self.manager
    }

    /// Run statistics so far.
    pub const fn stats(&self) -> &SimStats {
        &self.stats
    }
}
