//! The CPU scheduler.
//!
//! Orders READY processes, dispatches them into the CPU, and counts quantum
//! pulses. Three policies:
//!
//! | Algorithm     | Ordering                          | Preempts on quantum |
//! |---------------|-----------------------------------|---------------------|
//! | `ROUND ROBIN` | FIFO                              | yes                 |
//! | `FCFS`        | FIFO                              | no                  |
//! | `PRIORITY`    | ascending priority, FIFO on ties  | no                  |
//!
//! Dispatching a disk-resident process triggers the swap protocol: the
//! least-recently-dispatched RAM-resident process (never the running one) is
//! swapped out first, then the incoming image is swapped into the freed
//! partition; only then is CPU state loaded.

use std::collections::VecDeque;

use crate::common::error::KernelError;
use crate::config::ScheduleAlgorithm;
use crate::cpu::{Cpu, PulseOutcome};
use crate::disk::DiskDriver;
use crate::kernel::console::Console;
use crate::mem::{MainMemory, MemoryManager};
use crate::proc::{ProcessLocation, ProcessState};
use crate::stats::SimStats;

/// The ready queue, quantum accounting, and context switching.
#[derive(Debug)]
pub struct Scheduler {
    ready: VecDeque<u32>,
    running: Option<u32>,
    quantum: u32,
    algorithm: ScheduleAlgorithm,
    dispatch_seq: u64,
}

impl Scheduler {
    /// Creates an idle scheduler.
    pub const fn new(quantum: u32, algorithm: ScheduleAlgorithm) -> Self {
        Self {
            ready: VecDeque::new(),
            running: None,
            quantum,
            algorithm,
            dispatch_seq: 0,
        }
    }

    /// The pid currently on the CPU, if any.
    pub const fn running(&self) -> Option<u32> {
        self.running
    }

    /// Pids waiting in the ready queue, in dispatch order.
    pub fn ready_queue(&self) -> impl Iterator<Item = u32> + '_ {
        self.ready.iter().copied()
    }

    /// `true` when nothing is running and nothing is queued.
    pub fn is_idle(&self) -> bool {
        self.running.is_none() && self.ready.is_empty()
    }

    /// The current quantum.
    pub const fn quantum(&self) -> u32 {
        self.quantum
    }

    /// Sets the quantum. Validation (`n >= 1`) happens at the kernel surface.
    pub const fn set_quantum(&mut self, quantum: u32) {
        self.quantum = quantum;
    }

    /// The active scheduling algorithm.
    pub const fn algorithm(&self) -> ScheduleAlgorithm {
        self.algorithm
    }

    /// Switches the scheduling algorithm.
    ///
    /// A queue built under another policy is reordered to match: switching
    /// to `PRIORITY` stably re-sorts the queue by priority.
    pub fn set_algorithm(&mut self, manager: &MemoryManager, algorithm: ScheduleAlgorithm) {
        self.algorithm = algorithm;
        if algorithm == ScheduleAlgorithm::Priority {
            let mut pids: Vec<u32> = self.ready.iter().copied().collect();
            pids.sort_by_key(|pid| manager.pcb(*pid).map_or(u8::MAX, |p| p.priority));
            self.ready = pids.into();
        }
    }

    /// Admits a process to the ready queue.
    ///
    /// The PCB must be resident (first run) or ready (re-enqueue after
    /// preemption). Disk-resident processes queue like any other and are
    /// swapped in at dispatch.
    pub fn enqueue(&mut self, manager: &mut MemoryManager, pid: u32) -> Result<(), KernelError> {
        let algorithm = self.algorithm;
        let insert_at = self.priority_slot(manager, pid, algorithm);
        let pcb = manager.pcb_mut(pid).ok_or(KernelError::UnknownProcess(pid))?;
        match pcb.state {
            ProcessState::Resident | ProcessState::Ready => {}
            _ => return Err(KernelError::NotResident(pid)),
        }
        pcb.set_state(ProcessState::Ready);
        match insert_at {
            Some(i) => self.ready.insert(i, pid),
            None => self.ready.push_back(pid),
        }
        tracing::debug!(pid, "process enqueued");
        Ok(())
    }

    /// Where the pid belongs in the queue under the given policy.
    ///
    /// FIFO policies append; `PRIORITY` inserts before the first entry with
    /// a strictly greater priority value, keeping ties in arrival order.
    fn priority_slot(
        &self,
        manager: &MemoryManager,
        pid: u32,
        algorithm: ScheduleAlgorithm,
    ) -> Option<usize> {
        if algorithm != ScheduleAlgorithm::Priority {
            return None;
        }
        let priority = manager.pcb(pid).map_or(u8::MAX, |p| p.priority);
        self.ready
            .iter()
            .position(|q| manager.pcb(*q).map_or(u8::MAX, |p| p.priority) > priority)
    }

    /// Removes a process from the ready queue (the `kill` path).
    pub fn extract(&mut self, pid: u32) {
        self.ready.retain(|p| *p != pid);
    }

    /// Empties the ready queue without touching the running process.
    pub fn clear(&mut self) {
        self.ready.clear();
    }

    /// Clears the running slot if it holds the given pid (the `kill` path);
    /// returns whether it did.
    pub fn take_running(&mut self, pid: u32) -> bool {
        if self.running == Some(pid) {
            self.running = None;
            true
        } else {
            false
        }
    }

    /// One clock pulse: dispatch if idle, step the CPU, handle halt and
    /// quantum expiry. Returns the pid that consumed the pulse, or `None`
    /// when the machine is idle.
    pub fn tick(
        &mut self,
        cpu: &mut Cpu,
        mem: &mut MainMemory,
        disk: &mut DiskDriver,
        manager: &mut MemoryManager,
        console: &mut dyn Console,
        stats: &mut SimStats,
    ) -> Option<u32> {
        if self.running.is_none() && !self.ready.is_empty() {
            self.dispatch(cpu, mem, disk, manager, console, stats);
        }
        let pid = self.running?;

        let outcome = cpu.pulse(mem, console);
        if let Some(pcb) = manager.pcb_mut(pid) {
            pcb.quantum_used += 1;
        }

        match outcome {
            Err(trap) => {
                stats.traps_taken += 1;
                tracing::error!(pid, %trap, "trap; halting process");
                if console.current_x() > 0 {
                    console.advance_line();
                }
                console.put_text(&trap.to_string());
                console.advance_line();
                manager.deallocate(mem, disk, pid);
                self.running = None;
            }
            Ok(PulseOutcome::Halted) => {
                stats.instructions_retired += 1;
                tracing::debug!(pid, "process halted");
                manager.deallocate(mem, disk, pid);
                self.running = None;
            }
            Ok(PulseOutcome::Retired) => {
                stats.instructions_retired += 1;
                self.preempt_if_expired(cpu, manager, pid);
            }
        }
        Some(pid)
    }

    /// Under a preempting policy, rotates an expired process back into the
    /// ready queue when someone else is waiting.
    fn preempt_if_expired(&mut self, cpu: &Cpu, manager: &mut MemoryManager, pid: u32) {
        if !self.algorithm.preempts() || self.ready.is_empty() {
            return;
        }
        let expired = manager
            .pcb(pid)
            .is_some_and(|p| p.quantum_used >= self.quantum);
        if !expired {
            return;
        }
        if let Some(pcb) = manager.pcb_mut(pid) {
            pcb.snapshot(cpu);
            pcb.set_state(ProcessState::Ready);
        }
        self.running = None;
        if let Err(err) = self.enqueue(manager, pid) {
            tracing::error!(pid, %err, "failed to re-enqueue preempted process");
        }
        tracing::debug!(pid, "quantum expired; process preempted");
    }

    /// Pops ready processes until one dispatches.
    ///
    /// Swap-in failures terminate the affected process with a console
    /// message and move on to the next candidate; they never stall the
    /// machine.
    fn dispatch(
        &mut self,
        cpu: &mut Cpu,
        mem: &mut MainMemory,
        disk: &mut DiskDriver,
        manager: &mut MemoryManager,
        console: &mut dyn Console,
        stats: &mut SimStats,
    ) {
        while let Some(pid) = self.ready.pop_front() {
            // Terminated PCBs are never dispatched, whatever the queue says.
            if !manager.pcb(pid).is_some_and(super::Pcb::is_live) {
                continue;
            }
            if let Err(err) = self.stage_resident(mem, disk, manager, pid, stats) {
                tracing::error!(pid, %err, "swap-in failed; terminating process");
                if console.current_x() > 0 {
                    console.advance_line();
                }
                console.put_text(&format!("ERR: could not swap in process {pid}: {err}"));
                console.advance_line();
                manager.deallocate(mem, disk, pid);
                continue;
            }

            let Some(pcb) = manager.pcb_mut(pid) else {
                continue;
            };
            let Some(base) = pcb.base else {
                continue;
            };
            pcb.set_state(ProcessState::Running);
            pcb.quantum_used = 0;
            self.dispatch_seq += 1;
            pcb.last_dispatch = self.dispatch_seq;
            cpu.load_context(pcb.restore(), base);
            self.running = Some(pid);
            stats.context_switches += 1;
            tracing::debug!(pid, %base, "process dispatched");
            return;
        }
    }

    /// Ensures the process's image is in a partition, swapping as needed.
    ///
    /// Swap-out of the victim strictly precedes swap-in of the incoming
    /// process; both complete before any CPU state is loaded.
    fn stage_resident(
        &mut self,
        mem: &mut MainMemory,
        disk: &mut DiskDriver,
        manager: &mut MemoryManager,
        pid: u32,
        stats: &mut SimStats,
    ) -> Result<(), KernelError> {
        let on_disk = manager
            .pcb(pid)
            .ok_or(KernelError::UnknownProcess(pid))?
            .location
            == ProcessLocation::Disk;
        if !on_disk {
            return Ok(());
        }

        if manager.free_partition(mem).is_none() {
            let victim = manager
                .swap_victim(self.running)
                .ok_or_else(|| KernelError::InvalidArgument("no swappable partition".into()))?;
            manager.swap_out(mem, disk, victim)?;
            stats.swaps_out += 1;
        }
        let base = manager
            .free_partition(mem)
            .ok_or_else(|| KernelError::InvalidArgument("no free partition after swap".into()))?;
        manager.swap_in(mem, disk, pid, base)?;
        stats.swaps_in += 1;
        Ok(())
    }
}
