//! The Memory Manager: partition allocation and disk-backed overflow.
//!
//! The manager owns the process registry (every PCB ever created this run)
//! and decides where a new program lives:
//! 1. **RAM:** the first free partition, scanned in base-address order. A
//!    partition is free iff its base byte reads 0x00 *and* no live PCB
//!    claims it; process lifetime is the source of truth, the zero-byte
//!    scan is advisory.
//! 2. **Disk:** when every partition is occupied, the program image is
//!    written to a hidden swap file (`.process<PID>.swp`) as hex tokens and
//!    the PCB is created disk-resident.
//!
//! The same swap-file machinery serves the scheduler's swap-in/out protocol
//! at dispatch time.

use crate::common::addr::PhysAddr;
use crate::common::constants::swap_file_name;
use crate::common::error::{DiskError, KernelError, MemoryError};
use crate::disk::DiskDriver;
use crate::proc::{Pcb, ProcessLocation, ProcessState};
use crate::sim::loader;

use super::accessor::MemoryAccessor;
use super::memory::MainMemory;

/// Partition allocation, the PCB registry, and swap files.
#[derive(Debug, Default)]
pub struct MemoryManager {
    next_pid: u32,
    processes: Vec<Pcb>,
}

impl MemoryManager {
    /// Creates a manager with an empty registry.
    pub const fn new() -> Self {
        Self {
            next_pid: 0,
            processes: Vec::new(),
        }
    }

    /// Every registered PCB, in creation order.
    pub fn processes(&self) -> &[Pcb] {
        &self.processes
    }

    /// Looks up a PCB by pid.
    pub fn pcb(&self, pid: u32) -> Option<&Pcb> {
        self.processes.iter().find(|p| p.pid == pid)
    }

    /// Looks up a PCB by pid, mutably.
    pub fn pcb_mut(&mut self, pid: u32) -> Option<&mut Pcb> {
        self.processes.iter_mut().find(|p| p.pid == pid)
    }

    /// `true` iff some partition base reads 0x00.
    pub fn has_free_partition(&self, mem: &MainMemory) -> bool {
        self.free_partition(mem).is_some()
    }

    /// First free partition in base-address order.
    ///
    /// Free means the base byte is zero and no live process claims the
    /// partition.
    pub fn free_partition(&self, mem: &MainMemory) -> Option<PhysAddr> {
        mem.partition_bases()
            .iter()
            .copied()
            .find(|base| {
                MemoryAccessor::read_immediate(mem, *base) == 0
                    && !self
                        .processes
                        .iter()
                        .any(|p| p.is_live() && p.base == Some(*base))
            })
    }

    /// Allocates a process for a program image.
    ///
    /// Installs into the first free partition, or creates a disk-resident
    /// PCB with a swap file when memory is full. Returns the new pid. On
    /// any failure no PCB is registered.
    pub fn allocate(
        &mut self,
        mem: &mut MainMemory,
        disk: &mut DiskDriver,
        program: &[u8],
        priority: u8,
    ) -> Result<u32, KernelError> {
        let limit = mem.partition_size();
        if program.len() > limit as usize {
            return Err(MemoryError::ProgramTooLarge {
                len: program.len(),
                limit,
            }
            .into());
        }

        let pid = self.next_pid;
        let pcb = if let Some(base) = self.free_partition(mem) {
            MemoryAccessor::write_program(mem, program, base, limit)?;
            tracing::debug!(pid, %base, "process loaded into partition");
            Pcb::new(pid, Some(base), ProcessLocation::Ram, priority)
        } else {
            Self::write_swap_file(disk, pid, program)?;
            tracing::debug!(pid, "memory full; process loaded to disk");
            Pcb::new(pid, None, ProcessLocation::Disk, priority)
        };

        self.next_pid += 1;
        self.processes.push(pcb);
        Ok(pid)
    }

    /// Terminates a process and releases its storage.
    ///
    /// Zeroes the partition of a RAM-resident process, deletes the swap file
    /// of a disk-resident one. Idempotent on already-terminated PCBs.
    pub fn deallocate(&mut self, mem: &mut MainMemory, disk: &mut DiskDriver, pid: u32) {
        let limit = mem.partition_size();
        let Some(pcb) = self.processes.iter_mut().find(|p| p.pid == pid) else {
            return;
        };
        if pcb.state == ProcessState::Terminated {
            return;
        }
        pcb.set_state(ProcessState::Terminated);
        match (pcb.location, pcb.base) {
            (ProcessLocation::Ram, Some(base)) => {
                MemoryAccessor::clear_program(mem, base, limit);
            }
            _ => {
                if let Err(err) = disk.delete(&swap_file_name(pid)) {
                    tracing::warn!(pid, %err, "swap file missing at deallocation");
                }
            }
        }
        tracing::debug!(pid, "process deallocated");
    }

    /// Moves a RAM-resident process's image out to a fresh swap file.
    ///
    /// Part of the dispatch-time swap protocol: the victim's partition
    /// contents become `.process<PID>.swp` and its PCB flips to disk.
    pub fn swap_out(
        &mut self,
        mem: &mut MainMemory,
        disk: &mut DiskDriver,
        pid: u32,
    ) -> Result<(), KernelError> {
        let limit = mem.partition_size();
        let base = {
            let pcb = self.pcb(pid).ok_or(KernelError::UnknownProcess(pid))?;
            debug_assert_eq!(pcb.location, ProcessLocation::Ram);
            pcb.base.ok_or(KernelError::UnknownProcess(pid))?
        };

        let image = mem.read_slice(base, limit as usize).to_vec();
        Self::write_swap_file(disk, pid, &image)?;
        MemoryAccessor::clear_program(mem, base, limit);

        if let Some(pcb) = self.pcb_mut(pid) {
            pcb.location = ProcessLocation::Disk;
            pcb.base = None;
        }
        tracing::debug!(pid, %base, "process swapped out");
        Ok(())
    }

    /// Brings a disk-resident process's image into a free partition and
    /// deletes its swap file.
    pub fn swap_in(
        &mut self,
        mem: &mut MainMemory,
        disk: &mut DiskDriver,
        pid: u32,
        base: PhysAddr,
    ) -> Result<(), KernelError> {
        let limit = mem.partition_size();
        let file = swap_file_name(pid);
        let contents = disk.read(&file)?;
        let image = loader::parse_program(&contents)?;
        MemoryAccessor::write_program(mem, &image, base, limit)?;
        disk.delete(&file)?;

        if let Some(pcb) = self.pcb_mut(pid) {
            pcb.location = ProcessLocation::Ram;
            pcb.base = Some(base);
        }
        tracing::debug!(pid, %base, "process swapped in");
        Ok(())
    }

    /// Selects the least-recently-dispatched RAM-resident live process that
    /// is not currently running, as the swap-out victim.
    pub fn swap_victim(&self, running: Option<u32>) -> Option<u32> {
        self.processes
            .iter()
            .filter(|p| {
                p.is_live() && p.location == ProcessLocation::Ram && Some(p.pid) != running
            })
            .min_by_key(|p| p.last_dispatch)
            .map(|p| p.pid)
    }

    /// Writes a program image as a hidden swap file of hex tokens.
    fn write_swap_file(disk: &mut DiskDriver, pid: u32, image: &[u8]) -> Result<(), DiskError> {
        let file = swap_file_name(pid);
        disk.create(&file)?;
        if let Err(err) = disk.write(&file, &loader::format_program(image)) {
            // Roll the directory entry back so a failed load leaves no husk.
            let _ = disk.delete(&file);
            return Err(err);
        }
        Ok(())
    }
}
