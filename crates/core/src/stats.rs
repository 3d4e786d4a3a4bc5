//! Simulation statistics collection and reporting.
//!
//! Tracks what the machine did over a run:
//! 1. **Clock:** total pulses and idle pulses.
//! 2. **Execution:** instructions retired, traps taken.
//! 3. **Scheduling:** context switches, swap-ins and swap-outs.
//! 4. **Disk:** driver operations serviced.

use std::time::Instant;

/// Counters for one simulator run.
#[derive(Clone, Debug)]
pub struct SimStats {
    start_time: Instant,
    /// Total clock pulses delivered to the machine.
    pub pulses: u64,
    /// Pulses where nothing was running or ready.
    pub idle_pulses: u64,
    /// Instructions retired across all processes.
    pub instructions_retired: u64,
    /// Times a process was loaded onto the CPU.
    pub context_switches: u64,
    /// Processes moved from disk into a partition.
    pub swaps_in: u64,
    /// Processes moved from a partition out to disk.
    pub swaps_out: u64,
    /// Software traps taken (each one terminated a process).
    pub traps_taken: u64,
    /// Disk driver read operations serviced.
    pub disk_reads: u64,
    /// Disk driver write operations serviced (including formats).
    pub disk_writes: u64,
}

impl Default for SimStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            pulses: 0,
            idle_pulses: 0,
            instructions_retired: 0,
            context_switches: 0,
            swaps_in: 0,
            swaps_out: 0,
            traps_taken: 0,
            disk_reads: 0,
            disk_writes: 0,
        }
    }
}

impl SimStats {
    /// Renders a human-readable summary block.
    pub fn report(&self) -> String {
        let elapsed = self.start_time.elapsed();
        format!(
            "pulses:            {}\n\
             idle pulses:       {}\n\
             instructions:      {}\n\
             context switches:  {}\n\
             swaps in/out:      {}/{}\n\
             traps:             {}\n\
             disk reads/writes: {}/{}\n\
             host time:         {:.3}s",
            self.pulses,
            self.idle_pulses,
            self.instructions_retired,
            self.context_switches,
            self.swaps_in,
            self.swaps_out,
            self.traps_taken,
            self.disk_reads,
            self.disk_writes,
            elapsed.as_secs_f64(),
        )
    }
}
