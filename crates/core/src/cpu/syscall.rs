//! Software-interrupt (syscall) requests and their execution.
//!
//! A `FF` instruction does not touch the console in Execute1; it queues a
//! [`Syscall`] that the pipeline's interrupt check performs. Dispatch is on
//! the X register:
//! - `X = 1`: print the decimal value of Y;
//! - `X = 2`: print the NUL-terminated string at the logical address in Y;
//! - `X = 3`: print the NUL-terminated string at the MAR (two operands).
//!
//! String walks are bounds-checked like every other access; running off the
//! partition traps and halts the offending process.

use crate::common::addr::{LogicalAddr, PhysAddr};
use crate::common::error::Trap;
use crate::kernel::console::Console;
use crate::mem::MainMemory;

use super::Cpu;

/// A queued software interrupt, captured at Execute1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Syscall {
    /// Print the decimal rendering of the Y register.
    PrintDecimal(u8),
    /// Print the NUL-terminated string at a logical address (from Y).
    PrintStringAt(LogicalAddr),
    /// Print the NUL-terminated string at the assembled MAR.
    PrintStringAtMar(PhysAddr),
}

impl Syscall {
    /// Builds the syscall for the current register state, or `None` when the
    /// X register selects no known call.
    pub fn from_registers(x: u8, y: u8, mar: PhysAddr) -> Option<Self> {
        match x {
            1 => Some(Self::PrintDecimal(y)),
            2 => Some(Self::PrintStringAt(LogicalAddr::new(u16::from(y)))),
            3 => Some(Self::PrintStringAtMar(mar)),
            _ => None,
        }
    }
}

impl Cpu {
    /// Executes a queued syscall against the console.
    pub(super) fn perform_syscall(
        &self,
        sys: Syscall,
        mem: &MainMemory,
        console: &mut dyn Console,
    ) -> Result<(), Trap> {
        match sys {
            Syscall::PrintDecimal(value) => {
                console.put_text(&value.to_string());
            }
            Syscall::PrintStringAt(start) => {
                let text = self.read_string_logical(mem, start)?;
                console.put_text(&text);
            }
            Syscall::PrintStringAtMar(start) => {
                let text = self.read_string_physical(mem, start)?;
                console.put_text(&text);
            }
        }
        Ok(())
    }

    /// Walks a NUL-terminated string from a logical address.
    fn read_string_logical(&self, mem: &MainMemory, start: LogicalAddr) -> Result<String, Trap> {
        let mut out = String::new();
        let mut offset = 0u16;
        loop {
            let byte = self
                .accessor
                .read_logical(mem, LogicalAddr::new(start.val().wrapping_add(offset)))?;
            if byte == 0 {
                return Ok(out);
            }
            out.push(char::from(byte));
            offset = offset.wrapping_add(1);
        }
    }

    /// Walks a NUL-terminated string from a physical address (the MAR path).
    fn read_string_physical(&self, mem: &MainMemory, start: PhysAddr) -> Result<String, Trap> {
        let mut out = String::new();
        let mut addr = start.val();
        loop {
            let byte = self.accessor.read_checked(mem, PhysAddr::new(addr))?;
            if byte == 0 {
                return Ok(out);
            }
            out.push(char::from(byte));
            addr = addr.wrapping_add(1);
        }
    }
}
