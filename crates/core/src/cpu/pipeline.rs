//! The seven-step instruction pipeline.
//!
//! Each instruction moves through an explicit step machine:
//! `Fetch → Decode1 → Decode2 → Execute1 → Execute2 → WriteBack →
//! InterruptCheck`, with the skip rules below. One host pulse runs the whole
//! sequence for one instruction; the step field stays observable so the
//! machine's state is inspectable mid-instruction.
//!
//! Skip rules (applied in Decode1):
//! - zero-operand opcodes jump straight to Execute1;
//! - immediate loads assign their register and jump to the interrupt check;
//! - the branch latches its offset and skips Decode2;
//! - two-operand opcodes latch the low byte and continue to Decode2, where
//!   the high byte is latched with the partition-relocation offset added.
//!
//! The increment is the one read-modify-write: Execute1 stages the byte in
//! the accumulator, Execute2 bounds-checks and increments, WriteBack stores.

use crate::common::addr::LogicalAddr;
use crate::common::error::Trap;
use crate::isa::Opcode;
use crate::kernel::console::Console;
use crate::mem::MainMemory;

use super::syscall::Syscall;
use super::{Cpu, PulseOutcome};

/// The pipeline's current step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PipelineStep {
    /// Read the opcode byte at the PC and advance the PC.
    #[default]
    Fetch,
    /// Decode the opcode; fetch and route the first operand byte.
    Decode1,
    /// Fetch the high operand byte and assemble the physical MAR.
    Decode2,
    /// Opcode-specific action.
    Execute1,
    /// Second execute step (increment bounds check).
    Execute2,
    /// Store staged results (increment write-back).
    WriteBack,
    /// Commit queued software interrupts; return to fetch.
    InterruptCheck,
}

impl Cpu {
    /// Runs one pulse: a full trip through the pipeline for one instruction.
    ///
    /// On a trap the CPU stops executing and the error carries the console
    /// message; the kernel deallocates the process. The pipeline is left
    /// ready to fetch for whatever context is loaded next.
    pub fn pulse(
        &mut self,
        mem: &mut MainMemory,
        console: &mut dyn Console,
    ) -> Result<PulseOutcome, Trap> {
        debug_assert!(self.is_executing, "pulse on an idle CPU");
        loop {
            if let Err(trap) = self.step_once(mem, console) {
                self.is_executing = false;
                self.step = PipelineStep::Fetch;
                return Err(trap);
            }
            if self.step == PipelineStep::Fetch {
                break;
            }
        }
        if self.halt_pending {
            self.is_executing = false;
            Ok(PulseOutcome::Halted)
        } else {
            Ok(PulseOutcome::Retired)
        }
    }

    /// Advances the pipeline by exactly one step.
    fn step_once(&mut self, mem: &mut MainMemory, console: &mut dyn Console) -> Result<(), Trap> {
        match self.step {
            PipelineStep::Fetch => self.fetch(mem),
            PipelineStep::Decode1 => self.decode1(mem),
            PipelineStep::Decode2 => self.decode2(mem),
            PipelineStep::Execute1 => self.execute1(mem),
            PipelineStep::Execute2 => self.execute2(),
            PipelineStep::WriteBack => self.write_back(mem),
            PipelineStep::InterruptCheck => self.interrupt_check(mem, console),
        }
    }

    /// Reads the next program byte at the PC and advances the PC.
    fn next_program_byte(&mut self, mem: &MainMemory) -> Result<u8, Trap> {
        let byte = self.accessor.read_logical(mem, LogicalAddr::new(self.pc))?;
        self.pc = self.pc.wrapping_add(1);
        Ok(byte)
    }

    fn fetch(&mut self, mem: &MainMemory) -> Result<(), Trap> {
        self.decoded = None;
        self.carry = false;
        self.pending_syscall = None;
        self.ir = self.next_program_byte(mem)?;
        self.step = PipelineStep::Decode1;
        Ok(())
    }

    fn decode1(&mut self, mem: &MainMemory) -> Result<(), Trap> {
        let op = Opcode::from_byte(self.ir).ok_or(Trap::InvalidInstruction(self.ir))?;
        self.decoded = Some(op);
        match op.operand_count(self.x) {
            0 => self.step = PipelineStep::Execute1,
            1 if op.is_immediate_load() => {
                let operand = self.next_program_byte(mem)?;
                match op {
                    Opcode::LdaImm => self.acc = operand,
                    Opcode::LdxImm => self.x = operand,
                    Opcode::LdyImm => self.y = operand,
                    _ => {}
                }
                self.step = PipelineStep::InterruptCheck;
            }
            1 => {
                // The branch: latch the offset, no high byte follows.
                let operand = self.next_program_byte(mem)?;
                self.accessor.set_low_order(operand);
                self.step = PipelineStep::Execute1;
            }
            _ => {
                let operand = self.next_program_byte(mem)?;
                self.accessor.set_low_order(operand);
                self.step = PipelineStep::Decode2;
            }
        }
        Ok(())
    }

    /// Latches the high operand byte, relocated so the MAR is physical.
    fn decode2(&mut self, mem: &MainMemory) -> Result<(), Trap> {
        let operand = self.next_program_byte(mem)?;
        let relocation = (self.accessor.base().val() >> 8) as u8;
        self.accessor
            .set_high_order(operand.wrapping_add(relocation));
        self.step = PipelineStep::Execute1;
        Ok(())
    }

    fn execute1(&mut self, mem: &mut MainMemory) -> Result<(), Trap> {
        let op = self.decoded.ok_or(Trap::InvalidInstruction(self.ir))?;
        match op {
            Opcode::Brk => {
                self.halt_pending = true;
                self.step = PipelineStep::InterruptCheck;
                return Ok(());
            }
            Opcode::Adc => {
                let sum = u16::from(self.acc) + u16::from(self.accessor.read(mem)?);
                self.carry = sum > 0xFF;
                self.acc = (sum & 0xFF) as u8;
            }
            Opcode::Txa => self.acc = self.x,
            Opcode::Tya => self.acc = self.y,
            Opcode::Tay => self.y = self.acc,
            Opcode::Tax => self.x = self.acc,
            Opcode::Nop => {}
            Opcode::Sta => self.accessor.write(mem, self.acc)?,
            Opcode::LdaAbs => self.acc = self.accessor.read(mem)?,
            Opcode::LdxAbs => self.x = self.accessor.read(mem)?,
            Opcode::LdyAbs => self.y = self.accessor.read(mem)?,
            Opcode::Cpx => {
                self.z_flag = (self.x == self.accessor.read(mem)?) as u8;
            }
            Opcode::Bne => {
                if self.z_flag == 0 {
                    // Two's-complement offset, relative to the PC after the
                    // offset byte was consumed.
                    let offset = self.accessor.mar_low() as i8;
                    self.pc = self.pc.wrapping_add(offset as u16);
                }
            }
            Opcode::Inc => {
                self.acc = self.accessor.read(mem)?;
                self.step = PipelineStep::Execute2;
                return Ok(());
            }
            Opcode::Sys => {
                if let Some(sys) = Syscall::from_registers(self.x, self.y, self.accessor.mar()) {
                    self.pending_syscall = Some(sys);
                } else {
                    tracing::warn!(x = self.x, "syscall with unknown X register value ignored");
                }
            }
            // Immediate loads completed in Decode1 and never reach here.
            Opcode::LdaImm | Opcode::LdxImm | Opcode::LdyImm => {}
        }
        self.step = PipelineStep::WriteBack;
        Ok(())
    }

    /// Increment bounds check: the staged byte must not carry past 0xFF.
    fn execute2(&mut self) -> Result<(), Trap> {
        if self.decoded == Some(Opcode::Inc) {
            if self.acc == 0xFF {
                return Err(Trap::IncrementOverflow(self.accessor.mar()));
            }
            self.acc += 1;
        }
        self.step = PipelineStep::WriteBack;
        Ok(())
    }

    fn write_back(&mut self, mem: &mut MainMemory) -> Result<(), Trap> {
        if self.decoded == Some(Opcode::Inc) {
            self.accessor.write(mem, self.acc)?;
        }
        self.step = PipelineStep::InterruptCheck;
        Ok(())
    }

    /// Performs queued software interrupts (syscalls) and returns to fetch.
    fn interrupt_check(&mut self, mem: &MainMemory, console: &mut dyn Console) -> Result<(), Trap> {
        if let Some(sys) = self.pending_syscall.take() {
            self.perform_syscall(sys, mem, console)?;
        }
        self.step = PipelineStep::Fetch;
        Ok(())
    }
}
