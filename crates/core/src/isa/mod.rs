//! The 8-bit instruction set.
//!
//! This module defines decoding for the machine's 6502-like opcode set:
//! 1. **Tagged Sum:** Every instruction is a variant of [`Opcode`]; unknown
//!    bytes decode to `None` and trap at the pipeline level.
//! 2. **Operand Counts:** Each opcode declares how many operand bytes follow
//!    it. The syscall opcode resolves its count against the X register.
//! 3. **Decode Classes:** Predicates for the pipeline's skip rules
//!    (immediate loads, branch, read-modify-write).
//!
//! Execution lives in [`crate::cpu`]; this module is pure decode.

use std::fmt;

/// One instruction of the machine's opcode set.
///
/// Variants are named by their 6502 mnemonic plus addressing mode where the
/// mnemonic alone is ambiguous (`LdaImm` vs `LdaAbs`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Opcode {
    /// `00`: halt the running program.
    Brk,
    /// `6D`: add the byte at the operand address to the accumulator;
    /// wraps past 0xFF and latches carry.
    Adc,
    /// `8A`: copy X into the accumulator.
    Txa,
    /// `8D`: store the accumulator at the operand address.
    Sta,
    /// `98`: copy Y into the accumulator.
    Tya,
    /// `A0`: load Y with the immediate operand.
    LdyImm,
    /// `A2`: load X with the immediate operand.
    LdxImm,
    /// `A8`: copy the accumulator into Y.
    Tay,
    /// `A9`: load the accumulator with the immediate operand.
    LdaImm,
    /// `AA`: copy the accumulator into X.
    Tax,
    /// `AC`: load Y from the operand address.
    LdyAbs,
    /// `AD`: load the accumulator from the operand address.
    LdaAbs,
    /// `AE`: load X from the operand address.
    LdxAbs,
    /// `D0`: branch by a signed offset if the Z flag is clear.
    Bne,
    /// `EA`: no operation.
    Nop,
    /// `EC`: compare X with the byte at the operand address; sets Z.
    Cpx,
    /// `EE`: increment the byte at the operand address (staged through the
    /// accumulator; traps past 0xFF).
    Inc,
    /// `FF`: system call dispatched on X (print integer / print string).
    Sys,
}

impl Opcode {
    /// Decodes an opcode byte.
    ///
    /// Returns `None` for bytes outside the instruction set; the pipeline
    /// turns that into an invalid-instruction trap.
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Self::Brk),
            0x6D => Some(Self::Adc),
            0x8A => Some(Self::Txa),
            0x8D => Some(Self::Sta),
            0x98 => Some(Self::Tya),
            0xA0 => Some(Self::LdyImm),
            0xA2 => Some(Self::LdxImm),
            0xA8 => Some(Self::Tay),
            0xA9 => Some(Self::LdaImm),
            0xAA => Some(Self::Tax),
            0xAC => Some(Self::LdyAbs),
            0xAD => Some(Self::LdaAbs),
            0xAE => Some(Self::LdxAbs),
            0xD0 => Some(Self::Bne),
            0xEA => Some(Self::Nop),
            0xEC => Some(Self::Cpx),
            0xEE => Some(Self::Inc),
            0xFF => Some(Self::Sys),
            _ => None,
        }
    }

    /// Returns the encoding byte of this opcode.
    pub const fn byte(self) -> u8 {
        match self {
            Self::Brk => 0x00,
            Self::Adc => 0x6D,
            Self::Txa => 0x8A,
            Self::Sta => 0x8D,
            Self::Tya => 0x98,
            Self::LdyImm => 0xA0,
            Self::LdxImm => 0xA2,
            Self::Tay => 0xA8,
            Self::LdaImm => 0xA9,
            Self::Tax => 0xAA,
            Self::LdyAbs => 0xAC,
            Self::LdaAbs => 0xAD,
            Self::LdxAbs => 0xAE,
            Self::Bne => 0xD0,
            Self::Nop => 0xEA,
            Self::Cpx => 0xEC,
            Self::Inc => 0xEE,
            Self::Sys => 0xFF,
        }
    }

    /// Returns the number of operand bytes following this opcode.
    ///
    /// The syscall opcode takes two operands only when dispatching on
    /// `X == 3` (print string at an explicit address); `x_register` is the
    /// X value at decode time.
    pub const fn operand_count(self, x_register: u8) -> u8 {
        match self {
            Self::Brk | Self::Txa | Self::Tya | Self::Tay | Self::Tax | Self::Nop => 0,
            Self::LdyImm | Self::LdxImm | Self::LdaImm | Self::Bne => 1,
            Self::Adc
            | Self::Sta
            | Self::LdyAbs
            | Self::LdaAbs
            | Self::LdxAbs
            | Self::Cpx
            | Self::Inc => 2,
            Self::Sys => {
                if x_register == 3 {
                    2
                } else {
                    0
                }
            }
        }
    }

    /// Returns `true` for the immediate register loads (`A0`, `A2`, `A9`).
    ///
    /// These load their register directly in Decode1 and jump straight to
    /// the interrupt check.
    pub const fn is_immediate_load(self) -> bool {
        matches!(self, Self::LdyImm | Self::LdxImm | Self::LdaImm)
    }

    /// Returns the assembler mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Brk => "BRK",
            Self::Adc => "ADC",
            Self::Txa => "TXA",
            Self::Sta => "STA",
            Self::Tya => "TYA",
            Self::LdyImm | Self::LdyAbs => "LDY",
            Self::LdxImm | Self::LdxAbs => "LDX",
            Self::Tay => "TAY",
            Self::LdaImm | Self::LdaAbs => "LDA",
            Self::Tax => "TAX",
            Self::Bne => "BNE",
            Self::Nop => "NOP",
            Self::Cpx => "CPX",
            Self::Inc => "INC",
            Self::Sys => "SYS",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:02X})", self.mnemonic(), self.byte())
    }
}
