//! Instruction-accurate Zilog Z80 interpreter.
//!
//! Each call to [`Z80::step`] runs one whole instruction, prefix chain
//! included, or one interrupt acknowledge. Documented and undocumented flag
//! behaviour, MEMPTR and the refresh counter are reproduced exactly; timing
//! is reported per instruction through the [`emu_core::Bus`] hooks.

mod alu;
mod breakpoints;
mod cpu;
mod flags;
mod interrupt;
mod registers;

pub use alu::{AluResult, AluResult16};
pub use breakpoints::Breakpoints;
pub use cpu::Z80;
pub use flags::{CF, FLAG_TABLES, FlagTables, HF, NF, PF, SF, XF, YF, ZF, parity, sz53, sz53p};
pub use interrupt::InterruptMode;
pub use registers::{RegisterPair, Registers};

/// Pure ALU helpers, exposed for property tests and tooling.
pub mod ops {
    pub use crate::alu::{
        accumulator_op, adc16, add8, add16, and8, bit_flags, block_compare_flags,
        block_io_flags, block_io_repeat_flags, block_transfer_flags, cp8, cpl, daa, dec8,
        inc8, or8, rl8, rlc8, rotate_a, rotate_op, rr8, rrc8, sbc16, scf_ccf_53, sla8, sll8,
        sra8, srl8, sub8, xor8,
    };
}
