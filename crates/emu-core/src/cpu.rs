//! CPU core trait.

use crate::Bus;

/// A CPU core driven one instruction at a time.
///
/// The bus is passed in, not owned, so the embedding machine keeps control of
/// memory and devices between steps. Interrupt lines and reset are only ever
/// sampled at instruction boundaries.
pub trait Cpu {
    /// The type used for register inspection.
    type Registers;

    /// Execute one logical instruction, or one interrupt acknowledge, and
    /// return the T-states it took.
    fn step<B: Bus>(&mut self, bus: &mut B) -> u32;

    /// Returns the current program counter.
    ///
    /// Returns `u32` so cores with wider address buses share the trait.
    /// 16-bit cores zero-extend.
    fn pc(&self) -> u32;

    /// Returns a snapshot of all registers for inspection.
    fn registers(&self) -> Self::Registers;

    /// Returns true if the CPU is halted.
    fn is_halted(&self) -> bool;

    /// Drive the level-sensitive maskable interrupt line.
    fn set_interrupt_line(&mut self, active: bool);

    /// Assert the edge-triggered non-maskable interrupt.
    fn nmi(&mut self);

    /// Reset the CPU to its power-on state.
    fn reset(&mut self);
}
