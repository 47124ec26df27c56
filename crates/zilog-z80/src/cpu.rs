//! Z80 CPU core with per-instruction execution.

mod execute;
mod execute_cb;
mod execute_ed;
mod execute_index;
mod interrupt;

use emu_core::{Bus, Cpu, Observable, Ticks, Value};
use tracing::{debug, trace};

use crate::alu::{AluResult, AluResult16};
use crate::breakpoints::Breakpoints;
use crate::interrupt::InterruptMode;
use crate::registers::Registers;

/// Z80 CPU.
///
/// The CPU does not own the bus. The bus is passed to [`Z80::step`], which
/// runs one whole instruction (prefixes included) or one interrupt
/// acknowledge and returns the T-states it took.
#[derive(Debug, Clone)]
pub struct Z80 {
    /// Program-visible registers and MEMPTR.
    pub regs: Registers,

    // === Interrupt state ===
    iff1: bool,
    iff2: bool,
    im: InterruptMode,
    /// EI executed; interrupts stay blocked until one more instruction runs.
    pending_ei: bool,
    halted: bool,
    /// Edge-triggered, consumed when serviced.
    nmi_pending: bool,
    /// Level-sensitive INT input.
    int_line: bool,
    pin_reset: bool,

    // === Undocumented SCF/CCF state ===
    /// F written by the instruction in progress.
    flag_q: bool,
    /// F written by the previous instruction.
    last_flag_q: bool,

    breakpoints: Breakpoints,

    // === Timing ===
    /// T-states of the step in progress.
    cycles: u32,
    /// Total T-states elapsed.
    total_ticks: Ticks,
}

impl Z80 {
    /// Create a Z80 in its power-on state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            regs: Registers::power_on(),
            iff1: false,
            iff2: false,
            im: InterruptMode::Mode0,
            pending_ei: false,
            halted: false,
            nmi_pending: false,
            int_line: false,
            pin_reset: false,
            flag_q: false,
            last_flag_q: false,
            breakpoints: Breakpoints::new(),
            cycles: 0,
            total_ticks: Ticks::ZERO,
        }
    }

    /// Power-on reset. Breakpoints and the tick count survive, and so does
    /// the INT line, which belongs to whoever drives it.
    pub fn reset(&mut self) {
        self.regs = Registers::power_on();
        self.iff1 = false;
        self.iff2 = false;
        self.im = InterruptMode::Mode0;
        self.pending_ei = false;
        self.halted = false;
        self.nmi_pending = false;
        self.pin_reset = false;
        self.flag_q = false;
        self.last_flag_q = false;
        debug!("z80 reset");
    }

    /// Execute one instruction or interrupt acknowledge.
    ///
    /// Reset, NMI and INT are sampled here, before the fetch, so they are
    /// only ever seen between instructions.
    pub fn step<B: Bus>(&mut self, bus: &mut B) -> u32 {
        self.cycles = 0;

        if self.pin_reset {
            self.reset();
            // /RESET is held for three clocks.
            self.cycles = 3;
        } else if self.nmi_pending {
            self.accept_nmi(bus);
        } else if self.int_line && self.iff1 && !self.pending_ei {
            self.accept_int(bus);
        } else {
            self.pending_ei = false;
            self.execute_instruction(bus);
        }

        self.total_ticks += self.cycles;
        self.cycles
    }

    fn execute_instruction<B: Bus>(&mut self, bus: &mut B) {
        let pc = self.regs.pc;
        let mut opcode = self.fetch_m1(bus, pc);

        if self.halted {
            // HALT re-executes as a NOP on the same address.
            self.last_flag_q = false;
            bus.instruction_complete();
            return;
        }

        if self.breakpoints.is_set(pc) {
            let replacement = bus.breakpoint(pc, opcode);
            trace!(pc, opcode, replacement, "breakpoint");
            opcode = replacement;
        }

        self.regs.pc = pc.wrapping_add(1);
        self.flag_q = false;
        self.execute_base(bus, opcode);
        self.last_flag_q = self.flag_q;
        bus.instruction_complete();
    }

    /// Total T-states elapsed since creation.
    #[must_use]
    pub const fn total_ticks(&self) -> Ticks {
        self.total_ticks
    }

    // =========================================================================
    // Interrupt and halt control
    // =========================================================================

    /// Latch a non-maskable interrupt. Serviced once at the next boundary.
    pub fn trigger_nmi(&mut self) {
        self.nmi_pending = true;
    }

    #[must_use]
    pub const fn is_nmi_pending(&self) -> bool {
        self.nmi_pending
    }

    /// Drive the INT line. It stays asserted until the caller drops it.
    pub fn set_int_line(&mut self, active: bool) {
        self.int_line = active;
    }

    #[must_use]
    pub const fn int_line(&self) -> bool {
        self.int_line
    }

    /// Request a reset through the /RESET pin, honoured at the next boundary.
    pub fn set_pin_reset(&mut self) {
        self.pin_reset = true;
    }

    #[must_use]
    pub const fn is_pin_reset(&self) -> bool {
        self.pin_reset
    }

    #[must_use]
    pub const fn iff1(&self) -> bool {
        self.iff1
    }

    pub fn set_iff1(&mut self, state: bool) {
        self.iff1 = state;
    }

    #[must_use]
    pub const fn iff2(&self) -> bool {
        self.iff2
    }

    pub fn set_iff2(&mut self, state: bool) {
        self.iff2 = state;
    }

    #[must_use]
    pub const fn im(&self) -> InterruptMode {
        self.im
    }

    pub fn set_im(&mut self, mode: InterruptMode) {
        self.im = mode;
    }

    #[must_use]
    pub const fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn set_halted(&mut self, state: bool) {
        self.halted = state;
    }

    #[must_use]
    pub const fn is_pending_ei(&self) -> bool {
        self.pending_ei
    }

    pub fn set_pending_ei(&mut self, state: bool) {
        self.pending_ei = state;
    }

    /// Whether the last completed instruction wrote F.
    #[must_use]
    pub const fn last_flag_q(&self) -> bool {
        self.last_flag_q
    }

    // =========================================================================
    // Breakpoints
    // =========================================================================

    /// Enable or disable the breakpoint hook for opcodes fetched at `address`.
    pub fn set_breakpoint(&mut self, address: u16, enabled: bool) {
        self.breakpoints.set(address, enabled);
    }

    #[must_use]
    pub fn is_breakpoint(&self, address: u16) -> bool {
        self.breakpoints.is_set(address)
    }

    pub fn reset_breakpoints(&mut self) {
        self.breakpoints.clear();
    }

    // =========================================================================
    // Bus access with cycle accounting
    // =========================================================================

    /// M1 cycle: fetch an opcode byte and refresh.
    fn fetch_m1<B: Bus>(&mut self, bus: &mut B, address: u16) -> u8 {
        self.cycles += 4;
        self.regs.increment_r();
        bus.fetch_opcode(address)
    }

    /// Fetch the next byte of a prefix chain with a full M1 cycle.
    fn fetch_prefixed<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let pc = self.regs.pc;
        let op = self.fetch_m1(bus, pc);
        self.regs.pc = pc.wrapping_add(1);
        op
    }

    fn read8<B: Bus>(&mut self, bus: &mut B, address: u16) -> u8 {
        self.cycles += 3;
        bus.read(address)
    }

    fn write8<B: Bus>(&mut self, bus: &mut B, address: u16, value: u8) {
        self.cycles += 3;
        bus.write(address, value);
    }

    fn read16<B: Bus>(&mut self, bus: &mut B, address: u16) -> u16 {
        self.cycles += 6;
        bus.read_word(address)
    }

    fn write16<B: Bus>(&mut self, bus: &mut B, address: u16, value: u16) {
        self.cycles += 6;
        bus.write_word(address, value);
    }

    fn imm8<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let pc = self.regs.pc;
        self.regs.pc = pc.wrapping_add(1);
        self.read8(bus, pc)
    }

    fn imm16<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let pc = self.regs.pc;
        self.regs.pc = pc.wrapping_add(2);
        self.read16(bus, pc)
    }

    fn io_in<B: Bus>(&mut self, bus: &mut B, port: u16) -> u8 {
        self.cycles += 4;
        bus.io_read(port)
    }

    fn io_out<B: Bus>(&mut self, bus: &mut B, port: u16, value: u8) {
        self.cycles += 4;
        bus.io_write(port, value);
    }

    /// Internal T-states with `address` held on the bus.
    fn internal<B: Bus>(&mut self, bus: &mut B, address: u16, cycles: u32) {
        self.cycles += cycles;
        bus.address_on_bus(address, cycles);
    }

    /// Internal T-states with IR on the bus (refresh address).
    fn internal_ir<B: Bus>(&mut self, bus: &mut B, cycles: u32) {
        let ir = self.regs.ir();
        self.internal(bus, ir, cycles);
    }

    fn push<B: Bus>(&mut self, bus: &mut B, word: u16) {
        let [lo, hi] = word.to_le_bytes();
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        self.write8(bus, self.regs.sp, hi);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        self.write8(bus, self.regs.sp, lo);
    }

    fn pop<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let word = self.read16(bus, self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(2);
        word
    }

    // =========================================================================
    // Register and flag helpers
    // =========================================================================

    /// Store ALU flags and carry, marking F as written.
    fn apply_flags(&mut self, result: AluResult) {
        self.regs.flags = result.flags;
        self.regs.carry = result.carry;
        self.flag_q = true;
    }

    fn apply_flags16(&mut self, result: AluResult16) {
        self.regs.flags = result.flags;
        self.regs.carry = result.carry;
        self.flag_q = true;
    }

    /// Overwrite F without the carry bit.
    fn set_flags(&mut self, flags: u8) {
        self.regs.flags = flags;
        self.flag_q = true;
    }

    /// 8-bit register by 3-bit encoding. 6 is (HL) and handled by callers.
    fn get_reg8(&self, r: u8) -> u8 {
        match r & 7 {
            0 => self.regs.b(),
            1 => self.regs.c(),
            2 => self.regs.d(),
            3 => self.regs.e(),
            4 => self.regs.h(),
            5 => self.regs.l(),
            6 => 0, // (HL) - handled by callers
            7 => self.regs.a,
            _ => unreachable!(),
        }
    }

    fn set_reg8(&mut self, r: u8, value: u8) {
        match r & 7 {
            0 => self.regs.set_b(value),
            1 => self.regs.set_c(value),
            2 => self.regs.set_d(value),
            3 => self.regs.set_e(value),
            4 => self.regs.set_h(value),
            5 => self.regs.set_l(value),
            6 => {} // (HL) - handled by callers
            7 => self.regs.a = value,
            _ => unreachable!(),
        }
    }

    /// 16-bit pair by 2-bit encoding with SP in slot 3.
    fn get_reg16(&self, rp: u8) -> u16 {
        match rp & 3 {
            0 => self.regs.bc(),
            1 => self.regs.de(),
            2 => self.regs.hl(),
            3 => self.regs.sp,
            _ => unreachable!(),
        }
    }

    fn set_reg16(&mut self, rp: u8, value: u16) {
        match rp & 3 {
            0 => self.regs.set_bc(value),
            1 => self.regs.set_de(value),
            2 => self.regs.set_hl(value),
            3 => self.regs.sp = value,
            _ => unreachable!(),
        }
    }

    /// Condition code by 3-bit encoding: NZ, Z, NC, C, PO, PE, P, M.
    fn condition(&self, cc: u8) -> bool {
        match cc & 7 {
            0 => !self.regs.zero_flag(),
            1 => self.regs.zero_flag(),
            2 => !self.regs.carry,
            3 => self.regs.carry,
            4 => !self.regs.parity_overflow_flag(),
            5 => self.regs.parity_overflow_flag(),
            6 => !self.regs.sign_flag(),
            7 => self.regs.sign_flag(),
            _ => unreachable!(),
        }
    }
}

impl Default for Z80 {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Test utilities
// =========================================================================

#[cfg(feature = "test-utils")]
impl Z80 {
    pub fn set_pc(&mut self, pc: u16) {
        self.regs.pc = pc;
    }

    pub fn set_sp(&mut self, sp: u16) {
        self.regs.sp = sp;
    }

    /// Pop the return address into PC as if `RET` ran, without timing.
    pub fn force_ret<B: Bus>(&mut self, bus: &mut B) {
        let lo = bus.read(self.regs.sp);
        let hi = bus.read(self.regs.sp.wrapping_add(1));
        self.regs.sp = self.regs.sp.wrapping_add(2);
        self.regs.pc = u16::from_le_bytes([lo, hi]);
        self.regs.memptr = self.regs.pc;
    }
}

impl Cpu for Z80 {
    type Registers = Registers;

    fn step<B: Bus>(&mut self, bus: &mut B) -> u32 {
        Z80::step(self, bus)
    }

    fn pc(&self) -> u32 {
        u32::from(self.regs.pc)
    }

    fn registers(&self) -> Registers {
        self.regs
    }

    fn is_halted(&self) -> bool {
        self.halted
    }

    fn set_interrupt_line(&mut self, active: bool) {
        self.set_int_line(active);
    }

    fn nmi(&mut self) {
        self.trigger_nmi();
    }

    fn reset(&mut self) {
        Z80::reset(self);
    }
}

/// All paths supported by `Z80::query`.
const Z80_QUERY_PATHS: &[&str] = &[
    // Main registers
    "a", "f", "b", "c", "d", "e", "h", "l",
    // Register pairs
    "af", "bc", "de", "hl",
    // Alternate registers
    "a'", "f'", "b'", "c'", "d'", "e'", "h'", "l'",
    "af'", "bc'", "de'", "hl'",
    // Index registers
    "ix", "iy", "ixh", "ixl", "iyh", "iyl",
    // Other registers
    "sp", "pc", "i", "r", "memptr",
    // Flags (individual)
    "flags.s", "flags.z", "flags.y", "flags.h",
    "flags.x", "flags.p", "flags.n", "flags.c",
    "flags.q",
    // Interrupt state
    "int.iff1", "int.iff2", "int.im", "int.pending_ei",
    "int.nmi_pending", "int.line",
    // CPU state
    "halted", "ticks", "breakpoints",
];

impl Observable for Z80 {
    fn query(&self, path: &str) -> Option<Value> {
        let r = &self.regs;
        match path {
            // Main registers
            "a" => Some(r.a.into()),
            "f" => Some(r.f().into()),
            "b" => Some(r.b().into()),
            "c" => Some(r.c().into()),
            "d" => Some(r.d().into()),
            "e" => Some(r.e().into()),
            "h" => Some(r.h().into()),
            "l" => Some(r.l().into()),

            // Register pairs
            "af" => Some(r.af().into()),
            "bc" => Some(r.bc().into()),
            "de" => Some(r.de().into()),
            "hl" => Some(r.hl().into()),

            // Alternate registers
            "a'" => Some(r.a_alt().into()),
            "f'" => Some(r.f_alt().into()),
            "b'" => Some(r.b_alt().into()),
            "c'" => Some(r.c_alt().into()),
            "d'" => Some(r.d_alt().into()),
            "e'" => Some(r.e_alt().into()),
            "h'" => Some(r.h_alt().into()),
            "l'" => Some(r.l_alt().into()),
            "af'" => Some(r.af_alt().into()),
            "bc'" => Some(r.bc_alt().into()),
            "de'" => Some(r.de_alt().into()),
            "hl'" => Some(r.hl_alt().into()),

            // Index registers
            "ix" => Some(r.ix().into()),
            "iy" => Some(r.iy().into()),
            "ixh" => Some(r.ixh().into()),
            "ixl" => Some(r.ixl().into()),
            "iyh" => Some(r.iyh().into()),
            "iyl" => Some(r.iyl().into()),

            // Other registers
            "sp" => Some(r.sp.into()),
            "pc" => Some(r.pc.into()),
            "i" => Some(r.i.into()),
            "r" => Some(r.r().into()),
            "memptr" => Some(r.memptr.into()),

            // Individual flags
            "flags.s" => Some(r.sign_flag().into()),
            "flags.z" => Some(r.zero_flag().into()),
            "flags.y" => Some(r.bit5_flag().into()),
            "flags.h" => Some(r.half_carry_flag().into()),
            "flags.x" => Some(r.bit3_flag().into()),
            "flags.p" => Some(r.parity_overflow_flag().into()),
            "flags.n" => Some(r.add_sub_flag().into()),
            "flags.c" => Some(r.carry.into()),
            "flags.q" => Some(self.last_flag_q.into()),

            // Interrupt state
            "int.iff1" => Some(self.iff1.into()),
            "int.iff2" => Some(self.iff2.into()),
            "int.im" => Some(self.im.number().into()),
            "int.pending_ei" => Some(self.pending_ei.into()),
            "int.nmi_pending" => Some(self.nmi_pending.into()),
            "int.line" => Some(self.int_line.into()),

            // CPU state
            "halted" => Some(self.halted.into()),
            "ticks" => Some(self.total_ticks.get().into()),
            "breakpoints" => Some((self.breakpoints.len() as u64).into()),

            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        Z80_QUERY_PATHS
    }
}
