//! Interrupt acknowledge sequences.

use emu_core::Bus;
use tracing::debug;

use crate::interrupt::InterruptMode;

use super::Z80;

/// NMI service routine address.
const NMI_VECTOR: u16 = 0x0066;
/// Mode 1 service routine address (`RST 38h`).
const IM1_VECTOR: u16 = 0x0038;

impl Z80 {
    /// A HALTed CPU resumes after the HALT when interrupted.
    fn leave_halt(&mut self) {
        if self.halted {
            self.halted = false;
            self.regs.pc = self.regs.pc.wrapping_add(1);
        }
    }

    /// NMI: discarded M1 fetch, one extra state, then `RST 66h` keeping IFF2.
    pub(super) fn accept_nmi<B: Bus>(&mut self, bus: &mut B) {
        self.nmi_pending = false;
        self.last_flag_q = false;

        self.fetch_m1(bus, self.regs.pc);
        self.cycles += 1;
        bus.interrupt_handling_time(1);

        self.leave_halt();
        self.iff1 = false;
        let ret = self.regs.pc;
        self.push(bus, ret);
        self.regs.pc = NMI_VECTOR;
        self.regs.memptr = NMI_VECTOR;
        debug!(ret, iff2 = self.iff2, "nmi accepted");
    }

    /// Maskable interrupt, dispatched by the current interrupt mode.
    ///
    /// In mode 0 only the opcode comes from the device; any prefix
    /// continuation or operand bytes are fetched from memory at PC.
    pub(super) fn accept_int<B: Bus>(&mut self, bus: &mut B) {
        self.last_flag_q = false;
        self.leave_halt();
        self.regs.increment_r();
        self.iff1 = false;
        self.iff2 = false;

        let data = bus.interrupt_data();
        let ret = self.regs.pc;

        match self.im {
            InterruptMode::Mode0 => {
                // Acknowledge M1 plus two wait states; the device's byte is
                // then executed as the instruction.
                self.cycles += 6;
                bus.interrupt_handling_time(6);
                self.flag_q = false;
                self.execute_base(bus, data);
            }
            InterruptMode::Mode1 => {
                self.cycles += 7;
                bus.interrupt_handling_time(7);
                self.push(bus, ret);
                self.regs.pc = IM1_VECTOR;
                self.regs.memptr = IM1_VECTOR;
            }
            InterruptMode::Mode2 => {
                self.cycles += 7;
                bus.interrupt_handling_time(7);
                self.push(bus, ret);
                let table = (u16::from(self.regs.i) << 8) | u16::from(data);
                let target = self.read16(bus, table);
                self.regs.pc = target;
                self.regs.memptr = target;
            }
        }

        debug!(mode = %self.im, data, ret, pc = self.regs.pc, "interrupt accepted");
    }
}
