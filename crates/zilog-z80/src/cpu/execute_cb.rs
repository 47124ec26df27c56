//! CB page: rotates, shifts and bit operations.

use emu_core::Bus;

use crate::alu;

use super::Z80;

impl Z80 {
    /// Execute a CB-prefixed instruction. The CB byte has been fetched.
    pub(super) fn execute_cb<B: Bus>(&mut self, bus: &mut B) {
        let op = self.fetch_prefixed(bus);
        let r = op & 7;
        let bit = (op >> 3) & 7;

        if r == 6 {
            // (HL) forms
            let hl = self.regs.hl();
            let value = self.read8(bus, hl);
            self.internal(bus, hl, 1);
            if op & 0xC0 == 0x40 {
                // BIT n, (HL): bits 5/3 leak from MEMPTR
                let flags = alu::bit_flags(bit, value, (self.regs.memptr >> 8) as u8);
                self.set_flags(flags);
            } else {
                let result = self.cb_transform(op, value);
                self.write8(bus, hl, result);
            }
        } else {
            let value = self.get_reg8(r);
            if op & 0xC0 == 0x40 {
                // BIT n, r
                self.set_flags(alu::bit_flags(bit, value, value));
            } else {
                let result = self.cb_transform(op, value);
                self.set_reg8(r, result);
            }
        }
    }

    /// Rotate/shift (00-3F), RES (80-BF) or SET (C0-FF) on a byte. Only the
    /// rotate group touches flags.
    pub(super) fn cb_transform(&mut self, op: u8, value: u8) -> u8 {
        let mask = 1u8 << ((op >> 3) & 7);
        match op >> 6 {
            0 => {
                let result = alu::rotate_op(op, value, self.regs.carry);
                self.apply_flags(result);
                result.value
            }
            2 => value & !mask,
            _ => value | mask,
        }
    }
}
