//! DD/FD page: IX and IY forms of HL instructions, and the DDCB/FDCB
//! sub-page.

use emu_core::Bus;

use crate::alu;

use super::Z80;

/// Which index register a DD or FD prefix selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum IndexReg {
    Ix,
    Iy,
}

impl Z80 {
    fn index(&self, idx: IndexReg) -> u16 {
        match idx {
            IndexReg::Ix => self.regs.ix(),
            IndexReg::Iy => self.regs.iy(),
        }
    }

    fn set_index(&mut self, idx: IndexReg, value: u16) {
        match idx {
            IndexReg::Ix => self.regs.set_ix(value),
            IndexReg::Iy => self.regs.set_iy(value),
        }
    }

    /// Register by 3-bit encoding with H and L replaced by the index halves
    /// (undocumented IXH/IXL/IYH/IYL).
    fn get_reg8_indexed(&self, r: u8, idx: IndexReg) -> u8 {
        match (r & 7, idx) {
            (4, IndexReg::Ix) => self.regs.ixh(),
            (5, IndexReg::Ix) => self.regs.ixl(),
            (4, IndexReg::Iy) => self.regs.iyh(),
            (5, IndexReg::Iy) => self.regs.iyl(),
            _ => self.get_reg8(r),
        }
    }

    fn set_reg8_indexed(&mut self, r: u8, idx: IndexReg, value: u8) {
        match (r & 7, idx) {
            (4, IndexReg::Ix) => self.regs.set_ixh(value),
            (5, IndexReg::Ix) => self.regs.set_ixl(value),
            (4, IndexReg::Iy) => self.regs.set_iyh(value),
            (5, IndexReg::Iy) => self.regs.set_iyl(value),
            _ => self.set_reg8(r, value),
        }
    }

    /// Fetch `d` and form `index + d`, which also lands in MEMPTR.
    fn index_address<B: Bus>(&mut self, bus: &mut B, idx: IndexReg) -> u16 {
        let d = self.imm8(bus) as i8;
        self.internal(bus, self.regs.pc.wrapping_sub(1), 5);
        let address = self.index(idx).wrapping_add_signed(i16::from(d));
        self.regs.memptr = address;
        address
    }

    /// Execute after a DD or FD prefix byte has been fetched.
    pub(super) fn execute_index<B: Bus>(&mut self, bus: &mut B, idx: IndexReg) {
        let mut idx = idx;
        let mut op = self.fetch_prefixed(bus);
        // Chained prefixes: the last one wins, each costs an M1 cycle.
        while op == 0xDD || op == 0xFD {
            idx = if op == 0xDD { IndexReg::Ix } else { IndexReg::Iy };
            op = self.fetch_prefixed(bus);
        }

        match op {
            // LD IX, nn
            0x21 => {
                let nn = self.imm16(bus);
                self.set_index(idx, nn);
            }

            // LD (nn), IX
            0x22 => {
                let nn = self.imm16(bus);
                self.write16(bus, nn, self.index(idx));
                self.regs.memptr = nn.wrapping_add(1);
            }

            // LD IX, (nn)
            0x2A => {
                let nn = self.imm16(bus);
                let value = self.read16(bus, nn);
                self.set_index(idx, value);
                self.regs.memptr = nn.wrapping_add(1);
            }

            // INC IX
            0x23 => {
                self.internal_ir(bus, 2);
                self.set_index(idx, self.index(idx).wrapping_add(1));
            }

            // DEC IX
            0x2B => {
                self.internal_ir(bus, 2);
                self.set_index(idx, self.index(idx).wrapping_sub(1));
            }

            // ADD IX, rr (09=BC, 19=DE, 29=IX, 39=SP)
            0x09 | 0x19 | 0x29 | 0x39 => {
                self.internal_ir(bus, 7);
                let ix = self.index(idx);
                let rr = if op == 0x29 { ix } else { self.get_reg16(op >> 4) };
                self.regs.memptr = ix.wrapping_add(1);
                let result = alu::add16(ix, rr, self.regs.flags);
                self.set_index(idx, result.value);
                self.apply_flags16(result);
            }

            // INC IXH / INC IXL
            0x24 | 0x2C => {
                let r = op >> 3;
                let result = alu::inc8(self.get_reg8_indexed(r, idx), self.regs.carry);
                self.set_reg8_indexed(r, idx, result.value);
                self.apply_flags(result);
            }

            // DEC IXH / DEC IXL
            0x25 | 0x2D => {
                let r = op >> 3;
                let result = alu::dec8(self.get_reg8_indexed(r, idx), self.regs.carry);
                self.set_reg8_indexed(r, idx, result.value);
                self.apply_flags(result);
            }

            // LD IXH, n / LD IXL, n
            0x26 | 0x2E => {
                let n = self.imm8(bus);
                self.set_reg8_indexed(op >> 3, idx, n);
            }

            // INC (IX+d) / DEC (IX+d)
            0x34 | 0x35 => {
                let address = self.index_address(bus, idx);
                let value = self.read8(bus, address);
                self.internal(bus, address, 1);
                let result = if op == 0x34 {
                    alu::inc8(value, self.regs.carry)
                } else {
                    alu::dec8(value, self.regs.carry)
                };
                self.write8(bus, address, result.value);
                self.apply_flags(result);
            }

            // LD (IX+d), n
            0x36 => {
                let d = self.imm8(bus) as i8;
                let n = self.imm8(bus);
                self.internal(bus, self.regs.pc.wrapping_sub(1), 2);
                let address = self.index(idx).wrapping_add_signed(i16::from(d));
                self.regs.memptr = address;
                self.write8(bus, address, n);
            }

            // LD r, r' with IXH/IXL, LD r, (IX+d), LD (IX+d), r
            0x40..=0x75 | 0x77..=0x7F => {
                let dst = (op >> 3) & 7;
                let src = op & 7;
                if src == 6 {
                    // H and L here are the real registers
                    let address = self.index_address(bus, idx);
                    let value = self.read8(bus, address);
                    self.set_reg8(dst, value);
                } else if dst == 6 {
                    let address = self.index_address(bus, idx);
                    self.write8(bus, address, self.get_reg8(src));
                } else {
                    let value = self.get_reg8_indexed(src, idx);
                    self.set_reg8_indexed(dst, idx, value);
                }
            }

            // ALU A, IXH/IXL/(IX+d)
            0x80..=0xBF => {
                let src = op & 7;
                let value = if src == 6 {
                    let address = self.index_address(bus, idx);
                    self.read8(bus, address)
                } else {
                    self.get_reg8_indexed(src, idx)
                };
                self.alu_a(op >> 3, value);
            }

            // DDCB / FDCB
            0xCB => self.execute_index_cb(bus, idx),

            // POP IX
            0xE1 => {
                let value = self.pop(bus);
                self.set_index(idx, value);
            }

            // EX (SP), IX
            0xE3 => {
                let value = self.ex_sp(bus, self.index(idx));
                self.set_index(idx, value);
            }

            // PUSH IX
            0xE5 => {
                self.internal_ir(bus, 1);
                self.push(bus, self.index(idx));
            }

            // JP (IX)
            0xE9 => self.regs.pc = self.index(idx),

            // LD SP, IX
            0xF9 => {
                self.internal_ir(bus, 2);
                self.regs.sp = self.index(idx);
            }

            // ED after a prefix runs unmodified
            0xED => self.execute_ed(bus),

            // No indexed form: the prefix only cost its M1 cycle
            _ => self.execute_base(bus, op),
        }
    }

    /// DDCB/FDCB: `d` comes before the opcode, and the opcode byte is a
    /// plain memory read, not an M1 fetch.
    fn execute_index_cb<B: Bus>(&mut self, bus: &mut B, idx: IndexReg) {
        let d = self.imm8(bus) as i8;
        let address = self.index(idx).wrapping_add_signed(i16::from(d));
        self.regs.memptr = address;
        let op = self.imm8(bus);
        self.internal(bus, self.regs.pc.wrapping_sub(1), 2);

        let value = self.read8(bus, address);
        self.internal(bus, address, 1);

        if op & 0xC0 == 0x40 {
            // BIT n, (IX+d): any register field, bits 5/3 from the address
            let flags = alu::bit_flags((op >> 3) & 7, value, (address >> 8) as u8);
            self.set_flags(flags);
            return;
        }

        let result = self.cb_transform(op, value);
        self.write8(bus, address, result);
        // Undocumented: the result is also copied to the named register.
        if op & 7 != 6 {
            self.set_reg8(op & 7, result);
        }
    }
}
