//! Instruction execution for the Z80: unprefixed page.

use emu_core::Bus;
use tracing::trace;

use crate::alu;
use crate::flags::{FLAG_SZP, HF};

use super::Z80;
use super::execute_index::IndexReg;

impl Z80 {
    /// Execute an unprefixed opcode. PC already points past it.
    pub(super) fn execute_base<B: Bus>(&mut self, bus: &mut B, op: u8) {
        match op {
            // NOP
            0x00 => {}

            // LD rr, nn (01=BC, 11=DE, 21=HL, 31=SP)
            0x01 | 0x11 | 0x21 | 0x31 => {
                let nn = self.imm16(bus);
                self.set_reg16(op >> 4, nn);
            }

            // LD (BC), A / LD (DE), A
            0x02 | 0x12 => {
                let addr = if op == 0x02 { self.regs.bc() } else { self.regs.de() };
                self.write8(bus, addr, self.regs.a);
                self.regs.memptr =
                    (u16::from(self.regs.a) << 8) | (addr.wrapping_add(1) & 0x00FF);
            }

            // INC rr (03=BC, 13=DE, 23=HL, 33=SP)
            0x03 | 0x13 | 0x23 | 0x33 => {
                self.internal_ir(bus, 2);
                let rp = op >> 4;
                self.set_reg16(rp, self.get_reg16(rp).wrapping_add(1));
            }

            // DEC rr (0B=BC, 1B=DE, 2B=HL, 3B=SP)
            0x0B | 0x1B | 0x2B | 0x3B => {
                self.internal_ir(bus, 2);
                let rp = op >> 4;
                self.set_reg16(rp, self.get_reg16(rp).wrapping_sub(1));
            }

            // INC r (04=B, 0C=C, 14=D, 1C=E, 24=H, 2C=L, 3C=A)
            0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x3C => {
                let r = op >> 3;
                let result = alu::inc8(self.get_reg8(r), self.regs.carry);
                self.set_reg8(r, result.value);
                self.apply_flags(result);
            }

            // DEC r (05=B, 0D=C, 15=D, 1D=E, 25=H, 2D=L, 3D=A)
            0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x3D => {
                let r = op >> 3;
                let result = alu::dec8(self.get_reg8(r), self.regs.carry);
                self.set_reg8(r, result.value);
                self.apply_flags(result);
            }

            // INC (HL)
            0x34 => {
                let hl = self.regs.hl();
                let value = self.read8(bus, hl);
                self.internal(bus, hl, 1);
                let result = alu::inc8(value, self.regs.carry);
                self.write8(bus, hl, result.value);
                self.apply_flags(result);
            }

            // DEC (HL)
            0x35 => {
                let hl = self.regs.hl();
                let value = self.read8(bus, hl);
                self.internal(bus, hl, 1);
                let result = alu::dec8(value, self.regs.carry);
                self.write8(bus, hl, result.value);
                self.apply_flags(result);
            }

            // LD r, n (06=B, 0E=C, 16=D, 1E=E, 26=H, 2E=L, 3E=A)
            0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x3E => {
                let n = self.imm8(bus);
                self.set_reg8(op >> 3, n);
            }

            // LD (HL), n
            0x36 => {
                let n = self.imm8(bus);
                self.write8(bus, self.regs.hl(), n);
            }

            // RLCA, RRCA, RLA, RRA
            0x07 | 0x0F | 0x17 | 0x1F => {
                let result = alu::rotate_a(op, self.regs.a, self.regs.flags, self.regs.carry);
                self.regs.a = result.value;
                self.apply_flags(result);
            }

            // EX AF, AF'
            0x08 => self.regs.exchange_af(),

            // ADD HL, rr (09=BC, 19=DE, 29=HL, 39=SP)
            0x09 | 0x19 | 0x29 | 0x39 => {
                self.internal_ir(bus, 7);
                let hl = self.regs.hl();
                let rr = self.get_reg16(op >> 4);
                self.regs.memptr = hl.wrapping_add(1);
                let result = alu::add16(hl, rr, self.regs.flags);
                self.regs.set_hl(result.value);
                self.apply_flags16(result);
            }

            // LD A, (BC) / LD A, (DE)
            0x0A | 0x1A => {
                let addr = if op == 0x0A { self.regs.bc() } else { self.regs.de() };
                self.regs.a = self.read8(bus, addr);
                self.regs.memptr = addr.wrapping_add(1);
            }

            // DJNZ e
            0x10 => {
                self.internal_ir(bus, 1);
                let offset = self.imm8(bus) as i8;
                let b = self.regs.b().wrapping_sub(1);
                self.regs.set_b(b);
                if b != 0 {
                    self.relative_jump(bus, offset);
                }
            }

            // JR e
            0x18 => {
                let offset = self.imm8(bus) as i8;
                self.relative_jump(bus, offset);
            }

            // JR cc, e (20=NZ, 28=Z, 30=NC, 38=C)
            0x20 | 0x28 | 0x30 | 0x38 => {
                let offset = self.imm8(bus) as i8;
                if self.condition((op >> 3) & 3) {
                    self.relative_jump(bus, offset);
                }
            }

            // LD (nn), HL
            0x22 => {
                let nn = self.imm16(bus);
                self.write16(bus, nn, self.regs.hl());
                self.regs.memptr = nn.wrapping_add(1);
            }

            // LD HL, (nn)
            0x2A => {
                let nn = self.imm16(bus);
                let value = self.read16(bus, nn);
                self.regs.set_hl(value);
                self.regs.memptr = nn.wrapping_add(1);
            }

            // DAA
            0x27 => {
                let result = alu::daa(self.regs.a, self.regs.flags, self.regs.carry);
                self.regs.a = result.value;
                self.apply_flags(result);
            }

            // CPL
            0x2F => {
                let flags = alu::cpl(self.regs.a, self.regs.flags);
                self.regs.a = !self.regs.a;
                self.set_flags(flags);
            }

            // LD (nn), A
            0x32 => {
                let nn = self.imm16(bus);
                self.write8(bus, nn, self.regs.a);
                self.regs.memptr = (u16::from(self.regs.a) << 8) | (nn.wrapping_add(1) & 0x00FF);
            }

            // LD A, (nn)
            0x3A => {
                let nn = self.imm16(bus);
                self.regs.a = self.read8(bus, nn);
                self.regs.memptr = nn.wrapping_add(1);
            }

            // SCF
            0x37 => {
                let bits = alu::scf_ccf_53(self.regs.a, self.regs.flags, self.last_flag_q);
                self.regs.carry = true;
                self.set_flags((self.regs.flags & FLAG_SZP) | bits);
            }

            // CCF
            0x3F => {
                let bits = alu::scf_ccf_53(self.regs.a, self.regs.flags, self.last_flag_q);
                let half = if self.regs.carry { HF } else { 0 };
                self.regs.carry = !self.regs.carry;
                self.set_flags((self.regs.flags & FLAG_SZP) | bits | half);
            }

            // HALT
            0x76 => {
                // PC stays on the HALT; each halted step re-fetches it.
                self.regs.pc = self.regs.pc.wrapping_sub(1);
                self.halted = true;
                trace!(pc = self.regs.pc, "halt");
            }

            // LD r, r' / LD r, (HL) / LD (HL), r
            0x40..=0x7F => {
                let dst = (op >> 3) & 7;
                let src = op & 7;
                if src == 6 {
                    let value = self.read8(bus, self.regs.hl());
                    self.set_reg8(dst, value);
                } else if dst == 6 {
                    self.write8(bus, self.regs.hl(), self.get_reg8(src));
                } else {
                    self.set_reg8(dst, self.get_reg8(src));
                }
            }

            // ADD/ADC/SUB/SBC/AND/XOR/OR/CP A, r / (HL)
            0x80..=0xBF => {
                let src = op & 7;
                let value = if src == 6 {
                    self.read8(bus, self.regs.hl())
                } else {
                    self.get_reg8(src)
                };
                self.alu_a(op >> 3, value);
            }

            // RET cc
            0xC0 | 0xC8 | 0xD0 | 0xD8 | 0xE0 | 0xE8 | 0xF0 | 0xF8 => {
                self.internal_ir(bus, 1);
                if self.condition(op >> 3) {
                    self.ret(bus);
                }
            }

            // RET
            0xC9 => self.ret(bus),

            // POP rr (C1=BC, D1=DE, E1=HL, F1=AF)
            0xC1 | 0xD1 | 0xE1 | 0xF1 => {
                let value = self.pop(bus);
                if op == 0xF1 {
                    self.regs.set_af(value);
                } else {
                    self.set_reg16((op >> 4) & 3, value);
                }
            }

            // PUSH rr (C5=BC, D5=DE, E5=HL, F5=AF)
            0xC5 | 0xD5 | 0xE5 | 0xF5 => {
                self.internal_ir(bus, 1);
                let value = if op == 0xF5 {
                    self.regs.af()
                } else {
                    self.get_reg16((op >> 4) & 3)
                };
                self.push(bus, value);
            }

            // JP cc, nn
            0xC2 | 0xCA | 0xD2 | 0xDA | 0xE2 | 0xEA | 0xF2 | 0xFA => {
                let nn = self.imm16(bus);
                self.regs.memptr = nn;
                if self.condition(op >> 3) {
                    self.regs.pc = nn;
                }
            }

            // JP nn
            0xC3 => {
                let nn = self.imm16(bus);
                self.regs.memptr = nn;
                self.regs.pc = nn;
            }

            // CALL cc, nn
            0xC4 | 0xCC | 0xD4 | 0xDC | 0xE4 | 0xEC | 0xF4 | 0xFC => {
                let nn = self.imm16(bus);
                self.regs.memptr = nn;
                if self.condition(op >> 3) {
                    self.call(bus, nn);
                }
            }

            // CALL nn
            0xCD => {
                let nn = self.imm16(bus);
                self.regs.memptr = nn;
                self.call(bus, nn);
            }

            // ALU A, n
            0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => {
                let n = self.imm8(bus);
                self.alu_a(op >> 3, n);
            }

            // RST p
            0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
                self.internal_ir(bus, 1);
                self.push(bus, self.regs.pc);
                let target = u16::from(op & 0x38);
                self.regs.pc = target;
                self.regs.memptr = target;
            }

            // CB prefix
            0xCB => self.execute_cb(bus),

            // OUT (n), A
            0xD3 => {
                let n = self.imm8(bus);
                let a = self.regs.a;
                let port = (u16::from(a) << 8) | u16::from(n);
                self.io_out(bus, port, a);
                self.regs.memptr = (u16::from(a) << 8) | u16::from(n.wrapping_add(1));
            }

            // IN A, (n)
            0xDB => {
                let n = self.imm8(bus);
                let port = (u16::from(self.regs.a) << 8) | u16::from(n);
                self.regs.memptr = port.wrapping_add(1);
                self.regs.a = self.io_in(bus, port);
            }

            // EXX
            0xD9 => self.regs.exchange_main(),

            // DD / FD prefixes
            0xDD => self.execute_index(bus, IndexReg::Ix),
            0xFD => self.execute_index(bus, IndexReg::Iy),

            // EX (SP), HL
            0xE3 => {
                let value = self.ex_sp(bus, self.regs.hl());
                self.regs.set_hl(value);
            }

            // JP (HL)
            0xE9 => self.regs.pc = self.regs.hl(),

            // EX DE, HL
            0xEB => {
                let de = self.regs.de();
                self.regs.set_de(self.regs.hl());
                self.regs.set_hl(de);
            }

            // ED prefix
            0xED => self.execute_ed(bus),

            // DI
            0xF3 => {
                self.iff1 = false;
                self.iff2 = false;
            }

            // EI
            0xFB => {
                self.iff1 = true;
                self.iff2 = true;
                self.pending_ei = true;
            }

            // LD SP, HL
            0xF9 => {
                self.internal_ir(bus, 2);
                self.regs.sp = self.regs.hl();
            }
        }
    }

    /// Accumulator operation by 3-bit encoding (ADD, ADC, SUB, SBC, AND,
    /// XOR, OR, CP). CP leaves A unchanged.
    pub(super) fn alu_a(&mut self, op: u8, value: u8) {
        let result = alu::accumulator_op(op, self.regs.a, value, self.regs.carry);
        self.regs.a = result.value;
        self.apply_flags(result);
    }

    /// Taken relative jump: five internal states on the offset address.
    fn relative_jump<B: Bus>(&mut self, bus: &mut B, offset: i8) {
        self.internal(bus, self.regs.pc.wrapping_sub(1), 5);
        let target = self.regs.pc.wrapping_add_signed(i16::from(offset));
        self.regs.pc = target;
        self.regs.memptr = target;
    }

    pub(super) fn ret<B: Bus>(&mut self, bus: &mut B) {
        let target = self.pop(bus);
        self.regs.pc = target;
        self.regs.memptr = target;
    }

    fn call<B: Bus>(&mut self, bus: &mut B, target: u16) {
        self.internal(bus, self.regs.pc.wrapping_sub(1), 1);
        self.push(bus, self.regs.pc);
        self.regs.pc = target;
    }

    /// `EX (SP), rr`: returns the word popped from the stack top.
    pub(super) fn ex_sp<B: Bus>(&mut self, bus: &mut B, value: u16) -> u16 {
        let sp = self.regs.sp;
        let [lo, hi] = value.to_le_bytes();
        let from_stack = self.read16(bus, sp);
        self.internal(bus, sp.wrapping_add(1), 1);
        self.write8(bus, sp.wrapping_add(1), hi);
        self.write8(bus, sp, lo);
        self.internal(bus, sp, 2);
        self.regs.memptr = from_stack;
        from_stack
    }
}
