//! ED page: extended loads, 16-bit arithmetic, interrupt control, port I/O
//! through C and the block instructions.

use emu_core::Bus;

use crate::alu;
use crate::flags::{FLAG_53, PF, sz53n_add, sz53pn_add};
use crate::interrupt::InterruptMode;

use super::Z80;

impl Z80 {
    /// Execute an ED-prefixed instruction. The ED byte has been fetched.
    pub(super) fn execute_ed<B: Bus>(&mut self, bus: &mut B) {
        let op = self.fetch_prefixed(bus);

        match op {
            // IN r, (C) (70 is IN F,(C): flags only)
            0x40 | 0x48 | 0x50 | 0x58 | 0x60 | 0x68 | 0x70 | 0x78 => {
                let bc = self.regs.bc();
                self.regs.memptr = bc.wrapping_add(1);
                let value = self.io_in(bus, bc);
                self.set_flags(sz53pn_add(value));
                if op != 0x70 {
                    self.set_reg8(op >> 3, value);
                }
            }

            // OUT (C), r (71 is OUT (C),0)
            0x41 | 0x49 | 0x51 | 0x59 | 0x61 | 0x69 | 0x71 | 0x79 => {
                let bc = self.regs.bc();
                let value = if op == 0x71 { 0 } else { self.get_reg8(op >> 3) };
                self.io_out(bus, bc, value);
                self.regs.memptr = bc.wrapping_add(1);
            }

            // SBC HL, rr
            0x42 | 0x52 | 0x62 | 0x72 => {
                self.internal_ir(bus, 7);
                let hl = self.regs.hl();
                self.regs.memptr = hl.wrapping_add(1);
                let result = alu::sbc16(hl, self.get_reg16(op >> 4), self.regs.carry);
                self.regs.set_hl(result.value);
                self.apply_flags16(result);
            }

            // ADC HL, rr
            0x4A | 0x5A | 0x6A | 0x7A => {
                self.internal_ir(bus, 7);
                let hl = self.regs.hl();
                self.regs.memptr = hl.wrapping_add(1);
                let result = alu::adc16(hl, self.get_reg16(op >> 4), self.regs.carry);
                self.regs.set_hl(result.value);
                self.apply_flags16(result);
            }

            // LD (nn), rr
            0x43 | 0x53 | 0x63 | 0x73 => {
                let nn = self.imm16(bus);
                self.write16(bus, nn, self.get_reg16(op >> 4));
                self.regs.memptr = nn.wrapping_add(1);
            }

            // LD rr, (nn)
            0x4B | 0x5B | 0x6B | 0x7B => {
                let nn = self.imm16(bus);
                let value = self.read16(bus, nn);
                self.set_reg16(op >> 4, value);
                self.regs.memptr = nn.wrapping_add(1);
            }

            // NEG and its mirrors
            0x44 | 0x4C | 0x54 | 0x5C | 0x64 | 0x6C | 0x74 | 0x7C => {
                let result = alu::sub8(0, self.regs.a, false);
                self.regs.a = result.value;
                self.apply_flags(result);
            }

            // RETN / RETI and mirrors: both restore IFF1 from IFF2
            0x45 | 0x4D | 0x55 | 0x5D | 0x65 | 0x6D | 0x75 | 0x7D => {
                self.iff1 = self.iff2;
                self.ret(bus);
            }

            // IM 0/1/2 and mirrors
            0x46 | 0x4E | 0x56 | 0x5E | 0x66 | 0x6E | 0x76 | 0x7E => {
                self.im = InterruptMode::from_im_opcode(op);
            }

            // LD I, A
            0x47 => {
                self.internal_ir(bus, 1);
                self.regs.i = self.regs.a;
            }

            // LD R, A
            0x4F => {
                self.internal_ir(bus, 1);
                self.regs.set_r(self.regs.a);
            }

            // LD A, I / LD A, R: P/V reflects IFF2
            0x57 | 0x5F => {
                self.internal_ir(bus, 1);
                self.regs.a = if op == 0x57 { self.regs.i } else { self.regs.r() };
                let mut flags = sz53n_add(self.regs.a);
                if self.iff2 {
                    flags |= PF;
                }
                self.set_flags(flags);
            }

            // RRD
            0x67 => {
                let hl = self.regs.hl();
                let value = self.read8(bus, hl);
                self.internal(bus, hl, 4);
                let a = self.regs.a;
                self.write8(bus, hl, (a << 4) | (value >> 4));
                self.regs.a = (a & 0xF0) | (value & 0x0F);
                self.set_flags(sz53pn_add(self.regs.a));
                self.regs.memptr = hl.wrapping_add(1);
            }

            // RLD
            0x6F => {
                let hl = self.regs.hl();
                let value = self.read8(bus, hl);
                self.internal(bus, hl, 4);
                let a = self.regs.a;
                self.write8(bus, hl, (value << 4) | (a & 0x0F));
                self.regs.a = (a & 0xF0) | (value >> 4);
                self.set_flags(sz53pn_add(self.regs.a));
                self.regs.memptr = hl.wrapping_add(1);
            }

            // LDI, LDD, LDIR, LDDR
            0xA0 | 0xA8 | 0xB0 | 0xB8 => {
                let de = self.regs.de();
                let more = self.block_transfer(bus, op & 0x08 == 0);
                if op & 0x10 != 0 && more {
                    self.repeat_block(bus, de);
                }
            }

            // CPI, CPD, CPIR, CPDR
            0xA1 | 0xA9 | 0xB1 | 0xB9 => {
                let hl = self.regs.hl();
                let more = self.block_compare(bus, op & 0x08 == 0);
                if op & 0x10 != 0 && more && !self.regs.zero_flag() {
                    self.repeat_block(bus, hl);
                }
            }

            // INI, IND, INIR, INDR
            0xA2 | 0xAA | 0xB2 | 0xBA => {
                let hl = self.regs.hl();
                let ctx = self.block_in(bus, op & 0x08 == 0);
                if op & 0x10 != 0 && self.regs.b() != 0 {
                    self.repeat_block_io(bus, hl, ctx);
                }
            }

            // OUTI, OUTD, OTIR, OTDR
            0xA3 | 0xAB | 0xB3 | 0xBB => {
                let ctx = self.block_out(bus, op & 0x08 == 0);
                if op & 0x10 != 0 && self.regs.b() != 0 {
                    let bc = self.regs.bc();
                    self.repeat_block_io(bus, bc, ctx);
                }
            }

            // Everything else on this page is an 8 T-state NOP
            _ => {}
        }
    }

    /// One `LDI`/`LDD` step. Returns true while BC is non-zero.
    fn block_transfer<B: Bus>(&mut self, bus: &mut B, increment: bool) -> bool {
        let hl = self.regs.hl();
        let de = self.regs.de();
        let value = self.read8(bus, hl);
        self.write8(bus, de, value);
        self.internal(bus, de, 2);
        self.regs.set_hl(step_address(hl, increment));
        self.regs.set_de(step_address(de, increment));
        let bc = self.regs.bc().wrapping_sub(1);
        self.regs.set_bc(bc);
        let flags = alu::block_transfer_flags(self.regs.flags, self.regs.a, value, bc != 0);
        self.set_flags(flags);
        bc != 0
    }

    /// One `CPI`/`CPD` step. Carry is preserved. Returns true while BC is
    /// non-zero.
    fn block_compare<B: Bus>(&mut self, bus: &mut B, increment: bool) -> bool {
        let hl = self.regs.hl();
        let value = self.read8(bus, hl);
        self.internal(bus, hl, 5);
        self.regs.set_hl(step_address(hl, increment));
        let bc = self.regs.bc().wrapping_sub(1);
        self.regs.set_bc(bc);
        self.regs.memptr = step_address(self.regs.memptr, increment);
        self.set_flags(alu::block_compare_flags(self.regs.a, value, bc != 0));
        bc != 0
    }

    /// One `INI`/`IND` step.
    fn block_in<B: Bus>(&mut self, bus: &mut B, increment: bool) -> BlockIo {
        self.internal_ir(bus, 1);
        let bc = self.regs.bc();
        let value = self.io_in(bus, bc);
        self.regs.memptr = step_address(bc, increment);
        let hl = self.regs.hl();
        self.write8(bus, hl, value);
        let b = self.regs.b().wrapping_sub(1);
        self.regs.set_b(b);
        self.regs.set_hl(step_address(hl, increment));
        let c = if increment {
            self.regs.c().wrapping_add(1)
        } else {
            self.regs.c().wrapping_sub(1)
        };
        let k = u16::from(value) + u16::from(c);
        self.apply_flags(alu::block_io_flags(value, k, b));
        BlockIo { value, k }
    }

    /// One `OUTI`/`OUTD` step. B is decremented before it forms the port.
    fn block_out<B: Bus>(&mut self, bus: &mut B, increment: bool) -> BlockIo {
        self.internal_ir(bus, 1);
        let b = self.regs.b().wrapping_sub(1);
        self.regs.set_b(b);
        let hl = self.regs.hl();
        let value = self.read8(bus, hl);
        let bc = self.regs.bc();
        self.regs.memptr = step_address(bc, increment);
        self.io_out(bus, bc, value);
        self.regs.set_hl(step_address(hl, increment));
        let k = u16::from(value) + u16::from(self.regs.l());
        self.apply_flags(alu::block_io_flags(value, k, b));
        BlockIo { value, k }
    }

    /// Rewind PC onto the ED prefix so the instruction runs again.
    /// Bits 5/3 of F come from the rewound PC's high byte.
    fn repeat_block<B: Bus>(&mut self, bus: &mut B, address: u16) {
        self.internal(bus, address, 5);
        self.regs.pc = self.regs.pc.wrapping_sub(2);
        self.regs.memptr = self.regs.pc.wrapping_add(1);
        let pch = (self.regs.pc >> 8) as u8;
        self.regs.flags = (self.regs.flags & !FLAG_53) | (pch & FLAG_53);
    }

    fn repeat_block_io<B: Bus>(&mut self, bus: &mut B, address: u16, ctx: BlockIo) {
        self.regs.flags =
            alu::block_io_repeat_flags(self.regs.flags, ctx.value, ctx.k, self.regs.b());
        self.repeat_block(bus, address);
    }
}

/// Byte moved by an I/O block step and the sum that drives its flags.
#[derive(Debug, Clone, Copy)]
struct BlockIo {
    value: u8,
    k: u16,
}

fn step_address(address: u16, increment: bool) -> u16 {
    if increment {
        address.wrapping_add(1)
    } else {
        address.wrapping_sub(1)
    }
}
