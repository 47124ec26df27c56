//! Z80 register file.

use crate::flags::{CF, HF, NF, PF, SF, XF, YF, ZF};

/// A 16-bit register pair with byte views.
///
/// The high byte is always bits 8-15 regardless of host byte order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RegisterPair(u16);

impl RegisterPair {
    #[must_use]
    pub const fn new(word: u16) -> Self {
        Self(word)
    }

    #[must_use]
    pub const fn word(self) -> u16 {
        self.0
    }

    #[must_use]
    pub const fn hi(self) -> u8 {
        (self.0 >> 8) as u8
    }

    #[must_use]
    pub const fn lo(self) -> u8 {
        self.0 as u8
    }

    pub fn set_word(&mut self, word: u16) {
        self.0 = word;
    }

    pub fn set_hi(&mut self, value: u8) {
        self.0 = (self.0 & 0x00FF) | (u16::from(value) << 8);
    }

    pub fn set_lo(&mut self, value: u8) {
        self.0 = (self.0 & 0xFF00) | u16::from(value);
    }
}

impl From<u16> for RegisterPair {
    fn from(word: u16) -> Self {
        Self(word)
    }
}

/// All program-visible Z80 registers plus MEMPTR.
///
/// F is split: `flags` holds S, Z, 5, H, 3, P/V and N while carry lives in
/// its own bool. [`Registers::f`] recombines them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Registers {
    pub a: u8,
    /// F without the carry bit.
    pub flags: u8,
    pub carry: bool,
    pub bc: RegisterPair,
    pub de: RegisterPair,
    pub hl: RegisterPair,

    // Alternate set
    pub af_alt: RegisterPair,
    pub bc_alt: RegisterPair,
    pub de_alt: RegisterPair,
    pub hl_alt: RegisterPair,

    pub ix: RegisterPair,
    pub iy: RegisterPair,
    pub sp: u16,
    pub pc: u16,

    pub i: u8,
    /// Refresh counter, low 7 bits only.
    pub r: u8,
    /// Bit 7 of R, only changed by `LD R,A`.
    pub r_bit7: bool,

    /// WZ/MEMPTR. Leaks into flag bits 3/5 of `BIT n,(HL)` and friends.
    pub memptr: u16,
}

macro_rules! byte_accessors {
    ($($get:ident, $set:ident => $pair:ident . $half:ident, $set_half:ident;)*) => {
        $(
            #[must_use]
            pub const fn $get(&self) -> u8 {
                self.$pair.$half()
            }

            pub fn $set(&mut self, value: u8) {
                self.$pair.$set_half(value);
            }
        )*
    };
}

macro_rules! pair_accessors {
    ($($get:ident, $set:ident => $pair:ident;)*) => {
        $(
            #[must_use]
            pub const fn $get(&self) -> u16 {
                self.$pair.word()
            }

            pub fn $set(&mut self, word: u16) {
                self.$pair.set_word(word);
            }
        )*
    };
}

macro_rules! flag_accessors {
    ($($get:ident, $set:ident => $mask:ident;)*) => {
        $(
            #[must_use]
            pub const fn $get(&self) -> bool {
                self.flags & $mask != 0
            }

            pub fn $set(&mut self, state: bool) {
                if state {
                    self.flags |= $mask;
                } else {
                    self.flags &= !$mask;
                }
            }
        )*
    };
}

impl Registers {
    byte_accessors! {
        b, set_b => bc.hi, set_hi;
        c, set_c => bc.lo, set_lo;
        d, set_d => de.hi, set_hi;
        e, set_e => de.lo, set_lo;
        h, set_h => hl.hi, set_hi;
        l, set_l => hl.lo, set_lo;
        ixh, set_ixh => ix.hi, set_hi;
        ixl, set_ixl => ix.lo, set_lo;
        iyh, set_iyh => iy.hi, set_hi;
        iyl, set_iyl => iy.lo, set_lo;
        a_alt, set_a_alt => af_alt.hi, set_hi;
        f_alt, set_f_alt => af_alt.lo, set_lo;
        b_alt, set_b_alt => bc_alt.hi, set_hi;
        c_alt, set_c_alt => bc_alt.lo, set_lo;
        d_alt, set_d_alt => de_alt.hi, set_hi;
        e_alt, set_e_alt => de_alt.lo, set_lo;
        h_alt, set_h_alt => hl_alt.hi, set_hi;
        l_alt, set_l_alt => hl_alt.lo, set_lo;
    }

    pair_accessors! {
        bc, set_bc => bc;
        de, set_de => de;
        hl, set_hl => hl;
        ix, set_ix => ix;
        iy, set_iy => iy;
        af_alt, set_af_alt => af_alt;
        bc_alt, set_bc_alt => bc_alt;
        de_alt, set_de_alt => de_alt;
        hl_alt, set_hl_alt => hl_alt;
    }

    flag_accessors! {
        sign_flag, set_sign_flag => SF;
        zero_flag, set_zero_flag => ZF;
        bit5_flag, set_bit5_flag => YF;
        half_carry_flag, set_half_carry_flag => HF;
        bit3_flag, set_bit3_flag => XF;
        parity_overflow_flag, set_parity_overflow_flag => PF;
        add_sub_flag, set_add_sub_flag => NF;
    }

    /// Combined flag byte.
    #[must_use]
    pub const fn f(&self) -> u8 {
        self.flags | if self.carry { CF } else { 0 }
    }

    pub fn set_f(&mut self, value: u8) {
        self.flags = value & !CF;
        self.carry = value & CF != 0;
    }

    #[must_use]
    pub const fn af(&self) -> u16 {
        (self.a as u16) << 8 | self.f() as u16
    }

    pub fn set_af(&mut self, word: u16) {
        let [f, a] = word.to_le_bytes();
        self.a = a;
        self.set_f(f);
    }

    #[must_use]
    pub const fn carry_flag(&self) -> bool {
        self.carry
    }

    pub fn set_carry_flag(&mut self, state: bool) {
        self.carry = state;
    }

    /// R as seen by `LD A,R`: counter plus the preserved top bit.
    #[must_use]
    pub const fn r(&self) -> u8 {
        (self.r & 0x7F) | if self.r_bit7 { 0x80 } else { 0 }
    }

    pub fn set_r(&mut self, value: u8) {
        self.r = value & 0x7F;
        self.r_bit7 = value & 0x80 != 0;
    }

    /// Advance the refresh counter by one M1 cycle. Bit 7 is untouched.
    pub fn increment_r(&mut self) {
        self.r = self.r.wrapping_add(1) & 0x7F;
    }

    /// I in the high byte, R in the low byte. Placed on the address bus
    /// during refresh, so internal cycles report it.
    #[must_use]
    pub const fn ir(&self) -> u16 {
        (self.i as u16) << 8 | self.r() as u16
    }

    /// `EX AF,AF'`
    pub fn exchange_af(&mut self) {
        let af = self.af();
        self.set_af(self.af_alt.word());
        self.af_alt.set_word(af);
    }

    /// `EXX`
    pub fn exchange_main(&mut self) {
        std::mem::swap(&mut self.bc, &mut self.bc_alt);
        std::mem::swap(&mut self.de, &mut self.de_alt);
        std::mem::swap(&mut self.hl, &mut self.hl_alt);
    }

    /// Power-on pattern: everything all-ones except PC, I and R.
    #[must_use]
    pub fn power_on() -> Self {
        let ones = RegisterPair::new(0xFFFF);
        Self {
            a: 0xFF,
            flags: 0xFF & !CF,
            carry: true,
            bc: ones,
            de: ones,
            hl: ones,
            af_alt: ones,
            bc_alt: ones,
            de_alt: ones,
            hl_alt: ones,
            ix: ones,
            iy: ones,
            sp: 0xFFFF,
            pc: 0,
            i: 0,
            r: 0,
            r_bit7: false,
            memptr: 0xFFFF,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_and_byte_views_agree() {
        let mut regs = Registers::default();
        regs.set_bc(0x1234);
        assert_eq!(regs.b(), 0x12);
        assert_eq!(regs.c(), 0x34);

        regs.set_h(0xAB);
        regs.set_l(0xCD);
        assert_eq!(regs.hl(), 0xABCD);

        regs.set_ixl(0x01);
        assert_eq!(regs.ix(), 0x0001);
        regs.set_ixh(0x80);
        assert_eq!(regs.ix(), 0x8001);
    }

    #[test]
    fn flag_byte_recombines_carry() {
        let mut regs = Registers::default();
        regs.set_f(0xD7);
        assert!(regs.carry_flag());
        assert_eq!(regs.flags & CF, 0);
        assert_eq!(regs.f(), 0xD7);

        regs.set_carry_flag(false);
        regs.set_zero_flag(false);
        assert_eq!(regs.f(), 0x96);
        assert!(regs.sign_flag());
        assert!(regs.parity_overflow_flag());
    }

    #[test]
    fn refresh_counter_keeps_bit7() {
        let mut regs = Registers::default();
        regs.set_r(0xFF);
        regs.increment_r();
        assert_eq!(regs.r(), 0x80);
        regs.set_r(0x7F);
        regs.increment_r();
        assert_eq!(regs.r(), 0x00);
    }

    #[test]
    fn exchanges_swap_whole_sets() {
        let mut regs = Registers::default();
        regs.a = 0x11;
        regs.set_f(0x22);
        regs.set_af_alt(0x3344);
        regs.exchange_af();
        assert_eq!(regs.af(), 0x3344);
        assert_eq!(regs.af_alt(), 0x1122);

        regs.set_hl(0x5555);
        regs.set_hl_alt(0xAAAA);
        regs.exchange_main();
        assert_eq!(regs.hl(), 0xAAAA);
        assert_eq!(regs.h_alt(), 0x55);
    }
}
