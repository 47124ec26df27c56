//! ALU operations for the Z80.
//!
//! Pure functions over operands and the incoming flag state. The CPU writes
//! the result back and decides which register receives it.

#![allow(clippy::verbose_bit_mask)] // Clearer to read mask comparisons.

use crate::flags::{
    FLAG_53, FLAG_SZ, FLAG_SZHN, FLAG_SZP, HF, NF, PF, SF, XF, YF, ZF, sz53n_add, sz53n_sub,
    sz53pn_add, sz53pn_sub,
};

/// Result of an ALU operation: value, F without carry, and carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluResult {
    pub value: u8,
    pub flags: u8,
    pub carry: bool,
}

/// Result of a flag-affecting 16-bit operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluResult16 {
    pub value: u16,
    pub flags: u8,
    pub carry: bool,
}

/// `ADD`/`ADC`: 8-bit add with optional carry in.
#[must_use]
pub fn add8(a: u8, b: u8, carry_in: bool) -> AluResult {
    let sum = u16::from(a) + u16::from(b) + u16::from(carry_in);
    let value = sum as u8;
    let mut flags = sz53n_add(value);
    if (a ^ b ^ value) & HF != 0 {
        flags |= HF;
    }
    if (a ^ !b) & (a ^ value) & 0x80 != 0 {
        flags |= PF;
    }
    AluResult {
        value,
        flags,
        carry: sum > 0xFF,
    }
}

/// `SUB`/`SBC`: 8-bit subtract with optional borrow in.
#[must_use]
pub fn sub8(a: u8, b: u8, carry_in: bool) -> AluResult {
    let diff = i16::from(a) - i16::from(b) - i16::from(carry_in);
    let value = diff as u8;
    let mut flags = sz53n_sub(value);
    if (a ^ b ^ value) & HF != 0 {
        flags |= HF;
    }
    if (a ^ b) & (a ^ value) & 0x80 != 0 {
        flags |= PF;
    }
    AluResult {
        value,
        flags,
        carry: diff < 0,
    }
}

/// `CP`: subtract without storing. Bits 5/3 come from the operand, not the
/// result.
#[must_use]
pub fn cp8(a: u8, b: u8) -> AluResult {
    let sub = sub8(a, b, false);
    AluResult {
        value: a,
        flags: (sub.flags & !FLAG_53) | (b & FLAG_53),
        carry: sub.carry,
    }
}

#[must_use]
pub fn and8(a: u8, b: u8) -> AluResult {
    let value = a & b;
    AluResult {
        value,
        flags: sz53pn_add(value) | HF,
        carry: false,
    }
}

#[must_use]
pub fn or8(a: u8, b: u8) -> AluResult {
    let value = a | b;
    AluResult {
        value,
        flags: sz53pn_add(value),
        carry: false,
    }
}

#[must_use]
pub fn xor8(a: u8, b: u8) -> AluResult {
    let value = a ^ b;
    AluResult {
        value,
        flags: sz53pn_add(value),
        carry: false,
    }
}

/// `INC r`: carry is passed through untouched.
#[must_use]
pub fn inc8(v: u8, carry: bool) -> AluResult {
    let value = v.wrapping_add(1);
    let mut flags = sz53n_add(value);
    if v & 0x0F == 0x0F {
        flags |= HF;
    }
    if v == 0x7F {
        flags |= PF;
    }
    AluResult {
        value,
        flags,
        carry,
    }
}

/// `DEC r`: carry is passed through untouched.
#[must_use]
pub fn dec8(v: u8, carry: bool) -> AluResult {
    let value = v.wrapping_sub(1);
    let mut flags = sz53n_sub(value);
    if v & 0x0F == 0 {
        flags |= HF;
    }
    if v == 0x80 {
        flags |= PF;
    }
    AluResult {
        value,
        flags,
        carry,
    }
}

/// Dispatch for the eight accumulator operations selected by bits 3-5 of
/// `ADD A,r` .. `CP r` and their immediate/indexed forms.
#[must_use]
pub fn accumulator_op(op: u8, a: u8, operand: u8, carry: bool) -> AluResult {
    match op & 7 {
        0 => add8(a, operand, false),
        1 => add8(a, operand, carry),
        2 => sub8(a, operand, false),
        3 => sub8(a, operand, carry),
        4 => and8(a, operand),
        5 => xor8(a, operand),
        6 => or8(a, operand),
        _ => cp8(a, operand),
    }
}

// =========================================================================
// Rotates and shifts (CB page)
// =========================================================================

fn shifted(value: u8, carry: bool) -> AluResult {
    AluResult {
        value,
        flags: sz53pn_add(value),
        carry,
    }
}

#[must_use]
pub fn rlc8(v: u8) -> AluResult {
    shifted(v.rotate_left(1), v & 0x80 != 0)
}

#[must_use]
pub fn rrc8(v: u8) -> AluResult {
    shifted(v.rotate_right(1), v & 0x01 != 0)
}

#[must_use]
pub fn rl8(v: u8, carry: bool) -> AluResult {
    shifted((v << 1) | u8::from(carry), v & 0x80 != 0)
}

#[must_use]
pub fn rr8(v: u8, carry: bool) -> AluResult {
    shifted((v >> 1) | if carry { 0x80 } else { 0 }, v & 0x01 != 0)
}

#[must_use]
pub fn sla8(v: u8) -> AluResult {
    shifted(v << 1, v & 0x80 != 0)
}

#[must_use]
pub fn sra8(v: u8) -> AluResult {
    shifted((v >> 1) | (v & 0x80), v & 0x01 != 0)
}

/// Undocumented `SLL`: shift left and set bit 0.
#[must_use]
pub fn sll8(v: u8) -> AluResult {
    shifted((v << 1) | 0x01, v & 0x80 != 0)
}

#[must_use]
pub fn srl8(v: u8) -> AluResult {
    shifted(v >> 1, v & 0x01 != 0)
}

/// Dispatch for CB 00-3F: bits 3-5 select the rotate/shift.
#[must_use]
pub fn rotate_op(op: u8, v: u8, carry: bool) -> AluResult {
    match (op >> 3) & 7 {
        0 => rlc8(v),
        1 => rrc8(v),
        2 => rl8(v, carry),
        3 => rr8(v, carry),
        4 => sla8(v),
        5 => sra8(v),
        6 => sll8(v),
        _ => srl8(v),
    }
}

/// `BIT n,r`: returns new flags. Bits 5/3 come from `undoc`, which is the
/// register itself for register forms and MEMPTR's high byte otherwise.
#[must_use]
pub fn bit_flags(bit: u8, value: u8, undoc: u8) -> u8 {
    let mask = 1u8 << (bit & 7);
    let mut flags = HF | (undoc & FLAG_53);
    if value & mask == 0 {
        flags |= ZF | PF;
    } else if mask == SF {
        flags |= SF;
    }
    flags
}

// =========================================================================
// Accumulator specials
// =========================================================================

/// `RLCA`, `RRCA`, `RLA`, `RRA`: S, Z and P/V kept, H and N cleared,
/// bits 5/3 from the result.
#[must_use]
pub fn rotate_a(op: u8, a: u8, flags: u8, carry: bool) -> AluResult {
    let r = match (op >> 3) & 3 {
        0 => rlc8(a),
        1 => rrc8(a),
        2 => rl8(a, carry),
        _ => rr8(a, carry),
    };
    AluResult {
        value: r.value,
        flags: (flags & FLAG_SZP) | (r.value & FLAG_53),
        carry: r.carry,
    }
}

/// `DAA`, driven by N, H, C and the nibbles of A.
#[must_use]
pub fn daa(a: u8, flags: u8, carry: bool) -> AluResult {
    let mut correction = 0;
    let mut carry_out = carry;
    if flags & HF != 0 || a & 0x0F > 0x09 {
        correction = 0x06;
    }
    if carry || a > 0x99 {
        correction |= 0x60;
    }
    if a > 0x99 {
        carry_out = true;
    }
    if flags & NF != 0 {
        let r = sub8(a, correction, false);
        AluResult {
            value: r.value,
            flags: (r.flags & HF) | sz53pn_sub(r.value),
            carry: carry_out,
        }
    } else {
        let r = add8(a, correction, false);
        AluResult {
            value: r.value,
            flags: (r.flags & HF) | sz53pn_add(r.value),
            carry: carry_out,
        }
    }
}

/// `CPL`: carry unchanged.
#[must_use]
pub fn cpl(a: u8, flags: u8) -> u8 {
    (flags & FLAG_SZP) | HF | NF | (!a & FLAG_53)
}

/// `SCF`/`CCF` bits 5/3. With `last_q` set (previous instruction wrote F)
/// they come from A alone; otherwise A is OR'd with the old F.
#[must_use]
pub fn scf_ccf_53(a: u8, flags: u8, last_q: bool) -> u8 {
    let q = if last_q { flags } else { 0 };
    ((q ^ flags) | a) & FLAG_53
}

// =========================================================================
// 16-bit arithmetic
// =========================================================================

/// `ADD HL,rr`: S, Z and P/V preserved from `flags`.
#[must_use]
pub fn add16(a: u16, b: u16, flags: u8) -> AluResult16 {
    let sum = u32::from(a) + u32::from(b);
    let value = sum as u16;
    let mut f = (flags & FLAG_SZP) | ((value >> 8) as u8 & FLAG_53);
    if (value & 0x0FFF) < (a & 0x0FFF) {
        f |= HF;
    }
    AluResult16 {
        value,
        flags: f,
        carry: sum > 0xFFFF,
    }
}

/// `ADC HL,rr`
#[must_use]
pub fn adc16(a: u16, b: u16, carry_in: bool) -> AluResult16 {
    let sum = u32::from(a) + u32::from(b) + u32::from(carry_in);
    let value = sum as u16;
    let mut f = sz53n_add((value >> 8) as u8);
    if value != 0 {
        f &= !ZF;
    }
    if (value ^ a ^ b) & 0x1000 != 0 {
        f |= HF;
    }
    if (a ^ !b) & (a ^ value) & 0x8000 != 0 {
        f |= PF;
    }
    AluResult16 {
        value,
        flags: f,
        carry: sum > 0xFFFF,
    }
}

/// `SBC HL,rr`
#[must_use]
pub fn sbc16(a: u16, b: u16, carry_in: bool) -> AluResult16 {
    let diff = i32::from(a) - i32::from(b) - i32::from(carry_in);
    let value = diff as u16;
    let mut f = sz53n_sub((value >> 8) as u8);
    if value != 0 {
        f &= !ZF;
    }
    if (value ^ a ^ b) & 0x1000 != 0 {
        f |= HF;
    }
    if (a ^ b) & (a ^ value) & 0x8000 != 0 {
        f |= PF;
    }
    AluResult16 {
        value,
        flags: f,
        carry: diff < 0,
    }
}

// =========================================================================
// Block instruction flags
// =========================================================================

/// `LDI`/`LDD` flags: bit 3 from `value + A` bit 3, bit 5 from its bit 1.
#[must_use]
pub fn block_transfer_flags(flags: u8, a: u8, value: u8, bc_nonzero: bool) -> u8 {
    let n = value.wrapping_add(a);
    let mut f = (flags & FLAG_SZ) | (n & XF);
    if n & NF != 0 {
        f |= YF;
    }
    if bc_nonzero {
        f |= PF;
    }
    f
}

/// `CPI`/`CPD` flags. Carry is preserved by the caller.
#[must_use]
pub fn block_compare_flags(a: u8, value: u8, bc_nonzero: bool) -> u8 {
    let cmp = cp8(a, value);
    let n = a
        .wrapping_sub(value)
        .wrapping_sub(u8::from(cmp.flags & HF != 0));
    let mut f = (cmp.flags & FLAG_SZHN) | (n & XF);
    if n & NF != 0 {
        f |= YF;
    }
    if bc_nonzero {
        f |= PF;
    }
    f
}

/// `INI`/`IND`/`OUTI`/`OUTD` flags. `k` is the byte transferred plus the
/// adjusted C (input) or the new L (output); `b` is B after the decrement.
#[must_use]
pub fn block_io_flags(value: u8, k: u16, b: u8) -> AluResult {
    let mut flags = sz53n_add(b);
    if value & 0x80 != 0 {
        flags |= NF;
    }
    let carry = k > 0xFF;
    if carry {
        flags |= HF;
    }
    flags |= sz53pn_add(((k as u8) & 7) ^ b) & PF;
    AluResult {
        value: b,
        flags,
        carry,
    }
}

/// H and P/V for an I/O block instruction that is about to repeat.
///
/// The CPU re-runs the B decrement internally on repeat, which changes how
/// H and P/V come out compared with the final iteration.
#[must_use]
pub fn block_io_repeat_flags(flags: u8, value: u8, k: u16, b: u8) -> u8 {
    let p = ((k as u8) & 7) ^ b;
    let carry = k > 0xFF;
    let (hf, pf) = if carry {
        if value & 0x80 != 0 {
            (
                if b & 0x0F == 0 { HF } else { 0 },
                sz53pn_add(p ^ (b.wrapping_sub(1) & 7)) & PF,
            )
        } else {
            (
                if b & 0x0F == 0x0F { HF } else { 0 },
                sz53pn_add(p ^ (b.wrapping_add(1) & 7)) & PF,
            )
        }
    } else {
        (0, sz53pn_add(p ^ (b & 7)) & PF)
    };
    (flags & !(HF | PF)) | hf | pf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_transfer_keeps_sign_zero() {
        // 0x05 + 0x03 = 0x08: bit 3 set, bit 1 clear.
        assert_eq!(block_transfer_flags(SF | ZF | HF | NF, 0x03, 0x05, true), SF | ZF | XF | PF);
        // 0x01 + 0x01 = 0x02: bit 1 lands in F bit 5.
        assert_eq!(block_transfer_flags(0, 0x01, 0x01, false), YF);
    }

    #[test]
    fn add_overflowing_byte() {
        let r = add8(0xFF, 0x01, false);
        assert_eq!(r.value, 0x00);
        assert!(r.carry);
        assert_eq!(r.flags & (SF | ZF | HF | PF | NF), ZF | HF);
    }

    #[test]
    fn add_signed_overflow() {
        let r = add8(0x7F, 0x01, false);
        assert_eq!(r.value, 0x80);
        assert_eq!(r.flags, SF | HF | PF);
        assert!(!r.carry);
    }

    #[test]
    fn adc_uses_carry_in() {
        let r = add8(0x0E, 0x01, true);
        assert_eq!(r.value, 0x10);
        assert_ne!(r.flags & HF, 0);
    }

    #[test]
    fn sub_borrow() {
        let r = sub8(0x00, 0x01, false);
        assert_eq!(r.value, 0xFF);
        assert!(r.carry);
        assert_eq!(r.flags, SF | YF | HF | XF | NF);
    }

    #[test]
    fn sbc_signed_overflow() {
        let r = sub8(0x80, 0x00, true);
        assert_eq!(r.value, 0x7F);
        assert_ne!(r.flags & PF, 0);
        assert_ne!(r.flags & HF, 0);
    }

    #[test]
    fn cp_takes_undocumented_bits_from_operand() {
        let r = cp8(0x00, 0x28);
        assert_eq!(r.value, 0x00, "CP must not change A");
        assert_eq!(r.flags & (YF | XF), YF | XF);
        assert!(r.carry);
        let r = cp8(0x42, 0x42);
        assert_eq!(r.flags & (ZF | NF), ZF | NF);
    }

    #[test]
    fn logical_ops_clear_carry_and_set_parity() {
        let r = xor8(0xFF, 0xFF);
        assert_eq!(r.value, 0);
        assert_eq!(r.flags, ZF | PF);
        assert!(!r.carry);

        let r = and8(0xF0, 0x3C);
        assert_eq!(r.value, 0x30);
        assert_eq!(r.flags, YF | HF | PF);

        let r = or8(0x01, 0x00);
        assert_eq!(r.flags, 0);
    }

    #[test]
    fn inc_dec_edges() {
        let r = inc8(0x7F, true);
        assert_eq!(r.value, 0x80);
        assert_eq!(r.flags, SF | HF | PF);
        assert!(r.carry, "INC preserves carry");

        let r = dec8(0x80, false);
        assert_eq!(r.value, 0x7F);
        assert_eq!(r.flags, YF | HF | XF | PF | NF);

        let r = dec8(0x01, false);
        assert_eq!(r.flags, ZF | NF);
    }

    #[test]
    fn rotates() {
        let r = rlc8(0x80);
        assert_eq!(r.value, 0x01);
        assert!(r.carry);

        let r = rr8(0x01, true);
        assert_eq!(r.value, 0x80);
        assert!(r.carry);

        assert_eq!(sra8(0x81).value, 0xC0);
        assert_eq!(sll8(0x00).value, 0x01);
        assert_eq!(srl8(0x80).value, 0x40);
        assert_eq!(rotate_op(0x30, 0x00, false).value, 0x01, "CB 30 is SLL");
    }

    #[test]
    fn accumulator_rotates_keep_szp() {
        let r = rotate_a(0x07, 0x80, SF | ZF | PF | HF | NF, false);
        assert_eq!(r.value, 0x01);
        assert!(r.carry);
        assert_eq!(r.flags, SF | ZF | PF);

        let r = rotate_a(0x1F, 0x01, 0, false);
        assert_eq!(r.value, 0x00);
        assert!(r.carry);
    }

    #[test]
    fn bit_test() {
        assert_eq!(bit_flags(0, 0x00, 0x00), ZF | HF | PF);
        assert_eq!(bit_flags(7, 0x80, 0x80), SF | HF);
        assert_eq!(bit_flags(3, 0x08, 0x28), HF | YF | XF);
    }

    #[test]
    fn daa_after_add() {
        // 0x15 + 0x27 = 0x3C, adjusted to BCD 0x42
        let sum = add8(0x15, 0x27, false);
        let r = daa(sum.value, sum.flags, sum.carry);
        assert_eq!(r.value, 0x42);
        assert!(!r.carry);

        // 0x99 + 0x01 = 0x9A -> 0x00 with carry
        let sum = add8(0x99, 0x01, false);
        let r = daa(sum.value, sum.flags, sum.carry);
        assert_eq!(r.value, 0x00);
        assert!(r.carry);
        assert_ne!(r.flags & ZF, 0);
    }

    #[test]
    fn daa_after_sub() {
        // 0x42 - 0x15 = 0x2D, adjusted to BCD 0x27
        let diff = sub8(0x42, 0x15, false);
        let r = daa(diff.value, diff.flags, diff.carry);
        assert_eq!(r.value, 0x27);
        assert_ne!(r.flags & NF, 0);
    }

    #[test]
    fn sixteen_bit() {
        let r = add16(0x0FFF, 0x0001, SF | ZF | PF);
        assert_eq!(r.value, 0x1000);
        assert_eq!(r.flags, SF | ZF | PF | HF);
        assert!(!r.carry);

        let r = adc16(0xFFFF, 0x0000, true);
        assert_eq!(r.value, 0);
        assert!(r.carry);
        assert_ne!(r.flags & ZF, 0);

        let r = sbc16(0x8000, 0x0001, false);
        assert_eq!(r.value, 0x7FFF);
        assert_ne!(r.flags & PF, 0);
        assert_ne!(r.flags & NF, 0);
        assert_eq!(r.flags & ZF, 0);
    }

    #[test]
    fn scf_ccf_undocumented_bits() {
        // Previous instruction wrote F: bits come from A only.
        assert_eq!(scf_ccf_53(0x00, YF | XF, true), 0);
        // Previous instruction left F alone: A | F.
        assert_eq!(scf_ccf_53(0x00, YF | XF, false), YF | XF);
        assert_eq!(scf_ccf_53(0x28, 0, true), YF | XF);
    }
}
