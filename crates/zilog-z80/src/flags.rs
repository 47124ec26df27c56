//! Z80 flag register bits and precomputed flag tables.

/// Sign flag (bit 7) - set if result is negative.
pub const SF: u8 = 0b1000_0000;

/// Zero flag (bit 6) - set if result is zero.
pub const ZF: u8 = 0b0100_0000;

/// Undocumented flag (bit 5) - copy of bit 5 of result.
pub const YF: u8 = 0b0010_0000;

/// Half-carry flag (bit 4) - carry from bit 3 to bit 4.
pub const HF: u8 = 0b0001_0000;

/// Undocumented flag (bit 3) - copy of bit 3 of result.
pub const XF: u8 = 0b0000_1000;

/// Parity/Overflow flag (bit 2) - parity or overflow depending on instruction.
pub const PF: u8 = 0b0000_0100;

/// Add/Subtract flag (bit 1) - set if last operation was subtraction.
pub const NF: u8 = 0b0000_0010;

/// Carry flag (bit 0) - carry out of bit 7.
pub const CF: u8 = 0b0000_0001;

pub(crate) const FLAG_53: u8 = YF | XF;
pub(crate) const FLAG_SZ: u8 = SF | ZF;
pub(crate) const FLAG_SZP: u8 = SF | ZF | PF;
pub(crate) const FLAG_SZHN: u8 = SF | ZF | HF | NF;

/// Compute parity of a byte (true if even number of 1 bits).
#[must_use]
pub const fn parity(value: u8) -> bool {
    value.count_ones().is_multiple_of(2)
}

/// Sign, zero and bits 5/3 of a result.
#[must_use]
pub const fn sz53(value: u8) -> u8 {
    let mut f = value & (SF | YF | XF);
    if value == 0 {
        f |= ZF;
    }
    f
}

/// [`sz53`] plus even parity.
#[must_use]
pub const fn sz53p(value: u8) -> u8 {
    let mut f = sz53(value);
    if parity(value) {
        f |= PF;
    }
    f
}

/// Four 256-entry tables mapping a result byte to S, Z, 5, 3, P and N.
///
/// H and C are always clear in every entry; callers OR them in. The
/// `_add` tables have N clear and the `_sub` tables have it set. The tables
/// without parity leave P/V clear so an overflow bit can be OR'd in.
#[derive(Debug)]
pub struct FlagTables {
    pub sz53n_add: [u8; 256],
    pub sz53pn_add: [u8; 256],
    pub sz53n_sub: [u8; 256],
    pub sz53pn_sub: [u8; 256],
}

impl FlagTables {
    const fn build() -> Self {
        let mut tables = Self {
            sz53n_add: [0; 256],
            sz53pn_add: [0; 256],
            sz53n_sub: [0; 256],
            sz53pn_sub: [0; 256],
        };
        let mut i = 0;
        while i < 256 {
            let value = i as u8;
            tables.sz53n_add[i] = sz53(value);
            tables.sz53pn_add[i] = sz53p(value);
            tables.sz53n_sub[i] = sz53(value) | NF;
            tables.sz53pn_sub[i] = sz53p(value) | NF;
            i += 1;
        }
        tables
    }
}

/// Tables are evaluated at compile time and shared by every CPU instance.
pub static FLAG_TABLES: FlagTables = FlagTables::build();

#[inline]
pub(crate) fn sz53n_add(value: u8) -> u8 {
    FLAG_TABLES.sz53n_add[usize::from(value)]
}

#[inline]
pub(crate) fn sz53pn_add(value: u8) -> u8 {
    FLAG_TABLES.sz53pn_add[usize::from(value)]
}

#[inline]
pub(crate) fn sz53n_sub(value: u8) -> u8 {
    FLAG_TABLES.sz53n_sub[usize::from(value)]
}

#[inline]
pub(crate) fn sz53pn_sub(value: u8) -> u8 {
    FLAG_TABLES.sz53pn_sub[usize::from(value)]
}
