//! Maskable interrupt modes.

use std::fmt;

/// How an accepted maskable interrupt finds its service routine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum InterruptMode {
    /// Execute the byte the device places on the data bus.
    #[default]
    Mode0,
    /// `RST 38h`.
    Mode1,
    /// Jump through the table entry at `(I << 8) | data`.
    Mode2,
}

impl InterruptMode {
    /// `IM n` operand for ED 46/56/5E and their mirrors. Bits 3-4 of the
    /// opcode select the mode; the undocumented `IM 0/1` at 4E/6E maps to 0.
    #[must_use]
    pub const fn from_im_opcode(op: u8) -> Self {
        match (op >> 3) & 3 {
            2 => Self::Mode1,
            3 => Self::Mode2,
            _ => Self::Mode0,
        }
    }

    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Mode0 => 0,
            Self::Mode1 => 1,
            Self::Mode2 => 2,
        }
    }
}

impl fmt::Display for InterruptMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IM {}", self.number())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn im_opcodes() {
        assert_eq!(InterruptMode::from_im_opcode(0x46), InterruptMode::Mode0);
        assert_eq!(InterruptMode::from_im_opcode(0x4E), InterruptMode::Mode0);
        assert_eq!(InterruptMode::from_im_opcode(0x56), InterruptMode::Mode1);
        assert_eq!(InterruptMode::from_im_opcode(0x5E), InterruptMode::Mode2);
        assert_eq!(InterruptMode::from_im_opcode(0x66), InterruptMode::Mode0);
        assert_eq!(InterruptMode::from_im_opcode(0x6E), InterruptMode::Mode0);
        assert_eq!(InterruptMode::from_im_opcode(0x76), InterruptMode::Mode1);
        assert_eq!(InterruptMode::from_im_opcode(0x7E), InterruptMode::Mode2);
    }
}
