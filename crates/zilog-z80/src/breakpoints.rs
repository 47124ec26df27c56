//! Per-address breakpoint enables.

const WORDS: usize = 0x1_0000 / 64;

/// One enable bit per address, all clear by default.
///
/// Consulted on every opcode fetch, so lookup is a single bit test and an
/// empty table short-circuits on the count.
#[derive(Debug, Clone)]
pub struct Breakpoints {
    bits: Box<[u64; WORDS]>,
    count: usize,
}

impl Breakpoints {
    #[must_use]
    pub fn new() -> Self {
        Self {
            bits: Box::new([0; WORDS]),
            count: 0,
        }
    }

    pub fn set(&mut self, address: u16, enabled: bool) {
        let (word, mask) = Self::locate(address);
        let was = self.bits[word] & mask != 0;
        if enabled && !was {
            self.bits[word] |= mask;
            self.count += 1;
        } else if !enabled && was {
            self.bits[word] &= !mask;
            self.count -= 1;
        }
    }

    #[must_use]
    pub fn is_set(&self, address: u16) -> bool {
        if self.count == 0 {
            return false;
        }
        let (word, mask) = Self::locate(address);
        self.bits[word] & mask != 0
    }

    /// Number of enabled addresses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn clear(&mut self) {
        self.bits.fill(0);
        self.count = 0;
    }

    fn locate(address: u16) -> (usize, u64) {
        (usize::from(address >> 6), 1u64 << (address & 63))
    }
}

impl Default for Breakpoints {
    fn default() -> Self {
        Self::new()
    }
}
