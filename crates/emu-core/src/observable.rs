//! Read-only inspection of component state by path.
//!
//! Debuggers and test harnesses look at CPU state through string paths so
//! they don't need to know a core's concrete register layout. Queries never
//! affect execution.

use std::fmt;

/// One piece of observed state, tagged with its natural width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    /// A single flag or latch.
    Bool(bool),
    /// An 8-bit register.
    Byte(u8),
    /// A 16-bit register or pair.
    Word(u16),
    /// A running total such as elapsed T-states.
    Count(u64),
}

impl Value {
    /// Numeric view, with flags as 0 or 1.
    #[must_use]
    pub fn as_u64(self) -> u64 {
        match self {
            Value::Bool(v) => u64::from(v),
            Value::Byte(v) => u64::from(v),
            Value::Word(v) => u64::from(v),
            Value::Count(v) => v,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{}", u8::from(*v)),
            Value::Byte(v) => write!(f, "{v:#04X}"),
            Value::Word(v) => write!(f, "{v:#06X}"),
            Value::Count(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::Byte(v)
    }
}

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Value::Word(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Count(v)
    }
}

/// A component whose state can be inspected between steps.
pub trait Observable {
    /// Query a specific property by path.
    ///
    /// Paths are hierarchical, separated by dots:
    /// - `pc` - Program counter
    /// - `bc'` - Alternate BC pair
    /// - `flags.z` - Zero flag
    /// - `int.iff1` - Interrupt enable flip-flop 1
    ///
    /// Returns `None` if the path is not recognised.
    fn query(&self, path: &str) -> Option<Value>;

    /// Every path `query()` recognises.
    fn query_paths(&self) -> &'static [&'static str];
}
