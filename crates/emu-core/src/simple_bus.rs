//! Plain RAM bus for tests, exercisers and small hosts.

use std::collections::HashMap;

use thiserror::Error;
use tracing::trace;

use crate::Bus;

/// Full 16-bit address space.
const DEFAULT_MEMORY_SIZE: usize = 0x1_0000;

/// An image did not fit in the bus memory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("image of {len} bytes at {address:#06X} overruns {size} bytes of memory")]
pub struct LoadError {
    pub address: u16,
    pub len: usize,
    pub size: usize,
}

/// A bus over an owned, explicitly sized memory buffer and a port table.
///
/// Reads beyond the end of memory float to 0xFF and writes there are
/// dropped. Port reads return the value preset with [`SimpleBus::set_port`]
/// (0xFF otherwise); port writes are logged in order.
#[derive(Debug, Clone)]
pub struct SimpleBus {
    memory: Box<[u8]>,
    ports: HashMap<u16, u8>,
    io_writes: Vec<(u16, u8)>,
    interrupt_data: u8,
    breakpoint_substitute: Option<u8>,
    breakpoint_hits: Vec<(u16, u8)>,
    internal_cycles: u64,
    interrupt_cycles: u64,
    instructions: u64,
}

impl SimpleBus {
    /// A bus with 64 KiB of zeroed RAM.
    #[must_use]
    pub fn new() -> Self {
        Self::with_memory(vec![0; DEFAULT_MEMORY_SIZE].into_boxed_slice())
    }

    /// A bus over the given memory buffer. The buffer may be any size.
    #[must_use]
    pub fn with_memory(memory: Box<[u8]>) -> Self {
        Self {
            memory,
            ports: HashMap::new(),
            io_writes: Vec::new(),
            interrupt_data: 0xFF,
            breakpoint_substitute: None,
            breakpoint_hits: Vec::new(),
            internal_cycles: 0,
            interrupt_cycles: 0,
            instructions: 0,
        }
    }

    /// Copy `data` into memory starting at `address`.
    pub fn load(&mut self, address: u16, data: &[u8]) -> Result<(), LoadError> {
        let start = usize::from(address);
        let end = start + data.len();
        let Some(dest) = self.memory.get_mut(start..end) else {
            return Err(LoadError {
                address,
                len: data.len(),
                size: self.memory.len(),
            });
        };
        dest.copy_from_slice(data);
        Ok(())
    }

    /// Read memory without side effects.
    #[must_use]
    pub fn peek(&self, address: u16) -> u8 {
        self.memory.get(usize::from(address)).copied().unwrap_or(0xFF)
    }

    /// Write memory without side effects.
    pub fn poke(&mut self, address: u16, value: u8) {
        if let Some(cell) = self.memory.get_mut(usize::from(address)) {
            *cell = value;
        }
    }

    #[must_use]
    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    /// Value returned by reads from `port`.
    pub fn set_port(&mut self, port: u16, value: u8) {
        self.ports.insert(port, value);
    }

    /// Port writes in the order they happened.
    #[must_use]
    pub fn io_writes(&self) -> &[(u16, u8)] {
        &self.io_writes
    }

    /// Byte supplied during a maskable interrupt acknowledge.
    pub fn set_interrupt_data(&mut self, value: u8) {
        self.interrupt_data = value;
    }

    /// Make the breakpoint hook return `opcode` instead of the fetched byte.
    pub fn set_breakpoint_substitute(&mut self, opcode: Option<u8>) {
        self.breakpoint_substitute = opcode;
    }

    /// `(address, fetched opcode)` for every breakpoint hook call.
    #[must_use]
    pub fn breakpoint_hits(&self) -> &[(u16, u8)] {
        &self.breakpoint_hits
    }

    /// Sum of all cycles reported through `address_on_bus`.
    #[must_use]
    pub fn internal_cycles(&self) -> u64 {
        self.internal_cycles
    }

    /// Sum of all cycles reported through `interrupt_handling_time`.
    #[must_use]
    pub fn interrupt_cycles(&self) -> u64 {
        self.interrupt_cycles
    }

    /// Number of `instruction_complete` notifications.
    #[must_use]
    pub fn instructions(&self) -> u64 {
        self.instructions
    }
}

impl Default for SimpleBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for SimpleBus {
    fn read(&mut self, address: u16) -> u8 {
        self.peek(address)
    }

    fn write(&mut self, address: u16, value: u8) {
        self.poke(address, value);
    }

    fn io_read(&mut self, port: u16) -> u8 {
        self.ports.get(&port).copied().unwrap_or(0xFF)
    }

    fn io_write(&mut self, port: u16, value: u8) {
        self.io_writes.push((port, value));
    }

    fn address_on_bus(&mut self, _address: u16, cycles: u32) {
        self.internal_cycles += u64::from(cycles);
    }

    fn interrupt_handling_time(&mut self, cycles: u32) {
        self.interrupt_cycles += u64::from(cycles);
    }

    fn interrupt_data(&mut self) -> u8 {
        self.interrupt_data
    }

    fn breakpoint(&mut self, address: u16, opcode: u8) -> u8 {
        self.breakpoint_hits.push((address, opcode));
        let replacement = self.breakpoint_substitute.unwrap_or(opcode);
        trace!(address, opcode, replacement, "breakpoint hook");
        replacement
    }

    fn instruction_complete(&mut self) {
        self.instructions += 1;
    }
}
