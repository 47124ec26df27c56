//! Memory, I/O and timing contract between the CPU and the machine.

/// Memory and I/O bus interface.
///
/// The CPU performs every memory access, port access and timing notification
/// through this trait. Only the byte accessors and the port accessors are
/// required; everything else has a default that suits a plain RAM machine.
///
/// Cycle accounting convention: an opcode fetch is 4 T-states, a memory byte
/// access 3 and a port access 4. Those are implied by the call itself and
/// never reported separately. [`Bus::address_on_bus`] carries only the extra
/// internal states an instruction spends with an address held on the bus.
pub trait Bus {
    /// Read a byte for the instruction stream (M1 cycle).
    ///
    /// Semantically identical to [`Bus::read`] unless the machine models
    /// contention differently for M1.
    fn fetch_opcode(&mut self, address: u16) -> u8 {
        self.read(address)
    }

    /// Read a byte from the given address.
    fn read(&mut self, address: u16) -> u8;

    /// Write a byte to the given address.
    fn write(&mut self, address: u16, value: u8);

    /// Read a little-endian word: low byte at `address`, high byte at
    /// `address + 1` (wrapping).
    fn read_word(&mut self, address: u16) -> u16 {
        let lo = self.read(address);
        let hi = self.read(address.wrapping_add(1));
        u16::from_le_bytes([lo, hi])
    }

    /// Write a little-endian word.
    fn write_word(&mut self, address: u16, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.write(address, lo);
        self.write(address.wrapping_add(1), hi);
    }

    /// Read from a 16-bit I/O port.
    fn io_read(&mut self, port: u16) -> u8;

    /// Write to a 16-bit I/O port.
    fn io_write(&mut self, port: u16, value: u8);

    /// `cycles` internal T-states elapsed with `address` on the bus.
    fn address_on_bus(&mut self, address: u16, cycles: u32) {
        let _ = (address, cycles);
    }

    /// `cycles` T-states elapsed acknowledging an interrupt.
    fn interrupt_handling_time(&mut self, cycles: u32) {
        let _ = cycles;
    }

    /// Byte placed on the data bus during a maskable interrupt acknowledge.
    ///
    /// Mode 0 executes it as an opcode, mode 2 uses it as the low byte of the
    /// vector table address. An idle bus floats to 0xFF.
    fn interrupt_data(&mut self) -> u8 {
        0xFF
    }

    /// Called when an opcode is fetched from an address with a breakpoint
    /// set. The returned byte is executed in place of `opcode`.
    fn breakpoint(&mut self, address: u16, opcode: u8) -> u8 {
        let _ = address;
        opcode
    }

    /// One logical instruction, prefix chain included, has finished.
    fn instruction_complete(&mut self) {}
}
