//! Minimal CP/M environment for running `.COM` programs on the Z80.
//!
//! Only what instruction exercisers such as ZEXDOC and ZEXALL need: the
//! image is loaded into the TPA, BDOS calls at 0x0005 are intercepted for
//! console output, and returning to 0x0000 (warm boot) ends the run.

use std::io::{self, Write};

use emu_core::{LoadError, SimpleBus};
use tracing::debug;
use zilog_z80::Z80;

/// Warm boot vector. Reaching it ends the program.
pub const WARM_BOOT: u16 = 0x0000;
/// BDOS entry point, intercepted before the CPU executes it.
pub const BDOS_ENTRY: u16 = 0x0005;
/// Start of the transient program area, where `.COM` files load.
pub const TPA_START: u16 = 0x0100;
/// Default top of stack, also published as the BDOS address at 0x0006.
pub const DEFAULT_STACK: u16 = 0xFE00;

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// Jumped or returned to 0x0000.
    WarmBoot,
    /// BDOS function 0.
    SystemReset,
    /// Executed HALT with nothing to wake it.
    Halted,
    /// The instruction budget ran out.
    InstructionLimit,
}

/// Summary of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub exit: Exit,
    pub instructions: u64,
    pub cycles: u64,
}

/// A Z80 with 64 KiB of RAM and a console sink for BDOS output.
pub struct CpmMachine<W: Write> {
    cpu: Z80,
    bus: SimpleBus,
    console: W,
}

impl<W: Write> CpmMachine<W> {
    pub fn new(console: W) -> Self {
        Self {
            cpu: Z80::new(),
            bus: SimpleBus::new(),
            console,
        }
    }

    /// Load `image` at `load_address` and prepare the page-zero vectors.
    ///
    /// 0x0000 holds `JP 0x0000` and 0x0005 holds `JP stack`, so programs that
    /// size memory from the BDOS address put their stack at `stack`. A
    /// return address of 0x0000 is pushed so a final `RET` warm boots.
    pub fn load(&mut self, image: &[u8], load_address: u16, stack: u16) -> Result<(), LoadError> {
        let [stack_lo, stack_hi] = stack.to_le_bytes();
        self.bus.load(WARM_BOOT, &[0xC3, 0x00, 0x00])?;
        self.bus.load(BDOS_ENTRY, &[0xC3, stack_lo, stack_hi])?;
        self.bus.load(load_address, image)?;

        let sp = stack.wrapping_sub(2);
        self.bus.poke(sp, 0x00);
        self.bus.poke(sp.wrapping_add(1), 0x00);
        self.cpu.set_sp(sp);
        self.cpu.set_pc(load_address);

        debug!(len = image.len(), load_address, stack, "image loaded");
        Ok(())
    }

    /// Run until warm boot, system reset, HALT or `max_instructions`.
    ///
    /// Only console writes can fail.
    pub fn run(&mut self, max_instructions: Option<u64>) -> io::Result<RunStats> {
        let mut instructions = 0u64;
        let start_ticks = self.cpu.total_ticks().get();

        let exit = loop {
            match self.cpu.regs.pc {
                BDOS_ENTRY => {
                    if self.bdos()? {
                        break Exit::SystemReset;
                    }
                    self.cpu.force_ret(&mut self.bus);
                    continue;
                }
                WARM_BOOT => break Exit::WarmBoot,
                _ => {}
            }

            if self.cpu.is_halted() {
                break Exit::Halted;
            }
            if max_instructions.is_some_and(|limit| instructions >= limit) {
                break Exit::InstructionLimit;
            }

            self.cpu.step(&mut self.bus);
            instructions += 1;
        };

        self.console.flush()?;
        Ok(RunStats {
            exit,
            instructions,
            cycles: self.cpu.total_ticks().get() - start_ticks,
        })
    }

    /// Handle the BDOS call selected by C. Returns true for system reset.
    fn bdos(&mut self) -> io::Result<bool> {
        let regs = &self.cpu.regs;
        match regs.c() {
            0 => return Ok(true),
            // Console output: character in E
            2 => self.console.write_all(&[regs.e()])?,
            // Print string: DE points to a '$'-terminated string
            9 => {
                let mut address = regs.de();
                let mut text = Vec::new();
                loop {
                    let ch = self.bus.peek(address);
                    if ch == b'$' {
                        break;
                    }
                    text.push(ch);
                    address = address.wrapping_add(1);
                    if address == regs.de() {
                        // No terminator anywhere in memory.
                        break;
                    }
                }
                self.console.write_all(&text)?;
            }
            function => debug!(function, "unhandled BDOS call"),
        }
        self.console.flush()?;
        Ok(false)
    }

    #[must_use]
    pub fn cpu(&self) -> &Z80 {
        &self.cpu
    }

    #[must_use]
    pub fn bus(&self) -> &SimpleBus {
        &self.bus
    }

    #[must_use]
    pub fn console(&self) -> &W {
        &self.console
    }

    pub fn into_console(self) -> W {
        self.console
    }
}
