//! Core traits and types shared by the Z80 interpreter and the machines that
//! embed it.
//!
//! The interpreter never touches memory or ports directly. Everything goes
//! through [`Bus`], which the embedding machine implements.

mod bus;
mod cpu;
mod observable;
mod simple_bus;
mod ticks;

pub use bus::Bus;
pub use cpu::Cpu;
pub use observable::{Observable, Value};
pub use simple_bus::{LoadError, SimpleBus};
pub use ticks::Ticks;
