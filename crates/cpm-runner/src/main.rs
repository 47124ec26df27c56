//! `cpm-run`: run a CP/M `.COM` program on the Z80 interpreter.
//!
//! Console output from BDOS functions 2 and 9 goes to stdout; logs go to
//! stderr (`RUST_LOG`, default `info`).

use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use cpm_runner::{CpmMachine, DEFAULT_STACK, Exit, TPA_START};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "cpm-run",
    about = "Run a CP/M .COM program (e.g. ZEXDOC/ZEXALL) on the Z80 interpreter."
)]
struct Args {
    /// Path to the .COM image
    program: PathBuf,

    /// Stop after this many instructions (default: run to completion)
    #[arg(long, value_name = "COUNT")]
    max_instructions: Option<u64>,

    /// Address the image is loaded at and started from
    #[arg(long, value_name = "ADDR", value_parser = parse_address, default_value_t = TPA_START)]
    load_address: u16,

    /// Initial stack top, also reported as the top of memory at 0x0006
    #[arg(long, value_name = "ADDR", value_parser = parse_address, default_value_t = DEFAULT_STACK)]
    stack: u16,
}

/// Accept `0x`-prefixed hex or decimal.
fn parse_address(s: &str) -> Result<u16, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid address {s:?}: {e}"))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let image = fs::read(&args.program)
        .with_context(|| format!("failed to read {}", args.program.display()))?;

    let mut machine = CpmMachine::new(io::stdout().lock());
    machine
        .load(&image, args.load_address, args.stack)
        .with_context(|| format!("failed to load {}", args.program.display()))?;

    info!(
        program = %args.program.display(),
        load_address = args.load_address,
        "starting"
    );
    let started = Instant::now();
    let stats = machine
        .run(args.max_instructions)
        .context("failed to write console output")?;
    let elapsed = started.elapsed().as_secs_f64();

    if stats.exit == Exit::InstructionLimit {
        warn!(limit = ?args.max_instructions, "instruction limit reached");
    }
    info!(
        exit = ?stats.exit,
        instructions = stats.instructions,
        cycles = stats.cycles,
        elapsed_s = elapsed,
        mips = stats.instructions as f64 / elapsed.max(f64::EPSILON) / 1_000_000.0,
        "finished"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addresses_parse_as_hex_or_decimal() {
        assert_eq!(parse_address("0x0100"), Ok(0x0100));
        assert_eq!(parse_address("0XFE00"), Ok(0xFE00));
        assert_eq!(parse_address("256"), Ok(256));
        assert!(parse_address("0x10000").is_err());
        assert!(parse_address("zz").is_err());
    }

    #[test]
    fn defaults() {
        let args = Args::parse_from(["cpm-run", "zexdoc.com"]);
        assert_eq!(args.load_address, 0x0100);
        assert_eq!(args.stack, 0xFE00);
        assert_eq!(args.max_instructions, None);
    }
}
