//! ZEXDOC/ZEXALL instruction exercisers under the CP/M harness.
//!
//! The `.com` images are not shipped. Put them in `tests/data/` of this crate
//! and run with `--ignored --nocapture`; ZEXALL takes several billion
//! instructions, so build with `--release`.

use std::fs;
use std::path::Path;

use cpm_runner::{CpmMachine, DEFAULT_STACK, Exit, TPA_START};

fn run_exerciser(name: &str) {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data")
        .join(name);
    let Ok(binary) = fs::read(&path) else {
        eprintln!("{} not found, skipping", path.display());
        return;
    };

    let mut machine = CpmMachine::new(Vec::new());
    machine
        .load(&binary, TPA_START, DEFAULT_STACK)
        .expect("exerciser fits in the TPA");
    let stats = machine.run(None).expect("console writes to a Vec");

    let output = String::from_utf8_lossy(machine.console()).into_owned();
    println!("{output}");
    println!(
        "{name}: {} instructions, {} T-states",
        stats.instructions, stats.cycles
    );

    assert_eq!(stats.exit, Exit::WarmBoot, "{name} did not finish");
    assert!(output.contains("Tests complete"), "{name} produced no summary");
    assert!(!output.contains("ERROR"), "{name} reported errors");
}

#[test]
#[ignore = "needs tests/data/zexdoc.com; slow"]
fn zexdoc() {
    run_exerciser("zexdoc.com");
}

#[test]
#[ignore = "needs tests/data/zexall.com; slow"]
fn zexall() {
    run_exerciser("zexall.com");
}
