//! Interrupt, HALT and reset behaviour at instruction boundaries.

use emu_core::{Cpu, SimpleBus};
use zilog_z80::{InterruptMode, Z80};

/// LD SP, 0x8000 at 0x0000 followed by `rest`.
fn machine(rest: &[u8]) -> (Z80, SimpleBus) {
    let mut bus = SimpleBus::new();
    bus.load(0x0000, &[0x31, 0x00, 0x80]).expect("fits");
    bus.load(0x0003, rest).expect("fits");
    (Z80::new(), bus)
}

fn stacked_word(bus: &SimpleBus, sp: u16) -> u16 {
    u16::from_le_bytes([bus.peek(sp), bus.peek(sp.wrapping_add(1))])
}

#[test]
fn test_nmi_serviced_once() {
    let (mut cpu, mut bus) = machine(&[0x00, 0x00]);
    cpu.step(&mut bus);
    cpu.set_iff1(true);
    cpu.set_iff2(true);

    // Asserting twice before service still latches one request.
    cpu.trigger_nmi();
    cpu.trigger_nmi();
    let cycles = cpu.step(&mut bus);
    assert_eq!(cycles, 11);
    assert_eq!(cpu.regs.pc, 0x0066);
    assert_eq!(cpu.regs.memptr, 0x0066);
    assert_eq!(stacked_word(&bus, cpu.regs.sp), 0x0003);
    assert!(!cpu.iff1());
    assert!(cpu.iff2(), "IFF2 keeps the pre-NMI state");
    assert!(!cpu.is_nmi_pending());
    assert_eq!(bus.interrupt_cycles(), 1);

    // The next step runs the handler, not another acknowledge.
    let cycles = cpu.step(&mut bus);
    assert_eq!(cycles, 4);
    assert_eq!(cpu.regs.pc, 0x0067);
}

#[test]
fn test_retn_restores_iff1() {
    let (mut cpu, mut bus) = machine(&[0x00]);
    bus.load(0x0066, &[0xED, 0x45]).expect("fits"); // RETN
    cpu.step(&mut bus);
    cpu.set_iff1(true);
    cpu.set_iff2(true);

    cpu.trigger_nmi();
    cpu.step(&mut bus);
    assert!(!cpu.iff1());
    cpu.step(&mut bus);
    assert!(cpu.iff1());
    assert_eq!(cpu.regs.pc, 0x0003);
    assert_eq!(cpu.regs.sp, 0x8000);
}

#[test]
fn test_nmi_beats_int() {
    let (mut cpu, mut bus) = machine(&[0x00]);
    cpu.step(&mut bus);
    cpu.set_iff1(true);
    cpu.set_im(InterruptMode::Mode1);
    cpu.set_int_line(true);
    cpu.trigger_nmi();
    cpu.step(&mut bus);
    assert_eq!(cpu.regs.pc, 0x0066);
}

#[test]
fn test_im1_after_ei_delay() {
    let (mut cpu, mut bus) = machine(&[
        0xED, 0x56, // IM 1
        0xFB, // EI
        0x00, // NOP
        0x00, // NOP
    ]);
    cpu.step(&mut bus);
    cpu.step(&mut bus);
    assert_eq!(cpu.im(), InterruptMode::Mode1);
    cpu.step(&mut bus); // EI
    cpu.set_int_line(true);

    // The instruction after EI always runs.
    assert_eq!(cpu.step(&mut bus), 4);
    assert_eq!(cpu.regs.pc, 0x0007);

    let cycles = cpu.step(&mut bus);
    assert_eq!(cycles, 13);
    assert_eq!(cpu.regs.pc, 0x0038);
    assert_eq!(cpu.regs.memptr, 0x0038);
    assert_eq!(stacked_word(&bus, cpu.regs.sp), 0x0007);
    assert!(!cpu.iff1() && !cpu.iff2());
    assert_eq!(bus.interrupt_cycles(), 7);

    // Line still asserted, but interrupts are now disabled.
    cpu.step(&mut bus);
    assert_eq!(cpu.regs.pc, 0x0039);
}

#[test]
fn test_repeated_ei_keeps_blocking() {
    let (mut cpu, mut bus) = machine(&[0xED, 0x56, 0xFB, 0xFB, 0x00, 0x00]);
    cpu.step(&mut bus);
    cpu.step(&mut bus);
    cpu.set_int_line(true);
    cpu.step(&mut bus); // EI
    cpu.step(&mut bus); // EI again, still blocked
    assert!(cpu.is_pending_ei());
    cpu.step(&mut bus); // NOP
    assert_eq!(cpu.regs.pc, 0x0008);
    assert_eq!(cpu.step(&mut bus), 13);
    assert_eq!(stacked_word(&bus, cpu.regs.sp), 0x0008);
}

#[test]
fn test_ei_halt_returns_past_halt() {
    let (mut cpu, mut bus) = machine(&[
        0xED, 0x56, // IM 1
        0xFB, // EI
        0x76, // HALT
    ]);
    cpu.step(&mut bus);
    cpu.step(&mut bus);
    cpu.set_int_line(true);
    cpu.step(&mut bus); // EI
    cpu.step(&mut bus); // HALT
    assert!(cpu.is_halted());
    assert_eq!(cpu.regs.pc, 0x0006);

    assert_eq!(cpu.step(&mut bus), 13);
    assert!(!cpu.is_halted());
    assert_eq!(stacked_word(&bus, cpu.regs.sp), 0x0007);
}

#[test]
fn test_halt_spins_without_interrupt() {
    let (mut cpu, mut bus) = machine(&[0x76]);
    cpu.step(&mut bus);
    cpu.step(&mut bus);
    let r = cpu.regs.r();
    for _ in 0..3 {
        assert_eq!(cpu.step(&mut bus), 4);
    }
    assert!(cpu.is_halted());
    assert_eq!(cpu.regs.pc, 0x0003);
    assert_eq!(cpu.regs.r(), r + 3, "each halted cycle refreshes");
    assert_eq!(bus.instructions(), 5);
}

#[test]
fn test_nmi_wakes_halt() {
    let (mut cpu, mut bus) = machine(&[0x76]);
    cpu.step(&mut bus);
    cpu.step(&mut bus);
    cpu.trigger_nmi();
    cpu.step(&mut bus);
    assert!(!cpu.is_halted());
    assert_eq!(stacked_word(&bus, cpu.regs.sp), 0x0004);
}

#[test]
fn test_im2_vector_table() {
    let mut bus = SimpleBus::new();
    bus.load(0x2004, &[0x00, 0x90]).expect("fits");
    bus.set_interrupt_data(0x04);
    let mut cpu = Z80::new();
    cpu.regs.sp = 0x8000;
    cpu.regs.i = 0x20;
    cpu.set_im(InterruptMode::Mode2);
    cpu.set_iff1(true);
    cpu.set_iff2(true);
    cpu.set_int_line(true);

    let cycles = cpu.step(&mut bus);
    assert_eq!(cycles, 19);
    assert_eq!(cpu.regs.pc, 0x9000);
    assert_eq!(cpu.regs.memptr, 0x9000);
    assert_eq!(stacked_word(&bus, 0x7FFE), 0x0000);
    assert_eq!(cpu.regs.r(), 1);
}

#[test]
fn test_im0_executes_data_byte() {
    let mut bus = SimpleBus::new();
    bus.set_interrupt_data(0xD7); // RST 10h
    let mut cpu = Z80::new();
    cpu.regs.sp = 0x8000;
    cpu.set_iff1(true);
    cpu.set_int_line(true);

    let cycles = cpu.step(&mut bus);
    assert_eq!(cycles, 13);
    assert_eq!(cpu.regs.pc, 0x0010);
    assert_eq!(stacked_word(&bus, 0x7FFE), 0x0000);
}

#[test]
fn test_int_ignored_when_disabled() {
    let (mut cpu, mut bus) = machine(&[0x00]);
    cpu.set_im(InterruptMode::Mode1);
    cpu.set_int_line(true);
    cpu.step(&mut bus);
    cpu.step(&mut bus);
    assert_eq!(cpu.regs.pc, 0x0004);
    assert!(cpu.int_line());
}

#[test]
fn test_pin_reset() {
    let (mut cpu, mut bus) = machine(&[0xFB, 0xED, 0x5E]); // EI; IM 2
    for _ in 0..3 {
        cpu.step(&mut bus);
    }
    assert!(cpu.iff1());

    cpu.set_pin_reset();
    assert!(cpu.is_pin_reset());
    assert_eq!(cpu.step(&mut bus), 3);
    assert!(!cpu.is_pin_reset());
    assert_eq!(cpu.regs.pc, 0x0000);
    assert_eq!(cpu.regs.sp, 0xFFFF);
    assert!(!cpu.iff1() && !cpu.iff2());
    assert_eq!(cpu.im(), InterruptMode::Mode0);
}

#[test]
fn test_pin_reset_keeps_int_line() {
    let mut bus = SimpleBus::new();
    bus.load(0x0000, &[0xED, 0x56, 0xFB, 0x00, 0x00]).expect("fits"); // IM 1; EI
    let mut cpu = Z80::new();
    cpu.set_int_line(true);
    cpu.set_pin_reset();
    cpu.step(&mut bus);
    assert!(cpu.int_line(), "the device still holds INT");

    cpu.step(&mut bus); // IM 1
    cpu.step(&mut bus); // EI
    cpu.step(&mut bus); // NOP
    assert_eq!(cpu.step(&mut bus), 13);
    assert_eq!(cpu.regs.pc, 0x0038);
}

#[test]
fn test_generic_cpu_interface() {
    fn run<C: Cpu>(cpu: &mut C, bus: &mut SimpleBus, steps: usize) -> u32 {
        (0..steps).map(|_| cpu.step(bus)).sum()
    }

    let (mut cpu, mut bus) = machine(&[0x00, 0x00]);
    assert_eq!(run(&mut cpu, &mut bus, 3), 10 + 4 + 4);
    assert_eq!(Cpu::pc(&cpu), 5);

    Cpu::nmi(&mut cpu);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(Cpu::registers(&cpu).pc, 0x0066);

    Cpu::reset(&mut cpu);
    assert_eq!(Cpu::pc(&cpu), 0);
}
