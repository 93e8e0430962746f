//! Cycle-count verification for every implemented opcode.
//!
//! Each opcode runs once against a flat RAM bus with X=Y=0 and operands
//! `$10 $02` (zero page `$10`, absolute `$0210`), so no indexed access
//! crosses a page and the expected count is the base cost from the standard
//! 6502 timing chart. Branch costs assume the post-reset flag state
//! (P=$24): taken branches cost 3, untaken 2. Page-crossing and branch
//! penalties get their own focused tests at the bottom.

use anyhow::{ensure, Result};
use famicore_core::bus::mock::RamBus;
use famicore_core::cpu::Cpu;

fn run_opcode(program: &[u8], setup: impl FnOnce(&mut Cpu, &mut RamBus)) -> Result<u8> {
    let mut bus = RamBus::new();
    bus.load(0x8000, program);
    bus.write_word(0xFFFC, 0x8000);
    bus.write_word(0xFFFE, 0x9000); // BRK vector
    let mut cpu = Cpu::new();
    cpu.reset(&mut bus);
    setup(&mut cpu, &mut bus);
    Ok(cpu.step_instruction(&mut bus)?)
}

/// (opcode, base cycles) for all 232 implemented opcodes.
#[rustfmt::skip]
const BASE_CYCLES: &[(u8, u8)] = &[
    // 0x00 row
    (0x00, 7), (0x01, 6), (0x03, 8), (0x04, 3), (0x05, 3), (0x06, 5), (0x07, 5),
    (0x08, 3), (0x09, 2), (0x0A, 2), (0x0C, 4), (0x0D, 4), (0x0E, 6), (0x0F, 6),
    // 0x10 row (BPL taken: N clear after reset)
    (0x10, 3), (0x11, 5), (0x13, 8), (0x14, 4), (0x15, 4), (0x16, 6), (0x17, 6),
    (0x18, 2), (0x19, 4), (0x1A, 2), (0x1B, 7), (0x1C, 4), (0x1D, 4), (0x1E, 7), (0x1F, 7),
    // 0x20 row
    (0x20, 6), (0x21, 6), (0x23, 8), (0x24, 3), (0x25, 3), (0x26, 5), (0x27, 5),
    (0x28, 4), (0x29, 2), (0x2A, 2), (0x2C, 4), (0x2D, 4), (0x2E, 6), (0x2F, 6),
    // 0x30 row (BMI untaken)
    (0x30, 2), (0x31, 5), (0x33, 8), (0x34, 4), (0x35, 4), (0x36, 6), (0x37, 6),
    (0x38, 2), (0x39, 4), (0x3A, 2), (0x3B, 7), (0x3C, 4), (0x3D, 4), (0x3E, 7), (0x3F, 7),
    // 0x40 row
    (0x40, 6), (0x41, 6), (0x43, 8), (0x44, 3), (0x45, 3), (0x46, 5), (0x47, 5),
    (0x48, 3), (0x49, 2), (0x4A, 2), (0x4C, 3), (0x4D, 4), (0x4E, 6), (0x4F, 6),
    // 0x50 row (BVC taken)
    (0x50, 3), (0x51, 5), (0x53, 8), (0x54, 4), (0x55, 4), (0x56, 6), (0x57, 6),
    (0x58, 2), (0x59, 4), (0x5A, 2), (0x5B, 7), (0x5C, 4), (0x5D, 4), (0x5E, 7), (0x5F, 7),
    // 0x60 row
    (0x60, 6), (0x61, 6), (0x63, 8), (0x64, 3), (0x65, 3), (0x66, 5), (0x67, 5),
    (0x68, 4), (0x69, 2), (0x6A, 2), (0x6C, 5), (0x6D, 4), (0x6E, 6), (0x6F, 6),
    // 0x70 row (BVS untaken)
    (0x70, 2), (0x71, 5), (0x73, 8), (0x74, 4), (0x75, 4), (0x76, 6), (0x77, 6),
    (0x78, 2), (0x79, 4), (0x7A, 2), (0x7B, 7), (0x7C, 4), (0x7D, 4), (0x7E, 7), (0x7F, 7),
    // 0x80 row
    (0x80, 2), (0x81, 6), (0x82, 2), (0x83, 6), (0x84, 3), (0x85, 3), (0x86, 3), (0x87, 3),
    (0x88, 2), (0x89, 2), (0x8A, 2), (0x8C, 4), (0x8D, 4), (0x8E, 4), (0x8F, 4),
    // 0x90 row (BCC taken)
    (0x90, 3), (0x91, 6), (0x94, 4), (0x95, 4), (0x96, 4), (0x97, 4),
    (0x98, 2), (0x99, 5), (0x9A, 2), (0x9D, 5),
    // 0xA0 row
    (0xA0, 2), (0xA1, 6), (0xA2, 2), (0xA3, 6), (0xA4, 3), (0xA5, 3), (0xA6, 3), (0xA7, 3),
    (0xA8, 2), (0xA9, 2), (0xAA, 2), (0xAB, 2), (0xAC, 4), (0xAD, 4), (0xAE, 4), (0xAF, 4),
    // 0xB0 row (BCS untaken)
    (0xB0, 2), (0xB1, 5), (0xB3, 5), (0xB4, 4), (0xB5, 4), (0xB6, 4), (0xB7, 4),
    (0xB8, 2), (0xB9, 4), (0xBA, 2), (0xBC, 4), (0xBD, 4), (0xBE, 4), (0xBF, 4),
    // 0xC0 row
    (0xC0, 2), (0xC1, 6), (0xC2, 2), (0xC3, 8), (0xC4, 3), (0xC5, 3), (0xC6, 5), (0xC7, 5),
    (0xC8, 2), (0xC9, 2), (0xCA, 2), (0xCC, 4), (0xCD, 4), (0xCE, 6), (0xCF, 6),
    // 0xD0 row (BNE taken)
    (0xD0, 3), (0xD1, 5), (0xD3, 8), (0xD4, 4), (0xD5, 4), (0xD6, 6), (0xD7, 6),
    (0xD8, 2), (0xD9, 4), (0xDA, 2), (0xDB, 7), (0xDC, 4), (0xDD, 4), (0xDE, 7), (0xDF, 7),
    // 0xE0 row
    (0xE0, 2), (0xE1, 6), (0xE2, 2), (0xE3, 8), (0xE4, 3), (0xE5, 3), (0xE6, 5), (0xE7, 5),
    (0xE8, 2), (0xE9, 2), (0xEA, 2), (0xEB, 2), (0xEC, 4), (0xED, 4), (0xEE, 6), (0xEF, 6),
    // 0xF0 row (BEQ untaken)
    (0xF0, 2), (0xF1, 5), (0xF3, 8), (0xF4, 4), (0xF5, 4), (0xF6, 6), (0xF7, 6),
    (0xF8, 2), (0xF9, 4), (0xFA, 2), (0xFB, 7), (0xFC, 4), (0xFD, 4), (0xFE, 7), (0xFF, 7),
];

#[test]
fn base_cycle_counts_match_the_timing_chart() -> Result<()> {
    for &(opcode, expected) in BASE_CYCLES {
        let cycles = run_opcode(&[opcode, 0x10, 0x02], |_, _| {})?;
        ensure!(
            cycles == expected,
            "opcode {opcode:02X}: expected {expected} cycles, got {cycles}"
        );
    }
    Ok(())
}

#[test]
fn every_table_slot_is_either_timed_or_a_jam() -> Result<()> {
    let jams: Vec<u8> = (0u16..=0xFF)
        .map(|op| op as u8)
        .filter(|op| !BASE_CYCLES.iter().any(|&(listed, _)| listed == *op))
        .collect();
    // The remaining 24 slots must all fault as unknown opcodes.
    ensure!(jams.len() == 24, "expected 24 jam slots, found {}", jams.len());
    for opcode in jams {
        let result = run_opcode(&[opcode, 0x10, 0x02], |_, _| {});
        ensure!(result.is_err(), "opcode {opcode:02X} should be a fault");
    }
    Ok(())
}

#[test]
fn indexed_reads_pay_for_page_crossing() -> Result<()> {
    // LDA $02F0,X with X=0x20 lands in $0310.
    let cases: &[(&[u8], u8)] = &[
        (&[0xBD, 0xF0, 0x02], 5), // LDA abs,X
        (&[0xB9, 0xF0, 0x02], 5), // LDA abs,Y
        (&[0xBE, 0xF0, 0x02], 5), // LDX abs,Y
        (&[0xBC, 0xF0, 0x02], 5), // LDY abs,X
        (&[0x3D, 0xF0, 0x02], 5), // AND abs,X
        (&[0x7D, 0xF0, 0x02], 5), // ADC abs,X
        (&[0xDD, 0xF0, 0x02], 5), // CMP abs,X
        (&[0xBF, 0xF0, 0x02], 5), // LAX abs,Y
        (&[0xFC, 0xF0, 0x02], 5), // NOP abs,X
    ];
    for (program, expected) in cases {
        let cycles = run_opcode(program, |cpu, _| {
            cpu.x = 0x20;
            cpu.y = 0x20;
        })?;
        ensure!(
            cycles == *expected,
            "{:02X?}: expected {expected}, got {cycles}",
            program
        );
    }
    Ok(())
}

#[test]
fn indirect_indexed_reads_pay_for_page_crossing() -> Result<()> {
    // ($10),Y with pointer $02F0 and Y=$20.
    let cycles = run_opcode(&[0xB1, 0x10], |cpu, bus| {
        cpu.y = 0x20;
        bus.load(0x0010, &[0xF0, 0x02]);
    })?;
    ensure!(cycles == 6, "LDA (zp),Y crossing: got {cycles}");
    Ok(())
}

#[test]
fn stores_and_rmw_never_pay_the_crossing_penalty() -> Result<()> {
    let cases: &[(&[u8], u8)] = &[
        (&[0x9D, 0xF0, 0x02], 5), // STA abs,X
        (&[0x99, 0xF0, 0x02], 5), // STA abs,Y
        (&[0x91, 0x10], 6),       // STA (zp),Y
        (&[0xFE, 0xF0, 0x02], 7), // INC abs,X
        (&[0xDE, 0xF0, 0x02], 7), // DEC abs,X
        (&[0x1E, 0xF0, 0x02], 7), // ASL abs,X
        (&[0xDF, 0xF0, 0x02], 7), // DCP abs,Y
        (&[0xFF, 0xF0, 0x02], 7), // ISB abs,Y
    ];
    for (program, expected) in cases {
        let cycles = run_opcode(program, |cpu, bus| {
            cpu.x = 0x20;
            cpu.y = 0x20;
            bus.load(0x0010, &[0xF0, 0x02]);
        })?;
        ensure!(
            cycles == *expected,
            "{:02X?}: expected {expected}, got {cycles}",
            program
        );
    }
    Ok(())
}

#[test]
fn branch_costs_scale_with_distance() -> Result<()> {
    // Untaken: 2.
    let cycles = run_opcode(&[0xF0, 0x10], |_, _| {})?;
    ensure!(cycles == 2, "untaken branch: {cycles}");

    // Taken, same page: 3.
    let cycles = run_opcode(&[0xD0, 0x10], |_, _| {})?;
    ensure!(cycles == 3, "taken branch: {cycles}");

    // Taken, crossing back a page: 4.
    let cycles = run_opcode(&[0xD0, 0x80], |_, _| {})?;
    ensure!(cycles == 4, "page-crossing branch: {cycles}");
    Ok(())
}
