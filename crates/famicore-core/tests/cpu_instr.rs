//! Instruction semantics: flags, memory effects, and the illegal-opcode
//! compositions, exercised against a flat RAM bus.

use anyhow::Result;
use famicore_core::bus::mock::RamBus;
use famicore_core::cpu::status::Status;
use famicore_core::cpu::Cpu;

fn machine(program: &[u8]) -> (Cpu, RamBus) {
    let mut bus = RamBus::new();
    bus.load(0x8000, program);
    bus.write_word(0xFFFC, 0x8000);
    bus.write_word(0xFFFE, 0x9000);
    let mut cpu = Cpu::new();
    cpu.reset(&mut bus);
    (cpu, bus)
}

fn run(cpu: &mut Cpu, bus: &mut RamBus, instructions: usize) -> Result<()> {
    for _ in 0..instructions {
        cpu.step_instruction(bus)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------
// Arithmetic
// ---------------------------------------------------------------------

#[test]
fn adc_carry_chains_across_additions() -> Result<()> {
    // $FF + $01 = $00 carry; next ADC consumes the carry.
    let (mut cpu, mut bus) = machine(&[0xA9, 0xFF, 0x69, 0x01, 0x69, 0x10]);
    run(&mut cpu, &mut bus, 2)?;
    assert_eq!(cpu.a, 0x00);
    assert!(cpu.status.contains(Status::CARRY));
    assert!(cpu.status.contains(Status::ZERO));
    run(&mut cpu, &mut bus, 1)?;
    assert_eq!(cpu.a, 0x11);
    assert!(!cpu.status.contains(Status::CARRY));
    Ok(())
}

#[test]
fn adc_overflow_covers_all_sign_combinations() -> Result<()> {
    // (a, operand, carry_in, expect_v)
    let cases = [
        (0x50u8, 0x10u8, false, false),
        (0x50, 0x50, false, true),  // + + -> -
        (0xD0, 0x90, false, true),  // - - -> +
        (0x50, 0xD0, false, false), // mixed signs never overflow
        (0x7F, 0x00, true, true),   // carry tips it over
    ];
    for (a, operand, carry_in, expect_v) in cases {
        let (mut cpu, mut bus) = machine(&[0x69, operand]);
        cpu.a = a;
        cpu.status.set(Status::CARRY, carry_in);
        run(&mut cpu, &mut bus, 1)?;
        assert_eq!(
            cpu.status.contains(Status::OVERFLOW),
            expect_v,
            "a={a:02X} m={operand:02X} c={carry_in}"
        );
    }
    Ok(())
}

#[test]
fn sbc_borrows_when_carry_is_clear() -> Result<()> {
    let (mut cpu, mut bus) = machine(&[0xE9, 0x01]);
    cpu.a = 0x10;
    cpu.status.remove(Status::CARRY);
    run(&mut cpu, &mut bus, 1)?;
    // 0x10 - 0x01 - 1 = 0x0E.
    assert_eq!(cpu.a, 0x0E);
    assert!(cpu.status.contains(Status::CARRY));
    Ok(())
}

#[test]
fn sbc_underflow_clears_carry_and_sets_negative() -> Result<()> {
    let (mut cpu, mut bus) = machine(&[0x38, 0xE9, 0x20]); // SEC; SBC #$20
    cpu.a = 0x10;
    run(&mut cpu, &mut bus, 2)?;
    assert_eq!(cpu.a, 0xF0);
    assert!(!cpu.status.contains(Status::CARRY));
    assert!(cpu.status.contains(Status::NEGATIVE));
    Ok(())
}

#[test]
fn compare_family_sets_carry_zero_negative() -> Result<()> {
    let cases: [(u8, fn(&mut Cpu, u8)); 3] = [
        (0xC9, |cpu, v| cpu.a = v),
        (0xE0, |cpu, v| cpu.x = v),
        (0xC0, |cpu, v| cpu.y = v),
    ];
    for (opcode, setup) in cases {
        // register > operand
        let (mut cpu, mut bus) = machine(&[opcode, 0x10]);
        setup(&mut cpu, 0x20);
        run(&mut cpu, &mut bus, 1)?;
        assert!(cpu.status.contains(Status::CARRY));
        assert!(!cpu.status.contains(Status::ZERO));

        // register == operand
        let (mut cpu, mut bus) = machine(&[opcode, 0x20]);
        setup(&mut cpu, 0x20);
        run(&mut cpu, &mut bus, 1)?;
        assert!(cpu.status.contains(Status::CARRY));
        assert!(cpu.status.contains(Status::ZERO));

        // register < operand
        let (mut cpu, mut bus) = machine(&[opcode, 0x30]);
        setup(&mut cpu, 0x20);
        run(&mut cpu, &mut bus, 1)?;
        assert!(!cpu.status.contains(Status::CARRY));
        assert!(cpu.status.contains(Status::NEGATIVE));
    }
    Ok(())
}

// ---------------------------------------------------------------------
// Logic
// ---------------------------------------------------------------------

#[test]
fn bit_reflects_memory_high_bits() -> Result<()> {
    let (mut cpu, mut bus) = machine(&[0x24, 0x10]);
    bus.load(0x0010, &[0xC0]);
    cpu.a = 0x3F; // no common bits -> Z
    run(&mut cpu, &mut bus, 1)?;
    assert!(cpu.status.contains(Status::ZERO));
    assert!(cpu.status.contains(Status::NEGATIVE));
    assert!(cpu.status.contains(Status::OVERFLOW));
    // Accumulator untouched.
    assert_eq!(cpu.a, 0x3F);
    Ok(())
}

#[test]
fn logical_operations_update_zn_only() -> Result<()> {
    let (mut cpu, mut bus) = machine(&[0x29, 0x0F, 0x09, 0x80, 0x49, 0xFF]);
    cpu.a = 0xF0;
    run(&mut cpu, &mut bus, 1)?; // AND -> 0x00
    assert!(cpu.status.contains(Status::ZERO));
    run(&mut cpu, &mut bus, 1)?; // ORA -> 0x80
    assert!(cpu.status.contains(Status::NEGATIVE));
    run(&mut cpu, &mut bus, 1)?; // EOR -> 0x7F
    assert_eq!(cpu.a, 0x7F);
    assert!(!cpu.status.contains(Status::NEGATIVE));
    assert!(!cpu.status.contains(Status::ZERO));
    Ok(())
}

// ---------------------------------------------------------------------
// Shifts and rotates
// ---------------------------------------------------------------------

#[test]
fn shifts_move_bits_through_carry() -> Result<()> {
    // ASL A: carry out of bit 7.
    let (mut cpu, mut bus) = machine(&[0x0A]);
    cpu.a = 0x81;
    run(&mut cpu, &mut bus, 1)?;
    assert_eq!(cpu.a, 0x02);
    assert!(cpu.status.contains(Status::CARRY));

    // LSR A: carry out of bit 0, N always clear.
    let (mut cpu, mut bus) = machine(&[0x4A]);
    cpu.a = 0x01;
    run(&mut cpu, &mut bus, 1)?;
    assert_eq!(cpu.a, 0x00);
    assert!(cpu.status.contains(Status::CARRY));
    assert!(cpu.status.contains(Status::ZERO));
    assert!(!cpu.status.contains(Status::NEGATIVE));
    Ok(())
}

#[test]
fn rotates_insert_the_previous_carry() -> Result<()> {
    let (mut cpu, mut bus) = machine(&[0x38, 0x2A]); // SEC; ROL A
    cpu.a = 0x80;
    run(&mut cpu, &mut bus, 2)?;
    assert_eq!(cpu.a, 0x01);
    assert!(cpu.status.contains(Status::CARRY));

    let (mut cpu, mut bus) = machine(&[0x38, 0x6A]); // SEC; ROR A
    cpu.a = 0x01;
    run(&mut cpu, &mut bus, 2)?;
    assert_eq!(cpu.a, 0x80);
    assert!(cpu.status.contains(Status::CARRY));
    Ok(())
}

#[test]
fn memory_rmw_writes_back() -> Result<()> {
    let (mut cpu, mut bus) = machine(&[0x06, 0x10, 0xE6, 0x10, 0xC6, 0x11]);
    bus.load(0x0010, &[0x40, 0x00]);
    run(&mut cpu, &mut bus, 1)?; // ASL $10 -> 0x80
    assert_eq!(bus.peek_ram(0x0010), 0x80);
    assert!(cpu.status.contains(Status::NEGATIVE));
    run(&mut cpu, &mut bus, 1)?; // INC $10 -> 0x81
    assert_eq!(bus.peek_ram(0x0010), 0x81);
    run(&mut cpu, &mut bus, 1)?; // DEC $11 -> 0xFF
    assert_eq!(bus.peek_ram(0x0011), 0xFF);
    assert!(cpu.status.contains(Status::NEGATIVE));
    Ok(())
}

// ---------------------------------------------------------------------
// Register traffic
// ---------------------------------------------------------------------

#[test]
fn transfers_update_flags_except_txs() -> Result<()> {
    let (mut cpu, mut bus) = machine(&[0xA9, 0x00, 0xAA, 0x8A, 0x9A, 0xBA]);
    run(&mut cpu, &mut bus, 2)?; // LDA #0; TAX
    assert!(cpu.status.contains(Status::ZERO));
    assert_eq!(cpu.x, 0);
    run(&mut cpu, &mut bus, 1)?; // TXA
    assert!(cpu.status.contains(Status::ZERO));

    // TXS copies without flags; TSX re-reads with flags.
    cpu.x = 0x80;
    cpu.status.remove(Status::NEGATIVE);
    run(&mut cpu, &mut bus, 1)?; // TXS
    assert_eq!(cpu.sp, 0x80);
    assert!(!cpu.status.contains(Status::NEGATIVE));
    run(&mut cpu, &mut bus, 1)?; // TSX
    assert!(cpu.status.contains(Status::NEGATIVE));
    Ok(())
}

#[test]
fn index_increments_wrap() -> Result<()> {
    let (mut cpu, mut bus) = machine(&[0xE8, 0x88]);
    cpu.x = 0xFF;
    cpu.y = 0x00;
    run(&mut cpu, &mut bus, 1)?; // INX
    assert_eq!(cpu.x, 0x00);
    assert!(cpu.status.contains(Status::ZERO));
    run(&mut cpu, &mut bus, 1)?; // DEY
    assert_eq!(cpu.y, 0xFF);
    assert!(cpu.status.contains(Status::NEGATIVE));
    Ok(())
}

// ---------------------------------------------------------------------
// Stack and interrupts
// ---------------------------------------------------------------------

#[test]
fn pha_pla_round_trips_through_page_one() -> Result<()> {
    let (mut cpu, mut bus) = machine(&[0x48, 0xA9, 0x00, 0x68]);
    cpu.a = 0x5A;
    run(&mut cpu, &mut bus, 3)?;
    assert_eq!(cpu.a, 0x5A);
    assert_eq!(cpu.sp, 0xFD);
    assert_eq!(bus.peek_ram(0x01FD), 0x5A);
    Ok(())
}

#[test]
fn plp_drops_the_break_bit() -> Result<()> {
    // Push $FF via PHA, pull into P via PLP.
    let (mut cpu, mut bus) = machine(&[0x48, 0x28]);
    cpu.a = 0xFF;
    run(&mut cpu, &mut bus, 2)?;
    // B cleared, bit 5 forced.
    assert_eq!(cpu.status.bits(), 0xEF);
    Ok(())
}

#[test]
fn brk_rti_round_trip_restores_flags_and_pc() -> Result<()> {
    let (mut cpu, mut bus) = machine(&[0x38, 0x00, 0xFF, 0xEA]); // SEC; BRK; (padding); NOP
    bus.load(0x9000, &[0x40]); // RTI
    run(&mut cpu, &mut bus, 2)?;
    assert_eq!(cpu.pc, 0x9000);
    assert!(cpu.status.contains(Status::INTERRUPT));
    run(&mut cpu, &mut bus, 1)?; // RTI
    // Returns past the padding byte with the carry restored.
    assert_eq!(cpu.pc, 0x8003);
    assert!(cpu.status.contains(Status::CARRY));
    Ok(())
}

#[test]
fn nested_jsr_rts_unwind_in_order() -> Result<()> {
    let (mut cpu, mut bus) = machine(&[0x20, 0x00, 0x90]); // JSR $9000
    bus.load(0x9000, &[0x20, 0x00, 0x91]); // JSR $9100
    bus.load(0x9100, &[0x60]); // RTS
    bus.load(0x9003, &[0x60]); // RTS
    run(&mut cpu, &mut bus, 4)?;
    assert_eq!(cpu.pc, 0x8003);
    assert_eq!(cpu.sp, 0xFD);
    Ok(())
}

// ---------------------------------------------------------------------
// Illegal compositions
// ---------------------------------------------------------------------

#[test]
fn slo_shifts_then_ors() -> Result<()> {
    let (mut cpu, mut bus) = machine(&[0x07, 0x10]);
    bus.load(0x0010, &[0x81]);
    cpu.a = 0x01;
    run(&mut cpu, &mut bus, 1)?;
    assert_eq!(bus.peek_ram(0x0010), 0x02);
    assert_eq!(cpu.a, 0x03);
    assert!(cpu.status.contains(Status::CARRY));
    Ok(())
}

#[test]
fn rla_rotates_then_ands() -> Result<()> {
    let (mut cpu, mut bus) = machine(&[0x38, 0x27, 0x10]); // SEC; RLA $10
    bus.load(0x0010, &[0x40]);
    cpu.a = 0x83;
    run(&mut cpu, &mut bus, 2)?;
    assert_eq!(bus.peek_ram(0x0010), 0x81);
    assert_eq!(cpu.a, 0x81);
    Ok(())
}

#[test]
fn sre_shifts_right_then_eors() -> Result<()> {
    let (mut cpu, mut bus) = machine(&[0x47, 0x10]);
    bus.load(0x0010, &[0x03]);
    cpu.a = 0xFF;
    run(&mut cpu, &mut bus, 1)?;
    assert_eq!(bus.peek_ram(0x0010), 0x01);
    assert_eq!(cpu.a, 0xFE);
    assert!(cpu.status.contains(Status::CARRY));
    Ok(())
}

#[test]
fn rra_rotates_then_adds() -> Result<()> {
    let (mut cpu, mut bus) = machine(&[0x67, 0x10]);
    bus.load(0x0010, &[0x02]);
    cpu.a = 0x10;
    run(&mut cpu, &mut bus, 1)?;
    // ROR 0x02 -> 0x01 (no carry out), then 0x10 + 0x01 = 0x11.
    assert_eq!(bus.peek_ram(0x0010), 0x01);
    assert_eq!(cpu.a, 0x11);
    Ok(())
}

#[test]
fn sax_stores_a_and_x_without_flags() -> Result<()> {
    let (mut cpu, mut bus) = machine(&[0x87, 0x10]);
    cpu.a = 0xF0;
    cpu.x = 0x3C;
    let flags = cpu.status;
    run(&mut cpu, &mut bus, 1)?;
    assert_eq!(bus.peek_ram(0x0010), 0x30);
    assert_eq!(cpu.status, flags);
    Ok(())
}

#[test]
fn lax_loads_both_registers() -> Result<()> {
    let (mut cpu, mut bus) = machine(&[0xA7, 0x10]);
    bus.load(0x0010, &[0x8E]);
    run(&mut cpu, &mut bus, 1)?;
    assert_eq!(cpu.a, 0x8E);
    assert_eq!(cpu.x, 0x8E);
    assert!(cpu.status.contains(Status::NEGATIVE));
    Ok(())
}

#[test]
fn isb_increments_then_subtracts() -> Result<()> {
    let (mut cpu, mut bus) = machine(&[0x38, 0xE7, 0x10]); // SEC; ISB $10
    bus.load(0x0010, &[0x0F]);
    cpu.a = 0x20;
    run(&mut cpu, &mut bus, 2)?;
    assert_eq!(bus.peek_ram(0x0010), 0x10);
    assert_eq!(cpu.a, 0x10);
    Ok(())
}

#[test]
fn addressed_nops_read_but_change_nothing() -> Result<()> {
    let (mut cpu, mut bus) = machine(&[0x04, 0x10, 0x1C, 0x00, 0x02]);
    bus.load(0x0010, &[0x55]);
    let a = cpu.a;
    let flags = cpu.status;
    run(&mut cpu, &mut bus, 2)?;
    assert_eq!(cpu.a, a);
    assert_eq!(cpu.status, flags);
    assert_eq!(bus.peek_ram(0x0010), 0x55);
    assert_eq!(cpu.pc, 0x8005);
    Ok(())
}

#[test]
fn decimal_flag_is_stored_but_ignored_by_adc() -> Result<()> {
    let (mut cpu, mut bus) = machine(&[0xF8, 0xA9, 0x09, 0x69, 0x01]);
    run(&mut cpu, &mut bus, 3)?;
    assert!(cpu.status.contains(Status::DECIMAL));
    // Binary result, not BCD 0x10.
    assert_eq!(cpu.a, 0x0A);
    Ok(())
}
