//! Instruction disassembly and nestest-format execution tracing.
//!
//! [`disassemble`] renders one instruction in plain 6502 syntax and is what a
//! debugger UI consumes for its `pc -> text` listing. [`trace_line`] produces
//! the full per-instruction log line in the exact format of `nestest.log`,
//! including the memory-read embellishments (` @ XX = XX`,
//! ` = XXXX @ XXXX = XX`) and the register/PPU/cycle tail, so a comparison
//! harness can diff the two byte-for-byte.
//!
//! Both functions use [`Bus::peek`], which must be free of read side effects.

use crate::bus::Bus;
use crate::cpu::Cpu;
use crate::cpu::addressing::Addressing;
use crate::cpu::lookup::{LOOKUP_TABLE, Mnemonic, Opcode};

/// A disassembled instruction: the rendered text plus its byte length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disassembly {
    pub text: String,
    pub len: u16,
}

/// Renders the instruction at `pc` in plain assembler syntax
/// (`LDA $0200,X`, `JMP ($0300)`, ...). Branch targets are resolved to
/// absolute addresses.
pub fn disassemble<B: Bus>(bus: &B, pc: u16) -> Disassembly {
    let opcode = bus.peek(pc);
    let decoded = LOOKUP_TABLE[opcode as usize];
    let lo = bus.peek(pc.wrapping_add(1));
    let hi = bus.peek(pc.wrapping_add(2));
    let operand = word(lo, hi);
    let len = 1 + decoded.mode.operand_len();

    let operand_text = match decoded.mode {
        Addressing::Implied => String::new(),
        Addressing::Accumulator => "A".to_string(),
        Addressing::Immediate => format!("#${lo:02X}"),
        Addressing::ZeroPage => format!("${lo:02X}"),
        Addressing::ZeroPageX => format!("${lo:02X},X"),
        Addressing::ZeroPageY => format!("${lo:02X},Y"),
        Addressing::Absolute => format!("${operand:04X}"),
        Addressing::AbsoluteX => format!("${operand:04X},X"),
        Addressing::AbsoluteY => format!("${operand:04X},Y"),
        Addressing::Indirect => format!("(${operand:04X})"),
        Addressing::IndexedIndirect => format!("(${lo:02X},X)"),
        Addressing::IndirectIndexed => format!("(${lo:02X}),Y"),
        Addressing::Relative => {
            let target = pc.wrapping_add(2).wrapping_add(lo as i8 as u16);
            format!("${target:04X}")
        }
    };

    let text = if operand_text.is_empty() {
        decoded.mnemonic.name().to_string()
    } else {
        format!("{} {}", decoded.mnemonic.name(), operand_text)
    };
    Disassembly { text, len }
}

/// Builds a `pc -> text` listing by walking `count` instructions from `start`.
pub fn disassemble_range<B: Bus>(bus: &B, start: u16, count: usize) -> Vec<(u16, String)> {
    let mut listing = Vec::with_capacity(count);
    let mut pc = start;
    for _ in 0..count {
        let entry = disassemble(bus, pc);
        listing.push((pc, entry.text));
        pc = pc.wrapping_add(entry.len);
    }
    listing
}

/// Formats the nestest.log line for the instruction the CPU is about to
/// execute, e.g.
///
/// ```text
/// C000  4C F5 C5  JMP $C5F5                       A:00 X:00 Y:00 P:24 SP:FD PPU:  0, 21 CYC:7
/// ```
pub fn trace_line<B: Bus>(
    cpu: &Cpu,
    bus: &B,
    ppu_scanline: u16,
    ppu_dot: u16,
    cpu_cycle: u64,
) -> String {
    let pc = cpu.pc;
    let opcode = bus.peek(pc);
    let decoded = LOOKUP_TABLE[opcode as usize];
    let lo = bus.peek(pc.wrapping_add(1));
    let hi = bus.peek(pc.wrapping_add(2));

    let mut bytes = format!("{opcode:02X}");
    for i in 1..=decoded.mode.operand_len() {
        let byte = bus.peek(pc.wrapping_add(i));
        bytes.push_str(&format!(" {byte:02X}"));
    }

    let star = if is_starred(opcode, decoded.mnemonic) {
        '*'
    } else {
        ' '
    };

    let operand_text = annotated_operand(cpu, bus, decoded, lo, hi);
    let asm = if operand_text.is_empty() {
        decoded.mnemonic.name().to_string()
    } else {
        format!("{} {}", decoded.mnemonic.name(), operand_text)
    };

    let left = format!("{pc:04X}  {bytes:<8} {star}{asm}");
    format!(
        "{left:<47} A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} PPU:{ppu_scanline:>3},{ppu_dot:>3} CYC:{cpu_cycle}",
        cpu.a,
        cpu.x,
        cpu.y,
        cpu.status.bits(),
        cpu.sp,
    )
}

/// Opcodes nestest.log marks with a leading `*`: the illegal compositions,
/// every NOP variant except the official `$EA`, and the `$EB` SBC alias.
fn is_starred(opcode: u8, mnemonic: Mnemonic) -> bool {
    mnemonic.is_illegal() || (mnemonic == Mnemonic::Nop && opcode != 0xEA) || opcode == 0xEB
}

fn annotated_operand<B: Bus>(cpu: &Cpu, bus: &B, decoded: Opcode, lo: u8, hi: u8) -> String {
    let operand = word(lo, hi);
    match decoded.mode {
        Addressing::Implied => String::new(),
        Addressing::Accumulator => "A".to_string(),
        Addressing::Immediate => format!("#${lo:02X}"),
        Addressing::ZeroPage => {
            let value = bus.peek(lo as u16);
            format!("${lo:02X} = {value:02X}")
        }
        Addressing::ZeroPageX => {
            let addr = lo.wrapping_add(cpu.x);
            let value = bus.peek(addr as u16);
            format!("${lo:02X},X @ {addr:02X} = {value:02X}")
        }
        Addressing::ZeroPageY => {
            let addr = lo.wrapping_add(cpu.y);
            let value = bus.peek(addr as u16);
            format!("${lo:02X},Y @ {addr:02X} = {value:02X}")
        }
        Addressing::Absolute => {
            // Control flow just names the target; data operands show the byte
            // behind it.
            if matches!(decoded.mnemonic, Mnemonic::Jmp | Mnemonic::Jsr) {
                format!("${operand:04X}")
            } else {
                let value = bus.peek(operand);
                format!("${operand:04X} = {value:02X}")
            }
        }
        Addressing::AbsoluteX => {
            let addr = operand.wrapping_add(cpu.x as u16);
            let value = bus.peek(addr);
            format!("${operand:04X},X @ {addr:04X} = {value:02X}")
        }
        Addressing::AbsoluteY => {
            let addr = operand.wrapping_add(cpu.y as u16);
            let value = bus.peek(addr);
            format!("${operand:04X},Y @ {addr:04X} = {value:02X}")
        }
        Addressing::Indirect => {
            let target_lo = bus.peek(operand);
            let hi_addr = (operand & 0xFF00) | (operand.wrapping_add(1) & 0x00FF);
            let target = word(target_lo, bus.peek(hi_addr));
            format!("(${operand:04X}) = {target:04X}")
        }
        Addressing::IndexedIndirect => {
            let ptr = lo.wrapping_add(cpu.x);
            let addr = word(bus.peek(ptr as u16), bus.peek(ptr.wrapping_add(1) as u16));
            let value = bus.peek(addr);
            format!("(${lo:02X},X) @ {ptr:02X} = {addr:04X} = {value:02X}")
        }
        Addressing::IndirectIndexed => {
            let base = word(bus.peek(lo as u16), bus.peek(lo.wrapping_add(1) as u16));
            let addr = base.wrapping_add(cpu.y as u16);
            let value = bus.peek(addr);
            format!("(${lo:02X}),Y = {base:04X} @ {addr:04X} = {value:02X}")
        }
        Addressing::Relative => {
            let target = cpu.pc.wrapping_add(2).wrapping_add(lo as i8 as u16);
            format!("${target:04X}")
        }
    }
}

#[inline]
fn word(lo: u8, hi: u8) -> u16 {
    (hi as u16) << 8 | lo as u16
}
