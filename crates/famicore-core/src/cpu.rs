//! MOS 6502 (Ricoh 2A03) interpreter.
//!
//! The CPU steps at instruction granularity: [`Cpu::step_instruction`] fetches,
//! decodes through the 256-entry [`lookup`] table, executes, and returns the
//! number of cycles consumed, including page-crossing and branch penalties.
//! The sequencer uses that count to advance the PPU and APU.
//!
//! Interrupt discipline: NMI is edge-triggered by the PPU and delivered by the
//! sequencer between instructions via [`Cpu::nonmaskable_interrupt`]; BRK
//! shares the `$FFFE` vector with IRQ.

use crate::bus::Bus;
use crate::error::Error;
use crate::memory::cpu as cpu_mem;

use self::addressing::{Addressing, Operand};
use self::lookup::{LOOKUP_TABLE, Mnemonic, Opcode};
use self::status::Status;

pub mod addressing;
pub mod lookup;
pub mod status;
pub mod trace;

/// CPU register file.
///
/// The stack pointer indexes page one (`$0100 + sp`) and wraps within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cpu {
    pub pc: u16,
    pub sp: u8,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub status: Status,
}

impl Cpu {
    pub fn new() -> Self {
        Self {
            pc: 0,
            sp: 0,
            a: 0,
            x: 0,
            y: 0,
            status: Status::new(),
        }
    }

    /// Runs the reset sequence: registers cleared, interrupts disabled,
    /// `pc` loaded from the reset vector. Costs 7 cycles.
    pub fn reset<B: Bus>(&mut self, bus: &mut B) -> u8 {
        self.pc = self.read_word(bus, cpu_mem::RESET_VECTOR);
        self.sp = 0xFD;
        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.status = Status::new();
        7
    }

    /// Services a non-maskable interrupt: pushes `pc` and status (B clear),
    /// disables interrupts, and jumps through `$FFFA`. Costs 7 cycles.
    pub fn nonmaskable_interrupt<B: Bus>(&mut self, bus: &mut B) -> Result<u8, Error> {
        self.push_word(bus, self.pc)?;
        self.push(bus, self.status.pushed_by_interrupt())?;
        self.status.insert(Status::INTERRUPT);
        self.pc = self.read_word(bus, cpu_mem::NMI_VECTOR);
        Ok(7)
    }

    /// Services a maskable interrupt through the shared BRK vector.
    ///
    /// Returns 0 without touching any state while the I flag is set.
    pub fn interrupt_request<B: Bus>(&mut self, bus: &mut B) -> Result<u8, Error> {
        if self.status.contains(Status::INTERRUPT) {
            return Ok(0);
        }
        self.push_word(bus, self.pc)?;
        self.push(bus, self.status.pushed_by_interrupt())?;
        self.status.insert(Status::INTERRUPT);
        self.pc = self.read_word(bus, cpu_mem::IRQ_VECTOR);
        Ok(7)
    }

    /// Register snapshot for tracing and post-mortem reports.
    pub fn snapshot(&self) -> CpuSnapshot {
        CpuSnapshot {
            pc: self.pc,
            sp: self.sp,
            a: self.a,
            x: self.x,
            y: self.y,
            p: self.status.bits(),
        }
    }

    /// Executes the next instruction and returns the cycles it consumed.
    pub fn step_instruction<B: Bus>(&mut self, bus: &mut B) -> Result<u8, Error> {
        let opcode_pc = self.pc;
        let opcode = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);

        let decoded = LOOKUP_TABLE[opcode as usize];
        if decoded.mnemonic == Mnemonic::Jam {
            // Leave pc on the faulting opcode for post-mortem inspection.
            self.pc = opcode_pc;
            return Err(Error::UnknownOpcode {
                opcode,
                pc: opcode_pc,
            });
        }

        let (operand, page_crossed) = self.resolve_operand(bus, decoded.mode);
        let extra = self.execute(bus, decoded, operand, page_crossed)?;
        Ok(decoded.cycles + extra)
    }

    // ---------------------------------------------------------------------
    // Operand resolution
    // ---------------------------------------------------------------------

    /// Computes the effective operand for `mode`, consuming operand bytes.
    ///
    /// The second return value reports whether indexed addressing crossed a
    /// page boundary; whether that costs a cycle depends on the instruction.
    fn resolve_operand<B: Bus>(&mut self, bus: &mut B, mode: Addressing) -> (Operand, bool) {
        match mode {
            Addressing::Implied => (Operand::None, false),
            Addressing::Accumulator => (Operand::Accumulator, false),
            Addressing::Immediate => (Operand::Immediate(self.fetch(bus)), false),
            Addressing::Relative => (Operand::Relative(self.fetch(bus) as i8), false),
            Addressing::ZeroPage => (Operand::Address(self.fetch(bus) as u16), false),
            Addressing::ZeroPageX => {
                let base = self.fetch(bus);
                (Operand::Address(base.wrapping_add(self.x) as u16), false)
            }
            Addressing::ZeroPageY => {
                let base = self.fetch(bus);
                (Operand::Address(base.wrapping_add(self.y) as u16), false)
            }
            Addressing::Absolute => (Operand::Address(self.fetch_word(bus)), false),
            Addressing::AbsoluteX => {
                let base = self.fetch_word(bus);
                let addr = base.wrapping_add(self.x as u16);
                (Operand::Address(addr), crosses_page(base, addr))
            }
            Addressing::AbsoluteY => {
                let base = self.fetch_word(bus);
                let addr = base.wrapping_add(self.y as u16);
                (Operand::Address(addr), crosses_page(base, addr))
            }
            Addressing::Indirect => {
                // The pointer's high byte does not carry: $xxFF wraps to $xx00.
                let ptr = self.fetch_word(bus);
                let lo = bus.read(ptr);
                let hi_addr = (ptr & 0xFF00) | (ptr.wrapping_add(1) & 0x00FF);
                let hi = bus.read(hi_addr);
                (Operand::Address(word(lo, hi)), false)
            }
            Addressing::IndexedIndirect => {
                // Both the X addition and the pointer fetch wrap in page zero.
                let base = self.fetch(bus).wrapping_add(self.x);
                let lo = bus.read(base as u16);
                let hi = bus.read(base.wrapping_add(1) as u16);
                (Operand::Address(word(lo, hi)), false)
            }
            Addressing::IndirectIndexed => {
                let zp = self.fetch(bus);
                let lo = bus.read(zp as u16);
                let hi = bus.read(zp.wrapping_add(1) as u16);
                let base = word(lo, hi);
                let addr = base.wrapping_add(self.y as u16);
                (Operand::Address(addr), crosses_page(base, addr))
            }
        }
    }

    // ---------------------------------------------------------------------
    // Execution
    // ---------------------------------------------------------------------

    /// Executes one decoded instruction; returns extra cycles beyond the base
    /// count (page-cross penalties for reads, branch penalties).
    fn execute<B: Bus>(
        &mut self,
        bus: &mut B,
        decoded: Opcode,
        operand: Operand,
        page_crossed: bool,
    ) -> Result<u8, Error> {
        let mut extra = 0u8;
        if page_crossed && decoded.mnemonic.pays_page_cross_penalty() {
            extra += 1;
        }

        match decoded.mnemonic {
            // Loads / stores / transfers
            Mnemonic::Lda => {
                self.a = self.read_operand(bus, operand);
                self.status.set_zn(self.a);
            }
            Mnemonic::Ldx => {
                self.x = self.read_operand(bus, operand);
                self.status.set_zn(self.x);
            }
            Mnemonic::Ldy => {
                self.y = self.read_operand(bus, operand);
                self.status.set_zn(self.y);
            }
            Mnemonic::Lax => {
                let value = self.read_operand(bus, operand);
                self.a = value;
                self.x = value;
                self.status.set_zn(value);
            }
            Mnemonic::Sta => bus.write(operand.address(), self.a)?,
            Mnemonic::Stx => bus.write(operand.address(), self.x)?,
            Mnemonic::Sty => bus.write(operand.address(), self.y)?,
            Mnemonic::Sax => bus.write(operand.address(), self.a & self.x)?,
            Mnemonic::Tax => {
                self.x = self.a;
                self.status.set_zn(self.x);
            }
            Mnemonic::Tay => {
                self.y = self.a;
                self.status.set_zn(self.y);
            }
            Mnemonic::Tsx => {
                self.x = self.sp;
                self.status.set_zn(self.x);
            }
            Mnemonic::Txa => {
                self.a = self.x;
                self.status.set_zn(self.a);
            }
            Mnemonic::Txs => self.sp = self.x,
            Mnemonic::Tya => {
                self.a = self.y;
                self.status.set_zn(self.a);
            }

            // ALU
            Mnemonic::Adc => {
                let value = self.read_operand(bus, operand);
                self.adc(value);
            }
            Mnemonic::Sbc => {
                let value = self.read_operand(bus, operand);
                self.adc(!value);
            }
            Mnemonic::And => {
                self.a &= self.read_operand(bus, operand);
                self.status.set_zn(self.a);
            }
            Mnemonic::Ora => {
                self.a |= self.read_operand(bus, operand);
                self.status.set_zn(self.a);
            }
            Mnemonic::Eor => {
                self.a ^= self.read_operand(bus, operand);
                self.status.set_zn(self.a);
            }
            Mnemonic::Cmp => {
                let value = self.read_operand(bus, operand);
                self.compare(self.a, value);
            }
            Mnemonic::Cpx => {
                let value = self.read_operand(bus, operand);
                self.compare(self.x, value);
            }
            Mnemonic::Cpy => {
                let value = self.read_operand(bus, operand);
                self.compare(self.y, value);
            }
            Mnemonic::Bit => {
                let value = self.read_operand(bus, operand);
                self.status.set(Status::ZERO, self.a & value == 0);
                self.status.set(Status::NEGATIVE, value & 0x80 != 0);
                self.status.set(Status::OVERFLOW, value & 0x40 != 0);
            }

            // Increments / decrements
            Mnemonic::Inc => {
                let value = self.modify(bus, operand, |_, v| v.wrapping_add(1))?;
                self.status.set_zn(value);
            }
            Mnemonic::Dec => {
                let value = self.modify(bus, operand, |_, v| v.wrapping_sub(1))?;
                self.status.set_zn(value);
            }
            Mnemonic::Inx => {
                self.x = self.x.wrapping_add(1);
                self.status.set_zn(self.x);
            }
            Mnemonic::Iny => {
                self.y = self.y.wrapping_add(1);
                self.status.set_zn(self.y);
            }
            Mnemonic::Dex => {
                self.x = self.x.wrapping_sub(1);
                self.status.set_zn(self.x);
            }
            Mnemonic::Dey => {
                self.y = self.y.wrapping_sub(1);
                self.status.set_zn(self.y);
            }

            // Shifts / rotates
            Mnemonic::Asl => {
                let value = self.modify(bus, operand, shift_left)?;
                self.status.set_zn(value);
            }
            Mnemonic::Lsr => {
                let value = self.modify(bus, operand, shift_right)?;
                self.status.set_zn(value);
            }
            Mnemonic::Rol => {
                let value = self.modify(bus, operand, rotate_left)?;
                self.status.set_zn(value);
            }
            Mnemonic::Ror => {
                let value = self.modify(bus, operand, rotate_right)?;
                self.status.set_zn(value);
            }

            // Illegal read-modify-write compositions
            Mnemonic::Slo => {
                let value = self.modify(bus, operand, shift_left)?;
                self.a |= value;
                self.status.set_zn(self.a);
            }
            Mnemonic::Rla => {
                let value = self.modify(bus, operand, rotate_left)?;
                self.a &= value;
                self.status.set_zn(self.a);
            }
            Mnemonic::Sre => {
                let value = self.modify(bus, operand, shift_right)?;
                self.a ^= value;
                self.status.set_zn(self.a);
            }
            Mnemonic::Rra => {
                let value = self.modify(bus, operand, rotate_right)?;
                self.adc(value);
            }
            Mnemonic::Dcp => {
                let value = self.modify(bus, operand, |_, v| v.wrapping_sub(1))?;
                self.compare(self.a, value);
            }
            Mnemonic::Isc => {
                let value = self.modify(bus, operand, |_, v| v.wrapping_add(1))?;
                self.adc(!value);
            }

            // Flow control
            Mnemonic::Jmp => self.pc = operand.address(),
            Mnemonic::Jsr => {
                self.push_word(bus, self.pc.wrapping_sub(1))?;
                self.pc = operand.address();
            }
            Mnemonic::Rts => {
                self.pc = self.pull_word(bus).wrapping_add(1);
            }
            Mnemonic::Brk => {
                // BRK skips a padding byte; the pushed return address points
                // past it.
                self.push_word(bus, self.pc.wrapping_add(1))?;
                self.push(bus, self.status.pushed_by_instruction())?;
                self.status.insert(Status::INTERRUPT);
                self.pc = self.read_word(bus, cpu_mem::IRQ_VECTOR);
            }
            Mnemonic::Rti => {
                let flags = self.pull(bus);
                self.status = Status::pulled(flags);
                self.pc = self.pull_word(bus);
            }

            // Branches
            Mnemonic::Bcc => extra += self.branch(operand, !self.status.carry()),
            Mnemonic::Bcs => extra += self.branch(operand, self.status.carry()),
            Mnemonic::Bne => extra += self.branch(operand, !self.status.zero()),
            Mnemonic::Beq => extra += self.branch(operand, self.status.zero()),
            Mnemonic::Bpl => extra += self.branch(operand, !self.status.negative()),
            Mnemonic::Bmi => extra += self.branch(operand, self.status.negative()),
            Mnemonic::Bvc => extra += self.branch(operand, !self.status.overflow()),
            Mnemonic::Bvs => extra += self.branch(operand, self.status.overflow()),

            // Stack
            Mnemonic::Pha => self.push(bus, self.a)?,
            Mnemonic::Php => self.push(bus, self.status.pushed_by_instruction())?,
            Mnemonic::Pla => {
                self.a = self.pull(bus);
                self.status.set_zn(self.a);
            }
            Mnemonic::Plp => {
                let flags = self.pull(bus);
                self.status = Status::pulled(flags);
            }

            // Flags
            Mnemonic::Clc => self.status.remove(Status::CARRY),
            Mnemonic::Sec => self.status.insert(Status::CARRY),
            Mnemonic::Cli => self.status.remove(Status::INTERRUPT),
            Mnemonic::Sei => self.status.insert(Status::INTERRUPT),
            Mnemonic::Cld => self.status.remove(Status::DECIMAL),
            Mnemonic::Sed => self.status.insert(Status::DECIMAL),
            Mnemonic::Clv => self.status.remove(Status::OVERFLOW),

            Mnemonic::Nop => {
                // Addressed NOP variants still perform the dummy read.
                if let Operand::Address(addr) = operand {
                    bus.read(addr);
                }
            }

            // Filtered out by step_instruction before execution.
            Mnemonic::Jam => unreachable!("jam opcodes fault during decode"),
        }

        Ok(extra)
    }

    fn branch(&mut self, operand: Operand, taken: bool) -> u8 {
        let offset = match operand {
            Operand::Relative(offset) => offset,
            _ => unreachable!("branch operand is always relative"),
        };
        if !taken {
            return 0;
        }
        let target = self.pc.wrapping_add(offset as u16);
        let penalty = if crosses_page(self.pc, target) { 2 } else { 1 };
        self.pc = target;
        penalty
    }

    /// Add-with-carry core, shared by ADC/SBC/RRA/ISC (SBC adds the one's
    /// complement).
    fn adc(&mut self, value: u8) {
        let carry = self.status.carry() as u16;
        let sum = self.a as u16 + value as u16 + carry;
        let result = sum as u8;
        self.status.set(Status::CARRY, sum > 0xFF);
        // Overflow: operands agree in sign but the result does not.
        let overflow = (self.a ^ result) & (value ^ result) & 0x80 != 0;
        self.status.set(Status::OVERFLOW, overflow);
        self.a = result;
        self.status.set_zn(result);
    }

    fn compare(&mut self, register: u8, value: u8) {
        let result = register.wrapping_sub(value);
        self.status.set(Status::CARRY, register >= value);
        self.status.set_zn(result);
    }

    fn read_operand<B: Bus>(&mut self, bus: &mut B, operand: Operand) -> u8 {
        match operand {
            Operand::Accumulator => self.a,
            Operand::Immediate(value) => value,
            Operand::Address(addr) => bus.read(addr),
            _ => unreachable!("operand carries no value"),
        }
    }

    /// Read-modify-write helper; returns the written value.
    fn modify<B, F>(&mut self, bus: &mut B, operand: Operand, f: F) -> Result<u8, Error>
    where
        B: Bus,
        F: FnOnce(&mut Status, u8) -> u8,
    {
        match operand {
            Operand::Accumulator => {
                self.a = f(&mut self.status, self.a);
                Ok(self.a)
            }
            Operand::Address(addr) => {
                let value = bus.read(addr);
                let result = f(&mut self.status, value);
                bus.write(addr, result)?;
                Ok(result)
            }
            _ => unreachable!("read-modify-write needs a memory or accumulator operand"),
        }
    }

    // ---------------------------------------------------------------------
    // Memory helpers
    // ---------------------------------------------------------------------

    fn fetch<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let value = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        value
    }

    fn fetch_word<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let lo = self.fetch(bus);
        let hi = self.fetch(bus);
        word(lo, hi)
    }

    fn read_word<B: Bus>(&self, bus: &mut B, addr: u16) -> u16 {
        let lo = bus.read(addr);
        let hi = bus.read(addr.wrapping_add(1));
        word(lo, hi)
    }

    fn push<B: Bus>(&mut self, bus: &mut B, value: u8) -> Result<(), Error> {
        bus.write(cpu_mem::STACK_PAGE + self.sp as u16, value)?;
        self.sp = self.sp.wrapping_sub(1);
        Ok(())
    }

    fn push_word<B: Bus>(&mut self, bus: &mut B, value: u16) -> Result<(), Error> {
        self.push(bus, (value >> 8) as u8)?;
        self.push(bus, value as u8)
    }

    fn pull<B: Bus>(&mut self, bus: &mut B) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        bus.read(cpu_mem::STACK_PAGE + self.sp as u16)
    }

    fn pull_word<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let lo = self.pull(bus);
        let hi = self.pull(bus);
        word(lo, hi)
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

/// Copy of the register file at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuSnapshot {
    pub pc: u16,
    pub sp: u8,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub p: u8,
}

#[inline]
fn word(lo: u8, hi: u8) -> u16 {
    (hi as u16) << 8 | lo as u16
}

#[inline]
fn crosses_page(a: u16, b: u16) -> bool {
    a & 0xFF00 != b & 0xFF00
}

fn shift_left(status: &mut Status, value: u8) -> u8 {
    status.set(Status::CARRY, value & 0x80 != 0);
    value << 1
}

fn shift_right(status: &mut Status, value: u8) -> u8 {
    status.set(Status::CARRY, value & 0x01 != 0);
    value >> 1
}

fn rotate_left(status: &mut Status, value: u8) -> u8 {
    let carry_in = status.carry() as u8;
    status.set(Status::CARRY, value & 0x80 != 0);
    value << 1 | carry_in
}

fn rotate_right(status: &mut Status, value: u8) -> u8 {
    let carry_in = (status.carry() as u8) << 7;
    status.set(Status::CARRY, value & 0x01 != 0);
    value >> 1 | carry_in
}
