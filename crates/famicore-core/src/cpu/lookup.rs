//! 256-entry opcode decode table.
//!
//! Each slot carries the mnemonic, addressing mode, and base cycle count.
//! Page-crossing and branch penalties are added during execution. Slots for
//! opcodes outside the documented set plus the illegal variants `nestest`
//! exercises decode to [`Mnemonic::Jam`], which the CPU turns into a fatal
//! [`crate::error::Error::UnknownOpcode`].

use crate::cpu::addressing::Addressing as A;

/// Executable operation selected by the decode table.
///
/// Illegal opcodes are compositions of two legal primitives (`DCP = DEC;CMP`
/// and so on) and are executed that way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(clippy::upper_case_acronyms)]
pub enum Mnemonic {
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc, Bvs,
    Clc, Cld, Cli, Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx,
    Iny, Jmp, Jsr, Lda, Ldx, Ldy, Lsr, Nop, Ora, Pha, Php, Pla, Plp,
    Rol, Ror, Rti, Rts, Sbc, Sec, Sed, Sei, Sta, Stx, Sty, Tax, Tay,
    Tsx, Txa, Txs, Tya,
    // Illegal variants required by nestest.
    Dcp, Isc, Lax, Rla, Rra, Sax, Slo, Sre,
    /// Unimplemented/halting opcode: decoding one is a fatal fault.
    Jam,
}

impl Mnemonic {
    /// `true` for opcodes outside the documented set (starred in nestest.log).
    pub fn is_illegal(self) -> bool {
        matches!(
            self,
            Mnemonic::Dcp
                | Mnemonic::Isc
                | Mnemonic::Lax
                | Mnemonic::Rla
                | Mnemonic::Rra
                | Mnemonic::Sax
                | Mnemonic::Slo
                | Mnemonic::Sre
        )
    }

    /// Three-letter form used by the trace log (`ISB` is nestest's name for ISC).
    pub fn name(self) -> &'static str {
        match self {
            Mnemonic::Adc => "ADC", Mnemonic::And => "AND", Mnemonic::Asl => "ASL",
            Mnemonic::Bcc => "BCC", Mnemonic::Bcs => "BCS", Mnemonic::Beq => "BEQ",
            Mnemonic::Bit => "BIT", Mnemonic::Bmi => "BMI", Mnemonic::Bne => "BNE",
            Mnemonic::Bpl => "BPL", Mnemonic::Brk => "BRK", Mnemonic::Bvc => "BVC",
            Mnemonic::Bvs => "BVS", Mnemonic::Clc => "CLC", Mnemonic::Cld => "CLD",
            Mnemonic::Cli => "CLI", Mnemonic::Clv => "CLV", Mnemonic::Cmp => "CMP",
            Mnemonic::Cpx => "CPX", Mnemonic::Cpy => "CPY", Mnemonic::Dec => "DEC",
            Mnemonic::Dex => "DEX", Mnemonic::Dey => "DEY", Mnemonic::Eor => "EOR",
            Mnemonic::Inc => "INC", Mnemonic::Inx => "INX", Mnemonic::Iny => "INY",
            Mnemonic::Jmp => "JMP", Mnemonic::Jsr => "JSR", Mnemonic::Lda => "LDA",
            Mnemonic::Ldx => "LDX", Mnemonic::Ldy => "LDY", Mnemonic::Lsr => "LSR",
            Mnemonic::Nop => "NOP", Mnemonic::Ora => "ORA", Mnemonic::Pha => "PHA",
            Mnemonic::Php => "PHP", Mnemonic::Pla => "PLA", Mnemonic::Plp => "PLP",
            Mnemonic::Rol => "ROL", Mnemonic::Ror => "ROR", Mnemonic::Rti => "RTI",
            Mnemonic::Rts => "RTS", Mnemonic::Sbc => "SBC", Mnemonic::Sec => "SEC",
            Mnemonic::Sed => "SED", Mnemonic::Sei => "SEI", Mnemonic::Sta => "STA",
            Mnemonic::Stx => "STX", Mnemonic::Sty => "STY", Mnemonic::Tax => "TAX",
            Mnemonic::Tay => "TAY", Mnemonic::Tsx => "TSX", Mnemonic::Txa => "TXA",
            Mnemonic::Txs => "TXS", Mnemonic::Tya => "TYA", Mnemonic::Dcp => "DCP",
            Mnemonic::Isc => "ISB", Mnemonic::Lax => "LAX", Mnemonic::Rla => "RLA",
            Mnemonic::Rra => "RRA", Mnemonic::Sax => "SAX", Mnemonic::Slo => "SLO",
            Mnemonic::Sre => "SRE", Mnemonic::Jam => "JAM",
        }
    }

    /// Loads/ALU reads pay +1 cycle when indexing crosses a page. Stores and
    /// read-modify-write operations do not.
    pub(crate) fn pays_page_cross_penalty(self) -> bool {
        matches!(
            self,
            Mnemonic::Adc
                | Mnemonic::And
                | Mnemonic::Cmp
                | Mnemonic::Eor
                | Mnemonic::Lax
                | Mnemonic::Lda
                | Mnemonic::Ldx
                | Mnemonic::Ldy
                | Mnemonic::Nop
                | Mnemonic::Ora
                | Mnemonic::Sbc
        )
    }
}

/// One decoded opcode slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Opcode {
    pub mnemonic: Mnemonic,
    pub mode: A,
    pub cycles: u8,
}

// Short aliases to keep the table readable.
const IMP: A = A::Implied;
const ACC: A = A::Accumulator;
const IMM: A = A::Immediate;
const REL: A = A::Relative;
const ZP: A = A::ZeroPage;
const ZPX: A = A::ZeroPageX;
const ZPY: A = A::ZeroPageY;
const ABS: A = A::Absolute;
const ABX: A = A::AbsoluteX;
const ABY: A = A::AbsoluteY;
const IND: A = A::Indirect;
const INX: A = A::IndexedIndirect;
const INY: A = A::IndirectIndexed;

macro_rules! op {
    ($mnemonic:ident, $mode:ident, $cycles:literal) => {
        Opcode {
            mnemonic: Mnemonic::$mnemonic,
            mode: $mode,
            cycles: $cycles,
        }
    };
}

#[rustfmt::skip]
pub(crate) static LOOKUP_TABLE: [Opcode; 256] = [
    // 0x00
    op!(Brk, IMP, 7), op!(Ora, INX, 6), op!(Jam, IMP, 0), op!(Slo, INX, 8),
    op!(Nop, ZP,  3), op!(Ora, ZP,  3), op!(Asl, ZP,  5), op!(Slo, ZP,  5),
    op!(Php, IMP, 3), op!(Ora, IMM, 2), op!(Asl, ACC, 2), op!(Jam, IMP, 0),
    op!(Nop, ABS, 4), op!(Ora, ABS, 4), op!(Asl, ABS, 6), op!(Slo, ABS, 6),
    // 0x10
    op!(Bpl, REL, 2), op!(Ora, INY, 5), op!(Jam, IMP, 0), op!(Slo, INY, 8),
    op!(Nop, ZPX, 4), op!(Ora, ZPX, 4), op!(Asl, ZPX, 6), op!(Slo, ZPX, 6),
    op!(Clc, IMP, 2), op!(Ora, ABY, 4), op!(Nop, IMP, 2), op!(Slo, ABY, 7),
    op!(Nop, ABX, 4), op!(Ora, ABX, 4), op!(Asl, ABX, 7), op!(Slo, ABX, 7),
    // 0x20
    op!(Jsr, ABS, 6), op!(And, INX, 6), op!(Jam, IMP, 0), op!(Rla, INX, 8),
    op!(Bit, ZP,  3), op!(And, ZP,  3), op!(Rol, ZP,  5), op!(Rla, ZP,  5),
    op!(Plp, IMP, 4), op!(And, IMM, 2), op!(Rol, ACC, 2), op!(Jam, IMP, 0),
    op!(Bit, ABS, 4), op!(And, ABS, 4), op!(Rol, ABS, 6), op!(Rla, ABS, 6),
    // 0x30
    op!(Bmi, REL, 2), op!(And, INY, 5), op!(Jam, IMP, 0), op!(Rla, INY, 8),
    op!(Nop, ZPX, 4), op!(And, ZPX, 4), op!(Rol, ZPX, 6), op!(Rla, ZPX, 6),
    op!(Sec, IMP, 2), op!(And, ABY, 4), op!(Nop, IMP, 2), op!(Rla, ABY, 7),
    op!(Nop, ABX, 4), op!(And, ABX, 4), op!(Rol, ABX, 7), op!(Rla, ABX, 7),
    // 0x40
    op!(Rti, IMP, 6), op!(Eor, INX, 6), op!(Jam, IMP, 0), op!(Sre, INX, 8),
    op!(Nop, ZP,  3), op!(Eor, ZP,  3), op!(Lsr, ZP,  5), op!(Sre, ZP,  5),
    op!(Pha, IMP, 3), op!(Eor, IMM, 2), op!(Lsr, ACC, 2), op!(Jam, IMP, 0),
    op!(Jmp, ABS, 3), op!(Eor, ABS, 4), op!(Lsr, ABS, 6), op!(Sre, ABS, 6),
    // 0x50
    op!(Bvc, REL, 2), op!(Eor, INY, 5), op!(Jam, IMP, 0), op!(Sre, INY, 8),
    op!(Nop, ZPX, 4), op!(Eor, ZPX, 4), op!(Lsr, ZPX, 6), op!(Sre, ZPX, 6),
    op!(Cli, IMP, 2), op!(Eor, ABY, 4), op!(Nop, IMP, 2), op!(Sre, ABY, 7),
    op!(Nop, ABX, 4), op!(Eor, ABX, 4), op!(Lsr, ABX, 7), op!(Sre, ABX, 7),
    // 0x60
    op!(Rts, IMP, 6), op!(Adc, INX, 6), op!(Jam, IMP, 0), op!(Rra, INX, 8),
    op!(Nop, ZP,  3), op!(Adc, ZP,  3), op!(Ror, ZP,  5), op!(Rra, ZP,  5),
    op!(Pla, IMP, 4), op!(Adc, IMM, 2), op!(Ror, ACC, 2), op!(Jam, IMP, 0),
    op!(Jmp, IND, 5), op!(Adc, ABS, 4), op!(Ror, ABS, 6), op!(Rra, ABS, 6),
    // 0x70
    op!(Bvs, REL, 2), op!(Adc, INY, 5), op!(Jam, IMP, 0), op!(Rra, INY, 8),
    op!(Nop, ZPX, 4), op!(Adc, ZPX, 4), op!(Ror, ZPX, 6), op!(Rra, ZPX, 6),
    op!(Sei, IMP, 2), op!(Adc, ABY, 4), op!(Nop, IMP, 2), op!(Rra, ABY, 7),
    op!(Nop, ABX, 4), op!(Adc, ABX, 4), op!(Ror, ABX, 7), op!(Rra, ABX, 7),
    // 0x80
    op!(Nop, IMM, 2), op!(Sta, INX, 6), op!(Nop, IMM, 2), op!(Sax, INX, 6),
    op!(Sty, ZP,  3), op!(Sta, ZP,  3), op!(Stx, ZP,  3), op!(Sax, ZP,  3),
    op!(Dey, IMP, 2), op!(Nop, IMM, 2), op!(Txa, IMP, 2), op!(Jam, IMP, 0),
    op!(Sty, ABS, 4), op!(Sta, ABS, 4), op!(Stx, ABS, 4), op!(Sax, ABS, 4),
    // 0x90
    op!(Bcc, REL, 2), op!(Sta, INY, 6), op!(Jam, IMP, 0), op!(Jam, IMP, 0),
    op!(Sty, ZPX, 4), op!(Sta, ZPX, 4), op!(Stx, ZPY, 4), op!(Sax, ZPY, 4),
    op!(Tya, IMP, 2), op!(Sta, ABY, 5), op!(Txs, IMP, 2), op!(Jam, IMP, 0),
    op!(Jam, IMP, 0), op!(Sta, ABX, 5), op!(Jam, IMP, 0), op!(Jam, IMP, 0),
    // 0xA0
    op!(Ldy, IMM, 2), op!(Lda, INX, 6), op!(Ldx, IMM, 2), op!(Lax, INX, 6),
    op!(Ldy, ZP,  3), op!(Lda, ZP,  3), op!(Ldx, ZP,  3), op!(Lax, ZP,  3),
    op!(Tay, IMP, 2), op!(Lda, IMM, 2), op!(Tax, IMP, 2), op!(Lax, IMM, 2),
    op!(Ldy, ABS, 4), op!(Lda, ABS, 4), op!(Ldx, ABS, 4), op!(Lax, ABS, 4),
    // 0xB0
    op!(Bcs, REL, 2), op!(Lda, INY, 5), op!(Jam, IMP, 0), op!(Lax, INY, 5),
    op!(Ldy, ZPX, 4), op!(Lda, ZPX, 4), op!(Ldx, ZPY, 4), op!(Lax, ZPY, 4),
    op!(Clv, IMP, 2), op!(Lda, ABY, 4), op!(Tsx, IMP, 2), op!(Jam, IMP, 0),
    op!(Ldy, ABX, 4), op!(Lda, ABX, 4), op!(Ldx, ABY, 4), op!(Lax, ABY, 4),
    // 0xC0
    op!(Cpy, IMM, 2), op!(Cmp, INX, 6), op!(Nop, IMM, 2), op!(Dcp, INX, 8),
    op!(Cpy, ZP,  3), op!(Cmp, ZP,  3), op!(Dec, ZP,  5), op!(Dcp, ZP,  5),
    op!(Iny, IMP, 2), op!(Cmp, IMM, 2), op!(Dex, IMP, 2), op!(Jam, IMP, 0),
    op!(Cpy, ABS, 4), op!(Cmp, ABS, 4), op!(Dec, ABS, 6), op!(Dcp, ABS, 6),
    // 0xD0
    op!(Bne, REL, 2), op!(Cmp, INY, 5), op!(Jam, IMP, 0), op!(Dcp, INY, 8),
    op!(Nop, ZPX, 4), op!(Cmp, ZPX, 4), op!(Dec, ZPX, 6), op!(Dcp, ZPX, 6),
    op!(Cld, IMP, 2), op!(Cmp, ABY, 4), op!(Nop, IMP, 2), op!(Dcp, ABY, 7),
    op!(Nop, ABX, 4), op!(Cmp, ABX, 4), op!(Dec, ABX, 7), op!(Dcp, ABX, 7),
    // 0xE0
    op!(Cpx, IMM, 2), op!(Sbc, INX, 6), op!(Nop, IMM, 2), op!(Isc, INX, 8),
    op!(Cpx, ZP,  3), op!(Sbc, ZP,  3), op!(Inc, ZP,  5), op!(Isc, ZP,  5),
    op!(Inx, IMP, 2), op!(Sbc, IMM, 2), op!(Nop, IMP, 2), op!(Sbc, IMM, 2),
    op!(Cpx, ABS, 4), op!(Sbc, ABS, 4), op!(Inc, ABS, 6), op!(Isc, ABS, 6),
    // 0xF0
    op!(Beq, REL, 2), op!(Sbc, INY, 5), op!(Jam, IMP, 0), op!(Isc, INY, 8),
    op!(Nop, ZPX, 4), op!(Sbc, ZPX, 4), op!(Inc, ZPX, 6), op!(Isc, ZPX, 6),
    op!(Sed, IMP, 2), op!(Sbc, ABY, 4), op!(Nop, IMP, 2), op!(Isc, ABY, 7),
    op!(Nop, ABX, 4), op!(Sbc, ABX, 4), op!(Inc, ABX, 7), op!(Isc, ABX, 7),
];
