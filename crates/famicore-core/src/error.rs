use std::fmt;

use crate::cartridge::header::INES_HEADER_LEN;

/// Fatal emulation faults.
///
/// None of these are recovered locally: the sequencer logs the diagnostic and
/// exits its loop, leaving all machine state in place for post-mortem
/// inspection (zero-page dump, last PC).
#[derive(Debug)]
pub enum Error {
    /// Provided ROM image is shorter than the 16-byte iNES header.
    TooShort { actual: usize },
    /// Magic number ("NES<EOF>") is missing.
    InvalidMagic,
    /// The header names a mapper other than 0 (NROM).
    UnsupportedMapper(u8),
    /// Four-screen mirroring requires cartridge VRAM we do not model.
    FourScreenMirroring,
    /// A ROM section (trainer/PRG/CHR) is shorter than the header advertises.
    SectionTooShort {
        section: &'static str,
        expected: usize,
        actual: usize,
    },
    /// The CPU fetched an opcode outside the implemented set.
    UnknownOpcode { opcode: u8, pc: u16 },
    /// A program stored to PRG ROM outside the reset-vector override hole.
    RomWrite { addr: u16 },
    /// Wrapper for I/O errors raised while reading ROMs from disk.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort { actual } => {
                write!(f, "header expected {INES_HEADER_LEN} bytes, got {actual}")
            }
            Self::InvalidMagic => write!(f, "missing NES magic bytes"),
            Self::UnsupportedMapper(id) => write!(f, "unsupported mapper {id} (only NROM)"),
            Self::FourScreenMirroring => write!(f, "four-screen mirroring is unsupported"),
            Self::SectionTooShort {
                section,
                expected,
                actual,
            } => write!(
                f,
                "{section} section expected {expected} bytes, got {actual}"
            ),
            Self::UnknownOpcode { opcode, pc } => {
                write!(f, "unknown opcode {opcode:02X} at {pc:04X}")
            }
            Self::RomWrite { addr } => write!(f, "write to PRG ROM at {addr:04X}"),
            Self::Io(err) => write!(f, "i/o error while reading cartridge: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}
