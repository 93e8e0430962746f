//! Cartridge model: iNES parsing plus PRG/CHR bank ownership.
//!
//! A [`Cartridge`] owns the PRG and CHR banks sliced out of a `.nes` image and
//! answers CPU/PPU reads through its mapper. The image is immutable after
//! load, with one deliberate hole: writes to `$FFFC/$FFFD` patch the reset
//! vector so headless test harnesses can redirect execution (the trick the
//! `nestest` harness relies on).

use std::fs;
use std::path::Path;

use crate::error::Error;
use crate::memory::cpu as cpu_mem;

use self::header::{Header, INES_HEADER_LEN, Mirroring, TRAINER_LEN};
use self::mapper::{Mapper, Nrom};

pub mod header;
pub mod mapper;

/// An inserted cartridge: parsed header, PRG/CHR data, and the mapper that
/// translates bus addresses into bank offsets.
#[derive(Debug, Clone)]
pub struct Cartridge {
    prg_rom: Box<[u8]>,
    chr_rom: Box<[u8]>,
    mapper: Nrom,
    mirroring: Mirroring,
}

impl Cartridge {
    /// Loads a cartridge from a `.nes` file on disk.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Self::from_bytes(&fs::read(path)?)
    }

    /// Parses a complete iNES image held in memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let header = Header::parse(bytes)?;

        let mut offset = INES_HEADER_LEN;
        if header.trainer_present {
            // A trainer carries code for long-dead copiers; skip it.
            let end = offset + TRAINER_LEN;
            if bytes.len() < end {
                return Err(Error::SectionTooShort {
                    section: "trainer",
                    expected: TRAINER_LEN,
                    actual: bytes.len().saturating_sub(offset),
                });
            }
            offset = end;
        }

        let prg_len = header.prg_rom_len();
        if bytes.len() < offset + prg_len {
            return Err(Error::SectionTooShort {
                section: "PRG ROM",
                expected: prg_len,
                actual: bytes.len().saturating_sub(offset),
            });
        }
        let prg_rom: Box<[u8]> = bytes[offset..offset + prg_len].into();
        offset += prg_len;

        let chr_len = header.chr_rom_len();
        if bytes.len() < offset + chr_len {
            return Err(Error::SectionTooShort {
                section: "CHR ROM",
                expected: chr_len,
                actual: bytes.len().saturating_sub(offset),
            });
        }
        let chr_rom: Box<[u8]> = bytes[offset..offset + chr_len].into();

        Ok(Self {
            prg_rom,
            chr_rom,
            mapper: Nrom::new(header.prg_bank_count),
            mirroring: header.mirroring,
        })
    }

    /// Hardwired nametable mirroring reported to the graphics bus.
    pub fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    /// CPU-side read. Addresses below the PRG window are open bus (0).
    pub fn cpu_read(&self, addr: u16) -> u8 {
        match self.mapper.cpu_map(addr) {
            Some(offset) => self.prg_rom[offset],
            None => 0,
        }
    }

    /// CPU-side write.
    ///
    /// PRG ROM is read-only except for the reset-vector override hole at
    /// `$FFFC/$FFFD`; anything else is a fatal fault.
    pub fn cpu_write(&mut self, addr: u16, value: u8) -> Result<(), Error> {
        if addr == cpu_mem::RESET_VECTOR || addr == cpu_mem::RESET_VECTOR + 1 {
            if let Some(offset) = self.mapper.cpu_map(addr) {
                self.prg_rom[offset] = value;
            }
            Ok(())
        } else {
            Err(Error::RomWrite { addr })
        }
    }

    /// PPU-side read from CHR (`addr < $2000`).
    pub fn ppu_read(&self, addr: u16) -> u8 {
        let offset = self.mapper.ppu_map(addr);
        if self.chr_rom.is_empty() {
            return 0;
        }
        self.chr_rom[offset % self.chr_rom.len()]
    }
}
