//! iNES header parsing.
//!
//! The first 16 bytes of every `.nes` ROM are the *iNES header*: magic bytes,
//! PRG/CHR bank counts, and two flag bytes that encode the mapper id, the
//! nametable mirroring, and whether a 512-byte trainer sits between the header
//! and the PRG data. See <https://www.nesdev.org/wiki/INES#iNES_file_format>.
//!
//! Damaged or unsupported headers turn into a descriptive [`Error`].

use bitflags::bitflags;

use crate::error::Error;

const NES_MAGIC: &[u8; 4] = b"NES\x1A";

/// Size of the fixed iNES header in bytes.
pub const INES_HEADER_LEN: usize = 16;

/// Size of the optional trainer block between the header and PRG data.
pub const TRAINER_LEN: usize = 512;

/// PRG ROM bank granularity (16 KiB).
pub const PRG_BANK_LEN: usize = 16 * 1024;

/// CHR ROM bank granularity (8 KiB).
pub const CHR_BANK_LEN: usize = 8 * 1024;

bitflags! {
    /// iNES flags 6: mirroring, battery, trainer, and the low mapper nibble.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Flags6: u8 {
        const VERTICAL_MIRRORING = 0b0000_0001;
        const BATTERY            = 0b0000_0010;
        const TRAINER            = 0b0000_0100;
        const FOUR_SCREEN        = 0b0000_1000;
        const MAPPER_LOW_MASK    = 0b1111_0000;
    }
}

bitflags! {
    /// iNES flags 7: console type bits and the high mapper nibble.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Flags7: u8 {
        const VS_UNISYSTEM     = 0b0000_0001;
        const PLAYCHOICE_10    = 0b0000_0010;
        const NES2_DETECTION   = 0b0000_1100;
        const MAPPER_HIGH_MASK = 0b1111_0000;
    }
}

/// Layout mirroring type for the PPU nametables.
///
/// Only the two hardwired NROM arrangements are representable; four-screen
/// carts are rejected at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mirroring {
    /// Two horizontal nametables that mirror vertically.
    Horizontal,
    /// Two vertical nametables that mirror horizontally.
    Vertical,
}

/// Parsed iNES header fields relevant to an NROM cartridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Header {
    /// PRG ROM size in 16 KiB units.
    pub prg_bank_count: u8,
    /// CHR ROM size in 8 KiB units.
    pub chr_bank_count: u8,
    /// Mapper id assembled from the two flag nibbles.
    pub mapper: u8,
    /// Hardwired nametable mirroring.
    pub mirroring: Mirroring,
    /// Whether a 512-byte trainer precedes the PRG data.
    pub trainer_present: bool,
}

impl Header {
    /// Parses the 16-byte iNES header.
    ///
    /// Rejects missing magic, any mapper other than NROM, and four-screen
    /// mirroring (spec'd as unsupported).
    pub fn parse(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() < INES_HEADER_LEN {
            return Err(Error::TooShort {
                actual: bytes.len(),
            });
        }
        if &bytes[0..4] != NES_MAGIC {
            return Err(Error::InvalidMagic);
        }

        let flags6 = Flags6::from_bits_retain(bytes[6]);
        let flags7 = Flags7::from_bits_retain(bytes[7]);

        let mapper = (flags7.bits() & Flags7::MAPPER_HIGH_MASK.bits()) | (flags6.bits() >> 4);
        if mapper != 0 {
            return Err(Error::UnsupportedMapper(mapper));
        }

        if flags6.contains(Flags6::FOUR_SCREEN) {
            return Err(Error::FourScreenMirroring);
        }
        let mirroring = if flags6.contains(Flags6::VERTICAL_MIRRORING) {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };

        Ok(Self {
            prg_bank_count: bytes[4],
            chr_bank_count: bytes[5],
            mapper,
            mirroring,
            trainer_present: flags6.contains(Flags6::TRAINER),
        })
    }

    /// Total PRG ROM size in bytes.
    pub fn prg_rom_len(&self) -> usize {
        self.prg_bank_count as usize * PRG_BANK_LEN
    }

    /// Total CHR ROM size in bytes.
    pub fn chr_rom_len(&self) -> usize {
        self.chr_bank_count as usize * CHR_BANK_LEN
    }
}
