#![allow(dead_code)]

use anyhow::Result;
use ctor::ctor;
use famicore_core::Nes;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[ctor]
fn init_tracing() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");
}

pub const PRG_BANK: usize = 16 * 1024;
pub const CHR_BANK: usize = 8 * 1024;

/// Builds synthetic single-bank NROM images so the suite never depends on
/// ROM files on disk.
pub struct RomBuilder {
    prg: Vec<u8>,
    chr: Vec<u8>,
    flags6: u8,
    reset_vector: u16,
}

impl RomBuilder {
    /// A NOP-sled PRG bank with the reset vector at `$8000`, no CHR content,
    /// horizontal mirroring.
    pub fn new() -> Self {
        Self {
            prg: vec![0xEA; PRG_BANK],
            chr: vec![0; CHR_BANK],
            flags6: 0x00,
            reset_vector: 0x8000,
        }
    }

    /// Places machine code at the start of the PRG bank (`$8000`).
    pub fn program(self, code: &[u8]) -> Self {
        self.program_at(0x8000, code)
    }

    /// Places machine code at an absolute CPU address within the bank.
    pub fn program_at(mut self, addr: u16, code: &[u8]) -> Self {
        let offset = (addr as usize - 0x8000) % PRG_BANK;
        self.prg[offset..offset + code.len()].copy_from_slice(code);
        self
    }

    pub fn reset_vector(mut self, addr: u16) -> Self {
        self.reset_vector = addr;
        self
    }

    pub fn vertical_mirroring(mut self) -> Self {
        self.flags6 |= 0x01;
        self
    }

    /// Fills one 8x8 tile's low bit plane so every pixel reads as color 1.
    pub fn solid_tile(mut self, table: u16, tile: u8) -> Self {
        let base = table as usize * 0x1000 + tile as usize * 16;
        for row in 0..8 {
            self.chr[base + row] = 0xFF;
        }
        self
    }

    pub fn build(mut self) -> Vec<u8> {
        self.prg[PRG_BANK - 4] = self.reset_vector as u8;
        self.prg[PRG_BANK - 3] = (self.reset_vector >> 8) as u8;

        let mut image = vec![0u8; 16];
        image[0..4].copy_from_slice(b"NES\x1A");
        image[4] = 1;
        image[5] = 1;
        image[6] = self.flags6;
        image.extend_from_slice(&self.prg);
        image.extend_from_slice(&self.chr);
        image
    }

    /// Builds the image, inserts it, and runs the reset sequence.
    pub fn into_nes(self) -> Result<Nes> {
        let mut nes = Nes::from_rom_bytes(&self.build())?;
        nes.reset();
        Ok(nes)
    }
}

impl Default for RomBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Steps until the PPU position within the current frame reaches at least
/// (`scanline`, `dot`).
pub fn step_until_ppu(nes: &mut Nes, scanline: u16, dot: u16) -> Result<()> {
    let start_frame = nes.ppu().frame_count();
    let target = scanline as u32 * 341 + dot as u32;
    let mut guard = 0u32;
    loop {
        let position = nes.ppu().scanline() as u32 * 341 + nes.ppu().cycle() as u32;
        if nes.ppu().frame_count() > start_frame || position >= target {
            return Ok(());
        }
        nes.step()?;
        guard += 1;
        anyhow::ensure!(guard < 200_000, "PPU never reached ({scanline}, {dot})");
    }
}

/// Steps `count` instructions (DMA cycles count as steps).
pub fn step_n(nes: &mut Nes, count: usize) -> Result<()> {
    for _ in 0..count {
        nes.step()?;
    }
    Ok(())
}
