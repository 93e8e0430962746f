//! PPU-side address decode.
//!
//! Routes pattern-table fetches to cartridge CHR and nametable accesses to
//! the 2 KiB of console VRAM, applying the cartridge's hardwired mirroring.
//! Palette RAM (`$3F00-$3FFF`) never reaches this bus; the PPU services it
//! directly.

use crate::cartridge::Cartridge;
use crate::cartridge::header::Mirroring;
use crate::memory::ppu as ppu_mem;

/// Short-lived borrow of the components visible from the PPU's address space.
#[derive(Debug)]
pub struct GraphicsBus<'a> {
    cartridge: &'a Cartridge,
    vram: &'a mut [u8; ppu_mem::VRAM_SIZE],
}

impl<'a> GraphicsBus<'a> {
    pub fn new(cartridge: &'a Cartridge, vram: &'a mut [u8; ppu_mem::VRAM_SIZE]) -> Self {
        Self { cartridge, vram }
    }

    /// Folds a logical nametable address (`$2000-$3EFF`) onto the 2 KiB of
    /// physical VRAM.
    ///
    /// The logical space holds four 1 KiB tables; horizontal mirroring stacks
    /// them in pairs (0,0,1,1) and vertical mirroring alternates them
    /// (0,1,0,1).
    fn nametable_index(&self, addr: u16) -> usize {
        let addr = addr & 0x0FFF;
        let logical = addr / ppu_mem::NAMETABLE_SIZE;
        let physical = match self.cartridge.mirroring() {
            Mirroring::Horizontal => logical / 2,
            Mirroring::Vertical => logical % 2,
        };
        (physical * ppu_mem::NAMETABLE_SIZE + addr % ppu_mem::NAMETABLE_SIZE) as usize
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            0..=ppu_mem::PATTERN_TABLE_END => self.cartridge.ppu_read(addr),
            ppu_mem::NAMETABLE_BASE..=ppu_mem::NAMETABLE_END => {
                self.vram[self.nametable_index(addr)]
            }
            _ => unreachable!("graphics bus address {addr:04X} out of range"),
        }
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        match addr {
            // CHR ROM is read-only on NROM; the write is dropped.
            0..=ppu_mem::PATTERN_TABLE_END => {}
            ppu_mem::NAMETABLE_BASE..=ppu_mem::NAMETABLE_END => {
                let index = self.nametable_index(addr);
                self.vram[index] = value;
            }
            _ => unreachable!("graphics bus address {addr:04X} out of range"),
        }
    }
}
