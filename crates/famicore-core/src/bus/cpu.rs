//! CPU-side address decode and the OAM DMA engine.
//!
//! `CpuBus` is a short-lived borrow over the system's components, assembled
//! for each CPU step (see the `cpu_bus!` construction in the crate root). No
//! component owns another; all back-references live only for the duration of
//! one call.
//!
//! Decode map:
//! - `$0000-$1FFF`: 2 KiB WRAM, mirrored every `$0800`
//! - `$2000-$3FFF`: PPU registers, mirrored every 8 bytes
//! - `$4000-$4013`, `$4015`, `$4017` (write): APU registers
//! - `$4014` (write): OAM DMA trigger
//! - `$4016` (write), `$4016/$4017` (read): controller strobe / serial data
//! - `$4018-$401F`: disabled test IO, reads as 0
//! - `$4020-$FFFF`: cartridge

use crate::apu::Apu;
use crate::cartridge::Cartridge;
use crate::controller::Controllers;
use crate::error::Error;
use crate::memory::{cpu as cpu_mem, ppu as ppu_mem};
use crate::ppu::Ppu;

use super::dma::DmaState;
use super::graphics::GraphicsBus;
use super::Bus;

/// One CPU step's view of the machine.
#[derive(Debug)]
pub struct CpuBus<'a> {
    pub wram: &'a mut [u8; cpu_mem::WRAM_SIZE],
    pub vram: &'a mut [u8; ppu_mem::VRAM_SIZE],
    pub ppu: &'a mut Ppu,
    pub apu: &'a mut Apu,
    pub cartridge: &'a mut Cartridge,
    pub controllers: &'a mut Controllers,
    pub dma: &'a mut DmaState,
}

impl CpuBus<'_> {
    /// Runs one cycle of an in-progress OAM DMA transfer.
    ///
    /// The CPU halts for one alignment cycle (two when the trigger lands on
    /// an odd cycle) so the 256 read/write pairs start right after an even
    /// put cycle: 513 cycles total, or 514 on odd-cycle starts.
    pub fn step_dma_cycle(&mut self, cpu_cycle: u64) -> Result<(), Error> {
        debug_assert!(self.dma.in_progress);

        if !self.dma.can_begin {
            if cpu_cycle % 2 == 0 {
                self.dma.can_begin = true;
            }
            return Ok(());
        }

        if cpu_cycle % 2 == 1 {
            let source = self.dma.source();
            self.dma.data = self.read(source);
            self.dma.addr = self.dma.addr.wrapping_add(1);
        } else {
            let data = self.dma.data;
            self.write(0x2004, data)?;
            if self.dma.addr == 0 {
                self.dma.in_progress = false;
                self.dma.can_begin = false;
            }
        }
        Ok(())
    }

}

impl Bus for CpuBus<'_> {
    fn read(&mut self, addr: u16) -> u8 {
        match addr {
            0..=cpu_mem::WRAM_END => self.wram[(addr & cpu_mem::WRAM_MIRROR_MASK) as usize],
            cpu_mem::PPU_REGISTER_START..=cpu_mem::PPU_REGISTER_END => {
                match addr & cpu_mem::PPU_REGISTER_SELECT_MASK {
                    0 => self.ppu.control_bits(),
                    1 => self.ppu.mask_bits(),
                    2 => self.ppu.read_status(),
                    3 => self.ppu.oam_addr(),
                    4 => self.ppu.read_oam_data(),
                    // Scroll and address registers have no read port.
                    5 | 6 => 0,
                    _ => {
                        let mut bus = GraphicsBus::new(self.cartridge, self.vram);
                        self.ppu.read_data(&mut bus)
                    }
                }
            }
            cpu_mem::APU_STATUS => self.apu.read_status(),
            cpu_mem::CONTROLLER_0 | cpu_mem::CONTROLLER_1 => {
                self.controllers.read((addr & 1) as usize)
            }
            // Write-only APU/IO registers and the disabled test region:
            // open bus, approximated as zero.
            cpu_mem::APU_REGISTER_START..=0x401F => 0,
            _ => self.cartridge.cpu_read(addr),
        }
    }

    fn peek(&self, addr: u16) -> u8 {
        match addr {
            0..=cpu_mem::WRAM_END => self.wram[(addr & cpu_mem::WRAM_MIRROR_MASK) as usize],
            cpu_mem::PPU_REGISTER_START..=cpu_mem::PPU_REGISTER_END => {
                match addr & cpu_mem::PPU_REGISTER_SELECT_MASK {
                    0 => self.ppu.control_bits(),
                    1 => self.ppu.mask_bits(),
                    2 => self.ppu.peek_status(),
                    3 => self.ppu.oam_addr(),
                    4 => self.ppu.read_oam_data(),
                    5 | 6 => 0,
                    _ => self.ppu.peek_data(),
                }
            }
            cpu_mem::APU_STATUS => self.apu.peek_status(),
            cpu_mem::CONTROLLER_0 | cpu_mem::CONTROLLER_1 => {
                self.controllers.peek((addr & 1) as usize)
            }
            cpu_mem::APU_REGISTER_START..=0x401F => 0,
            _ => self.cartridge.cpu_read(addr),
        }
    }

    fn write(&mut self, addr: u16, value: u8) -> Result<(), Error> {
        match addr {
            0..=cpu_mem::WRAM_END => {
                self.wram[(addr & cpu_mem::WRAM_MIRROR_MASK) as usize] = value;
            }
            cpu_mem::PPU_REGISTER_START..=cpu_mem::PPU_REGISTER_END => {
                match addr & cpu_mem::PPU_REGISTER_SELECT_MASK {
                    0 => self.ppu.write_control(value),
                    1 => self.ppu.write_mask(value),
                    // Status is read-only; stores to it are dropped.
                    2 => {}
                    3 => self.ppu.write_oam_addr(value),
                    4 => self.ppu.write_oam_data(value),
                    5 => self.ppu.write_scroll(value),
                    6 => self.ppu.write_addr(value),
                    _ => {
                        let mut bus = GraphicsBus::new(self.cartridge, self.vram);
                        self.ppu.write_data(&mut bus, value);
                    }
                }
            }
            cpu_mem::OAM_DMA => self.dma.begin(value),
            cpu_mem::CONTROLLER_0 => self.controllers.latch(),
            cpu_mem::APU_REGISTER_START..=cpu_mem::CONTROLLER_1 => {
                self.apu.write_register(addr, value);
            }
            cpu_mem::DISABLED_IO_START..=0x401F => {}
            _ => self.cartridge.cpu_write(addr, value)?,
        }
        Ok(())
    }
}
