//! Shared definitions for the NES memory map.
//!
//! Centralizing address-related constants keeps the hardware layout in one
//! location and prevents magic numbers from sneaking into the bus decoders.

/// CPU memory map details.
pub mod cpu {
    /// Work RAM size (2 KiB, mirrored through `$1FFF`).
    pub const WRAM_SIZE: usize = 0x0800;
    /// Mask for decoding WRAM mirrors (`addr & 0x07FF`).
    pub const WRAM_MIRROR_MASK: u16 = 0x07FF;
    /// Last address (inclusive) of the WRAM mirror window.
    pub const WRAM_END: u16 = 0x1FFF;

    /// First address of the hardware stack page.
    pub const STACK_PAGE: u16 = 0x0100;

    /// First CPU-visible PPU register mirror address.
    pub const PPU_REGISTER_START: u16 = 0x2000;
    /// Last CPU-visible PPU register mirror address (inclusive).
    pub const PPU_REGISTER_END: u16 = 0x3FFF;
    /// Mask for decoding PPU register mirrors (`addr & 0x0007`).
    pub const PPU_REGISTER_SELECT_MASK: u16 = 0x0007;

    /// First APU channel register.
    pub const APU_REGISTER_START: u16 = 0x4000;
    /// OAM DMA trigger register.
    pub const OAM_DMA: u16 = 0x4014;
    /// APU status/enable register.
    pub const APU_STATUS: u16 = 0x4015;
    /// Controller strobe (write) / port 0 serial read.
    pub const CONTROLLER_0: u16 = 0x4016;
    /// Frame counter (write) / port 1 serial read.
    pub const CONTROLLER_1: u16 = 0x4017;
    /// First address of the normally-disabled APU/IO test region.
    pub const DISABLED_IO_START: u16 = 0x4018;
    /// First address decoded to the cartridge.
    pub const CARTRIDGE_START: u16 = 0x4020;
    /// First address of PRG ROM in CPU space.
    pub const PRG_ROM_START: u16 = 0x8000;

    /// NMI vector (`$FFFA/$FFFB`).
    pub const NMI_VECTOR: u16 = 0xFFFA;
    /// Reset vector (`$FFFC/$FFFD`).
    pub const RESET_VECTOR: u16 = 0xFFFC;
    /// BRK/IRQ vector (`$FFFE/$FFFF`).
    pub const IRQ_VECTOR: u16 = 0xFFFE;
}

/// PPU address space details.
pub mod ppu {
    /// Pattern table window size (two 4 KiB tables).
    pub const PATTERN_TABLE_END: u16 = 0x1FFF;

    /// Base address of nametable 0.
    pub const NAMETABLE_BASE: u16 = 0x2000;
    /// Size of a single nametable in bytes.
    pub const NAMETABLE_SIZE: u16 = 0x0400;
    /// Physical VRAM backing two nametables.
    pub const VRAM_SIZE: usize = 0x0800;
    /// Last address (inclusive) routed to the nametable window.
    pub const NAMETABLE_END: u16 = 0x3EFF;

    /// Palette RAM base address.
    pub const PALETTE_BASE: u16 = 0x3F00;
    /// Palette RAM byte count (mirrored every 32 bytes).
    pub const PALETTE_RAM_SIZE: usize = 0x20;

    /// Mask applied to `v` before any memory access through `$2007`.
    pub const ADDR_MIRROR_MASK: u16 = 0x3FFF;

    /// Base address of the attribute table within a nametable.
    pub const ATTRIBUTE_BASE: u16 = 0x23C0;
}
