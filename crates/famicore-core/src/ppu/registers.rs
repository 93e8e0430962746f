//! CPU-visible PPU register file.

use bitflags::bitflags;

use super::vram_addr::VramAddr;

bitflags! {
    /// PPU control register (`$2000`).
    ///
    /// Bit layout:
    /// ```text
    /// 7 6 5 4 3 2 1 0
    /// N M S B s I n n
    /// ```
    /// - `n n`: base nametable select
    /// - `I`: VRAM increment (0=+1, 1=+32)
    /// - `s`: sprite pattern table (8x8 sprites)
    /// - `B`: background pattern table
    /// - `S`: sprite size (0=8x8, 1=8x16)
    /// - `M`: master/slave select
    /// - `N`: generate NMI at VBlank start
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub(crate) struct Control: u8 {
        const NAMETABLE_X      = 0b0000_0001;
        const NAMETABLE_Y      = 0b0000_0010;
        const INCREMENT_32     = 0b0000_0100;
        const SPRITE_TABLE     = 0b0000_1000;
        const BACKGROUND_TABLE = 0b0001_0000;
        const SPRITE_SIZE_16   = 0b0010_0000;
        const MASTER_SLAVE     = 0b0100_0000;
        const GENERATE_NMI     = 0b1000_0000;
    }
}

impl Control {
    /// Returns the VRAM increment amount (1 or 32) applied after `$2007`.
    pub(crate) fn vram_increment(self) -> u16 {
        if self.contains(Control::INCREMENT_32) {
            32
        } else {
            1
        }
    }

    /// Background pattern table base (`$0000` or `$1000`).
    pub(crate) fn background_pattern_table(self) -> u16 {
        if self.contains(Control::BACKGROUND_TABLE) {
            0x1000
        } else {
            0x0000
        }
    }

    /// Sprite pattern table base for 8x8 sprites.
    pub(crate) fn sprite_pattern_table(self) -> u16 {
        if self.contains(Control::SPRITE_TABLE) {
            0x1000
        } else {
            0x0000
        }
    }

    pub(crate) fn use_8x16_sprites(self) -> bool {
        self.contains(Control::SPRITE_SIZE_16)
    }

    pub(crate) fn nmi_enabled(self) -> bool {
        self.contains(Control::GENERATE_NMI)
    }
}

bitflags! {
    /// PPU mask register (`$2001`).
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub(crate) struct Mask: u8 {
        const GREYSCALE            = 0b0000_0001;
        const SHOW_BACKGROUND_LEFT = 0b0000_0010;
        const SHOW_SPRITES_LEFT    = 0b0000_0100;
        const SHOW_BACKGROUND      = 0b0000_1000;
        const SHOW_SPRITES         = 0b0001_0000;
        const EMPHASIZE_RED        = 0b0010_0000;
        const EMPHASIZE_GREEN      = 0b0100_0000;
        const EMPHASIZE_BLUE       = 0b1000_0000;
    }
}

impl Mask {
    pub(crate) fn greyscale(self) -> bool {
        self.contains(Mask::GREYSCALE)
    }

    pub(crate) fn show_background(self) -> bool {
        self.contains(Mask::SHOW_BACKGROUND)
    }

    pub(crate) fn show_sprites(self) -> bool {
        self.contains(Mask::SHOW_SPRITES)
    }

    /// Rendering is "enabled" when either layer is visible; this gates the
    /// scroll-register updates and the odd-frame cycle skip.
    pub(crate) fn rendering_enabled(self) -> bool {
        self.show_background() || self.show_sprites()
    }

    /// Sprite-zero hits are impossible in cycles 1..=8 when either leftmost
    /// switch is off.
    pub(crate) fn leftmost_columns_visible(self) -> bool {
        self.contains(Mask::SHOW_BACKGROUND_LEFT) || self.contains(Mask::SHOW_SPRITES_LEFT)
    }
}

bitflags! {
    /// PPU status register (`$2002`), upper three bits only; the low five
    /// read back stale data-bus contents.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub(crate) struct StatusFlags: u8 {
        const SPRITE_OVERFLOW = 0b0010_0000;
        const SPRITE_ZERO_HIT = 0b0100_0000;
        const VBLANK          = 0b1000_0000;
    }
}

/// The PPU register file shared between the CPU-visible interface and the
/// rendering pipeline.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Registers {
    pub control: Control,
    pub mask: Mask,
    pub status: StatusFlags,
    pub oam_addr: u8,
    /// `$2007` read buffer; reads below the palette are delayed one access.
    pub data_buffer: u8,
    /// The shared `$2005`/`$2006` write toggle (`w`).
    pub write_latch: bool,
    /// Current VRAM address (`v`).
    pub v: VramAddr,
    /// Temporary VRAM address (`t`).
    pub t: VramAddr,
    /// Fine X scroll (`x`, 3 bits).
    pub fine_x: u8,
}
