//! The fixed 2C02 system palette.
//!
//! Palette RAM stores 6-bit indices into this table; the RGB values are part
//! of the external interface and must match the reference byte-for-byte.
//! See <https://www.nesdev.org/wiki/PPU_palettes#2C02>.

use super::buffer::Rgb;

#[rustfmt::skip]
pub(crate) const SYSTEM_PALETTE: [Rgb; 64] = [
    Rgb::new( 84,  84,  84), Rgb::new(  0,  30, 116), Rgb::new(  8,  16, 144), Rgb::new( 48,   0, 136),
    Rgb::new( 68,   0, 100), Rgb::new( 92,   0,  48), Rgb::new( 84,   4,   0), Rgb::new( 60,  24,   0),
    Rgb::new( 32,  42,   0), Rgb::new(  8,  58,   0), Rgb::new(  0,  64,   0), Rgb::new(  0,  60,   0),
    Rgb::new(  0,  50,  60), Rgb::new(  0,   0,   0), Rgb::new(  0,   0,   0), Rgb::new(  0,   0,   0),
    Rgb::new(152, 150, 152), Rgb::new(  8,  76, 196), Rgb::new( 48,  50, 236), Rgb::new( 92,  30, 228),
    Rgb::new(136,  20, 176), Rgb::new(160,  20, 100), Rgb::new(152,  34,  32), Rgb::new(120,  60,   0),
    Rgb::new( 84,  90,   0), Rgb::new( 40, 114,   0), Rgb::new(  8, 124,   0), Rgb::new(  0, 118,  40),
    Rgb::new(  0, 102, 120), Rgb::new(  0,   0,   0), Rgb::new(  0,   0,   0), Rgb::new(  0,   0,   0),
    Rgb::new(236, 238, 236), Rgb::new( 76, 154, 236), Rgb::new(120, 124, 236), Rgb::new(176,  98, 236),
    Rgb::new(228,  84, 236), Rgb::new(236,  88, 180), Rgb::new(236, 106, 100), Rgb::new(212, 136,  32),
    Rgb::new(160, 170,   0), Rgb::new(116, 196,   0), Rgb::new( 76, 208,  32), Rgb::new( 56, 204, 108),
    Rgb::new( 56, 180, 204), Rgb::new( 60,  60,  60), Rgb::new(  0,   0,   0), Rgb::new(  0,   0,   0),
    Rgb::new(236, 238, 236), Rgb::new(168, 204, 236), Rgb::new(188, 188, 236), Rgb::new(212, 178, 236),
    Rgb::new(236, 174, 236), Rgb::new(236, 174, 212), Rgb::new(236, 180, 176), Rgb::new(228, 196, 144),
    Rgb::new(204, 210, 120), Rgb::new(180, 222, 120), Rgb::new(168, 226, 144), Rgb::new(152, 226, 180),
    Rgb::new(160, 214, 228), Rgb::new(160, 162, 160), Rgb::new(  0,   0,   0), Rgb::new(  0,   0,   0),
];

/// Folds the sprite palette's transparent entries onto the background set:
/// `$3F10/$3F14/$3F18/$3F1C` alias `$3F00/$3F04/$3F08/$3F0C`.
#[inline]
pub(crate) fn mirror_palette_index(addr: u16) -> usize {
    let index = (addr & 0x001F) as usize;
    match index {
        0x10 | 0x14 | 0x18 | 0x1C => index - 0x10,
        _ => index,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sprite_transparent_entries_alias_background() {
        assert_eq!(mirror_palette_index(0x3F10), 0x00);
        assert_eq!(mirror_palette_index(0x3F14), 0x04);
        assert_eq!(mirror_palette_index(0x3F18), 0x08);
        assert_eq!(mirror_palette_index(0x3F1C), 0x0C);
        assert_eq!(mirror_palette_index(0x3F11), 0x11);
        assert_eq!(mirror_palette_index(0x3F04), 0x04);
    }

    #[test]
    fn well_known_colors() {
        assert_eq!(SYSTEM_PALETTE[0x00], Rgb::new(84, 84, 84));
        assert_eq!(SYSTEM_PALETTE[0x30], Rgb::new(236, 238, 236));
        assert_eq!(SYSTEM_PALETTE[0x3F], Rgb::new(0, 0, 0));
    }
}
