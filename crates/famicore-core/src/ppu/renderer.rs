//! Cycle-accurate scanline rendering pipeline.
//!
//! The timing grid is 262 scanlines of 341 cycles. Scanlines 0..239 are
//! visible, 240 idles, 241..260 are vertical blank, and 261 is the pre-render
//! line that primes the shift registers for the next frame. Background tiles
//! stream through a four-step fetch cadence (nametable, attribute, pattern
//! low, pattern high) feeding 16-bit shift registers; sprites are evaluated
//! one scanline ahead into an eight-entry secondary list.
//! See <https://www.nesdev.org/wiki/PPU_rendering> and the NTSC frame timing
//! diagram it links.

use crate::bus::GraphicsBus;

use super::buffer::{Framebuffer, SCREEN_HEIGHT};
use super::palette::{SYSTEM_PALETTE, mirror_palette_index};
use super::registers::{Registers, StatusFlags};
use super::sprite::{ActiveSprite, ActiveSprites, OamEntry};

pub(crate) const CYCLES_PER_SCANLINE: u16 = 341;
pub(crate) const SCANLINES_PER_FRAME: u16 = 262;
const VBLANK_SCANLINE: u16 = 241;
const PRERENDER_SCANLINE: u16 = 261;

/// Everything the pipeline touches while stepping one dot, borrowed from the
/// PPU for the duration of the call.
pub(crate) struct RenderContext<'a, 'b> {
    pub bus: &'a mut GraphicsBus<'b>,
    pub registers: &'a mut Registers,
    pub oam: &'a [u8; 256],
    pub palette_ram: &'a [u8; 32],
    pub framebuffer: &'a mut Framebuffer,
}

/// Mutable pipeline state: scan position, background latches and shift
/// registers, and the per-scanline sprite set.
#[derive(Debug, Default, Clone)]
pub(crate) struct Renderer {
    scanline: u16,
    cycle: u16,
    frame: u64,

    // Background fetch latches, loaded over the eight-cycle tile cadence.
    tile_id: u8,
    tile_attribute: u8,
    tile_lsb: u8,
    tile_msb: u8,

    // Background shift registers; the mux taps bit `15 - fine_x`.
    pattern_shift_lo: u16,
    pattern_shift_hi: u16,
    attribute_shift_lo: u16,
    attribute_shift_hi: u16,

    active_sprites: ActiveSprites,
    sprite_shift_lo: [u8; 8],
    sprite_shift_hi: [u8; 8],
}

impl Renderer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn scanline(&self) -> u16 {
        self.scanline
    }

    pub(crate) fn cycle(&self) -> u16 {
        self.cycle
    }

    pub(crate) fn frame(&self) -> u64 {
        self.frame
    }

    /// Executes one PPU cycle. Returns `true` when this cycle entered the
    /// vertical blank period (scanline 241, cycle 1).
    pub(crate) fn step_cycle(&mut self, ctx: &mut RenderContext<'_, '_>) -> bool {
        let show_background = ctx.registers.mask.show_background();
        let show_sprites = ctx.registers.mask.show_sprites();
        let rendering = ctx.registers.mask.rendering_enabled();

        if self.scanline < SCREEN_HEIGHT as u16 || self.scanline == PRERENDER_SCANLINE {
            if self.scanline == 0 && self.cycle == 0 && rendering && self.frame & 1 == 1 {
                // Odd frames drop the idle dot at the top-left corner.
                self.cycle = 1;
            }

            if (2..256).contains(&self.cycle) || (321..338).contains(&self.cycle) {
                if show_background {
                    self.shift_background_registers();
                }
                match (self.cycle - 1) % 8 {
                    0 => {
                        self.reload_background_shifters();
                        self.tile_id = ctx.bus.read(ctx.registers.v.tile_address());
                    }
                    2 => self.fetch_tile_attribute(ctx),
                    4 => self.tile_lsb = ctx.bus.read(self.pattern_address(ctx, 0)),
                    6 => self.tile_msb = ctx.bus.read(self.pattern_address(ctx, 8)),
                    7 => {
                        if rendering {
                            ctx.registers.v.increment_coarse_x();
                        }
                    }
                    _ => {}
                }
            }

            if show_sprites && (2..=257).contains(&self.cycle) {
                self.update_active_sprites();
            }

            if self.cycle == 256 && rendering {
                ctx.registers.v.increment_fine_y();
            }

            if self.cycle == 257 {
                self.reload_background_shifters();
                if rendering {
                    let t = ctx.registers.t;
                    ctx.registers.v.copy_x_from(t);
                }
                self.evaluate_sprites_for_next_scanline(ctx);
            }

            if self.cycle == 338 || self.cycle == 340 {
                // Superfluous nametable reads at the end of the scanline.
                self.tile_id = ctx.bus.read(ctx.registers.v.tile_address());
            }

            if self.cycle == 340 {
                self.fetch_sprite_patterns(ctx);
            }

            if self.scanline == PRERENDER_SCANLINE && (280..305).contains(&self.cycle) && rendering
            {
                let t = ctx.registers.t;
                ctx.registers.v.copy_y_from(t);
            }
        }

        let mut entered_vblank = false;
        if self.cycle == 1 {
            if self.scanline == VBLANK_SCANLINE {
                ctx.registers.status.insert(StatusFlags::VBLANK);
                entered_vblank = true;
            } else if self.scanline == PRERENDER_SCANLINE {
                ctx.registers.status.remove(
                    StatusFlags::VBLANK | StatusFlags::SPRITE_ZERO_HIT | StatusFlags::SPRITE_OVERFLOW,
                );
            }
        }

        if self.scanline < SCREEN_HEIGHT as u16 && (1..=256).contains(&self.cycle) {
            self.compose_pixel(ctx, show_background, show_sprites);
        }

        self.cycle += 1;
        if self.cycle == CYCLES_PER_SCANLINE {
            self.cycle = 0;
            self.scanline += 1;
            if self.scanline == SCANLINES_PER_FRAME {
                self.scanline = 0;
                self.frame += 1;
            }
        }

        entered_vblank
    }

    // -----------------------------------------------------------------
    // Background pipeline
    // -----------------------------------------------------------------

    fn shift_background_registers(&mut self) {
        self.pattern_shift_lo <<= 1;
        self.pattern_shift_hi <<= 1;
        self.attribute_shift_lo <<= 1;
        self.attribute_shift_hi <<= 1;
    }

    /// Loads the latched tile bytes into the low halves of the shift
    /// registers; the two attribute bits are expanded to full bytes.
    fn reload_background_shifters(&mut self) {
        self.pattern_shift_lo = (self.pattern_shift_lo & 0xFF00) | self.tile_lsb as u16;
        self.pattern_shift_hi = (self.pattern_shift_hi & 0xFF00) | self.tile_msb as u16;
        let attr_lo = if self.tile_attribute & 0b01 != 0 { 0xFF } else { 0x00 };
        let attr_hi = if self.tile_attribute & 0b10 != 0 { 0xFF } else { 0x00 };
        self.attribute_shift_lo = (self.attribute_shift_lo & 0xFF00) | attr_lo;
        self.attribute_shift_hi = (self.attribute_shift_hi & 0xFF00) | attr_hi;
    }

    /// Reads the attribute byte and selects the 2-bit quadrant for the tile
    /// under `v`. See <https://www.nesdev.org/wiki/PPU_attribute_tables>.
    fn fetch_tile_attribute(&mut self, ctx: &mut RenderContext<'_, '_>) {
        let v = ctx.registers.v;
        let mut attribute = ctx.bus.read(v.attribute_address());
        if v.coarse_y() & 0b10 != 0 {
            attribute >>= 4;
        }
        if v.coarse_x() & 0b10 != 0 {
            attribute >>= 2;
        }
        self.tile_attribute = attribute & 0b11;
    }

    fn pattern_address(&self, ctx: &RenderContext<'_, '_>, plane: u16) -> u16 {
        ctx.registers.control.background_pattern_table()
            + ((self.tile_id as u16) << 4)
            + ctx.registers.v.fine_y() as u16
            + plane
    }

    /// Samples the background (palette, pixel) pair through the fine-x mux.
    fn background_pixel(&self, show_background: bool, fine_x: u8) -> (u8, u8) {
        if !show_background {
            return (0, 0);
        }
        let mux = 0x8000u16 >> fine_x;
        let pixel_lo = (self.pattern_shift_lo & mux != 0) as u8;
        let pixel_hi = (self.pattern_shift_hi & mux != 0) as u8;
        let palette_lo = (self.attribute_shift_lo & mux != 0) as u8;
        let palette_hi = (self.attribute_shift_hi & mux != 0) as u8;
        (palette_hi << 1 | palette_lo, pixel_hi << 1 | pixel_lo)
    }

    // -----------------------------------------------------------------
    // Sprite pipeline
    // -----------------------------------------------------------------

    /// Counts down sprite x positions; once a sprite's left edge is reached
    /// its pattern registers start shifting out pixels.
    fn update_active_sprites(&mut self) {
        for i in 0..self.active_sprites.len() {
            let sprite = self.active_sprites.get_mut(i);
            if sprite.x_countdown != 0 {
                sprite.x_countdown -= 1;
            } else {
                self.sprite_shift_lo[i] <<= 1;
                self.sprite_shift_hi[i] <<= 1;
            }
        }
    }

    /// Scans OAM at cycle 257 for sprites intersecting the next scanline,
    /// keeping the first eight and flagging overflow on the ninth.
    fn evaluate_sprites_for_next_scanline(&mut self, ctx: &mut RenderContext<'_, '_>) {
        let sprite_height: i16 = if ctx.registers.control.use_8x16_sprites() {
            16
        } else {
            8
        };

        self.active_sprites.clear();
        self.sprite_shift_lo.fill(0);
        self.sprite_shift_hi.fill(0);

        // The pre-render line evaluates as line -1, matching the hardware's
        // one-line sprite delay.
        let eval_line: i16 = if self.scanline == PRERENDER_SCANLINE {
            -1
        } else {
            self.scanline as i16
        };

        for index in 0..64u8 {
            let entry = self.oam_entry(ctx.oam, index);
            let diff = eval_line - entry.y as i16;
            if (0..sprite_height).contains(&diff) {
                if self.active_sprites.is_full() {
                    ctx.registers.status.insert(StatusFlags::SPRITE_OVERFLOW);
                    break;
                }
                self.active_sprites.push(ActiveSprite {
                    oam_index: index,
                    x_countdown: entry.x,
                });
            }
        }
    }

    /// At cycle 340, reads the pattern row for each selected sprite into its
    /// pair of shift registers, applying the flip attributes.
    fn fetch_sprite_patterns(&mut self, ctx: &mut RenderContext<'_, '_>) {
        for i in 0..self.active_sprites.len() {
            let entry = self.oam_entry(ctx.oam, self.active_sprites.get(i).oam_index);
            let row = (self.scanline as i16 - entry.y as i16) as u16;
            let addr = self.sprite_row_address(ctx, entry, row);

            let mut lo = ctx.bus.read(addr);
            let mut hi = ctx.bus.read(addr + 8);
            if entry.flip_horizontally() {
                lo = lo.reverse_bits();
                hi = hi.reverse_bits();
            }
            self.sprite_shift_lo[i] = lo;
            self.sprite_shift_hi[i] = hi;
        }
    }

    /// Address of the byte holding `row` of the sprite's low bit plane.
    ///
    /// 8x16 sprites take the pattern table from tile bit 0 and split into a
    /// top and bottom tile; vertical flip swaps both the row within a tile
    /// and which tile of the pair is used.
    fn sprite_row_address(
        &self,
        ctx: &RenderContext<'_, '_>,
        entry: OamEntry,
        row: u16,
    ) -> u16 {
        let tall = ctx.registers.control.use_8x16_sprites();
        let pattern_table = if tall {
            entry.tall_sprite_pattern_table()
        } else {
            ctx.registers.control.sprite_pattern_table()
        };

        let mut tile_row = row % 8;
        if entry.flip_vertically() {
            tile_row = 7 - tile_row;
        }

        let mut tile_id = if tall {
            entry.tall_sprite_tile_id()
        } else {
            entry.tile_id
        };
        if tall && ((row < 8 && entry.flip_vertically()) || (row >= 8 && !entry.flip_vertically()))
        {
            tile_id += 1;
        }

        pattern_table + 16 * tile_id as u16 + tile_row
    }

    /// Picks the first active sprite with an opaque pixel under the current
    /// dot. Returns (oam index, front priority, palette, pixel).
    fn foreground_pixel(&self, ctx: &RenderContext<'_, '_>, show_sprites: bool) -> (u8, bool, u8, u8) {
        if !show_sprites {
            return (64, false, 0, 0);
        }
        for i in 0..self.active_sprites.len() {
            let sprite = self.active_sprites.get(i);
            if sprite.x_countdown != 0 {
                continue;
            }
            let pixel_lo = (self.sprite_shift_lo[i] & 0x80 != 0) as u8;
            let pixel_hi = (self.sprite_shift_hi[i] & 0x80 != 0) as u8;
            let pixel = pixel_hi << 1 | pixel_lo;
            if pixel != 0 {
                let entry = self.oam_entry(ctx.oam, sprite.oam_index);
                return (
                    sprite.oam_index,
                    entry.prioritize_foreground(),
                    entry.palette_id(),
                    pixel,
                );
            }
        }
        (64, false, 0, 0)
    }

    fn oam_entry(&self, oam: &[u8; 256], index: u8) -> OamEntry {
        let offset = index as usize * 4;
        OamEntry::from_bytes(&oam[offset..offset + 4])
    }

    // -----------------------------------------------------------------
    // Composition
    // -----------------------------------------------------------------

    fn compose_pixel(
        &mut self,
        ctx: &mut RenderContext<'_, '_>,
        show_background: bool,
        show_sprites: bool,
    ) {
        let fine_x = ctx.registers.fine_x;
        let (bg_palette, bg_pixel) = self.background_pixel(show_background, fine_x);
        let (sprite_index, front_priority, fg_palette, fg_pixel) =
            self.foreground_pixel(ctx, show_sprites);

        let (palette, pixel) = match (bg_pixel, fg_pixel) {
            (0, 0) => (0, 0),
            (0, _) => (fg_palette, fg_pixel),
            (_, 0) => (bg_palette, bg_pixel),
            _ => {
                if front_priority {
                    (fg_palette, fg_pixel)
                } else {
                    (bg_palette, bg_pixel)
                }
            }
        };

        if sprite_index == 0
            && bg_pixel != 0
            && fg_pixel != 0
            && show_background
            && show_sprites
            && self.zero_hit_window_contains(ctx, self.cycle)
        {
            ctx.registers.status.insert(StatusFlags::SPRITE_ZERO_HIT);
        }

        let palette_addr = 0x3F00 + 4 * palette as u16 + pixel as u16;
        let mut color_index = ctx.palette_ram[mirror_palette_index(palette_addr)] & 0x3F;
        if ctx.registers.mask.greyscale() {
            // Greyscale keeps only the luminance column of the palette.
            color_index &= 0x30;
        }
        let color = SYSTEM_PALETTE[color_index as usize];
        ctx.framebuffer
            .set_pixel(self.cycle as usize - 1, self.scanline as usize, color);
    }

    /// Sprite-zero hits cannot occur in the leftmost eight dots when the
    /// left-column switches are off, and never at dot 258 or beyond.
    fn zero_hit_window_contains(&self, ctx: &RenderContext<'_, '_>, cycle: u16) -> bool {
        if ctx.registers.mask.leftmost_columns_visible() {
            (1..258).contains(&cycle)
        } else {
            (9..258).contains(&cycle)
        }
    }
}
