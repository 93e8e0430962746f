//! Fixed lookup tables shared by the APU channels.

/// Length counter load values, indexed by the 5-bit field of the channel's
/// fourth register. See <https://www.nesdev.org/wiki/APU_Length_Counter>.
#[rustfmt::skip]
pub(super) const LENGTH_TABLE: [u8; 32] = [
    10, 254, 20,  2, 40,  4, 80,  6, 160,  8, 60, 10, 14, 12, 26, 14,
    12,  16, 24, 18, 48, 20, 96, 22, 192, 24, 72, 26, 16, 28, 32, 30,
];

/// The four pulse duty sequences (12.5%, 25%, 50%, 25% negated).
/// See <https://www.nesdev.org/wiki/APU_Pulse#Sequencer_behavior>.
pub(super) const PULSE_DUTY_TABLE: [[u8; 8]; 4] = [
    [0, 1, 0, 0, 0, 0, 0, 0],
    [0, 1, 1, 0, 0, 0, 0, 0],
    [0, 1, 1, 1, 1, 0, 0, 0],
    [1, 0, 0, 1, 1, 1, 1, 1],
];

/// The 32-step triangle output ramp (15..0, 0..15).
/// See <https://www.nesdev.org/wiki/APU_Triangle>.
#[rustfmt::skip]
pub(super) const TRIANGLE_SEQUENCE: [u8; 32] = [
    15, 14, 13, 12, 11, 10,  9,  8,  7,  6,  5,  4,  3,  2,  1,  0,
     0,  1,  2,  3,  4,  5,  6,  7,  8,  9, 10, 11, 12, 13, 14, 15,
];

/// NTSC noise timer periods indexed by the low nibble of `$400E`.
#[rustfmt::skip]
pub(super) const NOISE_PERIOD_TABLE: [u16; 16] = [
    4, 8, 16, 32, 64, 96, 128, 160, 202, 254, 380, 508, 762, 1016, 2034, 4068,
];
