//! Triangle channel: timer, linear counter, length counter, 32-step ramp.

use super::length_counter::LengthCounter;
use super::linear_counter::LinearCounter;
use super::sequencer::TriangleSequencer;
use super::timer::Timer;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) struct Triangle {
    timer: Timer,
    linear: LinearCounter,
    length: LengthCounter,
    sequencer: TriangleSequencer,
}

impl Triangle {
    /// `$4008`: linear counter setup; the control flag also halts the length
    /// counter.
    pub(super) fn write_linear(&mut self, value: u8) {
        let control = value & 0b1000_0000 != 0;
        self.linear.configure(control, value & 0x7F);
        self.length.set_halted(control);
    }

    /// `$400A`.
    pub(super) fn write_timer_low(&mut self, value: u8) {
        self.timer.set_period_low(value);
    }

    /// `$400B`: length load + timer high bits; flags a linear counter reload.
    pub(super) fn write_length_and_timer_high(&mut self, value: u8) {
        self.length.load(value >> 3);
        self.timer.set_period_high(value & 0b111);
        self.linear.restart();
    }

    pub(super) fn set_enabled(&mut self, enabled: bool) {
        self.length.set_enabled(enabled);
    }

    pub(super) fn length_active(&self) -> bool {
        self.length.active()
    }

    /// Timer clock (every CPU cycle). The ramp only advances while both the
    /// linear and length counters are nonzero.
    pub(super) fn clock_timer(&mut self) {
        if self.timer.clock() && self.linear.active() && self.length.active() {
            self.sequencer.clock();
        }
    }

    pub(super) fn clock_quarter_frame(&mut self) {
        self.linear.clock();
    }

    pub(super) fn clock_half_frame(&mut self) {
        self.length.clock();
    }

    /// Silencing halts the ramp; it keeps emitting its last value rather
    /// than dropping to zero.
    pub(super) fn output(&self) -> u8 {
        self.sequencer.output()
    }
}
