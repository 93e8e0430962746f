//! Pulse channel: timer, duty sequencer, envelope, sweep, and length gate.

use super::envelope::Envelope;
use super::length_counter::LengthCounter;
use super::sequencer::PulseSequencer;
use super::sweep::Sweep;
use super::timer::Timer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) struct Pulse {
    timer: Timer,
    sequencer: PulseSequencer,
    envelope: Envelope,
    length: LengthCounter,
    sweep: Sweep,
}

impl Pulse {
    /// `subtract_extra` selects pulse 0's one's-complement sweep negation.
    pub(super) fn new(subtract_extra: bool) -> Self {
        Self {
            timer: Timer::default(),
            sequencer: PulseSequencer::default(),
            envelope: Envelope::default(),
            length: LengthCounter::default(),
            sweep: Sweep::new(subtract_extra),
        }
    }

    /// `$4000`/`$4004`: duty, length halt (doubles as envelope loop),
    /// constant volume, volume period.
    pub(super) fn write_control(&mut self, value: u8) {
        let halt = value & 0b0010_0000 != 0;
        self.sequencer.set_duty(value >> 6);
        self.length.set_halted(halt);
        self.envelope
            .configure(halt, value & 0b0001_0000 != 0, value & 0x0F);
    }

    /// `$4001`/`$4005`.
    pub(super) fn write_sweep(&mut self, value: u8) {
        self.sweep.configure(
            value & 0b1000_0000 != 0,
            (value >> 4) & 0b111,
            value & 0b0000_1000 != 0,
            value & 0b111,
        );
    }

    /// `$4002`/`$4006`.
    pub(super) fn write_timer_low(&mut self, value: u8) {
        self.timer.set_period_low(value);
    }

    /// `$4003`/`$4007`: length load + timer high bits; restarts the duty
    /// sequence and the envelope.
    pub(super) fn write_length_and_timer_high(&mut self, value: u8) {
        self.length.load(value >> 3);
        self.timer.set_period_high(value & 0b111);
        self.sequencer.restart();
        self.envelope.restart();
    }

    pub(super) fn set_enabled(&mut self, enabled: bool) {
        self.length.set_enabled(enabled);
    }

    pub(super) fn length_active(&self) -> bool {
        self.length.active()
    }

    /// Timer clock (every other CPU cycle).
    pub(super) fn clock_timer(&mut self) {
        if self.timer.clock() {
            self.sequencer.clock();
        }
    }

    pub(super) fn clock_quarter_frame(&mut self) {
        self.envelope.clock();
    }

    pub(super) fn clock_half_frame(&mut self) {
        self.length.clock();
        self.sweep.clock(&mut self.timer);
    }

    /// Current 4-bit output: envelope volume gated by sweep silence, length,
    /// and the duty sequence.
    pub(super) fn output(&self) -> u8 {
        if self.sweep.silences(&self.timer) || !self.length.active() || !self.sequencer.output() {
            return 0;
        }
        self.envelope.output()
    }
}
