//! Pulse channel frequency sweep.

use super::timer::{Divider, Timer};

/// Half-frame sweep unit. Pulse 0 uses one's-complement negation (subtracts
/// one extra), pulse 1 two's-complement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) struct Sweep {
    divider: Divider,
    subtract_extra: bool,
    enabled: bool,
    negated: bool,
    shift: u8,
    reload: bool,
}

impl Sweep {
    pub(super) fn new(subtract_extra: bool) -> Self {
        Self {
            divider: Divider::default(),
            subtract_extra,
            enabled: false,
            negated: false,
            shift: 0,
            reload: true,
        }
    }

    /// `$4001`/`$4005` write.
    pub(super) fn configure(&mut self, enabled: bool, period: u8, negated: bool, shift: u8) {
        self.divider.set_period(period & 0b111);
        self.enabled = enabled;
        self.negated = negated;
        self.shift = shift & 0b111;
        self.reload = true;
    }

    /// Half-frame clock; may rewrite the timer period.
    pub(super) fn clock(&mut self, timer: &mut Timer) {
        if self.reload {
            if self.enabled && self.divider.clock() {
                self.adjust_timer_period(timer);
            }
            self.divider.reset();
            self.reload = false;
        } else if self.divider.counter() > 0 {
            self.divider.clock();
        } else if self.enabled && self.divider.clock() {
            self.adjust_timer_period(timer);
        }
    }

    /// The channel is forced silent when the current period is below 8 or the
    /// sweep target overflows 11 bits, even with the sweep disabled.
    pub(super) fn silences(&self, timer: &Timer) -> bool {
        timer.period() < 8 || self.target_period(timer) > 0x07FF
    }

    fn target_period(&self, timer: &Timer) -> u16 {
        let period = timer.period();
        let delta = period >> self.shift;
        if self.negated {
            let mut target = period.wrapping_sub(delta);
            if self.subtract_extra {
                target = target.wrapping_sub(1);
            }
            target
        } else {
            period + delta
        }
    }

    fn adjust_timer_period(&self, timer: &mut Timer) {
        if self.enabled && self.shift > 0 && !self.silences(timer) {
            let target = self.target_period(timer);
            timer.set_period(target);
        }
    }
}
