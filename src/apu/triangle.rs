//! Triangle channel model
//!
//! 32-step ramp generator gated by both a length counter and a
//! quarter-frame clocked linear counter. Timer periods at the extremes
//! (`<= 1` or `>= 0x7FE`) would produce ultrasonic output; the sequencer
//! freezes there instead of resetting, which keeps the output level steady
//! and avoids an audible pop.

use super::divider::{count_down, count_up};
use super::tables::{LENGTH_TABLE, TRIANGLE_SEQUENCE};

/// Timer periods outside this range do not advance the sequencer
const ULTRASONIC_LOW: u16 = 2;
const ULTRASONIC_HIGH: u16 = 0x7FE;

/// Triangle channel state
#[derive(Debug, Clone)]
pub struct Triangle {
    // Linear counter
    linear_period: u8,
    linear_value: u8,
    linear_reload: bool,
    /// Halts the length counter and keeps the linear reload flag set
    control_flag: bool,

    // Timing
    timer_period: u16,
    timer_value: u32,
    /// Up-counting index into the 32-step ramp
    sequencer: u32,

    length_counter: u8,
    enabled: bool,
}

impl Triangle {
    /// Create a triangle channel
    pub fn new() -> Self {
        Triangle {
            linear_period: 0,
            linear_value: 0,
            linear_reload: false,
            control_flag: false,
            timer_period: 0,
            timer_value: 0,
            sequencer: 0,
            length_counter: 0,
            enabled: false,
        }
    }

    /// Linear counter register (`$4008`)
    pub fn write_control(&mut self, value: u8) {
        self.control_flag = value & 0x80 != 0;
        self.linear_period = value & 0x7F;
    }

    /// Timer low register (`$400A`)
    pub fn write_timer_lo(&mut self, value: u8) {
        self.set_timer_period((self.timer_period & 0x0700) | value as u16);
    }

    /// Timer high / length load register (`$400B`)
    pub fn write_timer_hi(&mut self, value: u8) {
        self.set_timer_period((self.timer_period & 0x00FF) | ((value as u16 & 0x07) << 8));
        if self.enabled {
            self.length_counter = LENGTH_TABLE[(value >> 3) as usize];
        }
        self.linear_reload = true;
    }

    fn set_timer_period(&mut self, period: u16) {
        self.timer_period = period & 0x07FF;
        let effective = self.timer_period as u32 + 1;
        if self.timer_value >= effective {
            self.timer_value %= effective;
        }
    }

    /// Status register enable bit
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.length_counter = 0;
        }
    }

    /// Length counter value (status readback / tests)
    #[inline]
    pub fn length(&self) -> u8 {
        self.length_counter
    }

    /// Quarter-frame pulse: linear counter
    pub fn clock_quarter(&mut self) {
        if self.linear_reload {
            self.linear_value = self.linear_period;
        } else if self.linear_value > 0 {
            self.linear_value -= 1;
        }
        if !self.control_flag {
            self.linear_reload = false;
        }
    }

    /// Half-frame pulse: length counter
    pub fn clock_half(&mut self) {
        if self.length_counter > 0 && !self.control_flag {
            self.length_counter -= 1;
        }
    }

    /// Advance the channel timer by `cycles` chip cycles
    ///
    /// The sequencer only moves while both gating counters are live, and
    /// never in the ultrasonic period range.
    pub fn advance(&mut self, cycles: u32) {
        if !(ULTRASONIC_LOW..ULTRASONIC_HIGH).contains(&self.timer_period) {
            return;
        }
        if self.length_counter == 0 || self.linear_value == 0 {
            return;
        }
        let wraps = count_down(&mut self.timer_value, self.timer_period as u32 + 1, cycles);
        count_up(&mut self.sequencer, 32, wraps);
    }

    /// Current output level (0..=15)
    pub fn output(&self) -> u8 {
        if !self.enabled || self.length_counter == 0 || self.linear_value == 0 {
            return 0;
        }
        TRIANGLE_SEQUENCE[self.sequencer as usize]
    }
}

impl Default for Triangle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_triangle(period: u16) -> Triangle {
        let mut t = Triangle::new();
        t.set_enabled(true);
        t.write_control(0x20); // linear period 32
        t.write_timer_lo(period as u8);
        t.write_timer_hi(0x08 | ((period >> 8) & 0x07) as u8); // length index 1
        t.clock_quarter(); // load linear counter
        t
    }

    #[test]
    fn test_linear_counter_reload_and_decay() {
        let mut t = Triangle::new();
        t.write_control(0x03);
        t.write_timer_hi(0x00); // sets reload flag
        t.clock_quarter();
        assert_eq!(t.linear_value, 3);
        t.clock_quarter();
        assert_eq!(t.linear_value, 2);
    }

    #[test]
    fn test_control_flag_keeps_reload_armed() {
        let mut t = Triangle::new();
        t.write_control(0x85); // control set, linear period 5
        t.write_timer_hi(0x00);
        t.clock_quarter();
        t.clock_quarter();
        // Reload flag stays set while control is high, so the counter
        // reloads instead of decrementing
        assert_eq!(t.linear_value, 5);
    }

    #[test]
    fn test_sequencer_advances_when_gated_open() {
        let mut t = ready_triangle(0x80);
        assert_eq!(t.output(), 15);
        t.advance(0x81); // one timer wrap
        assert_eq!(t.output(), 14);
    }

    #[test]
    fn test_ultrasonic_period_freezes_sequencer() {
        let mut t = ready_triangle(0x80);
        t.advance(0x81 * 3);
        let before = t.output();

        t.write_timer_lo(0x01);
        t.write_timer_hi(0x08); // period 1: ultrasonic
        t.clock_quarter();
        t.advance(10_000);
        assert_eq!(t.output(), before, "sequencer must freeze, not reset");
    }

    #[test]
    fn test_silent_when_linear_counter_expires() {
        let mut t = ready_triangle(0x80);
        t.write_control(0x00); // linear period 0, control clear
        t.write_timer_hi(0x08 | 0x00);
        t.clock_quarter(); // reload with 0
        assert_eq!(t.output(), 0);
    }

    #[test]
    fn test_length_counter_halted_by_control_flag() {
        let mut t = ready_triangle(0x80);
        let len = t.length();
        t.write_control(0x85); // control/halt set
        t.clock_half();
        assert_eq!(t.length(), len);

        t.write_control(0x05);
        t.clock_half();
        assert_eq!(t.length(), len - 1);
    }
}
