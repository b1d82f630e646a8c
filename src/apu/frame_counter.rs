//! Frame sequencer
//!
//! Shared ~240 Hz divider that paces the envelope, sweep, length and linear
//! counter units. A control register write selects a 4-step or 5-step
//! pattern; quarter-frame pulses clock envelopes and the linear counter,
//! half-frame pulses clock length counters and sweeps.

use crate::fixed::Fp16;

/// Sequencer stepping pattern selected via the control register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SequencerMode {
    /// 4-step pattern (power-on default)
    #[default]
    FourStep,
    /// 5-step pattern
    FiveStep,
}

/// Pulses produced by one `advance` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameEvents {
    /// Envelope / linear-counter clock
    pub quarter: bool,
    /// Length-counter / sweep clock
    pub half: bool,
}

/// Frame sequencer state
#[derive(Debug, Clone)]
pub struct FrameCounter {
    mode: SequencerMode,
    /// Step most recently fired, 0 after a pattern wrap
    step: u8,
    /// Cycles accumulated toward the next step
    accumulator: Fp16,
    /// One step period: clock_rate / 240 cycles
    period: Fp16,
    /// 5-step mode write fires an immediate quarter+half on the next advance
    force_clock: bool,
}

impl FrameCounter {
    /// Create a sequencer for the given chip clock
    pub fn new(clock_rate: u32) -> Self {
        FrameCounter {
            mode: SequencerMode::default(),
            step: 0,
            accumulator: Fp16::ZERO,
            period: Fp16::from_ratio(clock_rate, 240),
            force_clock: false,
        }
    }

    /// Currently selected stepping pattern
    #[inline]
    pub fn mode(&self) -> SequencerMode {
        self.mode
    }

    /// Handle a control register write (`$4017` style)
    ///
    /// Resets the step and accumulator. Selecting 5-step mode additionally
    /// fires one immediate quarter+half pulse, consumed by the next
    /// `advance` call (hardware quirk).
    pub fn write_control(&mut self, value: u8) {
        self.mode = if value & 0x80 != 0 {
            SequencerMode::FiveStep
        } else {
            SequencerMode::FourStep
        };
        self.step = 0;
        self.accumulator = Fp16::ZERO;
        self.force_clock = self.mode == SequencerMode::FiveStep;
    }

    /// Advance by `cycles` chip cycles, reporting any frame pulses
    ///
    /// At most one sequencer step fires per call; callers advance in bursts
    /// far smaller than one step period (~7457 cycles NTSC).
    pub fn advance(&mut self, cycles: u32) -> FrameEvents {
        let mut events = FrameEvents::default();

        if self.force_clock {
            self.force_clock = false;
            events.quarter = true;
            events.half = true;
        }

        self.accumulator += Fp16::from_int(cycles as i32);
        if self.accumulator < self.period {
            return events;
        }
        self.accumulator -= self.period;
        self.step += 1;

        let (quarter, half, last) = match self.mode {
            SequencerMode::FourStep => match self.step {
                1 | 3 => (true, false, false),
                2 => (true, true, false),
                _ => (true, true, true),
            },
            SequencerMode::FiveStep => match self.step {
                1 | 3 => (true, false, false),
                2 => (true, true, false),
                4 => (false, false, false),
                _ => (true, true, true),
            },
        };
        if last {
            self.step = 0;
        }

        events.quarter |= quarter;
        events.half |= half;
        events
    }
}
