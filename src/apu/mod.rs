//! NES APU (RP2A03) emulation
//!
//! Cycle-accurate model of the four analog sound generators: two pulse
//! channels, triangle and noise, paced by a shared frame sequencer and
//! combined through the chip's nonlinear mixer. The DMC channel is not
//! modeled; its mixer input is held at zero.
//!
//! Registers are addressed by their offset from `$4000`, matching the
//! address byte carried in VGM command streams. Timers advance in batched
//! bursts (see [`divider`]) rather than one cycle at a time.

pub mod divider;
pub mod envelope;
pub mod frame_counter;
pub mod noise;
pub mod pulse;
pub mod tables;
pub mod triangle;

pub use frame_counter::{FrameCounter, FrameEvents, SequencerMode};
pub use noise::Noise;
pub use pulse::Pulse;
pub use triangle::Triangle;

use crate::fixed::{q29_to_i16, Fp16};
use tables::{MIXER_PULSE_TABLE, MIXER_TND_TABLE};

/// Video region; selects the noise period table and is derived from the
/// VGM playback-rate hint (50 Hz means PAL).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Region {
    /// NTSC timing (default)
    #[default]
    Ntsc,
    /// PAL timing
    Pal,
}

bitflags::bitflags! {
    /// Channel enable bits of the status register (`$4015`)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ChannelMask: u8 {
        /// Pulse channel 1
        const PULSE1 = 0x01;
        /// Pulse channel 2
        const PULSE2 = 0x02;
        /// Triangle channel
        const TRIANGLE = 0x04;
        /// Noise channel
        const NOISE = 0x08;
        /// DMC channel (accepted but not emulated)
        const DMC = 0x10;
    }
}

/// NES APU sound generator model
#[derive(Debug, Clone)]
pub struct Apu {
    clock_rate: u32,
    sample_rate: u32,

    pulse1: Pulse,
    pulse2: Pulse,
    triangle: Triangle,
    noise: Noise,
    frame_counter: FrameCounter,

    /// Chip cycles per output sample, 16.16
    cycles_per_sample: Fp16,
    /// Fractional cycles carried between output samples
    cycle_accumulator: Fp16,

    last_sample: i16,
}

impl Apu {
    /// Create an APU for the given region, chip clock and output rate
    pub fn new(region: Region, clock_rate: u32, sample_rate: u32) -> Self {
        Apu {
            clock_rate,
            sample_rate,
            pulse1: Pulse::new(false),
            pulse2: Pulse::new(true),
            triangle: Triangle::new(),
            noise: Noise::new(region),
            frame_counter: FrameCounter::new(clock_rate),
            cycles_per_sample: Fp16::from_ratio(clock_rate, sample_rate),
            cycle_accumulator: Fp16::ZERO,
            last_sample: 0,
        }
    }

    /// Chip clock rate in Hz
    #[inline]
    pub fn clock_rate(&self) -> u32 {
        self.clock_rate
    }

    /// Output sample rate in Hz
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Write a register, addressed by its offset from `$4000`
    pub fn write_register(&mut self, reg: u8, value: u8) {
        match reg {
            0x00 => self.pulse1.write_control(value),
            0x01 => self.pulse1.write_sweep(value),
            0x02 => self.pulse1.write_timer_lo(value),
            0x03 => self.pulse1.write_timer_hi(value),

            0x04 => self.pulse2.write_control(value),
            0x05 => self.pulse2.write_sweep(value),
            0x06 => self.pulse2.write_timer_lo(value),
            0x07 => self.pulse2.write_timer_hi(value),

            0x08 => self.triangle.write_control(value),
            0x0A => self.triangle.write_timer_lo(value),
            0x0B => self.triangle.write_timer_hi(value),

            0x0C => self.noise.write_control(value),
            0x0E => self.noise.write_period(value),
            0x0F => self.noise.write_length(value),

            0x15 => self.write_status(value),
            0x17 => self.frame_counter.write_control(value),

            // $4009/$400D are unused, $4010..$4013 are DMC
            _ => {}
        }
    }

    /// Status register write: per-channel enable bits. Clearing a bit
    /// zeroes that channel's length counter at once.
    fn write_status(&mut self, value: u8) {
        let mask = ChannelMask::from_bits_truncate(value);
        self.pulse1.set_enabled(mask.contains(ChannelMask::PULSE1));
        self.pulse2.set_enabled(mask.contains(ChannelMask::PULSE2));
        self.triangle.set_enabled(mask.contains(ChannelMask::TRIANGLE));
        self.noise.set_enabled(mask.contains(ChannelMask::NOISE));
    }

    /// Channels whose length counters are currently live (status readback)
    pub fn status(&self) -> ChannelMask {
        let mut mask = ChannelMask::empty();
        if self.pulse1.length() > 0 {
            mask |= ChannelMask::PULSE1;
        }
        if self.pulse2.length() > 0 {
            mask |= ChannelMask::PULSE2;
        }
        if self.triangle.length() > 0 {
            mask |= ChannelMask::TRIANGLE;
        }
        if self.noise.length() > 0 {
            mask |= ChannelMask::NOISE;
        }
        mask
    }

    /// Advance the chip by `cycles` and synthesize one sample
    ///
    /// Frame-sequencer pulses are distributed to every channel before the
    /// channel timers advance; the mixed output is converted from Q29 to a
    /// saturated signed 16-bit sample. The previous return value remains
    /// available through [`Apu::last_output`] until this call replaces it,
    /// so callers feeding a band-limited resampler can form deltas.
    pub fn step_cycles(&mut self, cycles: u32) -> i16 {
        let events = self.frame_counter.advance(cycles);
        if events.quarter {
            self.pulse1.clock_quarter();
            self.pulse2.clock_quarter();
            self.triangle.clock_quarter();
            self.noise.clock_quarter();
        }
        if events.half {
            self.pulse1.clock_half();
            self.pulse2.clock_half();
            self.triangle.clock_half();
            self.noise.clock_half();
        }

        self.pulse1.advance(cycles);
        self.pulse2.advance(cycles);
        self.triangle.advance(cycles);
        self.noise.advance(cycles);

        let pulse_sum = (self.pulse1.output() + self.pulse2.output()) as usize;
        let tnd_sum = (3 * self.triangle.output() + 2 * self.noise.output()) as usize;
        let mix = MIXER_PULSE_TABLE[pulse_sum] + MIXER_TND_TABLE[tnd_sum];

        let sample = q29_to_i16(mix);
        self.last_sample = sample;
        sample
    }

    /// Synthesize one sample at the output rate
    ///
    /// Accumulates the fractional clock ratio so long runs stay locked to
    /// `clock_rate / sample_rate` without floating point.
    pub fn render_sample(&mut self) -> i16 {
        self.cycle_accumulator += self.cycles_per_sample;
        let cycles = self.cycle_accumulator.to_int();
        self.cycle_accumulator -= Fp16::from_int(cycles);
        self.step_cycles(cycles as u32)
    }

    /// Fill a buffer with output-rate samples
    pub fn render_into(&mut self, out: &mut [i16]) {
        for sample in out.iter_mut() {
            *sample = self.render_sample();
        }
    }

    /// Most recently synthesized sample
    #[inline]
    pub fn last_output(&self) -> i16 {
        self.last_sample
    }
}
