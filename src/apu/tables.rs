//! Constant tables for the APU channel models and mixer
//!
//! The small integer tables are hardware constants. The two mixer tables
//! model the chip's nonlinear summing-resistor network and are regenerated
//! from the closed-form formulas at first use rather than embedded as
//! hand-authored numbers, so they cannot drift from the reference curves.

use crate::fixed::{q29_from_f32, Q29};
use std::sync::LazyLock;

/// Length counter load values, indexed by the 5-bit register field
pub const LENGTH_TABLE: [u8; 32] = [
    10, 254, 20, 2, 40, 4, 80, 6, 160, 8, 60, 10, 14, 12, 26, 14, //
    12, 16, 24, 18, 48, 20, 96, 22, 192, 24, 72, 26, 16, 28, 32, 30,
];

/// Pulse duty waveforms: 4 duty settings x 8 sequencer steps
pub const DUTY_WAVEFORM: [[u8; 8]; 4] = [
    [0, 1, 0, 0, 0, 0, 0, 0], // 12.5%
    [0, 1, 1, 0, 0, 0, 0, 0], // 25%
    [0, 1, 1, 1, 1, 0, 0, 0], // 50%
    [1, 0, 0, 1, 1, 1, 1, 1], // 25% negated
];

/// Triangle output levels over the 32-step symmetric ramp
pub const TRIANGLE_SEQUENCE: [u8; 32] = [
    15, 14, 13, 12, 11, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 0, //
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15,
];

/// Noise timer periods in CPU cycles, NTSC clock, indexed by the 4-bit field
pub const NOISE_PERIOD_NTSC: [u16; 16] = [
    4, 8, 16, 32, 64, 96, 128, 160, 202, 254, 380, 508, 762, 1016, 2034, 4068,
];

/// Noise timer periods in CPU cycles, PAL clock
pub const NOISE_PERIOD_PAL: [u16; 16] = [
    4, 8, 14, 30, 60, 88, 118, 148, 188, 236, 354, 472, 708, 944, 1890, 3778,
];

/// Nonlinear pulse mixer: indexed by `pulse1 + pulse2` (0..=30)
///
/// `pulse_out = 95.52 / (8128.0 / n + 100.0)`, stored as Q29.
pub static MIXER_PULSE_TABLE: LazyLock<[Q29; 31]> = LazyLock::new(|| {
    let mut table = [0; 31];
    for (n, entry) in table.iter_mut().enumerate() {
        *entry = q29_from_f32(95.52 / (8128.0 / n as f32 + 100.0));
    }
    table
});

/// Nonlinear triangle/noise/DMC mixer: indexed by `3*t + 2*n + dmc` (0..=202)
///
/// `tnd_out = 163.67 / (24329.0 / n + 100.0)`, stored as Q29.
pub static MIXER_TND_TABLE: LazyLock<[Q29; 203]> = LazyLock::new(|| {
    let mut table = [0; 203];
    for (n, entry) in table.iter_mut().enumerate() {
        *entry = q29_from_f32(163.67 / (24329.0 / n as f32 + 100.0));
    }
    table
});
