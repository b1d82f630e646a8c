//! NES APU (RP2A03) Emulator with VGM Playback
//!
//! A cycle-accurate emulator of the audio unit inside the Ricoh RP2A03 as
//! found in the NES/Famicom, driven by a VGM command-stream interpreter.
//! Supports playback of `.vgm` and gzip-compressed `.vgz` music logs.
//!
//! # Features
//! - Cycle-accurate emulation of both pulse channels, triangle and noise
//! - Envelope, sweep, length-counter and linear-counter units
//! - 4-step / 5-step frame sequencer with the 5-step immediate-clock quirk
//! - Nonlinear mixer reproducing the chip's summing-resistor network
//! - VGM 1.50+ header and GD3 metadata parsing
//! - Batched O(1) timer advancement (no per-cycle loops in the hot path)
//! - WAV export and optional real-time streaming playback
//!
//! # Crate feature flags
//! - `streaming` (opt-in): Real-time audio output (enables optional `rodio` dep)
//!
//! # Quick start
//! ## Core chip only
//! ```no_run
//! use rp2a03_vgm::apu::Apu;
//! let mut apu = Apu::new(rp2a03_vgm::apu::Region::Ntsc, 1_789_773, 44_100);
//! apu.write_register(0x00, 0xBF); // Pulse 1: duty 2, constant volume 15
//! apu.write_register(0x02, 0xFD); // Timer low
//! apu.write_register(0x03, 0x00); // Timer high + length load
//! apu.write_register(0x15, 0x01); // Enable pulse 1
//! let sample = apu.render_sample();
//! # let _ = sample;
//! ```
//!
//! ## Play a VGM file
//! ```no_run
//! use rp2a03_vgm::{load_file, LoopMode, VgmPlayer};
//! let reader = load_file("song.vgz").unwrap();
//! let mut player = VgmPlayer::new(reader, 44_100, LoopMode::Count(1)).unwrap();
//! let mut buffer = vec![0i16; 4096];
//! let written = player.get_samples(&mut buffer);
//! # let _ = written;
//! ```

#![warn(missing_docs)]

// Domain modules
pub mod apu; // NES APU (RP2A03) emulation (core)
pub mod fixed; // Fixed-point arithmetic helpers

pub mod export; // WAV rendering
pub mod loader; // VGM file I/O and decompression
pub mod player; // Playback engine
pub mod reader; // Byte-addressable file access
pub mod vgm; // VGM format parsing

#[cfg(feature = "streaming")]
pub mod streaming; // Audio output & streaming

/// Error types for VGM playback operations
#[derive(thiserror::Error, Debug)]
pub enum VgmError {
    /// IO error from filesystem or device
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A read returned fewer bytes than the format requires
    #[error("Truncated stream: needed {needed} bytes at offset {offset}")]
    Truncated {
        /// Byte offset of the failed read
        offset: u64,
        /// Number of bytes the format required there
        needed: u32,
    },

    /// Header signature/version/size validation failure
    #[error("Malformed header: {0}")]
    BadHeader(String),

    /// Command stream contained an opcode outside the dispatch table
    #[error("Unknown command 0x{0:02X}")]
    UnknownOpcode(u8),

    /// Audio device error
    #[error("Audio device error: {0}")]
    AudioDeviceError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for VgmError {
    /// Converts a String into `VgmError::Other`.
    ///
    /// Convenience conversion for generic string errors. Prefer the specific
    /// variant constructors (`BadHeader`, `ConfigError`, ...) where the
    /// failure class is known.
    fn from(msg: String) -> Self {
        VgmError::Other(msg)
    }
}

impl From<&str> for VgmError {
    /// Converts a string slice into `VgmError::Other`.
    fn from(msg: &str) -> Self {
        VgmError::Other(msg.to_string())
    }
}

/// Result type for VGM playback operations
pub type Result<T> = std::result::Result<T, VgmError>;

// Public API exports
pub use apu::{Apu, Region};
pub use loader::{load_bytes, load_file};
pub use player::{LoopMode, PlaybackState, VgmPlayer};
pub use reader::{CachedFileReader, FileReader, MemoryReader};
pub use vgm::{Gd3Tags, VgmFile};

#[cfg(feature = "streaming")]
pub use streaming::{AudioDevice, RingBuffer, StreamConfig};
