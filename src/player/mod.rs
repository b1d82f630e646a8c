//! Playback engine
//!
//! Couples the command-stream interpreter to the chip model. The engine is
//! pull-based and single-threaded: samples are produced only inside
//! [`VgmPlayer::get_samples`], which alternates between decoding commands
//! (register writes accumulate immediately, waits accumulate a pending
//! sample budget) and batch-rendering the budget through the APU.

use crate::apu::Apu;
use crate::reader::FileReader;
use crate::vgm::{decode_one, Command, VgmFile};
use crate::{Result, VgmError};

/// Loop handling at the end-of-data marker
///
/// The file's loop point only says where a loop would re-enter; how many
/// times to take it is a player decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMode {
    /// Ignore the loop point; play the stream once
    Off,
    /// Take the loop this many times, then stop
    Count(u32),
    /// Loop until the caller stops asking for samples
    Infinite,
}

impl Default for LoopMode {
    /// One extra pass over the looped section, matching common player
    /// behavior.
    fn default() -> Self {
        LoopMode::Count(1)
    }
}

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Stream exhausted (or aborted); `get_samples` returns 0
    #[default]
    Stopped,
    /// Samples available
    Playing,
}

/// VGM playback session
///
/// Owns the file reader, the parsed metadata and the chip model
/// exclusively; nothing here is shared between threads.
pub struct VgmPlayer {
    reader: Box<dyn FileReader>,
    file: VgmFile,
    apu: Apu,
    sample_rate: u32,

    /// Command-stream read position; monotonic except on loop
    data_pos: u64,
    /// Samples owed by executed wait commands, not yet synthesized
    samples_pending: u32,
    loop_mode: LoopMode,
    loops_remaining: u32,

    state: PlaybackState,
    fault: Option<VgmError>,
    samples_rendered: u64,
}

impl VgmPlayer {
    /// Parse the stream and set up a playback session
    ///
    /// Fails on malformed headers or unsupported chip sets; no partial
    /// session is ever returned.
    pub fn new(
        mut reader: Box<dyn FileReader>,
        sample_rate: u32,
        loop_mode: LoopMode,
    ) -> Result<Self> {
        if sample_rate == 0 {
            return Err(VgmError::ConfigError("sample rate must be > 0".into()));
        }
        let file = VgmFile::parse(reader.as_mut())?;
        let apu = Apu::new(file.region(), file.apu_clock(), sample_rate);
        let data_pos = file.data_offset();
        let loops_remaining = match loop_mode {
            LoopMode::Count(n) => n,
            _ => 0,
        };
        Ok(VgmPlayer {
            reader,
            file,
            apu,
            sample_rate,
            data_pos,
            samples_pending: 0,
            loop_mode,
            loops_remaining,
            state: PlaybackState::Playing,
            fault: None,
            samples_rendered: 0,
        })
    }

    /// Run the interpreter until samples are owed or the stream ends
    fn exec(&mut self) -> Result<()> {
        // A loop body without any wait command would spin forever; one
        // wait-free jump is tolerated, the second stops playback.
        let mut looped_without_wait = false;

        while self.samples_pending == 0 {
            match decode_one(self.reader.as_mut(), &mut self.data_pos)? {
                Command::ApuWrite { reg, value } => self.apu.write_register(reg, value),
                Command::Wait(n) => self.samples_pending += n as u32,
                Command::End => {
                    if let Some(loop_offset) = self.file.loop_offset() {
                        let take = match self.loop_mode {
                            LoopMode::Off => false,
                            LoopMode::Infinite => true,
                            LoopMode::Count(_) => {
                                if self.loops_remaining > 0 {
                                    self.loops_remaining -= 1;
                                    true
                                } else {
                                    false
                                }
                            }
                        };
                        if take && !looped_without_wait {
                            looped_without_wait = true;
                            self.data_pos = loop_offset;
                            continue;
                        }
                    }
                    self.state = PlaybackState::Stopped;
                    return Ok(());
                }
                Command::Eof => {
                    self.state = PlaybackState::Stopped;
                    return Ok(());
                }
                Command::DataBlockSkip { .. } | Command::Skipped => {}
            }
        }
        Ok(())
    }

    /// Fill `out` with samples, returning the count actually written
    ///
    /// Returns less than requested only at end of stream (or after a
    /// decode fault, see [`VgmPlayer::fault`]), and 0 from then on.
    pub fn get_samples(&mut self, out: &mut [i16]) -> usize {
        let mut written = 0;
        while written < out.len() && self.state == PlaybackState::Playing {
            if self.samples_pending == 0 {
                if let Err(e) = self.exec() {
                    self.fault = Some(e);
                    self.state = PlaybackState::Stopped;
                }
                continue;
            }
            let n = (out.len() - written).min(self.samples_pending as usize);
            self.apu.render_into(&mut out[written..written + n]);
            self.samples_pending -= n as u32;
            written += n;
        }
        self.samples_rendered += written as u64;
        written
    }

    /// Current playback state
    #[inline]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// True once the stream has ended or aborted
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.state == PlaybackState::Stopped
    }

    /// Decode error that aborted playback, if any
    pub fn fault(&self) -> Option<&VgmError> {
        self.fault.as_ref()
    }

    /// Parsed file header and metadata
    #[inline]
    pub fn info(&self) -> &VgmFile {
        &self.file
    }

    /// Read access to the chip model
    #[inline]
    pub fn apu(&self) -> &Apu {
        &self.apu
    }

    /// Direct access to the chip model for advanced use
    #[inline]
    pub fn apu_mut(&mut self) -> &mut Apu {
        &mut self.apu
    }

    /// Output sample rate in Hz
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Samples handed out so far
    #[inline]
    pub fn samples_rendered(&self) -> u64 {
        self.samples_rendered
    }

    /// Expected total sample count; `None` when looping forever
    ///
    /// The declared total covers one full pass including one loop pass;
    /// every additional loop adds `loop_samples`.
    pub fn duration_samples(&self) -> Option<u64> {
        let base = self.file.total_samples() as u64;
        match self.loop_mode {
            LoopMode::Off | LoopMode::Count(0) => Some(base),
            LoopMode::Count(n) => {
                Some(base + self.file.loop_samples() as u64 * n as u64)
            }
            LoopMode::Infinite => None,
        }
    }

    /// Expected duration in seconds; `None` when looping forever
    pub fn duration_seconds(&self) -> Option<f32> {
        self.duration_samples()
            .map(|s| s as f32 / self.sample_rate as f32)
    }

    /// Playback position as a fraction (0.0 to 1.0); 0.0 when unbounded
    pub fn playback_position(&self) -> f32 {
        match self.duration_samples() {
            Some(total) if total > 0 => {
                (self.samples_rendered as f32 / total as f32).clamp(0.0, 1.0)
            }
            _ => 0.0,
        }
    }
}
