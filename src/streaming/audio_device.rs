//! Audio device integration using rodio
//!
//! Plays ring-buffer samples on the default output device. The rodio
//! source reads in batches to keep lock traffic low and emits silence on
//! underrun so the stream never stalls.

use super::RingBuffer;
use crate::{Result, VgmError};
use rodio::{OutputStream, Sink, Source};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Batch size for ring buffer reads
const BATCH_SAMPLES: usize = 1024;

/// Audio source pulling from the shared ring buffer
struct RingBufferSource {
    ring_buffer: Arc<RingBuffer>,
    sample_rate: u32,
    finished: Arc<AtomicBool>,
    batch: Vec<i16>,
    batch_pos: usize,
    batch_len: usize,
}

impl RingBufferSource {
    fn new(ring_buffer: Arc<RingBuffer>, sample_rate: u32, finished: Arc<AtomicBool>) -> Self {
        RingBufferSource {
            ring_buffer,
            sample_rate,
            finished,
            batch: vec![0; BATCH_SAMPLES],
            batch_pos: 0,
            batch_len: 0,
        }
    }
}

impl Iterator for RingBufferSource {
    type Item = i16;

    fn next(&mut self) -> Option<i16> {
        if self.batch_pos >= self.batch_len {
            let got = self.ring_buffer.read(&mut self.batch);
            self.batch_pos = 0;
            if got > 0 {
                self.batch_len = got;
            } else if self.finished.load(Ordering::Relaxed) {
                // Producer is done and the buffer has drained
                return None;
            } else {
                // Underrun: emit a silent batch to keep the stream alive
                self.batch.fill(0);
                self.batch_len = self.batch.len();
            }
        }
        let sample = self.batch[self.batch_pos];
        self.batch_pos += 1;
        Some(sample)
    }
}

impl Source for RingBufferSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

/// Audio playback device
pub struct AudioDevice {
    _stream: OutputStream,
    sink: Sink,
    finished: Arc<AtomicBool>,
}

impl AudioDevice {
    /// Open the default output device and start consuming the ring buffer
    pub fn new(sample_rate: u32, ring_buffer: Arc<RingBuffer>) -> Result<Self> {
        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| VgmError::AudioDeviceError(format!("failed to open stream: {e}")))?;
        let sink = Sink::try_new(&stream_handle)
            .map_err(|e| VgmError::AudioDeviceError(format!("failed to create sink: {e}")))?;

        let finished = Arc::new(AtomicBool::new(false));
        let source = RingBufferSource::new(ring_buffer, sample_rate, Arc::clone(&finished));
        sink.append(source);

        Ok(AudioDevice {
            _stream: stream,
            sink,
            finished,
        })
    }

    /// Signal that no more samples will be produced; playback ends once
    /// the buffer drains.
    pub fn finish(&self) {
        self.finished.store(true, Ordering::Relaxed);
    }

    /// Block until the sink has played everything
    pub fn wait_until_done(&self) {
        self.sink.sleep_until_end();
    }

    /// Pause output
    pub fn pause(&self) {
        self.sink.pause();
    }

    /// Resume output
    pub fn resume(&self) {
        self.sink.play();
    }
}

impl Drop for AudioDevice {
    fn drop(&mut self) {
        self.sink.pause();
    }
}
