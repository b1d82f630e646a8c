//! Ring buffer between the sample producer and the audio callback
//!
//! One producer thread writes synthesized samples, one consumer thread
//! (the audio device) reads them. Buffer storage sits behind a
//! `parking_lot` mutex; read/write positions are atomics so the fill level
//! is observable without taking the lock.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Ring buffer for streaming 16-bit samples
///
/// Capacity is rounded up to a power of two so position masking replaces
/// modulo. One slot is kept free to distinguish full from empty.
#[derive(Debug)]
pub struct RingBuffer {
    buffer: Mutex<Vec<i16>>,
    write_pos: AtomicUsize,
    read_pos: AtomicUsize,
    capacity: usize,
    mask: usize,
}

impl RingBuffer {
    /// Create a ring buffer with at least `requested_capacity` slots
    pub fn new(requested_capacity: usize) -> crate::Result<Self> {
        if requested_capacity == 0 {
            return Err(crate::VgmError::ConfigError(
                "ring buffer capacity must be greater than 0".into(),
            ));
        }
        let capacity = requested_capacity.next_power_of_two();
        Ok(RingBuffer {
            buffer: Mutex::new(vec![0; capacity]),
            write_pos: AtomicUsize::new(0),
            read_pos: AtomicUsize::new(0),
            capacity,
            mask: capacity - 1,
        })
    }

    /// Samples available to read without blocking
    pub fn available_read(&self) -> usize {
        let write = self.write_pos.load(Ordering::Acquire);
        let read = self.read_pos.load(Ordering::Acquire);
        write.wrapping_sub(read)
    }

    /// Free space available to write without overwriting
    pub fn available_write(&self) -> usize {
        self.capacity - self.available_read() - 1
    }

    /// Write samples (producer side), returning the count accepted
    pub fn write(&self, samples: &[i16]) -> usize {
        let mut buf = self.buffer.lock();
        let write_pos = self.write_pos.load(Ordering::Acquire);
        let read_pos = self.read_pos.load(Ordering::Acquire);
        let available = self.capacity - write_pos.wrapping_sub(read_pos) - 1;

        let to_write = samples.len().min(available);
        if to_write == 0 {
            return 0;
        }

        let idx = write_pos & self.mask;
        if idx + to_write <= self.capacity {
            buf[idx..idx + to_write].copy_from_slice(&samples[..to_write]);
        } else {
            let first = self.capacity - idx;
            buf[idx..].copy_from_slice(&samples[..first]);
            buf[..to_write - first].copy_from_slice(&samples[first..to_write]);
        }
        drop(buf);

        self.write_pos
            .store(write_pos.wrapping_add(to_write), Ordering::Release);
        to_write
    }

    /// Read samples (consumer side), returning the count delivered
    pub fn read(&self, dest: &mut [i16]) -> usize {
        let buf = self.buffer.lock();
        let write_pos = self.write_pos.load(Ordering::Acquire);
        let read_pos = self.read_pos.load(Ordering::Acquire);
        let available = write_pos.wrapping_sub(read_pos);

        let to_read = dest.len().min(available);
        if to_read == 0 {
            return 0;
        }

        let idx = read_pos & self.mask;
        if idx + to_read <= self.capacity {
            dest[..to_read].copy_from_slice(&buf[idx..idx + to_read]);
        } else {
            let first = self.capacity - idx;
            dest[..first].copy_from_slice(&buf[idx..]);
            dest[first..to_read].copy_from_slice(&buf[..to_read - first]);
        }
        drop(buf);

        self.read_pos
            .store(read_pos.wrapping_add(to_read), Ordering::Release);
        to_read
    }

    /// Fill level (0.0 to 1.0)
    pub fn fill_percentage(&self) -> f32 {
        self.available_read() as f32 / self.capacity as f32
    }
}
