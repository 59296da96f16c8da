//! Circular sample window with an O(1) running mean.

use crate::{Error, Result};

/// Fixed-capacity ring of `f32` samples. Once full, each push evicts the
/// oldest element and the running sum is adjusted by `new - evicted`, so the
/// mean never needs a rescan. The adjustment is always done in the same
/// floating-point order, which keeps the sum consistent under continuous
/// overwrite.
#[derive(Clone, Debug)]
pub struct RingBuffer {
    buf: Vec<f32>,
    head: usize,
    count: usize,
    sum: f32,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidConfig("ring buffer capacity must be nonzero"));
        }
        Ok(RingBuffer {
            buf: vec![0.0; capacity],
            head: 0,
            count: 0,
            sum: 0.0,
        })
    }

    pub fn push(&mut self, x: f32) {
        if self.count < self.buf.len() {
            self.buf[self.head] = x;
            self.sum += x;
            self.count += 1;
        } else {
            // when full, head points at the oldest element
            let old = self.buf[self.head];
            self.buf[self.head] = x;
            self.sum += x - old;
        }
        self.head = (self.head + 1) % self.buf.len();
    }

    pub fn mean(&self) -> f32 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f32
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn clear(&mut self) {
        self.buf.fill(0.0);
        self.head = 0;
        self.count = 0;
        self.sum = 0.0;
    }

    /// Last `count` samples, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        let cap = self.buf.len();
        let start = (self.head + cap - self.count) % cap;
        (0..self.count).map(move |i| self.buf[(start + i) % cap])
    }
}
