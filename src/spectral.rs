//! Single-bin Goertzel power estimation.

use crate::{Error, Result};

/// Recursive power estimate at one target frequency, without a full
/// transform. Push exactly `block_len` samples, then read [`power`], which
/// resets the accumulator as a side effect (the estimate is only valid once
/// per block). [`power_checked`] enforces the full-block precondition.
///
/// [`power`]: Goertzel::power
/// [`power_checked`]: Goertzel::power_checked
pub struct Goertzel {
    coeff: f64,
    s1: f64,
    s2: f64,
    block_len: usize,
    pushed: usize,
}

impl Goertzel {
    pub fn new(sample_rate_hz: f64, target_hz: f64, block_len: usize) -> Result<Self> {
        if sample_rate_hz <= 0.0 {
            return Err(Error::InvalidConfig("goertzel sample rate must be positive"));
        }
        if block_len == 0 {
            return Err(Error::InvalidConfig("goertzel block length must be nonzero"));
        }
        let k = (block_len as f64 * target_hz / sample_rate_hz).round();
        let w = 2.0 * std::f64::consts::PI * k / block_len as f64;
        Ok(Goertzel {
            coeff: 2.0 * w.cos(),
            s1: 0.0,
            s2: 0.0,
            block_len,
            pushed: 0,
        })
    }

    pub fn push(&mut self, x: f64) {
        let s0 = x + self.coeff * self.s1 - self.s2;
        self.s2 = self.s1;
        self.s1 = s0;
        self.pushed += 1;
    }

    /// Bin power normalized by the block length. Destructive: the shift
    /// register and push counter are cleared, so a second call without
    /// intervening pushes returns 0. Reading before `block_len` pushes
    /// yields a lower-confidence partial-window estimate.
    pub fn power(&mut self) -> f64 {
        let p = self.s1 * self.s1 + self.s2 * self.s2 - self.coeff * self.s1 * self.s2;
        self.reset();
        p / self.block_len as f64
    }

    /// Like [`power`](Goertzel::power), but errors out (leaving the block
    /// untouched) unless exactly a full block has accumulated.
    pub fn power_checked(&mut self) -> Result<f64> {
        if self.pushed != self.block_len {
            return Err(Error::ShortBlock {
                pushed: self.pushed,
                expected: self.block_len,
            });
        }
        Ok(self.power())
    }

    pub fn reset(&mut self) {
        self.s1 = 0.0;
        self.s2 = 0.0;
        self.pushed = 0;
    }

    pub fn pushed(&self) -> usize {
        self.pushed
    }

    pub fn block_len(&self) -> usize {
        self.block_len
    }
}
