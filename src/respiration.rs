//! Respiration-rate extraction from a chest-displacement proxy signal.
//!
//! A constant-bandwidth band-pass biquad isolates the breathing band, then
//! negative-to-positive zero crossings of the filtered output give the
//! breath period. Periods outside the physiological 6..120 breaths/min band
//! are treated as noise and the previous estimate is held.

use std::f64::consts::PI;

use crate::{Error, Result};

pub struct Respiration {
    // Direct Form I coefficients, fixed at construction
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
    last_sign: f64,
    last_cross_t: f64,
    last_t: f64,
    bpm: f64,
}

impl Respiration {
    /// Band-pass designed by the bilinear transform around the geometric
    /// mean of `[low_hz, high_hz]`.
    pub fn new(sample_rate_hz: f64, low_hz: f64, high_hz: f64) -> Result<Self> {
        if sample_rate_hz <= 0.0 {
            return Err(Error::InvalidConfig("respiration sample rate must be positive"));
        }
        if low_hz <= 0.0 || high_hz <= low_hz {
            return Err(Error::InvalidConfig("respiration passband must satisfy 0 < low < high"));
        }

        let w0 = 2.0 * PI * ((low_hz * high_hz).sqrt() / sample_rate_hz);
        let bw = 2.0 * PI * ((high_hz - low_hz) / sample_rate_hz);
        let alpha = w0.sin() * ((2.0f64.ln() / 2.0) * bw / w0.sin()).sinh();
        let cos0 = w0.cos();

        let a0 = 1.0 + alpha;
        Ok(Respiration {
            b0: alpha / a0,
            b1: 0.0,
            b2: -alpha / a0,
            a1: -2.0 * cos0 / a0,
            a2: (1.0 - alpha) / a0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
            last_sign: 0.0,
            last_cross_t: 0.0,
            last_t: f64::NEG_INFINITY,
            bpm: 0.0,
        })
    }

    /// Filter one sample taken at time `t` (seconds) and return the
    /// band-passed value. A non-increasing `t` is a no-op tick: the filter
    /// state is left untouched and the previous output is returned.
    pub fn update(&mut self, x: f64, t: f64) -> f64 {
        if t <= self.last_t {
            return self.y1;
        }
        self.last_t = t;

        let y = self.b0 * x + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;

        let s = if y >= 0.0 { 1.0 } else { -1.0 };
        if self.last_sign < 0.0 && s > 0.0 {
            if self.last_cross_t > 0.0 {
                let period = t - self.last_cross_t;
                if period > 0.5 && period < 10.0 {
                    self.bpm = 60.0 / period;
                }
            }
            self.last_cross_t = t;
        }
        self.last_sign = s;
        y
    }

    /// Last breath-rate estimate in breaths/min; 0 before the first valid
    /// crossing pair.
    pub fn rate(&self) -> f64 {
        self.bpm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_configuration() {
        assert!(Respiration::new(0.0, 0.1, 0.5).is_err());
        assert!(Respiration::new(50.0, 0.5, 0.1).is_err());
        assert!(Respiration::new(50.0, 0.0, 0.5).is_err());
    }

    #[test]
    fn sinusoid_converges_to_breath_rate() {
        // 0.25 Hz = 15 breaths/min, sampled at 50 Hz, five full cycles
        let fs = 50.0;
        let mut r = Respiration::new(fs, 0.1, 0.5).unwrap();
        for i in 0..(20.0 * fs) as usize {
            let t = i as f64 / fs;
            r.update((2.0 * PI * 0.25 * t).sin(), t);
        }
        assert!((r.rate() - 15.0).abs() < 1.0, "rate was {}", r.rate());
    }

    #[test]
    fn rate_zero_before_first_crossing() {
        let r = Respiration::new(50.0, 0.1, 0.5).unwrap();
        assert_eq!(r.rate(), 0.0);
    }

    #[test]
    fn non_increasing_timestamp_is_noop() {
        let fs = 50.0;
        let mut r = Respiration::new(fs, 0.1, 0.5).unwrap();
        let mut last = 0.0;
        for i in 0..500 {
            let t = i as f64 / fs;
            last = r.update((2.0 * PI * 0.25 * t).sin(), t);
        }
        let rate_before = r.rate();
        // duplicate and backwards timestamps must not disturb anything
        assert_eq!(r.update(5.0, 499.0 / fs), last);
        assert_eq!(r.update(-5.0, 1.0), last);
        assert_eq!(r.rate(), rate_before);
    }

    #[test]
    fn implausible_periods_hold_last_estimate() {
        // same sinusoid throughout, but the clock jumps 60 s mid-stream;
        // the crossing pair straddling the gap has a period > 10 s and must
        // be ignored, every later pair is a normal 4 s breath again
        let fs = 50.0;
        let mut r = Respiration::new(fs, 0.1, 0.5).unwrap();
        for i in 0..3000usize {
            let phase = i as f64 / fs;
            let t = if i < 1000 { phase } else { phase + 60.0 };
            r.update((2.0 * PI * 0.25 * phase).sin(), t);
        }
        // never latched 60/64 or similar from the gap
        assert!((r.rate() - 15.0).abs() < 1.0, "rate was {}", r.rate());
    }
}
