//! Robust statistics: Hampel outlier rejection, online variance, and a
//! small-footprint exponentially-weighted quantile tracker.

use heapless::Vec;

/// Largest supported Hampel window.
pub const HAMPEL_MAX: usize = 15;

/// Windowed median/MAD outlier filter. Samples further than `nsigma` robust
/// sigmas from the window median are replaced by the median.
#[derive(Clone, Debug)]
pub struct Hampel {
    buf: [f64; HAMPEL_MAX],
    size: usize,
    idx: usize,
    filled: usize,
    nsigma: f64,
}

impl Hampel {
    /// Window is forced odd and clamped to `3..=15`.
    pub fn new(window: usize, nsigma: f64) -> Self {
        let mut size = window.clamp(3, HAMPEL_MAX);
        if size % 2 == 0 {
            size -= 1;
        }
        Hampel {
            buf: [0.0; HAMPEL_MAX],
            size,
            idx: 0,
            filled: 0,
            nsigma,
        }
    }

    pub fn window(&self) -> usize {
        self.size
    }

    /// Push `x` and return either `x` or the window median if `x` is an
    /// outlier. While the deviation spread is degenerate (MAD ~ 0), any
    /// sample clearly off the median still counts as an outlier, so a spike
    /// into a flat window is rejected.
    pub fn update(&mut self, x: f64) -> f64 {
        self.buf[self.idx] = x;
        self.idx = (self.idx + 1) % self.size;
        if self.filled < self.size {
            self.filled += 1;
        }

        let n = self.filled;
        let mut tmp: Vec<f64, HAMPEL_MAX> = Vec::new();
        for &v in &self.buf[..n] {
            let _ = tmp.push(v);
        }
        tmp.sort_unstable_by(|a, b| a.total_cmp(b));
        let median = tmp[n / 2];

        for (i, v) in tmp.iter_mut().enumerate() {
            *v = (self.buf[i] - median).abs();
        }
        tmp.sort_unstable_by(|a, b| a.total_cmp(b));
        let mad = tmp[n / 2];
        let sigma = 1.4826 * mad; // Gaussian-consistent scale

        let dev = (x - median).abs();
        if dev > self.nsigma * sigma && dev > 1e-9 {
            return median;
        }
        x
    }
}

/// Welford's online mean/variance accumulator.
#[derive(Clone, Copy, Debug, Default)]
pub struct Welford {
    mean: f64,
    m2: f64,
    n: usize,
}

impl Welford {
    pub fn new() -> Self {
        Welford::default()
    }

    pub fn update(&mut self, x: f64) {
        self.n += 1;
        let d = x - self.mean;
        self.mean += d / self.n as f64;
        self.m2 += d * (x - self.mean);
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sample variance; 0.0 below two samples.
    pub fn variance(&self) -> f64 {
        if self.n > 1 {
            self.m2 / (self.n - 1) as f64
        } else {
            0.0
        }
    }

    pub fn count(&self) -> usize {
        self.n
    }

    pub fn reset(&mut self) {
        *self = Welford::default();
    }
}

/// Exponentially-weighted quantile tracker. Moves by a fixed `alpha` step
/// toward the target quantile regardless of distance, i.e. a coarse
/// stochastic approximation, not a true quantile estimator.
#[derive(Clone, Copy, Debug)]
pub struct EwQuantile {
    q: f64,
    alpha: f64,
    p: f64,
}

impl EwQuantile {
    pub fn new(p: f64, alpha: f64, q0: f64) -> Self {
        EwQuantile { q: q0, alpha, p }
    }

    pub fn update(&mut self, x: f64) {
        let e = if x > self.q { 1.0 } else { 0.0 };
        self.q += self.alpha * if e - self.p > 0.0 { 1.0 } else { -1.0 };
    }

    pub fn quantile(&self) -> f64 {
        self.q
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hampel_replaces_spike_in_flat_window() {
        let mut h = Hampel::new(5, 3.0);
        for _ in 0..4 {
            assert_eq!(h.update(1.0), 1.0);
        }
        assert_eq!(h.update(100.0), 1.0);
    }

    #[test]
    fn hampel_passes_clean_window() {
        let mut h = Hampel::new(5, 3.0);
        let xs = [70.0, 71.0, 69.5, 70.5, 70.2, 69.8, 70.9];
        for x in xs {
            assert_eq!(h.update(x), x);
        }
    }

    #[test]
    fn hampel_window_forced_odd_and_bounded() {
        assert_eq!(Hampel::new(8, 3.0).window(), 7);
        assert_eq!(Hampel::new(1, 3.0).window(), 3);
        assert_eq!(Hampel::new(99, 3.0).window(), 15);
    }

    #[test]
    fn welford_matches_batch_variance() {
        let xs = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let mut w = Welford::new();
        for x in xs {
            w.update(x);
        }
        assert!((w.mean() - 5.0).abs() < 1e-12);
        // sample variance of the set is 32/7
        assert!((w.variance() - 32.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn welford_degenerate_counts() {
        let mut w = Welford::new();
        assert_eq!(w.variance(), 0.0);
        w.update(3.0);
        assert_eq!(w.variance(), 0.0);
        assert_eq!(w.count(), 1);
    }

    #[test]
    fn ew_quantile_steps_toward_data() {
        let mut q = EwQuantile::new(0.5, 0.1, 0.0);
        for _ in 0..100 {
            q.update(10.0);
        }
        // unit steps of +alpha while below the stream
        assert!(q.quantile() > 5.0);
    }
}
