//! Scalar recursive Bayesian smoothing of the sleep propensity.

use crate::fusion::{self, Features};

/// One-dimensional Kalman filter over the fused propensity. The state is
/// clamped to `[0, 1]` after every update. One filter type serves both entry
/// points: a pre-fused scalar measurement, or the raw feature vector with
/// fusion as a pre-step — the two are identical on equivalent inputs.
#[derive(Clone, Copy, Debug)]
pub struct PropensityFilter {
    x: f64,
    p: f64,
    q: f64,
    r: f64,
    k: f64,
}

impl PropensityFilter {
    pub fn new(q: f64, r: f64, x0: f64, p0: f64) -> Self {
        PropensityFilter {
            x: x0.clamp(0.0, 1.0),
            p: p0.max(0.0),
            q,
            r,
            k: 0.0,
        }
    }

    /// One predict + update step with measurement `z` in `[0, 1]`. Returns
    /// the new estimate.
    pub fn update(&mut self, z: f64) -> f64 {
        // predict
        self.p += self.q;
        // update
        let mut denom = self.p + self.r;
        if denom <= 0.0 {
            denom = self.r;
        }
        self.k = self.p / denom;
        self.x += self.k * (z - self.x);
        self.p *= 1.0 - self.k;
        self.x = self.x.clamp(0.0, 1.0);
        self.x
    }

    /// Fuse the feature vector, then run the same update.
    pub fn update_features(&mut self, f: &Features) -> f64 {
        self.update(fusion::fuse(f))
    }

    pub fn estimate(&self) -> f64 {
        self.x
    }

    pub fn covariance(&self) -> f64 {
        self.p
    }

    /// Last Kalman gain, for inspection.
    pub fn gain(&self) -> f64 {
        self.k
    }
}

impl Default for PropensityFilter {
    fn default() -> Self {
        PropensityFilter::new(0.01, 0.10, 0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converges_monotonically_on_constant_measurement() {
        let mut kf = PropensityFilter::default();
        let c = 0.8;
        let mut prev_err = (kf.estimate() - c).abs();
        for _ in 0..200 {
            kf.update(c);
            let err = (kf.estimate() - c).abs();
            assert!(err <= prev_err + 1e-15);
            prev_err = err;
        }
        assert!(prev_err < 1e-3);
    }

    #[test]
    fn covariance_reaches_riccati_fixed_point() {
        let mut kf = PropensityFilter::default();
        for _ in 0..500 {
            kf.update(0.5);
        }
        // at the fixed point, P = (1 - K)(P + q) with K = (P+q)/(P+q+r)
        let p = kf.covariance();
        let (q, r) = (0.01, 0.10);
        let k = (p + q) / (p + q + r);
        let next = (1.0 - k) * (p + q);
        assert!((next - p).abs() < 1e-9, "p={p} next={next}");
    }

    #[test]
    fn estimate_stays_clamped() {
        let mut kf = PropensityFilter::new(0.5, 0.01, 0.0, 1.0);
        for _ in 0..50 {
            kf.update(5.0); // absurd measurement, clamp holds the state
            assert!(kf.estimate() <= 1.0);
        }
        for _ in 0..50 {
            kf.update(-5.0);
            assert!(kf.estimate() >= 0.0);
        }
    }

    #[test]
    fn prefused_and_feature_paths_are_identical() {
        let mut a = PropensityFilter::default();
        let mut b = PropensityFilter::default();
        let f = Features {
            hr_drop: 0.6,
            stillness: 0.9,
            neg_slope: 0.3,
            resp_quiet: 1.0,
            vlf_power: 0.2,
        };
        for _ in 0..20 {
            let za = a.update(crate::fusion::fuse(&f));
            let zb = b.update_features(&f);
            assert_eq!(za, zb);
        }
        assert_eq!(a.covariance(), b.covariance());
    }
}
