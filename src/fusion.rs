//! Feature fusion into a single sleep-propensity measurement.

/// Normalized evidence channels, each expected in `[0, 1]` (clipped before
/// fusion regardless).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Features {
    /// How far HR has dropped below its awake baseline.
    pub hr_drop: f64,
    /// Fraction of recent motion windows scored still.
    pub stillness: f64,
    /// Downward HR slope, normalized.
    pub neg_slope: f64,
    /// Quietness of the respiration/motion proxy.
    pub resp_quiet: f64,
    /// Very-low-frequency spectral power of the stillness signal.
    pub vlf_power: f64,
}

const W_DROP: f64 = 0.35;
const W_STILL: f64 = 0.30;
const W_NEG_SLOPE: f64 = 0.15;
const W_RESP_QUIET: f64 = 0.10;
const W_VLF: f64 = 0.10;

/// Weighted blend of the clipped features; weights sum to 1, so the result
/// stays in `[0, 1]`. Deterministic and stateless.
pub fn fuse(f: &Features) -> f64 {
    let clip = |v: f64| v.clamp(0.0, 1.0);
    W_DROP * clip(f.hr_drop)
        + W_STILL * clip(f.stillness)
        + W_NEG_SLOPE * clip(f.neg_slope)
        + W_RESP_QUIET * clip(f.resp_quiet)
        + W_VLF * clip(f.vlf_power)
}
