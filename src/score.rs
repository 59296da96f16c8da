//! Retrospective heart-rate statistics and sleep-likelihood score.

/// Batch statistics over a BPM history. Fields are NaN when undefined.
#[derive(Clone, Copy, Debug)]
pub struct Stats {
    pub mean: f64,
    /// Population standard deviation.
    pub sd: f64,
    /// Root mean square of successive differences.
    pub rmssd: f64,
}

/// Mean, sd and RMSSD of a sample batch. All NaN when empty; sd and RMSSD
/// NaN below two samples.
pub fn stats(samples: &[f64]) -> Stats {
    let n = samples.len();
    if n == 0 {
        return Stats {
            mean: f64::NAN,
            sd: f64::NAN,
            rmssd: f64::NAN,
        };
    }

    let mean = samples.iter().sum::<f64>() / n as f64;
    if n < 2 {
        return Stats {
            mean,
            sd: f64::NAN,
            rmssd: f64::NAN,
        };
    }

    let vsum: f64 = samples.iter().map(|x| (x - mean) * (x - mean)).sum();
    let sd = (vsum / n as f64).sqrt();

    let diff2: f64 = samples
        .windows(2)
        .map(|w| (w[1] - w[0]) * (w[1] - w[0]))
        .sum();
    let rmssd = (diff2 / (n - 1) as f64).sqrt();

    Stats { mean, sd, rmssd }
}

const HR_MIN: f64 = 40.0;
const HR_MAX: f64 = 100.0;
// BPM-delta proxy range for RMSSD normalization
const RMSSD_MIN: f64 = 1.0;
const RMSSD_MAX: f64 = 8.0;

/// 0..100 sleep-likelihood score from a BPM batch, or -1 below five
/// samples. Lower mean HR and higher beat-to-beat variability both push the
/// score up; HR carries more weight.
pub fn sleep_score(samples: &[f64]) -> i32 {
    if samples.len() < 5 {
        return -1;
    }
    let s = stats(samples);

    let hr_norm = 1.0 - ((s.mean - HR_MIN) / (HR_MAX - HR_MIN)).clamp(0.0, 1.0);
    let rm_norm = ((s.rmssd - RMSSD_MIN) / (RMSSD_MAX - RMSSD_MIN)).clamp(0.0, 1.0);

    let score01 = 0.6 * hr_norm + 0.4 * rm_norm;
    (100.0 * score01.clamp(0.0, 1.0)).round() as i32
}
