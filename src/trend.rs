//! Heart-rate baseline and short-term trend tracking.

use std::collections::VecDeque;

use crate::linreg::Linreg;

/// Tracks a long-window HR baseline and a short-window slope. Timestamps are
/// seconds on the host's monotonic clock.
pub struct TrendAnalyzer {
    baseline: VecDeque<(f64, f64)>,
    trend: VecDeque<(f64, f64)>,
    baseline_window: f64,
    trend_window: f64,
}

impl TrendAnalyzer {
    pub fn new(baseline_window_s: f64, trend_window_s: f64) -> Self {
        TrendAnalyzer {
            baseline: VecDeque::new(),
            trend: VecDeque::new(),
            baseline_window: baseline_window_s,
            trend_window: trend_window_s,
        }
    }

    pub fn ingest(&mut self, bpm: f64, t: f64) {
        self.baseline.push_back((t, bpm));
        self.trend.push_back((t, bpm));
        let baseline_cut = t - self.baseline_window;
        while self.baseline.front().is_some_and(|&(tt, _)| tt < baseline_cut) {
            self.baseline.pop_front();
        }
        let trend_cut = t - self.trend_window;
        while self.trend.front().is_some_and(|&(tt, _)| tt < trend_cut) {
            self.trend.pop_front();
        }
    }

    pub fn baseline_mean(&self) -> Option<f64> {
        if self.baseline.is_empty() {
            return None;
        }
        let sum: f64 = self.baseline.iter().map(|&(_, y)| y).sum();
        Some(sum / self.baseline.len() as f64)
    }

    /// `(latest - baseline) / baseline`; negative when HR sits below its
    /// recent baseline.
    pub fn drop_fraction(&self) -> Option<f64> {
        let baseline = self.baseline_mean()?;
        let &(_, latest) = self.trend.back()?;
        if baseline <= 0.0 {
            return None;
        }
        Some((latest - baseline) / baseline)
    }

    /// Linear-regression slope over the trend window, in bpm/second. `None`
    /// below 5 points.
    pub fn slope_bpm_per_sec(&self) -> Option<f64> {
        if self.trend.len() < 5 {
            return None;
        }
        let t0 = self.trend.front()?.0;
        let xs: Vec<f64> = self.trend.iter().map(|&(t, _)| t - t0).collect();
        let ys: Vec<f64> = self.trend.iter().map(|&(_, y)| y).collect();
        Linreg::fit(&xs, &ys).map(|lr| lr.slope)
    }

    pub fn reset(&mut self) {
        self.baseline.clear();
        self.trend.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_fraction_tracks_falling_hr() {
        let mut tr = TrendAnalyzer::new(300.0, 90.0);
        for i in 0..60 {
            tr.ingest(70.0, i as f64);
        }
        assert!(tr.drop_fraction().unwrap().abs() < 1e-9);
        // HR sags to 60 over the next minute
        for i in 60..120 {
            let bpm = 70.0 - 10.0 * ((i - 60) as f64 / 60.0);
            tr.ingest(bpm, i as f64);
        }
        let d = tr.drop_fraction().unwrap();
        assert!(d < -0.05, "drop fraction was {d}");
    }

    #[test]
    fn slope_sign_matches_trend() {
        let mut tr = TrendAnalyzer::new(300.0, 90.0);
        for i in 0..30 {
            tr.ingest(80.0 - 0.2 * i as f64, i as f64);
        }
        let s = tr.slope_bpm_per_sec().unwrap();
        assert!((s + 0.2).abs() < 1e-9);
    }

    #[test]
    fn slope_needs_five_points() {
        let mut tr = TrendAnalyzer::new(300.0, 90.0);
        for i in 0..4 {
            tr.ingest(70.0, i as f64);
        }
        assert!(tr.slope_bpm_per_sec().is_none());
    }

    #[test]
    fn old_samples_age_out_of_baseline() {
        let mut tr = TrendAnalyzer::new(10.0, 5.0);
        tr.ingest(100.0, 0.0);
        for i in 1..=20 {
            tr.ingest(60.0, i as f64);
        }
        // the 100 bpm sample is past the baseline window
        assert!((tr.baseline_mean().unwrap() - 60.0).abs() < 1e-9);
    }
}
