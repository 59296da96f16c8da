//! Stillness scoring and coarse motion classification.

use std::collections::VecDeque;

/// Coarse activity label derived from stillness statistics. Consumed by the
/// host directly; not an input to the state estimator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotionClass {
    Still,
    Fidget,
    Active,
}

/// Threshold rules, first match wins.
pub fn classify(still_mean: f64, still_var: f64) -> MotionClass {
    if still_mean > 0.85 && still_var < 0.02 {
        MotionClass::Still
    } else if still_mean > 0.60 && still_var < 0.08 {
        MotionClass::Fidget
    } else {
        MotionClass::Active
    }
}

impl MotionClass {
    /// Respiration-quietness proxy fed into feature fusion.
    pub fn resp_quietness(self) -> f64 {
        match self {
            MotionClass::Still => 1.0,
            MotionClass::Fidget => 0.6,
            MotionClass::Active => 0.2,
        }
    }
}

/// Rolling stillness score from a motion-magnitude stream.
///
/// Samples accumulate into fixed-length windows; a window is "still" when
/// its variance sits under the threshold. A hysteresis ring of recent window
/// verdicts yields a score in `[0, 1]` (the fraction of still windows), so
/// one twitch cannot zero the score.
pub struct StillnessScorer {
    window: Vec<f64>,
    samples_per_window: usize,
    variance_threshold: f64,
    recent: VecDeque<bool>,
    hysteresis_windows: usize,
    score: f64,
    still_now: bool,
    last_window_var: f64,
}

impl StillnessScorer {
    pub fn new(samples_per_window: usize, variance_threshold: f64, hysteresis_windows: usize) -> Self {
        StillnessScorer {
            window: Vec::with_capacity(samples_per_window.max(1)),
            samples_per_window: samples_per_window.max(1),
            variance_threshold,
            recent: VecDeque::new(),
            hysteresis_windows: hysteresis_windows.max(1),
            score: 0.0,
            still_now: false,
            last_window_var: 0.0,
        }
    }

    pub fn push(&mut self, magnitude: f64) {
        self.window.push(magnitude);
        if self.window.len() < self.samples_per_window {
            return;
        }

        let n = self.window.len() as f64;
        let mean = self.window.iter().sum::<f64>() / n;
        let var = self.window.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / n;
        self.window.clear();

        let still = var < self.variance_threshold;
        self.last_window_var = var;
        self.still_now = still;

        self.recent.push_back(still);
        if self.recent.len() > self.hysteresis_windows {
            self.recent.pop_front();
        }
        let still_count = self.recent.iter().filter(|&&s| s).count();
        self.score = still_count as f64 / self.recent.len().max(1) as f64;
    }

    /// Fraction of recent windows scored still.
    pub fn score(&self) -> f64 {
        self.score
    }

    /// Verdict of the most recent closed window.
    pub fn is_still_now(&self) -> bool {
        self.still_now
    }

    /// Variance of the most recent closed window.
    pub fn window_variance(&self) -> f64 {
        self.last_window_var
    }

    pub fn reset(&mut self) {
        self.window.clear();
        self.recent.clear();
        self.score = 0.0;
        self.still_now = false;
        self.last_window_var = 0.0;
    }
}
