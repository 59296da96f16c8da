//! One-pole smoothing filters and tiny spike helpers.

use std::f32::consts::PI;

/// Exponential moving average, `y[n] = (1 - alpha) * y[n-1] + alpha * x[n]`.
/// The first update after construction or reset seeds `y` with the input
/// verbatim, so there is no smoothing transient.
pub struct Iir1 {
    alpha: f32,
    last_value: Option<f32>,
}

impl Iir1 {
    /// Create a filter with an explicit alpha, clamped into `(eps, 1]`.
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha: clamp_alpha(alpha),
            last_value: None,
        }
    }

    /// Create a filter from a low-pass cutoff frequency and sample period,
    /// `alpha = dt / (1 / (2*pi*fc) + dt)`.
    pub fn from_cutoff(cutoff_hz: f32, dt_seconds: f32) -> Self {
        Self::new(alpha_from_cutoff(cutoff_hz, dt_seconds))
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        self.alpha = clamp_alpha(alpha);
    }

    /// Process a new sample through the filter
    pub fn update(&mut self, x: f32) -> f32 {
        let y = match self.last_value {
            None => x,
            Some(last) => (1.0 - self.alpha) * last + self.alpha * x,
        };
        self.last_value = Some(y);
        y
    }

    /// Reset the filter state
    pub fn reset_state(&mut self) {
        self.last_value = None;
    }
}

/// Alpha of 0 would freeze the output, so the lower bound is epsilon.
fn clamp_alpha(alpha: f32) -> f32 {
    alpha.clamp(f32::EPSILON, 1.0)
}

/// Non-positive cutoff or period falls back to 1.0, meaning no smoothing.
pub fn alpha_from_cutoff(cutoff_hz: f32, dt_seconds: f32) -> f32 {
    if cutoff_hz <= 0.0 || dt_seconds <= 0.0 {
        return 1.0;
    }
    let rc = 1.0 / (2.0 * PI * cutoff_hz);
    clamp_alpha(dt_seconds / (rc + dt_seconds))
}

/// Middle value of three, by sum minus extremes.
pub fn median3(a: f32, b: f32, c: f32) -> f32 {
    let mn = a.min(b).min(c);
    let mx = a.max(b).max(c);
    (a + b + c) - mn - mx
}
