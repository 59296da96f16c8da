//! Least-squares line fit for short trend windows.

pub struct Linreg {
    pub intercept: f64,
    pub slope: f64,
}

impl Linreg {
    /// Fit `y = intercept + slope * x` over paired samples. Returns `None`
    /// below two points or when all `x` coincide.
    pub fn fit(xs: &[f64], ys: &[f64]) -> Option<Self> {
        let n = xs.len().min(ys.len());
        if n < 2 {
            return None;
        }

        let mut sum_x = 0.0;
        let mut sum_y = 0.0;
        let mut sum_xx = 0.0;
        let mut sum_xy = 0.0;
        for (&x, &y) in xs.iter().zip(ys.iter()) {
            sum_x += x;
            sum_y += y;
            sum_xx += x * x;
            sum_xy += x * y;
        }

        let nf = n as f64;
        let denom = nf * sum_xx - sum_x * sum_x;
        if denom == 0.0 {
            return None;
        }

        Some(Linreg {
            intercept: (sum_y * sum_xx - sum_x * sum_xy) / denom,
            slope: (nf * sum_xy - sum_x * sum_y) / denom,
        })
    }

    pub fn y(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}
