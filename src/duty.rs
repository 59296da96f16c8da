//! Power-adaptive sampling intervals.

use crate::Stage;

/// Maps the current stage to the next sampling interval: dense sampling only
/// during the drowsy transition window, coarse sampling in the stable awake
/// and asleep stages. Memoryless in the stage value; the last stage is
/// retained for inspection only.
pub struct DutyCycle {
    fast_s: f64,
    slow_s: f64,
    last: Stage,
}

impl DutyCycle {
    pub fn new(fast_interval_s: f64, slow_interval_s: f64) -> Self {
        DutyCycle {
            fast_s: fast_interval_s,
            slow_s: slow_interval_s,
            last: Stage::Awake,
        }
    }

    pub fn next_interval(&mut self, stage: Stage) -> f64 {
        self.last = stage;
        if stage == Stage::Drowsy {
            self.fast_s
        } else {
            self.slow_s
        }
    }

    pub fn last_stage(&self) -> Stage {
        self.last
    }
}
