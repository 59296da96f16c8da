//! Online 3-state sleep-stage classifier.
//!
//! A fixed-parameter hidden Markov model over {awake, drowsy, asleep},
//! decoded with a one-step Viterbi recursion in the log domain: each tick
//! keeps only the per-state best log score (`log_delta`) and reports its
//! arg-max. Past decisions are never revised.

use crate::Stage;

const N: usize = 3;
const LOG0: f64 = -1e30;

fn lg(x: f64) -> f64 {
    if x <= 0.0 {
        LOG0
    } else {
        x.ln()
    }
}

pub struct Hmm3 {
    log_pi: [f64; N],
    log_a: [[f64; N]; N], // transition [from][to]
    log_e: [[f64; N]; N], // emission confusion [obs][state]
    log_delta: [f64; N],
}

impl Hmm3 {
    /// Hand-tuned default parameters: sticky transitions, mildly noisy
    /// observations, mass on awake at start.
    pub fn new() -> Self {
        let pi = [0.7, 0.2, 0.1];
        let a = [
            [0.85, 0.12, 0.03],
            [0.10, 0.80, 0.10],
            [0.03, 0.12, 0.85],
        ];
        let e = [
            [0.92, 0.06, 0.02],
            [0.08, 0.86, 0.06],
            [0.02, 0.08, 0.90],
        ];

        let log_pi = pi.map(lg);
        Hmm3 {
            log_pi,
            log_a: a.map(|row| row.map(lg)),
            log_e: e.map(|row| row.map(lg)),
            log_delta: log_pi,
        }
    }

    /// Advance one tick with a discrete observation and return the MAP
    /// stage. Ties break toward the lower stage index (awake < drowsy <
    /// asleep).
    pub fn step(&mut self, obs: Stage) -> Stage {
        let o = obs.index();
        let mut next = [LOG0; N];
        for (j, slot) in next.iter_mut().enumerate() {
            let mut best = LOG0;
            for i in 0..N {
                let v = self.log_delta[i] + self.log_a[i][j];
                if v > best {
                    best = v;
                }
            }
            *slot = best + self.log_e[o][j];
        }
        self.log_delta = next;
        self.map_stage()
    }

    /// Current MAP stage without advancing.
    pub fn map_stage(&self) -> Stage {
        let d = &self.log_delta;
        if d[0] >= d[1] && d[0] >= d[2] {
            Stage::Awake
        } else if d[1] >= d[2] {
            Stage::Drowsy
        } else {
            Stage::Asleep
        }
    }

    pub fn log_delta(&self) -> &[f64; N] {
        &self.log_delta
    }

    pub fn reset(&mut self) {
        self.log_delta = self.log_pi;
    }
}

impl Default for Hmm3 {
    fn default() -> Self {
        Hmm3::new()
    }
}
