//! Per-tick pipeline assembly.
//!
//! [`SleepMonitor`] owns every stage explicitly (no process-wide state) and
//! is driven by exactly one caller, the host's sampling loop: each tick the
//! host pushes a raw heart-rate or motion sample and reads back the fused
//! propensity, the discrete stage, the next sampling interval, and the
//! ancillary outputs.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::duty::DutyCycle;
use crate::filters::Iir1;
use crate::fusion::Features;
use crate::hmm::Hmm3;
use crate::kalman::PropensityFilter;
use crate::motion::{classify, MotionClass, StillnessScorer};
use crate::respiration::Respiration;
use crate::ring::RingBuffer;
use crate::ringlog::{Record, RingLog};
use crate::robust::{Hampel, Welford};
use crate::spectral::Goertzel;
use crate::trend::TrendAnalyzer;
use crate::{Result, Stage};

/// Hand-tuned pipeline parameters. The defaults are the constants the
/// models were tuned against; serde support exists so a host can persist or
/// ship overrides.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Hampel window over raw HR samples (forced odd, 3..=15).
    pub hampel_window: usize,
    pub hampel_nsigma: f64,
    /// EMA alpha for the cleaned HR stream.
    pub hr_alpha: f32,
    /// EMA alpha for the stillness score.
    pub still_alpha: f32,
    pub hr_window: usize,
    pub still_window: usize,

    /// Stillness stream rate feeding the VLF estimator.
    pub vlf_sample_rate_hz: f64,
    pub vlf_target_hz: f64,
    pub vlf_block_len: usize,
    /// Raw VLF power is divided by this before clipping to [0, 1].
    pub vlf_power_scale: f64,

    /// Motion/chest-proxy stream rate for the respiration band-pass.
    pub resp_sample_rate_hz: f64,
    pub resp_low_hz: f64,
    pub resp_high_hz: f64,

    pub kalman_q: f64,
    pub kalman_r: f64,

    pub fast_interval_s: f64,
    pub slow_interval_s: f64,

    /// Motion samples per stillness window.
    pub still_samples_per_window: usize,
    pub still_variance_threshold: f64,
    pub still_hysteresis_windows: usize,

    /// HR baseline / trend windows in seconds.
    pub baseline_window_s: f64,
    pub trend_window_s: f64,

    /// No decisions before this many HR samples.
    pub min_hr_samples: u32,
    /// Consecutive asleep ticks before the onset is confirmed.
    pub asleep_confirm_ticks: u32,

    /// Baseline-relative HR drop that gates the asleep transition
    /// (negative: below baseline).
    pub drop_threshold: f64,
    pub min_drowsy_seconds: f64,
    pub min_still_score: f64,
    pub require_negative_slope: bool,
    /// Slope (bpm/s) that maps to a saturated negative-slope feature.
    pub slope_norm: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            hampel_window: 9,
            hampel_nsigma: 3.0,
            hr_alpha: 0.22,
            still_alpha: 0.12,
            hr_window: 60,
            still_window: 64,
            vlf_sample_rate_hz: 10.0,
            vlf_target_hz: 0.20,
            vlf_block_len: 32,
            vlf_power_scale: 5.0,
            resp_sample_rate_hz: 10.0,
            resp_low_hz: 0.1,
            resp_high_hz: 0.5,
            kalman_q: 0.01,
            kalman_r: 0.10,
            fast_interval_s: 2.0,
            slow_interval_s: 5.0,
            still_samples_per_window: 50,
            still_variance_threshold: 8e-4,
            still_hysteresis_windows: 15,
            baseline_window_s: 300.0,
            trend_window_s: 90.0,
            min_hr_samples: 8,
            asleep_confirm_ticks: 2,
            drop_threshold: -0.12,
            min_drowsy_seconds: 180.0,
            min_still_score: 0.80,
            require_negative_slope: true,
            slope_norm: 0.2,
        }
    }
}

/// Host-facing outputs of one evaluated tick.
#[derive(Clone, Copy, Debug)]
pub struct TickOutput {
    pub propensity: f64,
    pub stage: Stage,
    /// Recommended seconds until the next sample.
    pub next_interval_s: f64,
    /// Breaths per minute; 0 while undetermined.
    pub respiration_bpm: f64,
    pub motion_class: MotionClass,
    /// True once the asleep stage has held for the configured number of
    /// consecutive ticks. The host triggers its action on this, never the
    /// core.
    pub onset_confirmed: bool,
}

/// Hysteresis gate between raw features and the HMM observation.
enum FsmState {
    Awake,
    Drowsy { since: f64 },
    Asleep,
}

struct StateMachine {
    drop_threshold: f64,
    min_drowsy_s: f64,
    min_still: f64,
    require_negative_slope: bool,
    state: FsmState,
}

impl StateMachine {
    fn new(cfg: &PipelineConfig) -> Self {
        StateMachine {
            drop_threshold: cfg.drop_threshold,
            min_drowsy_s: cfg.min_drowsy_seconds,
            min_still: cfg.min_still_score,
            require_negative_slope: cfg.require_negative_slope,
            state: FsmState::Awake,
        }
    }

    fn ingest(&mut self, drop: Option<f64>, stillness: f64, slope: Option<f64>, now: f64) -> Stage {
        match self.state {
            FsmState::Awake => {
                // start noticing earlier than the full thresholds
                if drop.is_some_and(|d| d <= self.drop_threshold * 0.5)
                    && stillness >= self.min_still * 0.7
                {
                    self.state = FsmState::Drowsy { since: now };
                }
            }
            FsmState::Drowsy { since } => {
                let sustained = now - since >= self.min_drowsy_s;
                let hr_low = drop.unwrap_or(0.0) <= self.drop_threshold;
                let slope_ok = !self.require_negative_slope || slope.unwrap_or(0.0) < 0.0;
                let still_ok = stillness >= self.min_still;

                if hr_low && still_ok && slope_ok && sustained {
                    self.state = FsmState::Asleep;
                } else if stillness < self.min_still * 0.5
                    || drop.unwrap_or(0.0) > self.drop_threshold * 0.25
                {
                    // motion spike or HR rebound
                    self.state = FsmState::Awake;
                }
            }
            FsmState::Asleep => {}
        }
        self.stage()
    }

    fn stage(&self) -> Stage {
        match self.state {
            FsmState::Awake => Stage::Awake,
            FsmState::Drowsy { .. } => Stage::Drowsy,
            FsmState::Asleep => Stage::Asleep,
        }
    }

    fn reset(&mut self) {
        self.state = FsmState::Awake;
    }
}

pub struct SleepMonitor {
    cfg: PipelineConfig,

    // HR path
    hampel: Hampel,
    hr_var: Welford,
    hr_lpf: Iir1,
    hr_window: RingBuffer,
    trend: TrendAnalyzer,

    // motion path
    stillness: StillnessScorer,
    still_lpf: Iir1,
    still_window: RingBuffer,
    goertzel: Goertzel,
    resp: Respiration,

    // decision core
    fsm: StateMachine,
    filter: PropensityFilter,
    hmm: Hmm3,
    duty: DutyCycle,
    log: Option<RingLog>,

    hr_samples: u32,
    asleep_ticks: u32,
    last_motion_t: f64,
    last_vlf: f64,

    current_bpm: f64,
    stillness_score: f64,
    propensity: f64,
    stage: Stage,
    onset_confirmed: bool,
}

impl SleepMonitor {
    pub fn new(cfg: PipelineConfig) -> Result<Self> {
        let hr_window = RingBuffer::new(cfg.hr_window)?;
        let still_window = RingBuffer::new(cfg.still_window)?;
        let goertzel = Goertzel::new(cfg.vlf_sample_rate_hz, cfg.vlf_target_hz, cfg.vlf_block_len)?;
        let resp = Respiration::new(cfg.resp_sample_rate_hz, cfg.resp_low_hz, cfg.resp_high_hz)?;

        Ok(SleepMonitor {
            hampel: Hampel::new(cfg.hampel_window, cfg.hampel_nsigma),
            hr_var: Welford::new(),
            hr_lpf: Iir1::new(cfg.hr_alpha),
            hr_window,
            trend: TrendAnalyzer::new(cfg.baseline_window_s, cfg.trend_window_s),
            stillness: StillnessScorer::new(
                cfg.still_samples_per_window,
                cfg.still_variance_threshold,
                cfg.still_hysteresis_windows,
            ),
            still_lpf: Iir1::new(cfg.still_alpha),
            still_window,
            goertzel,
            resp,
            fsm: StateMachine::new(&cfg),
            filter: PropensityFilter::new(cfg.kalman_q, cfg.kalman_r, 0.0, 1.0),
            hmm: Hmm3::new(),
            duty: DutyCycle::new(cfg.fast_interval_s, cfg.slow_interval_s),
            log: None,
            hr_samples: 0,
            asleep_ticks: 0,
            last_motion_t: f64::NEG_INFINITY,
            last_vlf: 0.0,
            current_bpm: f64::NAN,
            stillness_score: 0.0,
            propensity: 0.0,
            stage: Stage::Awake,
            onset_confirmed: false,
            cfg,
        })
    }

    /// Attach a best-effort diagnostic ring log. Append failures are logged
    /// and never gate inference.
    pub fn attach_ring_log<P: AsRef<Path>>(&mut self, path: P, capacity: u32) -> Result<()> {
        self.log = Some(RingLog::create(path, capacity)?);
        Ok(())
    }

    /// Ingest one raw heart-rate sample (bpm) at time `t` seconds.
    pub fn push_heart_rate(&mut self, bpm: f64, t: f64) -> Option<TickOutput> {
        let cleaned = self.hampel.update(bpm);
        self.hr_var.update(cleaned);
        let smoothed = f64::from(self.hr_lpf.update(cleaned as f32));

        self.current_bpm = smoothed;
        self.trend.ingest(smoothed, t);
        self.hr_window.push(smoothed as f32);
        self.hr_samples += 1;

        self.evaluate(t)
    }

    /// Ingest one raw motion-magnitude / chest-proxy sample at time `t`
    /// seconds. A non-increasing `t` is a no-op tick: the respiration and
    /// spectral stages are order-sensitive, so their state is left alone.
    pub fn push_motion(&mut self, magnitude: f64, t: f64) -> Option<TickOutput> {
        if t <= self.last_motion_t {
            log::debug!("non-increasing motion timestamp {t}, skipping tick");
            return None;
        }
        self.last_motion_t = t;

        self.stillness.push(magnitude);
        let s = f64::from(self.still_lpf.update(self.stillness.score() as f32));
        self.stillness_score = s;
        self.still_window.push(s as f32);
        self.goertzel.push(s);
        self.resp.update(magnitude, t);

        self.evaluate(t)
    }

    fn evaluate(&mut self, t: f64) -> Option<TickOutput> {
        if self.hr_samples < self.cfg.min_hr_samples {
            return None;
        }

        // HR trend features
        let drop = self.trend.drop_fraction();
        let slope = self.trend.slope_bpm_per_sec();
        let hr_drop = (-drop.unwrap_or(0.0) / self.cfg.drop_threshold.abs()).clamp(0.0, 1.0);
        let neg_slope = (-slope.unwrap_or(0.0) / self.cfg.slope_norm).clamp(0.0, 1.0);

        // stillness features
        let still_mean = self.stillness_score;
        let still_var = self.stillness.window_variance();
        let motion_class = classify(still_mean, still_var);
        let resp_quiet = motion_class.resp_quietness();

        // take a fresh VLF reading only on full blocks, hold it otherwise
        if let Ok(p) = self.goertzel.power_checked() {
            self.last_vlf = (p / self.cfg.vlf_power_scale).min(1.0);
        }

        let features = Features {
            hr_drop,
            stillness: still_mean,
            neg_slope,
            resp_quiet,
            vlf_power: self.last_vlf,
        };
        let p = self.filter.update_features(&features);
        self.propensity = p;

        // hysteresis gate -> observation -> HMM smoothing
        let obs = self.fsm.ingest(drop, still_mean, slope, t);
        let mut stage = self.hmm.step(obs);

        // propensity assists on the boundary cases
        if p > 0.85 && stage == Stage::Drowsy {
            stage = Stage::Asleep;
        }
        if p < 0.25 && stage == Stage::Drowsy {
            stage = Stage::Awake;
        }

        if stage != self.stage {
            log::info!("stage {:?} -> {:?} (propensity {p:.2})", self.stage, stage);
        }
        self.stage = stage;

        if stage == Stage::Asleep {
            self.asleep_ticks += 1;
            if self.asleep_ticks >= self.cfg.asleep_confirm_ticks {
                self.onset_confirmed = true;
            }
        } else {
            self.asleep_ticks = 0;
        }

        // one diagnostic row per tick, best-effort
        if let Some(rlog) = self.log.as_mut() {
            let rec = Record {
                t,
                hr: self.current_bpm as f32,
                still: still_mean as f32,
                propensity: p as f32,
                state: stage.index() as u8,
            };
            if let Err(e) = rlog.append(&rec) {
                log::warn!("ring log append failed: {e}");
            }
        }

        Some(TickOutput {
            propensity: p,
            stage,
            next_interval_s: self.duty.next_interval(stage),
            respiration_bpm: self.resp.rate(),
            motion_class,
            onset_confirmed: self.onset_confirmed,
        })
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn propensity(&self) -> f64 {
        self.propensity
    }

    /// Smoothed heart rate, NaN before the first sample.
    pub fn current_bpm(&self) -> f64 {
        self.current_bpm
    }

    pub fn stillness_score(&self) -> f64 {
        self.stillness_score
    }

    pub fn respiration_bpm(&self) -> f64 {
        self.resp.rate()
    }

    pub fn onset_confirmed(&self) -> bool {
        self.onset_confirmed
    }

    /// Mean of the smoothed HR window, for host-side reporting.
    pub fn hr_window_mean(&self) -> f32 {
        self.hr_window.mean()
    }

    /// Running variance of the cleaned HR stream.
    pub fn hr_variance(&self) -> f64 {
        self.hr_var.variance()
    }

    /// Release the ring log, surfacing its final flush error.
    pub fn detach_ring_log(&mut self) -> Result<()> {
        match self.log.take() {
            Some(log) => log.close(),
            None => Ok(()),
        }
    }

    /// Back to the initial awake state; filters, windows and counters are
    /// cleared, the ring log stays attached.
    pub fn reset(&mut self) {
        self.hampel = Hampel::new(self.cfg.hampel_window, self.cfg.hampel_nsigma);
        self.hr_var.reset();
        self.hr_lpf.reset_state();
        self.hr_window.clear();
        self.trend.reset();
        self.stillness.reset();
        self.still_lpf.reset_state();
        self.still_window.clear();
        self.goertzel.reset();
        self.fsm.reset();
        self.filter = PropensityFilter::new(self.cfg.kalman_q, self.cfg.kalman_r, 0.0, 1.0);
        self.hmm.reset();
        self.hr_samples = 0;
        self.asleep_ticks = 0;
        self.last_vlf = 0.0;
        self.current_bpm = f64::NAN;
        self.stillness_score = 0.0;
        self.propensity = 0.0;
        self.stage = Stage::Awake;
        self.onset_confirmed = false;
    }
}
