//! Demo: run the pipeline over a synthetic wind-down and report the result.
//!
//! Generates ~16 minutes of awake data (elevated, wandering HR, restless
//! motion) followed by a slow decline into stillness, feeds it tick by tick
//! through the monitor, and prints the stage transitions, the respiration
//! estimate and the retrospective sleep score.

use std::f64::consts::PI;

use log::info;

use drowse::{score, MotionClass, PipelineConfig, RingLog, SleepMonitor, Stage};

const HR_RATE_HZ: f64 = 1.0;
const MOTION_RATE_HZ: f64 = 10.0;

const AWAKE_SECONDS: f64 = 600.0;
const DECAY_SECONDS: f64 = 340.0;
const HOLD_SECONDS: f64 = 300.0;

const AWAKE_BPM: f64 = 72.0;
const ASLEEP_BPM: f64 = 50.0;

fn synth_bpm(t: f64) -> f64 {
    let base = if t < AWAKE_SECONDS {
        AWAKE_BPM
    } else if t < AWAKE_SECONDS + DECAY_SECONDS {
        let frac = (t - AWAKE_SECONDS) / DECAY_SECONDS;
        AWAKE_BPM + (ASLEEP_BPM - AWAKE_BPM) * frac
    } else {
        ASLEEP_BPM
    };
    // deterministic wander + the occasional sensor spike
    let wander = 2.0 * (t * 0.13).sin() + 0.8 * (t * 0.57).sin();
    let spike = if (t as u64) % 97 == 0 { 35.0 } else { 0.0 };
    base + wander + spike
}

fn synth_motion(t: f64) -> f64 {
    if t < AWAKE_SECONDS {
        // restless: fidgeting at varying amplitude
        0.25 * (t * 7.3).sin() + 0.15 * (t * 2.9).sin()
    } else {
        // still, breathing at 15 breaths/min showing through the chest proxy
        0.02 * (2.0 * PI * 0.25 * t).sin()
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let log_path = std::env::temp_dir().join("drowse_ringlog.bin");
    let mut monitor = SleepMonitor::new(PipelineConfig::default())?;
    monitor.attach_ring_log(&log_path, 600)?;
    info!("ring log at {}", log_path.display());

    let total = AWAKE_SECONDS + DECAY_SECONDS + HOLD_SECONDS;
    let mut hr_history = Vec::new();
    let mut last_stage = Stage::Awake;
    let mut next_interval = 0.0;
    let mut motion_class = MotionClass::Active;
    let mut onset_at = None;

    let motion_steps = (total * MOTION_RATE_HZ) as u64;
    for i in 0..motion_steps {
        let t = i as f64 / MOTION_RATE_HZ;

        // HR arrives at 1 Hz, interleaved with the 10 Hz motion stream
        if i % (MOTION_RATE_HZ / HR_RATE_HZ) as u64 == 0 {
            let bpm = synth_bpm(t);
            hr_history.push(bpm);
            if let Some(out) = monitor.push_heart_rate(bpm, t) {
                next_interval = out.next_interval_s;
                motion_class = out.motion_class;
            }
        }

        if let Some(out) = monitor.push_motion(synth_motion(t), t + 0.001) {
            if out.stage != last_stage {
                info!(
                    "t={t:7.1}s  stage {:?} -> {:?}  propensity={:.2}  interval={:.0}s",
                    last_stage, out.stage, out.propensity, out.next_interval_s
                );
                last_stage = out.stage;
            }
            next_interval = out.next_interval_s;
            motion_class = out.motion_class;
            if out.onset_confirmed && onset_at.is_none() {
                onset_at = Some(t);
                info!("sleep onset confirmed at t={t:.1}s; the host would pause media here");
            }
        }
    }

    println!("final stage:        {:?}", monitor.stage());
    println!("propensity:         {:.3}", monitor.propensity());
    println!("respiration:        {:.1} breaths/min", monitor.respiration_bpm());
    println!("motion class:       {motion_class:?}");
    println!("next interval:      {next_interval:.0}s");
    match onset_at {
        Some(t) => println!("onset confirmed at: {t:.0}s"),
        None => println!("onset confirmed at: never"),
    }

    // retrospective score over the wind-down tail
    let tail: Vec<f64> = hr_history
        .iter()
        .rev()
        .take(120)
        .rev()
        .copied()
        .collect();
    println!("sleep score (tail): {}", score::sleep_score(&tail));

    monitor.detach_ring_log()?;
    let rows = RingLog::read_all(&log_path)?;
    println!("ring log rows:      {}", rows.len());

    Ok(())
}
