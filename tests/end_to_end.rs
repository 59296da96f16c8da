//! End-to-end pipeline runs over synthetic sensor streams.

use std::f64::consts::PI;

use drowse::ringlog::{RingLog, RECORD_SIZE};
use drowse::{MotionClass, PipelineConfig, SleepMonitor, Stage, TickOutput};

const MOTION_RATE_HZ: f64 = 10.0;

/// Drive HR at 1 Hz and motion at 10 Hz from the given generators over
/// `seconds`, returning the last evaluated tick.
fn run(
    monitor: &mut SleepMonitor,
    t0: f64,
    seconds: f64,
    bpm: impl Fn(f64) -> f64,
    motion: impl Fn(f64) -> f64,
) -> Option<TickOutput> {
    let mut last = None;
    let steps = (seconds * MOTION_RATE_HZ) as u64;
    for i in 0..steps {
        let t = t0 + i as f64 / MOTION_RATE_HZ;
        if i % 10 == 0 {
            last = monitor.push_heart_rate(bpm(t), t).or(last);
        }
        last = monitor.push_motion(motion(t), t + 0.001).or(last);
    }
    last
}

fn restless(t: f64) -> f64 {
    0.25 * (t * 7.3).sin() + 0.15 * (t * 2.9).sin()
}

fn breathing(t: f64) -> f64 {
    0.02 * (2.0 * PI * 0.25 * t).sin()
}

#[test]
fn synthetic_wind_down_reaches_confirmed_sleep() {
    let mut m = SleepMonitor::new(PipelineConfig::default()).unwrap();

    // ten minutes awake: elevated wandering HR, restless motion
    let awake = run(
        &mut m,
        0.0,
        600.0,
        |t| 72.0 + 2.0 * (t * 0.13).sin(),
        restless,
    )
    .unwrap();
    assert_eq!(awake.stage, Stage::Awake);
    assert!(awake.propensity < 0.5);
    assert_eq!(awake.next_interval_s, 5.0);

    // slow decline into stillness: HR 72 -> 50 over 340 s, breathing motion
    run(
        &mut m,
        600.0,
        340.0,
        |t| 72.0 - 22.0 * (t - 600.0) / 340.0,
        breathing,
    );
    // settled sleep
    let asleep = run(&mut m, 940.0, 300.0, |_| 50.0, breathing).unwrap();

    assert_eq!(asleep.stage, Stage::Asleep);
    assert!(asleep.onset_confirmed);
    // with the baseline caught up, stillness and quiet respiration carry
    // the propensity
    assert!(asleep.propensity > 0.3, "propensity {}", asleep.propensity);
    // asleep is a stable stage, sampled slowly
    assert_eq!(asleep.next_interval_s, 5.0);
    // the 0.25 Hz chest proxy shows up as ~15 breaths/min
    assert!(
        (asleep.respiration_bpm - 15.0).abs() < 1.0,
        "respiration {}",
        asleep.respiration_bpm
    );
    assert_eq!(asleep.motion_class, MotionClass::Still);
}

#[test]
fn drowsy_phase_recommends_fast_sampling() {
    let mut m = SleepMonitor::new(PipelineConfig::default()).unwrap();
    run(&mut m, 0.0, 600.0, |t| 72.0 + 2.0 * (t * 0.13).sin(), restless);

    // capture the first drowsy tick during the decline
    let mut saw_fast = false;
    let steps = (340.0 * MOTION_RATE_HZ) as u64;
    for i in 0..steps {
        let t = 600.0 + i as f64 / MOTION_RATE_HZ;
        if i % 10 == 0 {
            m.push_heart_rate(72.0 - 22.0 * (t - 600.0) / 340.0, t);
        }
        if let Some(out) = m.push_motion(breathing(t), t + 0.001) {
            if out.stage == Stage::Drowsy {
                assert_eq!(out.next_interval_s, 2.0);
                saw_fast = true;
            }
        }
    }
    assert!(saw_fast, "never entered the drowsy transition window");
}

#[test]
fn ring_log_records_the_run_and_wraps() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.bin");

    let mut m = SleepMonitor::new(PipelineConfig::default()).unwrap();
    let cap = 100u32;
    m.attach_ring_log(&path, cap).unwrap();

    // far more evaluated ticks than the log holds
    run(&mut m, 0.0, 120.0, |_| 70.0, restless);
    m.detach_ring_log().unwrap();

    assert_eq!(
        std::fs::metadata(&path).unwrap().len(),
        u64::from(cap) * RECORD_SIZE
    );
    let rows = RingLog::read_all(&path).unwrap();
    assert_eq!(rows.len(), cap as usize);
    for row in &rows {
        assert!(row.still >= 0.0 && row.still <= 1.0);
        assert!(row.propensity >= 0.0 && row.propensity <= 1.0);
        assert!(row.state <= 2);
    }
}

#[test]
fn out_of_order_motion_ticks_are_ignored() {
    let mut m = SleepMonitor::new(PipelineConfig::default()).unwrap();
    run(&mut m, 0.0, 60.0, |_| 70.0, restless);

    let resp_before = m.respiration_bpm();
    let still_before = m.stillness_score();
    // stale and duplicate timestamps must not move anything
    assert!(m.push_motion(99.0, 1.0).is_none());
    assert!(m.push_motion(99.0, 59.9).is_none());
    assert_eq!(m.respiration_bpm(), resp_before);
    assert_eq!(m.stillness_score(), still_before);

    // host-side reporting surfaces stay sensible
    assert!((f64::from(m.hr_window_mean()) - 70.0).abs() < 1.0);
    assert!(m.hr_variance() < 1.0);
    assert!(m.current_bpm().is_finite());
}

#[test]
fn reset_returns_to_awake_and_regates() {
    let mut m = SleepMonitor::new(PipelineConfig::default()).unwrap();
    run(&mut m, 0.0, 60.0, |_| 70.0, restless);
    assert_eq!(m.stage(), Stage::Awake);

    m.reset();
    assert_eq!(m.stage(), Stage::Awake);
    assert_eq!(m.propensity(), 0.0);
    // the min-sample gate applies again after reset
    assert!(m.push_heart_rate(70.0, 1000.0).is_none());
}
