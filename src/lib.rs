//! Online sleep/wake inference from noisy, low-rate wearable sensor streams.
//!
//! The crate is a single-threaded, tick-driven pipeline: the host pushes raw
//! heart-rate and motion samples with monotonic timestamps, and reads back a
//! fused sleep propensity in `[0, 1]`, a discrete [`Stage`], a recommended
//! next sampling interval, and ancillary outputs (respiration rate, motion
//! class). [`monitor::SleepMonitor`] wires the stages together; the leaf
//! modules are usable on their own.

use thiserror::Error;

pub mod duty;
pub mod filters;
pub mod fusion;
pub mod hmm;
pub mod kalman;
pub mod linreg;
pub mod monitor;
pub mod motion;
pub mod respiration;
pub mod ring;
pub mod ringlog;
pub mod robust;
pub mod score;
pub mod spectral;
pub mod trend;

pub use hmm::Hmm3;
pub use kalman::PropensityFilter;
pub use monitor::{PipelineConfig, SleepMonitor, TickOutput};
pub use motion::MotionClass;
pub use ringlog::{Record, RingLog};

/// Discrete sleep stage shared by the classifier, the duty controller and
/// the host-facing outputs. The numeric values are the on-record encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[repr(u8)]
pub enum Stage {
    Awake = 0,
    Drowsy = 1,
    Asleep = 2,
}

impl Stage {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(i: usize) -> Stage {
        match i {
            0 => Stage::Awake,
            1 => Stage::Drowsy,
            _ => Stage::Asleep,
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// Rejected at construction time; parameters with a safe default are
    /// clamped instead of reported.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    /// Diagnostic ring log could not be opened or written. Never gates the
    /// in-memory pipeline.
    #[error("ring log storage failure")]
    Storage(#[from] std::io::Error),

    #[error("ring log record codec failure")]
    Codec(#[from] bincode::Error),

    /// Goertzel power was read before a full block of samples accumulated.
    #[error("spectral block incomplete: {pushed} of {expected} samples")]
    ShortBlock { pushed: usize, expected: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
