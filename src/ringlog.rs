//! Durable circular diagnostic log.
//!
//! Fixed-width packed records written sequentially to a file sized for
//! exactly `capacity` records. When the write cursor reaches the end it
//! rewinds to byte 0 before the next write (wrap-after-full), so once full
//! the file always holds the most recent `capacity` records. Every write is
//! flushed immediately; the log is meant to survive unexpected termination.
//!
//! Logging is best-effort: a storage failure never gates the in-memory
//! pipeline.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One diagnostic row. Encoded little-endian with fixed-width fields in
/// declared order, no padding: 8 + 4 + 4 + 4 + 1 = 21 bytes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Seconds since the host's reference epoch.
    pub t: f64,
    /// Heart rate in bpm; NaN when the sensor had no reading.
    pub hr: f32,
    /// Stillness score, 0..1.
    pub still: f32,
    /// Fused sleep propensity, 0..1.
    pub propensity: f32,
    /// Stage encoding: 0 awake, 1 drowsy, 2 asleep.
    pub state: u8,
}

pub const RECORD_SIZE: u64 = 21;

pub struct RingLog {
    file: File,
    capacity: u64,
}

impl RingLog {
    /// Create or truncate the store at `path`, sized for `capacity` records.
    pub fn create<P: AsRef<Path>>(path: P, capacity: u32) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidConfig("ring log capacity must be nonzero"));
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(RingLog {
            file,
            capacity: capacity as u64,
        })
    }

    /// Write one record at the cursor and flush. Rewinds the cursor once it
    /// reaches `capacity * RECORD_SIZE` bytes, overwriting the oldest
    /// records from then on.
    pub fn append(&mut self, rec: &Record) -> Result<()> {
        let bytes = bincode::serialize(rec)?;
        debug_assert_eq!(bytes.len() as u64, RECORD_SIZE);
        self.file.write_all(&bytes)?;
        self.file.flush()?;

        let pos = self.file.stream_position()?;
        if pos >= self.capacity * RECORD_SIZE {
            self.file.seek(SeekFrom::Start(0))?;
        }
        Ok(())
    }

    pub fn capacity(&self) -> u32 {
        self.capacity as u32
    }

    /// Sync and release the handle. Dropping the log closes it too; the
    /// explicit call surfaces the final flush error.
    pub fn close(mut self) -> Result<()> {
        self.file.flush()?;
        self.file.sync_all()?;
        Ok(())
    }

    /// Decode every complete record in file order (not chronological once
    /// the log has wrapped: the newest record sits just before the oldest).
    pub fn read_all<P: AsRef<Path>>(path: P) -> Result<Vec<Record>> {
        let mut file = File::open(path)?;
        let mut raw = Vec::new();
        file.read_to_end(&mut raw)?;

        let mut out = Vec::with_capacity(raw.len() / RECORD_SIZE as usize);
        for chunk in raw.chunks_exact(RECORD_SIZE as usize) {
            out.push(bincode::deserialize(chunk)?);
        }
        Ok(out)
    }
}
