//! Wall-clock timestamps and latency measurement
//!
//! Exchange timestamps are epoch milliseconds; local timing helpers share the
//! same clock so fallback timestamps and logged latencies line up.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Millisecond timestamp as used by the exchange (`serverTime`, `timestamp`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp {
    /// Milliseconds since Unix epoch
    pub millis: u64,
}

impl Timestamp {
    pub fn from_millis(millis: u64) -> Self {
        Self { millis }
    }

    /// Current local wall-clock time
    pub fn now() -> Self {
        Self {
            millis: epoch_millis(),
        }
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.millis as i64).unwrap_or_else(Utc::now)
    }

    /// Signed difference `self - other` in milliseconds
    pub fn offset_from(&self, other: Timestamp) -> i64 {
        self.millis as i64 - other.millis as i64
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_datetime().format("%Y-%m-%d %H:%M:%S%.3f UTC"))
    }
}

/// Nanoseconds since Unix epoch from the system clock.
#[inline]
pub fn nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}

/// Milliseconds since Unix epoch from the system clock.
#[inline]
pub fn epoch_millis() -> u64 {
    nanos() / 1_000_000
}

/// Logs how long a named operation took when dropped.
pub struct PerfTimer {
    start_nanos: u64,
    name: String,
}

impl PerfTimer {
    /// Start a new performance timer
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            start_nanos: nanos(),
            name: name.into(),
        }
    }

    pub fn elapsed_micros(&self) -> u64 {
        nanos().saturating_sub(self.start_nanos) / 1_000
    }

    fn log_elapsed(&self) {
        let micros = self.elapsed_micros();
        if micros < 1000 {
            tracing::debug!("⏱️  {} took {}μs", self.name, micros);
        } else {
            tracing::debug!("⏱️  {} took {:.3}ms", self.name, micros as f64 / 1000.0);
        }
    }
}

impl Drop for PerfTimer {
    fn drop(&mut self) {
        self.log_elapsed();
    }
}
