//! Strictly increasing server clock for message timestamps.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};

/// Hands out wall-clock timestamps that never repeat or go backwards within
/// this process, at microsecond resolution (the precision PostgreSQL keeps).
#[derive(Debug, Default)]
pub struct MonotonicClock {
    last_micros: AtomicI64,
}

impl MonotonicClock {
    /// Create a new clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Next timestamp: the wall clock, or one microsecond past the previous
    /// value if the wall clock has not advanced.
    pub fn now(&self) -> DateTime<Utc> {
        let wall = Utc::now().timestamp_micros();
        let mut prev = self.last_micros.load(Ordering::Acquire);
        loop {
            let next = wall.max(prev + 1);
            match self.last_micros.compare_exchange_weak(
                prev,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return DateTime::from_timestamp_micros(next).unwrap_or_else(Utc::now),
                Err(current) => prev = current,
            }
        }
    }
}
