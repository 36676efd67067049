use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

/// Source of block timestamps, in unix seconds.
#[derive(Debug)]
pub enum Clock {
    System,
    /// Only moves through `advance`. Used in dev mode and tests.
    Manual(AtomicU64),
}

impl Clock {
    pub fn manual(start: u64) -> Self {
        Clock::Manual(AtomicU64::new(start))
    }

    pub fn now(&self) -> u64 {
        match self {
            Clock::System => unix_now(),
            Clock::Manual(now) => now.load(Ordering::SeqCst),
        }
    }

    /// Returns the new time. A jump past `u64::MAX` leaves the clock where it was.
    pub fn advance(&self, seconds: u64) -> Result<u64, AdvanceError> {
        match self {
            Clock::System => Err(AdvanceError::SystemClock),
            Clock::Manual(now) => now
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |t| t.checked_add(seconds))
                .map(|previous| previous + seconds)
                .map_err(|_| AdvanceError::Overflow),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceError {
    SystemClock,
    Overflow,
}

pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
