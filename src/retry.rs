//! Bounded polling policies.
//!
//! Every wait in the driver is a poll of some register with a fixed pause
//! between attempts. A [`Retry`] describes how long such a loop may run.

/// Maximum number of polls used while waiting for a Tx buffer.
pub const TIMEOUT_VALUE: u16 = 50;

/// When a polling loop gives up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Budget {
    /// After this many unsuccessful attempts.
    Attempts(u16),
    /// Once this many milliseconds have passed on the driver clock since the
    /// first attempt.
    Millis(u32),
}

/// Pause between two attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interval {
    Millis(u8),
    Micros(u8),
}

/// Polling policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retry {
    pub budget: Budget,
    pub interval: Interval,
}

impl Retry {
    /// Confirming a new operation mode in `CANSTAT`.
    pub const MODE_CHANGE: Self = Self {
        budget: Budget::Millis(200),
        interval: Interval::Millis(1),
    };

    /// Waiting for an unreserved Tx buffer to become free.
    pub const TX_BUFFER: Self = Self {
        budget: Budget::Attempts(TIMEOUT_VALUE),
        interval: Interval::Micros(10),
    };

    /// Waiting for `TXREQ` to clear after requesting transmission.
    pub const TX_COMPLETE: Self = Self {
        budget: Budget::Attempts(TIMEOUT_VALUE),
        interval: Interval::Micros(10),
    };

    /// Whether `attempts` failed attempts exhaust an attempt budget.
    /// Time budgets are checked against the clock by the caller.
    pub(crate) fn attempts_exhausted(&self, attempts: u16) -> bool {
        matches!(self.budget, Budget::Attempts(max) if attempts >= max)
    }
}
