//! Time primitives for the game loop.
//!
//! All scheduling runs on a single monotonic elapsed-milliseconds axis
//! advanced by the app tick. Nothing here touches wall-clock time, which
//! keeps every timer deterministic and directly drivable from tests.

/// Repeating one-second countdown.
///
/// `advance` drains every tick due at the given elapsed time, so a late
/// tick fires immediately instead of being lost. Completion is reported
/// exactly once; after that the countdown stays inert until restarted.
#[derive(Debug, Clone, PartialEq)]
pub struct Countdown {
    remaining: u32,
    next_due: Option<u64>,
}

impl Countdown {
    pub fn idle() -> Self {
        Self {
            remaining: 0,
            next_due: None,
        }
    }

    /// Arm the countdown; the first tick lands one second after `now_ms`.
    pub fn start(duration_secs: u32, now_ms: u64) -> Self {
        Self {
            remaining: duration_secs,
            next_due: if duration_secs > 0 {
                Some(now_ms + 1000)
            } else {
                None
            },
        }
    }

    /// Cancel any pending tick.
    pub fn stop(&mut self) {
        self.next_due = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining
    }

    /// Drain every tick due at `elapsed_ms`. Returns true the single time
    /// the countdown reaches zero.
    pub fn advance(&mut self, elapsed_ms: u64) -> bool {
        while let Some(due) = self.next_due {
            if elapsed_ms < due {
                return false;
            }
            self.remaining = self.remaining.saturating_sub(1);
            if self.remaining == 0 {
                self.next_due = None;
                return true;
            }
            self.next_due = Some(due + 1000);
        }
        false
    }
}

/// Single-shot cancellable deadline on the same elapsed-ms axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    due: Option<u64>,
}

impl Deadline {
    pub fn idle() -> Self {
        Self { due: None }
    }

    pub fn at(due_ms: u64) -> Self {
        Self { due: Some(due_ms) }
    }

    pub fn cancel(&mut self) {
        self.due = None;
    }

    pub fn is_pending(&self) -> bool {
        self.due.is_some()
    }

    /// True once when the deadline has passed; clears itself so it can
    /// never fire twice.
    pub fn fire(&mut self, elapsed_ms: u64) -> bool {
        match self.due {
            Some(due) if elapsed_ms >= due => {
                self.due = None;
                true
            }
            _ => false,
        }
    }
}
