// Fixed-duration session countdown

/// Default session length: one hour
pub const DEFAULT_SESSION_SECS: u64 = 3600;

/// Remaining time at or below which the countdown is shown as a warning
pub const WARNING_SECS: u64 = 900;

/// Remaining time at or below which the countdown is shown as critical
pub const CRITICAL_SECS: u64 = 300;

/// How close the countdown is to running out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Normal,
    Warning,
    Critical,
}

/// Countdown advanced one second per tick
///
/// The countdown itself never reads a clock; whoever owns it delivers ticks
/// (see [`crate::ticker::Ticker`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    total: u64,
    remaining: u64,
    running: bool,
    expired: bool,
}

impl Countdown {
    pub fn new(total: u64) -> Self {
        Self {
            total,
            remaining: total,
            running: false,
            expired: false,
        }
    }

    /// Begin advancing from the current remaining value
    ///
    /// Starting a running or expired countdown does nothing.
    pub fn start(&mut self) {
        if self.expired || self.remaining == 0 {
            self.expired = true;
            return;
        }
        self.running = true;
    }

    /// Advance by one second; returns true when this tick expired the countdown
    pub fn tick(&mut self) -> bool {
        if !self.running {
            return false;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.running = false;
            self.expired = true;
            return true;
        }
        false
    }

    /// Back to the full duration, stopped, not expired
    pub fn reset(&mut self) {
        self.remaining = self.total;
        self.running = false;
        self.expired = false;
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn elapsed(&self) -> u64 {
        self.total - self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    pub fn urgency(&self) -> Urgency {
        if self.remaining <= CRITICAL_SECS {
            Urgency::Critical
        } else if self.remaining <= WARNING_SECS {
            Urgency::Warning
        } else {
            Urgency::Normal
        }
    }

    /// Remaining time as `MM:SS`
    pub fn display(&self) -> String {
        format_time(self.remaining)
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_SECS)
    }
}

/// Render seconds as zero-padded `MM:SS`
///
/// There is no hour component; past 99:59 the minutes simply widen.
pub fn format_time(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
