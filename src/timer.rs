//! Authorization countdown.
//!
//! Once a human authorizes the session, the peripheral stays authorized
//! only for a configured number of seconds. The timer is driven by an
//! external 1 Hz tick; it never reads a clock itself, which keeps it
//! deterministic under test.
//!
//! ```text
//!            start()                  tick() × duration
//!  Idle ─────────────────▶ Running ─────────────────────▶ Idle (Expired)
//!   ▲                         │
//!   └──────── cancel() ───────┘
//!
//!  Disabled: no duration configured, start() is refused.
//! ```

use log::{debug, info};

/// Countdown state. `remaining` only exists while running, so a stale
/// value can never leak into the next activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationTimer {
    /// No timeout configured for this session.
    Disabled,
    /// Configured but not counting.
    Idle { duration_secs: u16 },
    /// Counting down.
    Running { duration_secs: u16, remaining_secs: u16 },
}

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTick {
    /// Not running; nothing happened.
    Inactive,
    /// Still counting; seconds left.
    Remaining(u16),
    /// Reached zero on this tick. Fires exactly once per activation.
    Expired,
}

impl AuthorizationTimer {
    /// `None` or a zero duration leaves the timer disabled.
    pub const fn new(duration_secs: Option<u16>) -> Self {
        match duration_secs {
            Some(d) if d > 0 => Self::Idle { duration_secs: d },
            _ => Self::Disabled,
        }
    }

    /// Arm the countdown from the configured duration.
    ///
    /// Restarts from the full duration if already running. Returns the
    /// starting value, or `None` when no duration is configured.
    pub fn start(&mut self) -> Option<u16> {
        let duration_secs = self.duration_secs()?;
        *self = Self::Running {
            duration_secs,
            remaining_secs: duration_secs,
        };
        info!("TIMER: authorization expires in {}s", duration_secs);
        Some(duration_secs)
    }

    /// Stop counting. Idempotent; returns `true` if it was running.
    pub fn cancel(&mut self) -> bool {
        match *self {
            Self::Running { duration_secs, .. } => {
                *self = Self::Idle { duration_secs };
                debug!("TIMER: cancelled");
                true
            }
            _ => false,
        }
    }

    /// Advance by one second.
    pub fn tick(&mut self) -> TimerTick {
        let Self::Running {
            duration_secs,
            remaining_secs,
        } = *self
        else {
            return TimerTick::Inactive;
        };

        let remaining_secs = remaining_secs.saturating_sub(1);
        if remaining_secs == 0 {
            *self = Self::Idle { duration_secs };
            info!("TIMER: authorization expired");
            return TimerTick::Expired;
        }

        *self = Self::Running {
            duration_secs,
            remaining_secs,
        };
        debug!("TIMER: {}s remaining", remaining_secs);
        TimerTick::Remaining(remaining_secs)
    }

    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Running { .. })
    }

    pub const fn remaining_secs(&self) -> Option<u16> {
        match self {
            Self::Running { remaining_secs, .. } => Some(*remaining_secs),
            _ => None,
        }
    }

    pub const fn duration_secs(&self) -> Option<u16> {
        match self {
            Self::Disabled => None,
            Self::Idle { duration_secs } | Self::Running { duration_secs, .. } => {
                Some(*duration_secs)
            }
        }
    }
}
