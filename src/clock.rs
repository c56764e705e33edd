//! Timing: fall accumulator, soft-drop burst timer and the round clock.

use std::time::{Duration, Instant};

/// Period of the steady game tick.
pub const TICK_MS: u64 = 50;
/// Fastest fall interval while soft dropping.
pub const MIN_DROP_MS: u64 = 50;
/// How long one tap keeps soft drop active.
pub const BURST_MS: u64 = 180;

/// Milliseconds between fall steps for the given speed and soft-drop state.
pub fn fall_interval_ms(speed_multiplier: f64, soft_drop: bool) -> u64 {
    let base = ((1000.0 / speed_multiplier.max(0.01)).floor() as u64).max(1);
    if soft_drop {
        (base / 6).max(MIN_DROP_MS)
    } else {
        base
    }
}

/// Converts fixed ticks into discrete fall steps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FallScheduler {
    accumulator_ms: u64,
}

impl FallScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn accumulator_ms(&self) -> u64 {
        self.accumulator_ms
    }

    pub fn advance(&mut self, elapsed_ms: u64) {
        self.accumulator_ms = self.accumulator_ms.saturating_add(elapsed_ms);
    }

    /// Consume one step of `interval_ms` if enough time has accumulated.
    pub fn take_step(&mut self, interval_ms: u64) -> bool {
        if self.accumulator_ms >= interval_ms {
            self.accumulator_ms -= interval_ms;
            true
        } else {
            false
        }
    }

    /// Manual drop: start counting from zero again.
    pub fn reset(&mut self) {
        self.accumulator_ms = 0;
    }
}

/// Cancelable one-shot deadline. Scheduling again replaces the pending deadline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OneShotTimer {
    deadline: Option<Instant>,
}

impl OneShotTimer {
    pub fn schedule(&mut self, now: Instant, after: Duration) {
        self.deadline = Some(now + after);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// True while the deadline is set and not yet reached.
    pub fn is_pending(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|d| now < d)
    }

    /// Drop the deadline once it has passed. Returns true if it fired on this call.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(d) if now >= d => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Soft drop via key hold or via a timed tap burst.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SoftDrop {
    pub held: bool,
    burst: OneShotTimer,
}

impl SoftDrop {
    pub fn tap(&mut self, now: Instant) {
        self.burst.schedule(now, Duration::from_millis(BURST_MS));
    }

    pub fn burst_active(&self, now: Instant) -> bool {
        self.burst.is_pending(now)
    }

    pub fn is_active(&self, now: Instant) -> bool {
        self.held || self.burst_active(now)
    }

    /// Clear an expired burst deadline.
    pub fn poll(&mut self, now: Instant) {
        self.burst.fire_if_due(now);
    }

    pub fn cancel(&mut self) {
        self.held = false;
        self.burst.cancel();
    }
}

/// Fixed-length round measured from a start instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundClock {
    started_at: Instant,
    duration: Duration,
}

impl RoundClock {
    pub fn new(started_at: Instant, duration: Duration) -> Self {
        Self {
            started_at,
            duration,
        }
    }

    /// Whole seconds left, counting elapsed time in whole seconds.
    pub fn remaining_secs(&self, now: Instant) -> u64 {
        let elapsed = now.saturating_duration_since(self.started_at).as_secs();
        self.duration.as_secs().saturating_sub(elapsed)
    }

    pub fn is_up(&self, now: Instant) -> bool {
        self.remaining_secs(now) == 0
    }
}
