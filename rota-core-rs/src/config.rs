//! Scheduler configuration
//!
//! Timings are process-wide: every session run by a scheduler shares them.

use std::time::Duration;

/// Default enrollment window after a session opens
pub const ENROLLMENT_WINDOW_SECS: u64 = 120;

/// Default duty shift length
pub const ROTATION_PERIOD_SECS: u64 = 30 * 60;

/// Shortest rotation period a scheduler will run with
pub const MIN_ROTATION_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// How long operators may enroll before quorum is evaluated
    pub enrollment_window: Duration,

    /// Interval between duty rotations; the first rotation fires one full
    /// period after enrollment closes
    pub rotation_period: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enrollment_window: Duration::from_secs(ENROLLMENT_WINDOW_SECS),
            rotation_period: Duration::from_secs(ROTATION_PERIOD_SECS),
        }
    }
}

impl SchedulerConfig {
    /// Set enrollment window
    pub fn with_enrollment_window(mut self, window: Duration) -> Self {
        self.enrollment_window = window;
        self
    }

    /// Set rotation period, raised to [`MIN_ROTATION_PERIOD`] if shorter
    pub fn with_rotation_period(mut self, period: Duration) -> Self {
        self.rotation_period = period.max(MIN_ROTATION_PERIOD);
        self
    }

    /// Rotation period the timer actually runs with
    pub fn effective_rotation_period(&self) -> Duration {
        self.rotation_period.max(MIN_ROTATION_PERIOD)
    }
}
