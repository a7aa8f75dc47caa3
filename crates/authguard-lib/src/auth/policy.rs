// ============================
// authguard-lib/src/auth/policy.rs
// ============================
//! Lockout thresholds and the exponential backoff curve.
use chrono::Duration;

use crate::error::AppError;

/// Failures in one window before lockout consideration begins
pub const DEFAULT_THRESHOLD: u32 = 5;

/// A failure arriving later than this after the window start opens a new window
pub const DEFAULT_WINDOW: Duration = Duration::minutes(15);

/// Lock duration when the count first reaches the threshold
pub const DEFAULT_BASE_LOCK: Duration = Duration::minutes(1);

/// Upper bound on any lock duration
pub const DEFAULT_MAX_LOCK: Duration = Duration::hours(1);

/// Records whose window started longer ago than this are evicted by a sweep
pub const DEFAULT_RETENTION: Duration = Duration::hours(1);

/// Longest window, lock or retention a policy may configure
pub const MAX_POLICY_DURATION: Duration = Duration::days(3650);

/// Lockout policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    pub threshold: u32,
    pub window: Duration,
    pub base_lock: Duration,
    pub max_lock: Duration,
    pub retention: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            window: DEFAULT_WINDOW,
            base_lock: DEFAULT_BASE_LOCK,
            max_lock: DEFAULT_MAX_LOCK,
            retention: DEFAULT_RETENTION,
        }
    }
}

impl LockoutPolicy {
    /// Lock duration for a window holding `count` failures.
    ///
    /// `None` below the threshold. At the threshold the lock lasts
    /// `base_lock`, doubling with each further failure, capped at `max_lock`.
    pub fn lock_duration(&self, count: u32) -> Option<Duration> {
        if count < self.threshold {
            return None;
        }

        let exponent = count - self.threshold;
        let base_ms = self.base_lock.num_milliseconds();
        let max_ms = self.max_lock.num_milliseconds();

        // Beyond 2^61 the product can only overflow; the cap applies anyway.
        let lock_ms = if exponent > 61 {
            max_ms
        } else {
            base_ms
                .checked_mul(1i64 << exponent)
                .map_or(max_ms, |ms| ms.min(max_ms))
        };

        Some(Duration::milliseconds(lock_ms))
    }

    /// Reject policies that cannot behave sensibly
    pub fn validate(&self) -> Result<(), AppError> {
        if self.threshold == 0 {
            return Err(AppError::InvalidSetting(
                "lockout threshold must be at least 1".to_string(),
            ));
        }
        for (name, value) in [
            ("window", self.window),
            ("base_lock", self.base_lock),
            ("max_lock", self.max_lock),
            ("retention", self.retention),
        ] {
            if value <= Duration::zero() {
                return Err(AppError::InvalidSetting(format!(
                    "lockout {name} must be positive"
                )));
            }
            if value > MAX_POLICY_DURATION {
                return Err(AppError::InvalidSetting(format!(
                    "lockout {name} must not exceed {} days",
                    MAX_POLICY_DURATION.num_days()
                )));
            }
        }
        if self.base_lock > self.max_lock {
            return Err(AppError::InvalidSetting(
                "lockout base_lock must not exceed max_lock".to_string(),
            ));
        }
        // A record must outlive both its window and the longest lock it can carry.
        if self.retention < self.max_lock || self.retention < self.window {
            return Err(AppError::InvalidSetting(
                "lockout retention must be at least max_lock and window".to_string(),
            ));
        }
        Ok(())
    }
}
