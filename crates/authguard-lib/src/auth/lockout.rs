// ============================
// crates/authguard-lib/src/auth/lockout.rs
// ============================
//! Per-identifier failed-attempt tracking and lockout decisions.
//!
//! Failures are counted per normalized identifier inside a sliding window.
//! Once the count reaches the policy threshold the identifier is locked for a
//! duration that doubles with every further failure, measured from the start
//! of the window.
//!
//! Known limitation: a failure arriving more than one window after the window
//! start restarts the count at 1, so an attacker pacing guesses slower than
//! one per window never reaches the threshold.

use std::collections::HashMap;
use std::sync::Arc;

use authguard_common::{normalize_identifier, AttemptRecord, LockInfo, LockedIdentity};
use chrono::{DateTime, Duration, Utc};
use metrics::{counter, gauge};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::policy::LockoutPolicy;
use crate::clock::{Clock, SystemClock};
use crate::config::LockoutSettings;
use crate::metrics as keys;

/// Tracker for failed authentication attempts
///
/// Cloning yields another handle to the same table.
#[derive(Debug, Clone)]
pub struct LockoutTracker {
    /// Normalized identifier -> attempt record, behind a single lock
    records: Arc<Mutex<HashMap<String, AttemptRecord>>>,
    policy: LockoutPolicy,
    clock: Arc<dyn Clock>,
    /// Evict stale records at the end of every `record_failure`
    sweep_on_write: bool,
}

impl Default for LockoutTracker {
    fn default() -> Self {
        Self::new(LockoutPolicy::default())
    }
}

impl LockoutTracker {
    /// Create a tracker on the wall clock
    pub fn new(policy: LockoutPolicy) -> Self {
        Self::with_clock(policy, Arc::new(SystemClock))
    }

    /// Create a tracker reading time from `clock`
    pub fn with_clock(policy: LockoutPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            records: Arc::new(Mutex::new(HashMap::new())),
            policy,
            clock,
            sweep_on_write: true,
        }
    }

    /// Create a tracker from validated settings
    pub fn from_settings(settings: &LockoutSettings, clock: Arc<dyn Clock>) -> Self {
        Self::with_clock(settings.policy(), clock).sweep_on_write(settings.sweep_on_write)
    }

    /// Toggle the inline sweep after writes.
    ///
    /// With it off, something else must call [`LockoutTracker::sweep`]
    /// periodically (see [`crate::auth::spawn_sweeper`]).
    pub fn sweep_on_write(mut self, enabled: bool) -> Self {
        self.sweep_on_write = enabled;
        self
    }

    pub fn policy(&self) -> &LockoutPolicy {
        &self.policy
    }

    /// Record a failed authentication attempt and return the updated record.
    ///
    /// An empty identifier yields a zero-count record and leaves the table alone.
    pub fn record_failure(&self, identifier: &str) -> AttemptRecord {
        let now = self.clock.now();
        let Some(key) = normalize_identifier(identifier) else {
            return AttemptRecord::zero(now);
        };

        let mut records = self.records.lock();
        let record = records
            .entry(key.clone())
            .or_insert_with(|| AttemptRecord {
                identifier: key.clone(),
                count: 0,
                window_start: now,
                last_attempt: now,
            });

        record.count = record.count.saturating_add(1);
        record.last_attempt = now;

        // Stale failures don't carry over into a new window
        if now - record.window_start > self.policy.window {
            record.count = 1;
            record.window_start = now;
        }

        let updated = record.clone();

        let swept = if self.sweep_on_write {
            evict_stale(&mut records, now, self.policy.retention)
        } else {
            0
        };
        let tracked = records.len();
        drop(records);

        counter!(keys::LOCKOUT_FAILURE).increment(1);
        gauge!(keys::LOCKOUT_TRACKED).set(tracked as f64);
        report_swept(swept, tracked);

        match self.lock_remaining(&updated, now) {
            Some(remaining) => {
                counter!(keys::LOCKOUT_LOCKED).increment(1);
                warn!(
                    identifier = %key,
                    count = updated.count,
                    lock_secs = remaining.num_seconds(),
                    "Identifier locked out after repeated failures"
                );
            },
            None => {
                debug!(identifier = %key, count = updated.count, "Recorded failed attempt");
            },
        }

        updated
    }

    /// Whether the identifier is currently locked out
    pub fn is_locked(&self, identifier: &str) -> bool {
        self.get_lock_info(identifier).is_some()
    }

    /// Lock details, or `None` when the identifier may attempt authentication
    pub fn get_lock_info(&self, identifier: &str) -> Option<LockInfo> {
        let now = self.clock.now();
        let key = normalize_identifier(identifier)?;

        let records = self.records.lock();
        let record = records.get(&key)?;
        self.lock_info(record, now)
    }

    /// Forget every failure for the identifier after a successful login
    pub fn reset_on_success(&self, identifier: &str) {
        let Some(key) = normalize_identifier(identifier) else {
            return;
        };

        let removed = self.records.lock().remove(&key);
        if let Some(record) = removed {
            counter!(keys::LOCKOUT_RESET).increment(1);
            info!(
                identifier = %key,
                cleared = record.count,
                "Cleared failed attempts after successful authentication"
            );
        }
    }

    /// Evict every record whose window started more than the retention
    /// period ago. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut records = self.records.lock();
        let swept = evict_stale(&mut records, now, self.policy.retention);
        let tracked = records.len();
        drop(records);

        gauge!(keys::LOCKOUT_TRACKED).set(tracked as f64);
        report_swept(swept, tracked);
        swept
    }

    /// Number of identifiers currently tracked
    pub fn tracked(&self) -> usize {
        self.records.lock().len()
    }

    /// Snapshot of the stored record for an identifier
    pub fn attempt_record(&self, identifier: &str) -> Option<AttemptRecord> {
        let key = normalize_identifier(identifier)?;
        self.records.lock().get(&key).cloned()
    }

    /// Every identifier locked right now, ordered by identifier
    pub fn list_locked(&self) -> Vec<LockedIdentity> {
        let now = self.clock.now();
        let records = self.records.lock();
        let mut locked: Vec<LockedIdentity> = records
            .values()
            .filter_map(|record| {
                self.lock_info(record, now).map(|info| LockedIdentity {
                    identifier: record.identifier.clone(),
                    info,
                })
            })
            .collect();
        drop(records);

        locked.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        locked
    }

    fn lock_info(&self, record: &AttemptRecord, now: DateTime<Utc>) -> Option<LockInfo> {
        let remaining = self.lock_remaining(record, now)?;
        Some(LockInfo {
            locked: true,
            retry_after_seconds: ceil_secs(remaining),
            locked_until: now
                .checked_add_signed(remaining)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            attempt_count: record.count,
        })
    }

    /// Time left on the lock, if the record is locked at `now`
    fn lock_remaining(&self, record: &AttemptRecord, now: DateTime<Utc>) -> Option<Duration> {
        let lock = self.policy.lock_duration(record.count)?;
        let remaining = lock - (now - record.window_start);
        (remaining > Duration::zero()).then_some(remaining)
    }
}

fn evict_stale(
    records: &mut HashMap<String, AttemptRecord>,
    now: DateTime<Utc>,
    retention: Duration,
) -> usize {
    let before = records.len();
    records.retain(|_, record| now - record.window_start <= retention);
    before - records.len()
}

fn report_swept(swept: usize, tracked: usize) {
    if swept > 0 {
        counter!(keys::LOCKOUT_SWEPT).increment(swept as u64);
        info!(swept, tracked, "Evicted stale attempt records");
    }
}

/// Whole seconds, rounded up
fn ceil_secs(duration: Duration) -> u64 {
    let secs = duration.num_seconds();
    let rounded = if duration > Duration::seconds(secs) {
        secs + 1
    } else {
        secs
    };
    rounded.max(0) as u64
}
