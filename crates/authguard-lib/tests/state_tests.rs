// ==============================
// tests/state_tests.rs
// ==============================
//! `AppState` wiring from settings
use authguard_lib::auth::policy::MAX_POLICY_DURATION;
use authguard_lib::clock::{Clock, ManualClock};
use authguard_lib::config::Settings;
use authguard_lib::error::AppError;
use authguard_lib::AppState;
use chrono::{Duration, Utc};
use std::sync::Arc;

#[test]
fn test_state_rejects_invalid_settings() {
    let mut settings = Settings::default();
    settings.lockout.threshold = 0;

    let err = AppState::new(settings).err().unwrap();
    assert!(matches!(err, AppError::InvalidSetting(_)));
}

#[test]
fn test_state_applies_lockout_settings() {
    let mut settings = Settings::default();
    settings.lockout.threshold = 3;
    settings.lockout.base_lock_secs = 10;

    let clock = Arc::new(ManualClock::new(Utc::now()));
    let state = AppState::with_clock(settings, clock.clone()).unwrap();

    for _ in 0..3 {
        state.tracker.record_failure("carol");
    }
    let info = state.tracker.get_lock_info("carol").unwrap();
    assert_eq!(info.retry_after_seconds, 10);

    clock.advance(Duration::seconds(10));
    assert!(!state.tracker.is_locked("carol"));
}

#[test]
fn test_state_clones_share_tracker() {
    let state = AppState::new(Settings::default()).unwrap();
    let other = state.clone();

    other.tracker.record_failure("dave");
    assert_eq!(state.tracker.tracked(), 1);
}

#[tokio::test]
async fn test_sweeper_follows_settings() {
    let state = AppState::new(Settings::default()).unwrap();
    let handle = state.start_sweeper().unwrap();
    handle.abort();

    let mut settings = Settings::default();
    settings.lockout.sweep_interval_secs = 0;
    let state = AppState::new(settings).unwrap();
    assert!(state.start_sweeper().is_none());
}

#[test]
fn test_longest_accepted_policy_reports_lock_info() {
    let longest = MAX_POLICY_DURATION.num_seconds() as u64;
    let mut settings = Settings::default();
    settings.lockout.base_lock_secs = longest;
    settings.lockout.max_lock_secs = longest;
    settings.lockout.retention_secs = longest;

    let clock = Arc::new(ManualClock::new(Utc::now()));
    let state = AppState::with_clock(settings, clock.clone()).unwrap();
    for _ in 0..5 {
        state.tracker.record_failure("a@b.com");
    }

    let info = state.tracker.get_lock_info("a@b.com").unwrap();
    assert_eq!(info.retry_after_seconds, longest);
    assert_eq!(info.locked_until, clock.now() + MAX_POLICY_DURATION);
    assert_eq!(state.tracker.list_locked().len(), 1);
}

#[test]
fn test_state_rejects_oversized_durations() {
    let mut settings = Settings::default();
    settings.lockout.base_lock_secs = 10_000_000_000_000;
    settings.lockout.max_lock_secs = 10_000_000_000_000;
    settings.lockout.retention_secs = 10_000_000_000_000;

    let err = AppState::new(settings).err().unwrap();
    assert!(matches!(err, AppError::InvalidSetting(_)));
}
