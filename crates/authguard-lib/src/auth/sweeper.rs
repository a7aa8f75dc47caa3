// ============================
// crates/authguard-lib/src/auth/sweeper.rs
// ============================
//! Background eviction of stale attempt records.
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

use super::LockoutTracker;

/// Spawn a task that sweeps `tracker` every `period`.
///
/// Runs until the returned handle is aborted or the runtime shuts down.
pub fn spawn_sweeper(tracker: LockoutTracker, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let swept = tracker.sweep();
            debug!(swept, tracked = tracker.tracked(), "Lockout sweep tick");
        }
    })
}
