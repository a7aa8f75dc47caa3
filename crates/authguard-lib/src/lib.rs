// ============================
// authguard-lib/src/lib.rs
// ============================
//! Per-identity brute-force protection.
//!
//! A [`LockoutTracker`](auth::LockoutTracker) counts failed authentication
//! attempts per normalized identifier and locks an identifier out with an
//! exponentially growing backoff. Build one [`AppState`] at startup and hand
//! clones of its tracker to whatever handles logins.

pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::info;

use crate::auth::{spawn_sweeper, LockoutTracker};
use crate::clock::{Clock, SystemClock};
use crate::config::Settings;
use crate::error::AppError;

pub use authguard_common::{AttemptRecord, LockInfo, LockedIdentity};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Settings the state was built from
    pub settings: Arc<Settings>,
    /// Failed-attempt tracker
    pub tracker: LockoutTracker,
}

impl AppState {
    /// Create a new application state on the wall clock
    pub fn new(settings: Settings) -> Result<Self, AppError> {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    /// Create a new application state reading time from `clock`
    pub fn with_clock(settings: Settings, clock: Arc<dyn Clock>) -> Result<Self, AppError> {
        settings.validate()?;
        let tracker = LockoutTracker::from_settings(&settings.lockout, clock);

        Ok(Self {
            settings: Arc::new(settings),
            tracker,
        })
    }

    /// Start the background sweeper if the settings ask for one.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_sweeper(&self) -> Option<JoinHandle<()>> {
        let period = self.settings.lockout.sweep_interval()?;
        info!(period_secs = period.as_secs(), "Starting lockout sweeper");
        Some(spawn_sweeper(self.tracker.clone(), period))
    }
}
