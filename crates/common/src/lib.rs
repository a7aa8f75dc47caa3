// ================
// common/src/lib.rs
// ================
//! Common types shared between the lockout engine and its callers.
//! These are the values an authentication handler receives from the tracker
//! and may forward to a client (e.g. for a "try again in N seconds" display).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Failed-attempt state for a single identifier
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    /// Normalized identifier; empty only for the synthetic zero-state record
    pub identifier: String,
    /// Failures in the current window
    pub count: u32,
    /// First failure of the current window
    pub window_start: DateTime<Utc>,
    /// Most recent failure
    pub last_attempt: DateTime<Utc>,
}

impl AttemptRecord {
    /// The record handed back for an empty or absent identifier.
    /// It is never stored.
    pub fn zero(now: DateTime<Utc>) -> Self {
        Self {
            identifier: String::new(),
            count: 0,
            window_start: now,
            last_attempt: now,
        }
    }
}

/// Details of an active lockout
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LockInfo {
    /// Always `true`; kept so serialized payloads are self-describing
    pub locked: bool,
    /// Whole seconds until the lock lifts, rounded up
    pub retry_after_seconds: u64,
    /// Absolute time the lock lifts
    pub locked_until: DateTime<Utc>,
    /// Failures counted in the current window
    pub attempt_count: u32,
}

/// A locked identifier together with its lock details
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LockedIdentity {
    pub identifier: String,
    #[serde(flatten)]
    pub info: LockInfo,
}

/// Normalize a raw identifier into a tracking key.
///
/// Lower-cases and trims surrounding whitespace. Returns `None` when nothing
/// is left, which callers treat as "no identifier".
pub fn normalize_identifier(raw: &str) -> Option<String> {
    let key = raw.trim().to_lowercase();
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}
