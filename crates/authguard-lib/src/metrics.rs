// ==============
// crates/authguard-lib/src/metrics.rs

//! Central place for lockout metric keys
pub const LOCKOUT_FAILURE: &str = "lockout.failure";
pub const LOCKOUT_LOCKED: &str = "lockout.locked";
pub const LOCKOUT_RESET: &str = "lockout.reset";
pub const LOCKOUT_SWEPT: &str = "lockout.swept";
pub const LOCKOUT_TRACKED: &str = "lockout.tracked";
