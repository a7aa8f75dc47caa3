// ============================
// authguard-lib/src/auth/mod.rs
// ============================
//! Brute-force protection for authentication.

mod gate;
pub mod lockout;
pub mod policy;
mod sweeper;

pub use gate::{CredentialVerifier, LoginGate};
pub use lockout::LockoutTracker;
pub use policy::LockoutPolicy;
pub use sweeper::spawn_sweeper;
