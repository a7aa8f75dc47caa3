// ============================
// crates/authguard-lib/src/auth/gate.rs
// ============================
//! Wraps a credential check with lockout bookkeeping.
use std::sync::Arc;

use async_trait::async_trait;
use authguard_common::normalize_identifier;
use tracing::{debug, error};

use super::LockoutTracker;
use crate::error::AuthError;

/// Checks a secret against whatever credential store the application has.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    type Principal: Send;

    /// `Ok(None)` means the credentials were wrong.
    /// `Err` is reserved for infrastructure failures.
    async fn verify(&self, identifier: &str, secret: &str)
        -> anyhow::Result<Option<Self::Principal>>;
}

#[async_trait]
impl<T: CredentialVerifier + ?Sized> CredentialVerifier for Arc<T> {
    type Principal = T::Principal;

    async fn verify(&self, identifier: &str, secret: &str)
        -> anyhow::Result<Option<Self::Principal>> {
        (**self).verify(identifier, secret).await
    }
}

/// Authentication entry point guarded by a [`LockoutTracker`]
pub struct LoginGate<V> {
    tracker: LockoutTracker,
    verifier: V,
}

impl<V: CredentialVerifier> LoginGate<V> {
    pub fn new(tracker: LockoutTracker, verifier: V) -> Self {
        Self { tracker, verifier }
    }

    pub fn tracker(&self) -> &LockoutTracker {
        &self.tracker
    }

    /// Authenticate `identifier` with `secret`.
    ///
    /// Locked identifiers are rejected without consulting the verifier. Wrong
    /// credentials count as a failure; a success forgives earlier failures.
    /// The verifier sees `identifier` exactly as supplied; only lockout
    /// tracking uses the normalized form.
    pub async fn authenticate(
        &self,
        identifier: &str,
        secret: &str,
    ) -> Result<V::Principal, AuthError> {
        let Some(key) = normalize_identifier(identifier) else {
            return Err(AuthError::MissingIdentifier);
        };

        if let Some(info) = self.tracker.get_lock_info(&key) {
            debug!(identifier = %key, retry_after = info.retry_after_seconds, "Rejected locked identifier");
            return Err(AuthError::Locked {
                retry_after_secs: info.retry_after_seconds,
                locked_until: info.locked_until,
                attempts: info.attempt_count,
            });
        }

        match self.verifier.verify(identifier, secret).await {
            Ok(Some(principal)) => {
                self.tracker.reset_on_success(&key);
                Ok(principal)
            },
            Ok(None) => {
                self.tracker.record_failure(&key);
                Err(AuthError::InvalidCredentials)
            },
            Err(e) => {
                error!(identifier = %key, error = %e, "Credential verification failed");
                Err(AuthError::Verifier(e))
            },
        }
    }
}
