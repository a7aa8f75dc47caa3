// crates/authguard-lib/src/error.rs

//! Central error types.
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Configuration and startup errors
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CFG_001",
            AppError::InvalidSetting(_) => "CFG_002",
            AppError::Io(_) => "IO_001",
            AppError::Json(_) => "JSON_001",
        }
    }
}

impl From<figment::Error> for AppError {
    fn from(err: figment::Error) -> Self {
        AppError::Config(Box::new(err))
    }
}

/// Outcome of a rejected authentication attempt
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Identifier locked for another {retry_after_secs}s after {attempts} failed attempts")]
    Locked {
        retry_after_secs: u64,
        locked_until: DateTime<Utc>,
        attempts: u32,
    },

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Missing identifier")]
    MissingIdentifier,

    #[error("Credential verifier failed: {0}")]
    Verifier(#[source] anyhow::Error),
}

impl AuthError {
    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "AUTH_001",
            AuthError::MissingIdentifier => "AUTH_002",
            AuthError::Locked { .. } => "AUTH_003",
            AuthError::Verifier(_) => "INT_001",
        }
    }

    /// Get a message safe to show to the client.
    ///
    /// Never distinguishes unknown identifiers from wrong secrets.
    pub fn sanitized_message(&self) -> String {
        match self {
            AuthError::InvalidCredentials | AuthError::MissingIdentifier => {
                "Authentication failed".to_string()
            },
            AuthError::Locked { retry_after_secs, .. } => format!(
                "Too many failed attempts, try again in {retry_after_secs} seconds"
            ),
            AuthError::Verifier(_) => "An internal server error occurred".to_string(),
        }
    }

    /// Seconds the client should wait, for a `Retry-After` style hint
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            AuthError::Locked { retry_after_secs, .. } => Some(*retry_after_secs),
            _ => None,
        }
    }

    pub fn is_locked(&self) -> bool {
        matches!(self, AuthError::Locked { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error as IoError, ErrorKind};

    fn locked() -> AuthError {
        AuthError::Locked {
            retry_after_secs: 42,
            locked_until: Utc::now(),
            attempts: 6,
        }
    }

    #[test]
    fn test_auth_error_display() {
        assert_eq!(
            locked().to_string(),
            "Identifier locked for another 42s after 6 failed attempts"
        );
        assert_eq!(AuthError::InvalidCredentials.to_string(), "Invalid credentials");

        let err = AuthError::Verifier(anyhow::anyhow!("db down"));
        assert_eq!(err.to_string(), "Credential verifier failed: db down");
    }

    #[test]
    fn test_auth_error_codes() {
        assert_eq!(AuthError::InvalidCredentials.error_code(), "AUTH_001");
        assert_eq!(AuthError::MissingIdentifier.error_code(), "AUTH_002");
        assert_eq!(locked().error_code(), "AUTH_003");
        assert_eq!(
            AuthError::Verifier(anyhow::anyhow!("x")).error_code(),
            "INT_001"
        );
    }

    #[test]
    fn test_sanitized_messages_do_not_leak() {
        assert_eq!(
            AuthError::InvalidCredentials.sanitized_message(),
            AuthError::MissingIdentifier.sanitized_message()
        );
        assert!(locked().sanitized_message().contains("42 seconds"));
        assert!(!AuthError::Verifier(anyhow::anyhow!("db password is hunter2"))
            .sanitized_message()
            .contains("hunter2"));
    }

    #[test]
    fn test_retry_after() {
        assert_eq!(locked().retry_after_secs(), Some(42));
        assert!(locked().is_locked());
        assert_eq!(AuthError::InvalidCredentials.retry_after_secs(), None);
        assert!(!AuthError::InvalidCredentials.is_locked());
    }

    #[test]
    fn test_app_error_from_impls() {
        let io_err = IoError::new(ErrorKind::PermissionDenied, "Permission denied");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));
        assert_eq!(app_err.error_code(), "IO_001");

        let json_err: serde_json::Error =
            serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let app_err: AppError = json_err.into();
        assert!(matches!(app_err, AppError::Json(_)));

        let invalid = AppError::InvalidSetting("threshold".to_string());
        assert_eq!(invalid.to_string(), "Invalid setting: threshold");
        assert_eq!(invalid.error_code(), "CFG_002");
    }
}
