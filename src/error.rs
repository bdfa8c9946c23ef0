//! Error types for cogbot.

use thiserror::Error;

/// Main error type for cogbot operations.
///
/// User mistakes inside a live session (wrong page, occupied cell, failing
/// password) are not errors; they are reported as [`crate::session::Notice`]s.
#[derive(Error, Debug)]
pub enum CogbotError {
    /// Session with the given ID was not found (or was already detached).
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// Invalid session state transition attempted.
    #[error("invalid state transition from {from:?} to {to:?}")]
    InvalidStateTransition {
        from: crate::session::SessionState,
        to: crate::session::SessionState,
    },

    /// Malformed request input (empty page list, self-challenge, unknown feature).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The invoking member lacks the required permission.
    #[error("missing permission: {0}")]
    PermissionDenied(String),

    /// The feature is switched off for the guild.
    #[error("feature disabled in this guild: {0}")]
    FeatureDisabled(String),

    /// A page or board could not be rendered into a message.
    #[error("render failed: {0}")]
    Render(String),

    /// No conversation is waiting for input from this user in this channel.
    #[error("no active conversation for {0}")]
    ConversationNotFound(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted settings could not be (de)serialized.
    #[error("settings serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal lock was poisoned.
    #[error("internal lock poisoned")]
    LockPoisoned,
}

/// Convenience Result type for cogbot operations.
pub type Result<T> = std::result::Result<T, CogbotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_not_found_display() {
        let err = CogbotError::SessionNotFound("sess-00000001".into());
        assert!(err.to_string().contains("sess-00000001"));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_permission_denied_display() {
        let err = CogbotError::PermissionDenied("MANAGE_GUILD".into());
        assert!(err.to_string().contains("MANAGE_GUILD"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CogbotError = io_err.into();
        assert!(matches!(err, CogbotError::Io(_)));
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{ nope").unwrap_err();
        let err: CogbotError = json_err.into();
        assert!(matches!(err, CogbotError::Serialization(_)));
    }
}
