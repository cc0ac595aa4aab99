//! Error handling for the 5S audit tracker
//!
//! This module defines the main error type used throughout the crate
//! and the mapping from errors to user-facing notification text.

use thiserror::Error;

/// Main error type for the audit tracker
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Document store error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Group not found: {group_id}")]
    GroupNotFound { group_id: String },

    #[error("Problem not found: {problem_id}")]
    ProblemNotFound { problem_id: String },

    #[error("Document not found: {collection}/{id}")]
    DocumentNotFound { collection: String, id: String },

    #[error("No group uses invite code {code}")]
    InvalidInviteCode { code: String },

    #[error("User is already a member of this group")]
    AlreadyMember,

    #[error("Photo could not be stored: {0}")]
    Photo(String),

    #[error("Report generation failed: {0}")]
    Report(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Local store error: {0}")]
    Storage(String),
}

/// Result type alias for audit tracker operations
pub type Result<T> = std::result::Result<T, AuditError>;

impl AuditError {
    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            AuditError::Database(_) => false,
            AuditError::Redis(_) => true,
            AuditError::Serialization(_) => false,
            AuditError::Io(_) => true,
            AuditError::Token(_) => false,
            AuditError::Config(_) => false,
            AuditError::Validation(_) => true,
            AuditError::PermissionDenied(_) => false,
            AuditError::Authentication(_) => true,
            AuditError::NotSignedIn => true,
            AuditError::GroupNotFound { .. } => false,
            AuditError::ProblemNotFound { .. } => false,
            AuditError::DocumentNotFound { .. } => false,
            AuditError::InvalidInviteCode { .. } => true,
            AuditError::AlreadyMember => false,
            AuditError::Photo(_) => true,
            AuditError::Report(_) => true,
            AuditError::ServiceUnavailable(_) => true,
            AuditError::Storage(_) => false,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AuditError::Database(_) | AuditError::Storage(_) => ErrorSeverity::Critical,
            AuditError::Config(_) => ErrorSeverity::Critical,
            AuditError::PermissionDenied(_) => ErrorSeverity::Warning,
            AuditError::Authentication(_) | AuditError::Token(_) => ErrorSeverity::Warning,
            AuditError::NotSignedIn => ErrorSeverity::Warning,
            AuditError::Validation(_) => ErrorSeverity::Info,
            AuditError::AlreadyMember | AuditError::InvalidInviteCode { .. } => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }

    /// Best-effort human readable reason for a transient notification.
    ///
    /// Matches on the underlying cause, never on the variant's own prefix,
    /// so messages bubbling up from the document store or the database get
    /// the same hints as our own. Unmatched errors keep their full text.
    pub fn user_message(&self) -> String {
        match self {
            AuditError::Validation(reason) => return reason.clone(),
            AuditError::NotSignedIn => return "Please sign in again".to_string(),
            AuditError::PermissionDenied(_) => {
                return "You do not have permission for this action".to_string()
            }
            _ => {}
        }

        let raw = self.to_string();
        let lower = self.cause().to_lowercase();

        if lower.contains("permission") {
            "You do not have permission for this action".to_string()
        } else if lower.contains("network")
            || lower.contains("unavailable")
            || lower.contains("connection")
            || lower.contains("timed out")
        {
            "Check your network connection and try again".to_string()
        } else if lower.contains("already a member") {
            "You are already a member of this group".to_string()
        } else if lower.contains("invite code") {
            "Invite code not found, check the code and try again".to_string()
        } else {
            raw
        }
    }

    fn cause(&self) -> String {
        match self {
            AuditError::Database(e) => e.to_string(),
            AuditError::Redis(e) => e.to_string(),
            AuditError::Serialization(e) => e.to_string(),
            AuditError::Io(e) => e.to_string(),
            AuditError::Token(e) => e.to_string(),
            AuditError::Config(message)
            | AuditError::Validation(message)
            | AuditError::PermissionDenied(message)
            | AuditError::Authentication(message)
            | AuditError::Photo(message)
            | AuditError::Report(message)
            | AuditError::ServiceUnavailable(message)
            | AuditError::Storage(message) => message.clone(),
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_hints() {
        let err = AuditError::PermissionDenied("only the auditor may change status".to_string());
        assert_eq!(err.user_message(), "You do not have permission for this action");

        let err = AuditError::ServiceUnavailable("network unreachable".to_string());
        assert_eq!(err.user_message(), "Check your network connection and try again");

        let err = AuditError::AlreadyMember;
        assert_eq!(err.user_message(), "You are already a member of this group");

        let err = AuditError::InvalidInviteCode { code: "123456".to_string() };
        assert_eq!(err.user_message(), "Invite code not found, check the code and try again");
    }

    #[test]
    fn test_variant_prefix_does_not_pick_the_hint() {
        let err = AuditError::Storage("Could not save the problem".to_string());
        assert_eq!(err.user_message(), "Local store error: Could not save the problem");

        let err =
            AuditError::ServiceUnavailable("Could not allocate a unique invite code".to_string());
        assert_eq!(
            err.user_message(),
            "Service unavailable: Could not allocate a unique invite code"
        );

        let err = AuditError::Storage("connection pool closed".to_string());
        assert_eq!(err.user_message(), "Check your network connection and try again");
    }

    #[test]
    fn test_user_message_falls_back_to_raw_text() {
        let err = AuditError::Report("page overflow".to_string());
        assert_eq!(err.user_message(), "Report generation failed: page overflow");

        let err = AuditError::Validation("Description is required".to_string());
        assert_eq!(err.user_message(), "Description is required");
    }

    #[test]
    fn test_severity() {
        assert_eq!(AuditError::Config("x".into()).severity(), ErrorSeverity::Critical);
        assert_eq!(AuditError::AlreadyMember.severity(), ErrorSeverity::Info);
        assert_eq!(ErrorSeverity::Warning.to_string(), "WARN");
    }

    #[test]
    fn test_recoverable() {
        assert!(AuditError::ServiceUnavailable("timeout".into()).is_recoverable());
        assert!(AuditError::NotSignedIn.is_recoverable());
        assert!(!AuditError::AlreadyMember.is_recoverable());
        assert!(!AuditError::Storage("disk full".into()).is_recoverable());
    }
}
