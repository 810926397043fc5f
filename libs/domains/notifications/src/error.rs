//! Error types for the notifications domain.

use thiserror::Error;

/// Result type for notification operations.
pub type NotifyResult<T> = Result<T, NotificationError>;

/// Result type for conversation transport calls.
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors that can occur in the notifications domain.
///
/// These never escape a dispatch call; the dispatcher folds them into a
/// [`NotificationResult`](crate::models::NotificationResult). They do escape
/// the event-level operations when a collaborator fails before dispatch.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// No recruiter with this id exists.
    #[error("Recruiter not found: {0}")]
    RecruiterNotFound(i32),

    /// Template rendering error.
    #[error("Template rendering error: {0}")]
    TemplateError(String),

    /// The identity-resolution service failed.
    #[error("Identity resolution error: {0}")]
    Identity(String),

    /// The conversation transport rejected a call.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// An existing conversation reported no members to address.
    #[error("Conversation {0} has no members")]
    NoConversationMembers(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The caller cancelled the operation.
    #[error("Operation cancelled")]
    Cancelled,

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<handlebars::RenderError> for NotificationError {
    fn from(err: handlebars::RenderError) -> Self {
        NotificationError::TemplateError(err.to_string())
    }
}

impl From<handlebars::TemplateError> for NotificationError {
    fn from(err: handlebars::TemplateError) -> Self {
        NotificationError::TemplateError(err.to_string())
    }
}

impl From<serde_json::Error> for NotificationError {
    fn from(err: serde_json::Error) -> Self {
        NotificationError::Internal(format!("JSON serialization error: {}", err))
    }
}

impl From<reqwest::Error> for NotificationError {
    fn from(err: reqwest::Error) -> Self {
        NotificationError::Transport(TransportError::from(err))
    }
}

impl From<core_config::ConfigError> for NotificationError {
    fn from(err: core_config::ConfigError) -> Self {
        NotificationError::ConfigError(err.to_string())
    }
}

/// Coarse classification of a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The platform refused the call for this bot, typically because the
    /// recipient has not installed it.
    Forbidden,
    Other,
}

/// Structured error returned by a [`ConversationTransport`](crate::providers::ConversationTransport).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Transport error ({kind:?}): {detail}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub detail: String,
}

impl TransportError {
    pub fn forbidden(detail: impl Into<String>) -> Self {
        Self {
            kind: TransportErrorKind::Forbidden,
            detail: detail.into(),
        }
    }

    pub fn other(detail: impl Into<String>) -> Self {
        Self {
            kind: TransportErrorKind::Other,
            detail: detail.into(),
        }
    }

    pub fn is_forbidden(&self) -> bool {
        self.kind == TransportErrorKind::Forbidden
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) if status == reqwest::StatusCode::FORBIDDEN => TransportError::forbidden(err.to_string()),
            _ => TransportError::other(err.to_string()),
        }
    }
}
