//! Error types for WAF Console.
//!
//! Every backend call resolves to a payload or to exactly one of these
//! variants; the gateway is the only place that constructs the
//! business and transport variants.

use thiserror::Error;

/// Classification of a transport-level failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Transport status 401 with no usable envelope.
    Unauthenticated,
    /// Transport status 403.
    Forbidden,
    /// Transport status 404.
    NotFound,
    /// Transport status 5xx.
    ServerFault,
    /// No reply within the dispatch deadline.
    Timeout,
    /// Connection refused, DNS failure, reset, etc.
    Network,
    /// Anything else, including 2xx replies that are not a valid envelope.
    Unknown,
}

impl TransportErrorKind {
    /// Map a non-2xx transport status to its kind.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => TransportErrorKind::Unauthenticated,
            403 => TransportErrorKind::Forbidden,
            404 => TransportErrorKind::NotFound,
            500..=599 => TransportErrorKind::ServerFault,
            _ => TransportErrorKind::Unknown,
        }
    }

    /// Message shown to the user for this kind of failure.
    pub fn user_message(&self) -> &'static str {
        match self {
            TransportErrorKind::Unauthenticated => "Session expired, please sign in again",
            TransportErrorKind::Forbidden => "Access denied",
            TransportErrorKind::NotFound => "The requested resource was not found",
            TransportErrorKind::ServerFault => "Server error, please try again later",
            TransportErrorKind::Timeout => "Request timed out",
            TransportErrorKind::Network => "Network error",
            TransportErrorKind::Unknown => "Request failed",
        }
    }
}

impl std::fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TransportErrorKind::Unauthenticated => "unauthenticated",
            TransportErrorKind::Forbidden => "forbidden",
            TransportErrorKind::NotFound => "not_found",
            TransportErrorKind::ServerFault => "server_fault",
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::Network => "network",
            TransportErrorKind::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}

/// A classified transport failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    pub kind: TransportErrorKind,
    /// Transport status, when a reply was received at all.
    pub status: Option<u16>,
    pub detail: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, status: Option<u16>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            status,
            detail: detail.into(),
        }
    }
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(
                f,
                "{} transport error (HTTP {}): {}",
                self.kind, status, self.detail
            ),
            None => write!(f, "{} transport error: {}", self.kind, self.detail),
        }
    }
}

impl std::error::Error for TransportError {}

/// Unified error type for WAF Console operations.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// The backend replied with an envelope whose code is not the success sentinel.
    #[error("Business error {code}: {message}")]
    Business { code: i64, message: String },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Session persistence error: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConsoleError {
    /// Whether this error was classified as session-loss.
    pub fn is_session_loss(&self) -> bool {
        match self {
            ConsoleError::Business { code, .. } => *code == crate::gateway::UNAUTHENTICATED_CODE,
            ConsoleError::Transport(e) => e.kind == TransportErrorKind::Unauthenticated,
            _ => false,
        }
    }
}

/// Result type alias for console operations.
pub type ConsoleResult<T> = Result<T, ConsoleError>;
