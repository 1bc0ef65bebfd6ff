//! Response envelope handling and outcome classification.
//!
//! `classify` is pure: it turns whatever came back from the transport
//! into exactly one tagged [`Outcome`] and has no side effects. The
//! gateway applies side effects (notices, session-loss recovery) based
//! on the outcome.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{TransportError, TransportErrorKind};
use crate::gateway::{RawResponse, TransportFailure, SUCCESS_CODE, UNAUTHENTICATED_CODE};

/// Uniform JSON wrapper of every non-binary backend reply.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    pub code: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Value,
}

/// Classified result of one dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Envelope with the success code; carries `data` untouched.
    Success(Value),
    /// Binary dispatch; the reply is passed through as received.
    Binary(RawResponse),
    /// Envelope with any other code.
    BusinessError { code: i64, message: String },
    /// No usable envelope.
    TransportError(TransportError),
}

impl Outcome {
    /// Whether this outcome means the backend no longer accepts the credential.
    pub fn is_session_loss(&self) -> bool {
        match self {
            Outcome::BusinessError { code, .. } => *code == UNAUTHENTICATED_CODE,
            Outcome::TransportError(e) => e.kind == TransportErrorKind::Unauthenticated,
            _ => false,
        }
    }
}

/// Classify a transport reply.
pub fn classify(reply: Result<RawResponse, TransportFailure>, binary: bool) -> Outcome {
    let response = match reply {
        Ok(response) => response,
        Err(TransportFailure::Timeout) => {
            return Outcome::TransportError(TransportError::new(
                TransportErrorKind::Timeout,
                None,
                TransportFailure::Timeout.to_string(),
            ))
        }
        Err(TransportFailure::Network(detail)) => {
            return Outcome::TransportError(TransportError::new(
                TransportErrorKind::Network,
                None,
                detail,
            ))
        }
    };

    if binary {
        return Outcome::Binary(response);
    }

    let status = response.status;
    match serde_json::from_slice::<Envelope>(&response.body) {
        Ok(envelope) if envelope.code != SUCCESS_CODE => Outcome::BusinessError {
            code: envelope.code,
            message: envelope.message.unwrap_or_default(),
        },
        Ok(envelope) if response.is_success() => Outcome::Success(envelope.data),
        Ok(_) => Outcome::TransportError(TransportError::new(
            TransportErrorKind::from_status(status),
            Some(status),
            "success envelope on a failed transport status",
        )),
        Err(e) if response.is_success() => Outcome::TransportError(TransportError::new(
            TransportErrorKind::Unknown,
            Some(status),
            format!("malformed response envelope: {}", e),
        )),
        Err(_) => Outcome::TransportError(TransportError::new(
            TransportErrorKind::from_status(status),
            Some(status),
            body_excerpt(&response.body),
        )),
    }
}

fn body_excerpt(body: &[u8]) -> String {
    const MAX: usize = 200;
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.chars().count() > MAX {
        format!("{}...", text.chars().take(MAX).collect::<String>())
    } else {
        text.to_string()
    }
}
