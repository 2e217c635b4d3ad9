//! Request-visible error taxonomy.
//!
//! Only negotiation and validation failures are expected to reach the end
//! user as structured responses. Lifecycle, health-check, and sink failures
//! are operational: they are logged where they occur and never surface here.

use std::fmt;

/// An error carrying HTTP status semantics, produced during negotiation or
/// by a resource's handling logic.
#[derive(Debug)]
pub enum ServiceError {
    /// No registered provider can read the request's `Content-Type` (HTTP 415)
    UnsupportedMediaType {
        /// The offending media type, or empty when the header was absent
        media_type: String,
    },
    /// No registered provider can write any type listed in `Accept` (HTTP 406)
    NotAcceptable {
        /// The request's `Accept` header as received
        accept: String,
    },
    /// Entity failed structural or semantic validation (HTTP 400/422)
    Validation {
        /// Status to surface, 400 or 422
        status: u16,
        /// Human-readable description of the failure
        message: String,
    },
    /// Failure raised by application logic behind a resource (HTTP 500)
    Internal {
        /// Description logged and echoed in the error body
        message: String,
    },
}

impl ServiceError {
    /// Shorthand for a 400 validation error.
    #[must_use]
    pub fn bad_request(message: &str) -> Self {
        ServiceError::Validation {
            status: 400,
            message: message.to_string(),
        }
    }

    /// Shorthand for a 422 validation error.
    #[must_use]
    pub fn unprocessable(message: &str) -> Self {
        ServiceError::Validation {
            status: 422,
            message: message.to_string(),
        }
    }

    /// The HTTP status this error surfaces as.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            ServiceError::UnsupportedMediaType { .. } => 415,
            ServiceError::NotAcceptable { .. } => 406,
            ServiceError::Validation { status, .. } => *status,
            ServiceError::Internal { .. } => 500,
        }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::UnsupportedMediaType { media_type } => {
                write!(f, "unsupported media type '{media_type}'")
            }
            ServiceError::NotAcceptable { accept } => {
                write!(f, "no writer satisfies Accept '{accept}'")
            }
            ServiceError::Validation { status, message } => {
                write!(f, "validation failed ({status}): {message}")
            }
            ServiceError::Internal { message } => {
                write!(f, "internal error: {message}")
            }
        }
    }
}

impl std::error::Error for ServiceError {}

/// Extract a human-readable message from a `catch_unwind` payload.
///
/// String and `&str` payloads keep their text; anything else collapses to
/// the given fallback.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send), fallback: &str) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        fallback.to_string()
    }
}
