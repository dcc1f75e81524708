//! Error taxonomy for the request path.
//!
//! Three distinct failure channels exist per request:
//!
//! - [`ServerError`]: a handled application failure constructed deliberately
//!   by handler code; always carries an HTTP status and always resolves to a
//!   fail-path response.
//! - [`ValidationError`]: the expected fault kind for input validation;
//!   propagated as an ordinary `Err` return up the chain and routed through
//!   the fail path without stack-trace noise.
//! - Panics: the unexpected fault channel, contained by the recovery
//!   boundary in [`crate::context::RequestContext::recover`].
//!
//! [`ContextError`] is separate: it is the conflict error surfaced by
//! `write_status_only` when a response was already committed, for callers that
//! compose it with their own error handling.

use std::fmt;
use std::io;

/// A handled application failure carrying its HTTP status code.
///
/// `Display` prints the bare message, not the status; the fail path prefixes
/// the request path when building the response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerError {
    status: u16,
    message: String,
}

impl ServerError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(400, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(401, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(403, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(404, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(409, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(500, message)
    }

    /// The declared HTTP status for the fail-path response.
    #[inline]
    pub fn status_code(&self) -> u16 {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ServerError {}

/// Expected input-validation failure, signalled by a handler returning
/// `Err(ValidationError)` from the chain.
///
/// Defaults to 400 Bad Request; `with_status` covers schemes that prefer 422.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    status: u16,
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: 400,
            message: message.into(),
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    #[inline]
    pub fn status_code(&self) -> u16 {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for ServerError {
    fn from(err: ValidationError) -> Self {
        ServerError::new(err.status, err.message)
    }
}

/// Error surfaced by the status-only write path.
#[derive(Debug)]
pub enum ContextError {
    /// The response was already committed; the second write was not performed.
    AlreadyCommitted,
    /// No response sink is bound (the context is between release and acquire).
    NotBound,
    /// The transport sink failed while writing.
    Io(io::Error),
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextError::AlreadyCommitted => f.write_str("response already committed"),
            ContextError::NotBound => f.write_str("no response sink bound"),
            ContextError::Io(err) => write!(f, "sink write failed: {err}"),
        }
    }
}

impl std::error::Error for ContextError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ContextError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ContextError {
    fn from(err: io::Error) -> Self {
        ContextError::Io(err)
    }
}
