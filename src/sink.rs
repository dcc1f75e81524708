//! Response sink abstraction and the commit-observing guard.
//!
//! The transport layer hands the core a raw sink per request. The core never
//! writes to it directly: every sink is wrapped in a [`GuardedSink`] that flips
//! the committed flag before delegating, so "has anything been sent to the
//! client" is observable without trusting handler discipline. The guard is a
//! pass-through observer, not a response buffer.

use http::StatusCode;
use std::io;

/// Capability set required of a transport response sink.
///
/// Implemented by the transport layer over its own connection type; the core
/// only ever sees the trait object. Header mutation is separated from body
/// writes because removing a header after the status line has gone out is
/// meaningless.
pub trait ResponseSink {
    /// Write the status line. `reason` is the standard reason phrase resolved
    /// by the caller.
    fn write_status(&mut self, status: u16, reason: &'static str) -> io::Result<()>;

    /// Write body bytes, returning the number of bytes accepted.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Set or replace a response header.
    fn set_header(&mut self, name: &str, value: &str);

    /// Remove a response header if present.
    fn remove_header(&mut self, name: &str);
}

/// Standard English reason phrase for a status code.
///
/// Returns `""` for codes without a registered phrase, mirroring
/// `http.StatusText` semantics so a bare-status body degrades to empty rather
/// than inventing text.
pub fn reason_phrase(status: u16) -> &'static str {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or("")
}

/// Decorator that observes the first status/body write on a sink.
///
/// The committed flag transitions false→true at most once per request; header
/// mutation does not commit. Delegate results are returned unchanged.
pub struct GuardedSink {
    inner: Box<dyn ResponseSink + Send>,
    committed: bool,
}

impl GuardedSink {
    pub fn new(inner: Box<dyn ResponseSink + Send>) -> Self {
        Self {
            inner,
            committed: false,
        }
    }

    /// Whether any status line or body byte has been sent.
    #[inline]
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Write the status line, resolving the standard reason phrase, and mark
    /// the response committed before delegating.
    pub fn write_status(&mut self, status: u16) -> io::Result<()> {
        self.committed = true;
        self.inner.write_status(status, reason_phrase(status))
    }

    /// Write body bytes, marking the response committed before delegating.
    pub fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.committed = true;
        self.inner.write(buf)
    }

    pub fn set_header(&mut self, name: &str, value: &str) {
        self.inner.set_header(name, value);
    }

    pub fn remove_header(&mut self, name: &str) {
        self.inner.remove_header(name);
    }
}

impl std::fmt::Debug for GuardedSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardedSink")
            .field("committed", &self.committed)
            .finish_non_exhaustive()
    }
}
