//! Inbound request handle and inline parameter/header storage.
//!
//! The transport layer builds one [`Request`] per inbound request and hands it
//! to the pool at acquisition. The core treats it as opaque data: it reads the
//! path for log fields and envelope messages, and exposes params/headers to
//! handlers, but never parses HTTP framing itself.

use crate::ids::RequestId;
use http::Method;
use serde_json::Value;
use smallvec::SmallVec;
use std::sync::Arc;

/// Maximum number of path parameters before heap allocation.
/// Most REST paths have ≤4 params (e.g. `/users/{id}/posts/{post_id}`).
pub const MAX_INLINE_PARAMS: usize = 8;

/// Maximum inline headers before heap allocation.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated parameter storage.
///
/// Param names use `Arc<str>` because they come from the static route table
/// and clone with an atomic increment; values are per-request data.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Stack-allocated header storage, same key/value split as [`ParamVec`].
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// One inbound request as seen by the execution core.
#[derive(Debug, Clone)]
pub struct Request {
    /// Unique request ID for log correlation.
    pub id: RequestId,
    /// HTTP method.
    pub method: Method,
    /// Request path, used verbatim in failure envelopes and log fields.
    pub path: String,
    /// HTTP headers (stack-allocated for ≤16 headers).
    pub headers: HeaderVec,
    /// Request body parsed by the transport, if present.
    pub body: Option<Value>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            id: RequestId::new(),
            method,
            path: path.into(),
            headers: HeaderVec::new(),
            body: None,
        }
    }

    /// Get a header by name (case-insensitive per RFC 7230).
    #[inline]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Take the body out of the request, leaving `None`.
    pub fn take_body(&mut self) -> Option<Value> {
        self.body.take()
    }
}

/// Look up a parameter by name with "last write wins" semantics: duplicate
/// names at different path depths (e.g. `/org/{id}/user/{id}`) resolve to the
/// last occurrence.
#[inline]
pub(crate) fn lookup_param<'a>(params: &'a ParamVec, name: &str) -> Option<&'a str> {
    params
        .iter()
        .rfind(|(k, _)| k.as_ref() == name)
        .map(|(_, v)| v.as_str())
}
