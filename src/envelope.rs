//! Structured success/failure envelopes returned to clients.
//!
//! The wire shape is a fixed contract: field order is declaration order under
//! serde, so a success body is always `{"ok":true,"data":...}` and a failure
//! body `{"ok":false,"message":"..."}`, byte for byte.

use serde::Serialize;

/// Success envelope: `{"ok":true,"data":<payload>}`.
///
/// The payload is opaque to the core; the serializer must handle whatever
/// concrete shape the handler supplies at runtime.
#[derive(Debug, Serialize)]
pub struct Success<'a, T: Serialize> {
    pub ok: bool,
    pub data: &'a T,
}

impl<'a, T: Serialize> Success<'a, T> {
    pub fn new(data: &'a T) -> Self {
        Self { ok: true, data }
    }
}

/// Failure envelope: `{"ok":false,"message":"<path>: <error text>"}`.
#[derive(Debug, Serialize)]
pub struct Failure<'a> {
    pub ok: bool,
    pub message: &'a str,
}

impl<'a> Failure<'a> {
    pub fn new(message: &'a str) -> Self {
        Self { ok: false, message }
    }
}

/// Serialize a success envelope to its wire bytes.
pub fn success_body<T: Serialize>(data: &T) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(&Success::new(data))
}

/// Serialize a failure envelope to its wire bytes.
pub fn failure_body(message: &str) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(&Failure::new(message))
}
