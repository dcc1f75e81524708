//! # Request Context Module
//!
//! The per-request state container at the heart of the execution core.
//!
//! ## Overview
//!
//! A [`RequestContext`] carries everything one request needs while the handler
//! chain runs:
//!
//! - the inbound request handle and the guarded response sink,
//! - the handler-chain cursor driving cooperative dispatch,
//! - path parameters from the external matcher,
//! - request-scoped scratch data writable by any handler,
//! - the committed flag observed through the response guard.
//!
//! ## Lifecycle
//!
//! Contexts are acquired from a [`ContextPool`](crate::pool::ContextPool) when
//! a request arrives, mutated throughout chain execution, and released back
//! after the chain completes or panics. At release every external reference is
//! cleared so no handler can retain stale data from a prior request.
//!
//! ## Failure containment
//!
//! [`RequestContext::dispatch`] is the recovery boundary: validation failures
//! returned by handlers are routed through the normal fail path, and panics at
//! any cursor position are caught, stack-traced, and resolved to a response.
//! A fault is always contained to its single request, never the serving
//! process.

mod core;

pub use core::{RequestContext, SCRATCH_PANIC_KEY};
