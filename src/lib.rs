//! # chaincore
//!
//! **chaincore** is the per-request execution core of a coroutine-powered HTTP
//! middleware framework: pooled request contexts, a cooperative handler chain,
//! a single-write guarantee for the response, and panic-safe recovery that
//! resolves uncaught faults into well-formed error responses.
//!
//! ## Overview
//!
//! chaincore deliberately owns only the hard part of serving a request:
//! object lifecycle and reuse, mutable shared state across a handler chain,
//! and failure containment under concurrent requests. Everything around it is
//! an external collaborator: the HTTP listener/transport supplies a request
//! handle and a raw response sink per invocation, a route matcher supplies
//! pre-extracted path parameters, serde handles JSON encoding, and `tracing`
//! subscribers consume the structured log events.
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//!
//! - **[`context`]** - Per-request state container and its public contract
//!   (`succeed`, `fail`, `advance`, recovery)
//! - **[`chain`]** - Ordered handler list with cooperative, synchronous
//!   control transfer and an optional panic handler
//! - **[`pool`]** - Concurrent acquire/release recycling of contexts with
//!   occupancy metrics
//! - **[`sink`]** - Transport response-sink capability trait and the
//!   commit-observing guard
//! - **[`envelope`]** - Structured `{ok, data}` / `{ok, message}` response
//!   envelopes
//! - **[`error`]** - Status-carrying application errors, validation faults,
//!   and write-conflict errors
//! - **[`request`]** - Inbound request handle with inline param/header storage
//! - **[`ids`]** - ULID-backed request identifiers for log correlation
//!
//! ### Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Transport
//!     participant Pool as ContextPool
//!     participant Ctx as RequestContext
//!     participant A as Handler A
//!     participant B as Handler B
//!
//!     Transport->>Pool: acquire(request, sink)
//!     Pool-->>Transport: RequestContext (guarded sink, cursor before first)
//!     Transport->>Ctx: set_params(params)
//!     Transport->>Ctx: dispatch()
//!     Ctx->>A: advance() → invoke position 0
//!     A->>Ctx: advance() → yield downstream
//!     Ctx->>B: invoke position 1
//!     B->>Ctx: succeed(data) → 200 {"ok":true,"data":...}
//!     B-->>A: return (post-processing resumes)
//!     alt Handler panics
//!         Ctx->>Ctx: recover() → backtrace, 500 fallback
//!     end
//!     Transport->>Pool: release(ctx) → references cleared, recycled
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use chaincore::chain::HandlerChain;
//! use chaincore::pool::ContextPool;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let chain = Arc::new(HandlerChain::new().handle(|ctx| {
//!     ctx.succeed(&json!({ "message": "hello" }));
//!     Ok(())
//! }));
//!
//! // One pool per process, constructed at server start.
//! let pool = ContextPool::new(chain);
//! // Per request: let mut ctx = pool.acquire(request, sink);
//! //              ctx.dispatch();
//! //              pool.release(ctx);
//! ```
//!
//! ## Runtime Considerations
//!
//! chaincore targets the `may` coroutine runtime: chain execution is strictly
//! sequential and synchronous within the coroutine serving a request, and the
//! pool's free list blocks only the contending coroutine. Nothing in the core
//! suspends; blocking I/O inside handlers is the handler's own concern.
//!
//! ## Failure Containment
//!
//! Every failure resolves to a terminal HTTP response at the request
//! boundary. Validation failures travel as ordinary `Err` returns and produce
//! fail-path responses without stack traces; panics are caught at the dispatch
//! boundary, stack-traced at error severity, and answered with a generic 500
//! unless the chain installs a custom panic handler. A fault never escalates
//! past the request that raised it.

pub mod chain;
pub mod context;
pub mod envelope;
pub mod error;
pub mod ids;
pub mod pool;
pub mod request;
pub mod sink;

pub use chain::{Handler, HandlerChain, HandlerResult};
pub use context::{RequestContext, SCRATCH_PANIC_KEY};
pub use error::{ContextError, ServerError, ValidationError};
pub use pool::{ContextPool, PoolConfig, PoolMetrics};
pub use request::{HeaderVec, ParamVec, Request, MAX_INLINE_HEADERS, MAX_INLINE_PARAMS};
pub use sink::{reason_phrase, GuardedSink, ResponseSink};
