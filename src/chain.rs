//! # Handler Chain
//!
//! An ordered, immutable-per-request list of handler functions plus an
//! optional panic handler.
//!
//! ## Control transfer
//!
//! Dispatch is cooperative, single-threaded and synchronous within one
//! request: the transport calls [`RequestContext::dispatch`] once, which
//! advances the cursor to position 0 and invokes that handler. Each handler
//! either terminates the chain by writing a response, or yields downstream by
//! calling [`RequestContext::advance`], a direct, blocking call into the next
//! handler rather than a scheduled invocation, and resumes its own
//! post-processing
//! when the downstream returns.
//!
//! If the chain is exhausted without any handler committing a response, the
//! request completes silently uncommitted; the transport decides what that
//! means (typically a 404 fallthrough).
//!
//! ## Sharing
//!
//! A chain is built once at startup, wrapped in an `Arc`, and read-only from
//! then on; unlimited concurrent requests may reference it.
//!
//! ```rust
//! use chaincore::chain::HandlerChain;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let chain = Arc::new(
//!     HandlerChain::new()
//!         .handle(|ctx| {
//!             // pre-processing, then yield downstream
//!             ctx.advance()?;
//!             // post-processing runs after downstream handlers return
//!             Ok(())
//!         })
//!         .handle(|ctx| {
//!             ctx.succeed(&json!({ "hello": "world" }));
//!             Ok(())
//!         }),
//! );
//! assert_eq!(chain.len(), 2);
//! ```
//!
//! [`RequestContext::dispatch`]: crate::context::RequestContext::dispatch
//! [`RequestContext::advance`]: crate::context::RequestContext::advance

use crate::context::RequestContext;
use crate::error::ValidationError;

/// Result returned by every chain handler.
///
/// `Err(ValidationError)` is the expected-failure channel: it propagates up
/// through the `advance()` calls of upstream handlers (use `?`) and is routed
/// through the normal fail path by dispatch, with no stack trace.
pub type HandlerResult = Result<(), ValidationError>;

/// One step of middleware logic with shared access to the request context.
pub type Handler = Box<dyn Fn(&mut RequestContext) -> HandlerResult + Send + Sync>;

/// Ordered sequence of handlers driven by the context cursor.
pub struct HandlerChain {
    handlers: Vec<Handler>,
    panic_handler: Option<Handler>,
}

impl HandlerChain {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            panic_handler: None,
        }
    }

    /// Append a handler. Handlers run in insertion order.
    pub fn handle<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut RequestContext) -> HandlerResult + Send + Sync + 'static,
    {
        self.handlers.push(Box::new(handler));
        self
    }

    /// Install the distinguished panic handler, invoked by the recovery
    /// boundary when an uncommitted request panics. The panic message is
    /// available under the `"panic"` scratch key.
    pub fn panic_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut RequestContext) -> HandlerResult + Send + Sync + 'static,
    {
        self.panic_handler = Some(Box::new(handler));
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    #[inline]
    pub(crate) fn handler(&self, index: usize) -> Option<&Handler> {
        self.handlers.get(index)
    }

    #[inline]
    pub(crate) fn custom_panic_handler(&self) -> Option<&Handler> {
        self.panic_handler.as_ref()
    }
}

impl Default for HandlerChain {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HandlerChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerChain")
            .field("handlers", &self.handlers.len())
            .field("panic_handler", &self.panic_handler.is_some())
            .finish()
    }
}
