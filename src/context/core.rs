use crate::chain::HandlerChain;
use crate::envelope;
use crate::error::{ContextError, ServerError, ValidationError};
use crate::ids::RequestId;
use crate::request::{lookup_param, ParamVec, Request};
use crate::sink::{reason_phrase, GuardedSink, ResponseSink};
use serde::Serialize;
use serde_json::Value;
use std::any::Any;
use std::backtrace::Backtrace;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Scratch key under which the recovery boundary exposes the panic message to
/// a custom panic handler.
pub const SCRATCH_PANIC_KEY: &str = "panic";

/// Per-request state container shared by every handler in the chain.
///
/// Exactly one context is bound to exactly one in-flight request at a time;
/// the pool guarantees an instance is never live for two requests at once.
pub struct RequestContext {
    request: Option<Request>,
    sink: Option<GuardedSink>,
    /// Handler-chain cursor. `None` is the "before first" sentinel; the value
    /// only ever increases within one request.
    cursor: Option<usize>,
    chain: Arc<HandlerChain>,
    params: ParamVec,
    scratch: HashMap<String, Value>,
}

impl RequestContext {
    /// Bind a fresh context for one request. Transports that do not pool go
    /// through here; [`ContextPool::acquire`](crate::pool::ContextPool::acquire)
    /// reuses released instances instead.
    pub fn new(
        chain: Arc<HandlerChain>,
        request: Request,
        sink: Box<dyn ResponseSink + Send>,
    ) -> Self {
        Self {
            request: Some(request),
            sink: Some(GuardedSink::new(sink)),
            cursor: None,
            chain,
            params: ParamVec::new(),
            scratch: HashMap::new(),
        }
    }

    /// Whether the response has begun being sent. Pure observer.
    #[inline]
    pub fn is_committed(&self) -> bool {
        self.sink.as_ref().is_some_and(GuardedSink::is_committed)
    }

    /// The bound request, if any.
    pub fn request(&self) -> Option<&Request> {
        self.request.as_ref()
    }

    /// Request path, or `""` between release and the next acquire.
    pub fn path(&self) -> &str {
        self.request.as_ref().map_or("", |r| r.path.as_str())
    }

    /// Request ID for log correlation, or the nil ID between release and the
    /// next acquire. Every event the context emits carries this field.
    pub fn request_id(&self) -> RequestId {
        self.request.as_ref().map_or_else(RequestId::nil, |r| r.id)
    }

    /// The chain bound to this context.
    pub fn chain(&self) -> &Arc<HandlerChain> {
        &self.chain
    }

    /// Bind path parameters produced by the external matcher.
    pub fn set_params(&mut self, params: ParamVec) {
        self.params = params;
    }

    pub fn params(&self) -> &ParamVec {
        &self.params
    }

    /// Value of a path parameter, `""` if absent. Duplicate names resolve to
    /// the last occurrence.
    pub fn param(&self, key: &str) -> &str {
        lookup_param(&self.params, key).unwrap_or("")
    }

    /// Read a request-scoped scratch value.
    pub fn scratch(&self, key: &str) -> Option<&Value> {
        self.scratch.get(key)
    }

    /// Store a request-scoped scratch value, visible to downstream handlers
    /// and discarded at release.
    pub fn set_scratch(&mut self, key: impl Into<String>, value: Value) {
        self.scratch.insert(key.into(), value);
    }

    /// Write the success envelope `{"ok":true,"data":<data>}` with status 200.
    ///
    /// Fire-and-forget: if the response is already committed this logs a
    /// warning and drops the write; serialization and sink errors are logged,
    /// never propagated.
    pub fn succeed<T: Serialize>(&mut self, data: &T) {
        if self.is_committed() {
            warn!(
                request_id = %self.request_id(),
                path = %self.path(),
                "success dropped: response already committed"
            );
            return;
        }
        let body = match envelope::success_body(data) {
            Ok(body) => body,
            Err(err) => {
                warn!(
                    request_id = %self.request_id(),
                    path = %self.path(),
                    error = %err,
                    "failed to serialize success envelope"
                );
                return;
            }
        };
        self.write_envelope(200, &body);
    }

    /// Write the failure envelope `{"ok":false,"message":"<path>: <error>"}`
    /// with the error's declared status.
    ///
    /// Same fire-and-forget policy as [`succeed`](Self::succeed). Every
    /// deliberate failure is logged at warning severity regardless of status;
    /// validation failures routed by [`dispatch`](Self::dispatch) stay at
    /// debug instead.
    pub fn fail(&mut self, err: &ServerError) {
        if self.is_committed() {
            warn!(
                request_id = %self.request_id(),
                path = %self.path(),
                "failure dropped: response already committed"
            );
            return;
        }
        warn!(
            request_id = %self.request_id(),
            path = %self.path(),
            status = err.status_code(),
            error = %err,
            "request failed"
        );
        self.write_failure(err.status_code(), err.message());
    }

    /// Fail path for the expected fault kind: same envelope and status as
    /// [`fail`](Self::fail), logged at debug so routine input rejection does
    /// not clutter the warning log.
    fn fail_validation(&mut self, err: &ValidationError) {
        if self.is_committed() {
            warn!(
                request_id = %self.request_id(),
                path = %self.path(),
                "failure dropped: response already committed"
            );
            return;
        }
        debug!(
            request_id = %self.request_id(),
            path = %self.path(),
            status = err.status_code(),
            error = %err,
            "request failed validation"
        );
        self.write_failure(err.status_code(), err.message());
    }

    fn write_failure(&mut self, status: u16, error_text: &str) {
        let message = format!("{}: {error_text}", self.path());
        let body = match envelope::failure_body(&message) {
            Ok(body) => body,
            Err(err) => {
                warn!(
                    request_id = %self.request_id(),
                    path = %self.path(),
                    error = %err,
                    "failed to serialize failure envelope"
                );
                return;
            }
        };
        self.write_envelope(status, &body);
    }

    /// Write a bare status line with the standard reason phrase as body,
    /// returning the number of body bytes written.
    ///
    /// Unlike `succeed`/`fail`, a double write surfaces
    /// [`ContextError::AlreadyCommitted`] to the caller for composition with
    /// its own error handling.
    pub fn write_status_only(&mut self, status: u16) -> Result<usize, ContextError> {
        if self.is_committed() {
            return Err(ContextError::AlreadyCommitted);
        }
        let sink = self.sink.as_mut().ok_or(ContextError::NotBound)?;
        sink.write_status(status)?;
        let written = sink.write(reason_phrase(status).as_bytes())?;
        Ok(written)
    }

    /// Advance the cursor and synchronously invoke the next handler.
    ///
    /// No-op `Ok(())` when the response is already committed or the cursor sits
    /// at the last chain position. Reentrant by design: a handler calls this
    /// zero or more times, typically exactly once, to yield control downstream
    /// before resuming its own post-processing. Validation failures from
    /// downstream propagate through the return value; forward them with `?`.
    pub fn advance(&mut self) -> Result<(), ValidationError> {
        if self.is_committed() {
            return Ok(());
        }
        let next = self.cursor.map_or(0, |index| index + 1);
        let chain = Arc::clone(&self.chain);
        match chain.handler(next) {
            Some(handler) => {
                self.cursor = Some(next);
                handler(self)
            }
            None => Ok(()),
        }
    }

    /// Run the chain from the top under the recovery boundary.
    ///
    /// This is the transport layer's entry point after binding a context: it
    /// performs the initial [`advance`](Self::advance), routes a propagated
    /// validation failure through the fail path, and contains panics via
    /// [`recover`](Self::recover). Nothing escalates past this call.
    pub fn dispatch(&mut self) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.advance()));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(validation)) => self.fail_validation(&validation),
            Err(payload) => self.recover(payload),
        }
    }

    /// Resolve a caught panic to a terminal response.
    ///
    /// Logs the panic message and a captured backtrace at error severity. If
    /// the response is uncommitted, any content-type header is stripped, then
    /// the chain's custom panic handler runs (panic message under the
    /// [`SCRATCH_PANIC_KEY`] scratch key) or the generic 500 fallback is
    /// written. Public so a transport running its own `catch_unwind` can
    /// delegate containment here.
    pub fn recover(&mut self, payload: Box<dyn Any + Send>) {
        let message = panic_message(&*payload);
        let backtrace = Backtrace::capture();
        error!(
            request_id = %self.request_id(),
            path = %self.path(),
            panic_message = %message,
            backtrace = %backtrace,
            "handler panicked"
        );
        if self.is_committed() {
            return;
        }
        if let Some(sink) = self.sink.as_mut() {
            sink.remove_header("content-type");
        }
        let chain = Arc::clone(&self.chain);
        match chain.custom_panic_handler() {
            Some(handler) => {
                self.scratch
                    .insert(SCRATCH_PANIC_KEY.to_string(), Value::String(message));
                if let Err(validation) = handler(self) {
                    self.fail_validation(&validation);
                }
            }
            None => self.fail(&ServerError::internal("Internal Server Error")),
        }
    }

    /// Bind live handles onto a recycled instance. Cursor and committed state
    /// were already reset at release; only the handles and a fresh scratch map
    /// change here.
    pub(crate) fn rebind(&mut self, request: Request, sink: Box<dyn ResponseSink + Send>) {
        debug_assert!(self.cursor.is_none());
        self.request = Some(request);
        self.sink = Some(GuardedSink::new(sink));
        self.scratch = HashMap::new();
    }

    /// Clear every external reference so nothing from the prior request stays
    /// reachable between release and the next acquire. Dropping the request
    /// drains its body with it.
    pub(crate) fn clear(&mut self) {
        self.request = None;
        self.sink = None;
        self.params.clear();
        self.scratch = HashMap::new();
        self.cursor = None;
    }

    fn write_envelope(&mut self, status: u16, body: &[u8]) {
        let request_id = self.request_id();
        let path = self.path().to_owned();
        let Some(sink) = self.sink.as_mut() else {
            warn!(request_id = %request_id, path = %path, "write dropped: no response sink bound");
            return;
        };
        sink.set_header("content-type", "application/json");
        if let Err(err) = sink.write_status(status) {
            warn!(
                request_id = %request_id,
                path = %path,
                error = %err,
                "failed to write response status"
            );
            return;
        }
        if let Err(err) = sink.write(body) {
            warn!(
                request_id = %request_id,
                path = %path,
                error = %err,
                "failed to write response body"
            );
        }
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("path", &self.path())
            .field("cursor", &self.cursor)
            .field("committed", &self.is_committed())
            .field("params", &self.params.len())
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
