//! Tests for cooperative chain dispatch through the context cursor.
//!
//! # Test Coverage
//!
//! - Handlers run in insertion order, downstream-then-resume
//! - `advance` past the end of the chain is a no-op
//! - `advance` on a committed context invokes no further handler
//! - Chain exhaustion without a write leaves the request uncommitted

mod common;

use chaincore::chain::HandlerChain;
use chaincore::context::RequestContext;
use common::{get_request, RecordingSink};
use serde_json::json;
use std::sync::{Arc, Mutex};

#[test]
fn test_downstream_handler_writes_and_upstream_resumes() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let order_a = Arc::clone(&order);
    let order_b = Arc::clone(&order);

    let chain = Arc::new(
        HandlerChain::new()
            .handle(move |ctx| {
                order_a.lock().unwrap().push("a:pre");
                ctx.advance()?;
                order_a.lock().unwrap().push("a:post");
                // A second write after B responded must be silently dropped.
                ctx.succeed(&json!({ "x": 2 }));
                Ok(())
            })
            .handle(move |ctx| {
                order_b.lock().unwrap().push("b");
                ctx.succeed(&json!({ "x": 1 }));
                Ok(())
            }),
    );

    let (sink, recorded) = RecordingSink::new();
    let mut ctx = RequestContext::new(chain, get_request("/widgets"), sink);
    ctx.dispatch();

    assert_eq!(*order.lock().unwrap(), vec!["a:pre", "b", "a:post"]);
    let recorded = recorded.lock().unwrap();
    assert_eq!(recorded.status, Some(200));
    assert_eq!(recorded.status_writes, 1);
    assert_eq!(recorded.body_str(), r#"{"ok":true,"data":{"x":1}}"#);
}

#[test]
fn test_advance_past_last_position_is_a_noop() {
    let chain = Arc::new(HandlerChain::new().handle(|ctx| {
        // No downstream handler exists; both calls must be harmless.
        ctx.advance()?;
        ctx.advance()?;
        Ok(())
    }));

    let (sink, recorded) = RecordingSink::new();
    let mut ctx = RequestContext::new(chain, get_request("/widgets"), sink);
    ctx.dispatch();

    assert!(!ctx.is_committed());
    assert_eq!(recorded.lock().unwrap().status, None);
}

#[test]
fn test_advance_on_committed_context_invokes_nothing() {
    let downstream_ran = Arc::new(Mutex::new(false));
    let flag = Arc::clone(&downstream_ran);

    let chain = Arc::new(
        HandlerChain::new()
            .handle(|ctx| {
                ctx.succeed(&json!({ "done": true }));
                ctx.advance()
            })
            .handle(move |_ctx| {
                *flag.lock().unwrap() = true;
                Ok(())
            }),
    );

    let (sink, _recorded) = RecordingSink::new();
    let mut ctx = RequestContext::new(chain, get_request("/widgets"), sink);
    ctx.dispatch();

    assert!(!*downstream_ran.lock().unwrap());
}

#[test]
fn test_exhausted_chain_completes_uncommitted() {
    let chain = Arc::new(
        HandlerChain::new()
            .handle(|ctx| ctx.advance())
            .handle(|ctx| ctx.advance()),
    );

    let (sink, recorded) = RecordingSink::new();
    let mut ctx = RequestContext::new(chain, get_request("/nowhere"), sink);
    ctx.dispatch();

    // The 404 fallthrough is the transport's decision, not ours.
    assert!(!ctx.is_committed());
    let recorded = recorded.lock().unwrap();
    assert_eq!(recorded.status, None);
    assert!(recorded.body.is_empty());
}

#[test]
fn test_handlers_run_in_insertion_order() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let mut chain = HandlerChain::new();
    for i in 0..4 {
        let order = Arc::clone(&order);
        chain = chain.handle(move |ctx| {
            order.lock().unwrap().push(i);
            ctx.advance()
        });
    }
    let chain = Arc::new(chain);
    assert_eq!(chain.len(), 4);

    let (sink, _recorded) = RecordingSink::new();
    let mut ctx = RequestContext::new(chain, get_request("/ordered"), sink);
    ctx.dispatch();

    assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3]);
}

#[test]
fn test_empty_chain_dispatch_is_harmless() {
    let chain = Arc::new(HandlerChain::new());
    assert!(chain.is_empty());

    let (sink, recorded) = RecordingSink::new();
    let mut ctx = RequestContext::new(chain, get_request("/empty"), sink);
    ctx.dispatch();

    assert!(!ctx.is_committed());
    assert_eq!(recorded.lock().unwrap().status, None);
}
