//! # Context Pool Module
//!
//! Recycles [`RequestContext`] instances across requests to avoid per-request
//! heap churn.
//!
//! ## Overview
//!
//! The pool is the only structure shared across concurrently executing request
//! tasks. It is an explicit, injectable service with its own lifecycle:
//! constructed at server start with the chain it binds into every context, and
//! referenced by the request-dispatch entry point, never an implicit
//! singleton, so the core stays testable in isolation.
//!
//! ## Guarantees
//!
//! - `acquire` never hands the same physical instance to two live requests.
//! - Between `release` and the next `acquire` of the same instance, no stale
//!   reference to the prior request's data remains reachable from it.
//! - Acquired contexts always start with an empty scratch map, empty params,
//!   the cursor at its "before first" sentinel, and committed false.
//!
//! ## Configuration
//!
//! - `CHAINCORE_POOL_MAX_IDLE`: cap on recycled instances kept idle
//!   (default: 256). Contexts released beyond the cap are dropped and counted
//!   in the metrics.
//!
//! The free list sits behind a `may::sync::Mutex`, so contention parks the
//! calling coroutine rather than the OS thread.

use crate::chain::HandlerChain;
use crate::context::RequestContext;
use crate::request::Request;
use crate::sink::ResponseSink;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::info;

/// Configuration for a context pool.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum number of recycled contexts kept idle.
    pub max_idle: usize,
}

impl PoolConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let max_idle = std::env::var("CHAINCORE_POOL_MAX_IDLE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256);
        Self { max_idle }
    }

    pub fn new(max_idle: usize) -> Self {
        Self { max_idle }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { max_idle: 256 }
    }
}

/// Occupancy metrics for a context pool.
#[derive(Debug, Default)]
pub struct PoolMetrics {
    /// Contexts constructed fresh because the free list was empty.
    created_count: AtomicU64,
    /// Contexts handed out from the free list.
    reused_count: AtomicU64,
    /// Contexts returned through `release`.
    released_count: AtomicU64,
    /// Contexts dropped at release because the free list was full.
    discarded_count: AtomicU64,
    /// Current free-list depth.
    idle_depth: AtomicUsize,
}

impl PoolMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    fn record_created(&self) {
        self.created_count.fetch_add(1, Ordering::Relaxed);
    }

    fn record_reused(&self) {
        self.reused_count.fetch_add(1, Ordering::Relaxed);
        self.idle_depth.fetch_sub(1, Ordering::Relaxed);
    }

    fn record_released_idle(&self) {
        self.released_count.fetch_add(1, Ordering::Relaxed);
        self.idle_depth.fetch_add(1, Ordering::Relaxed);
    }

    fn record_released_discarded(&self) {
        self.released_count.fetch_add(1, Ordering::Relaxed);
        self.discarded_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_created_count(&self) -> u64 {
        self.created_count.load(Ordering::Relaxed)
    }

    pub fn get_reused_count(&self) -> u64 {
        self.reused_count.load(Ordering::Relaxed)
    }

    pub fn get_released_count(&self) -> u64 {
        self.released_count.load(Ordering::Relaxed)
    }

    pub fn get_discarded_count(&self) -> u64 {
        self.discarded_count.load(Ordering::Relaxed)
    }

    pub fn get_idle_depth(&self) -> usize {
        self.idle_depth.load(Ordering::Relaxed)
    }
}

/// Reuse pool that allocates, resets, and recycles request contexts.
pub struct ContextPool {
    chain: Arc<HandlerChain>,
    idle: may::sync::Mutex<Vec<Box<RequestContext>>>,
    config: PoolConfig,
    metrics: Arc<PoolMetrics>,
}

impl ContextPool {
    /// Create a pool binding `chain` into every context it hands out, with
    /// configuration from the environment.
    pub fn new(chain: Arc<HandlerChain>) -> Self {
        Self::with_config(chain, PoolConfig::from_env())
    }

    pub fn with_config(chain: Arc<HandlerChain>, config: PoolConfig) -> Self {
        info!(
            chain_len = chain.len(),
            max_idle = config.max_idle,
            "Creating context pool"
        );
        Self {
            chain,
            idle: may::sync::Mutex::new(Vec::new()),
            config,
            metrics: Arc::new(PoolMetrics::new()),
        }
    }

    /// Pull a recycled context or construct a fresh one, binding the request
    /// and a freshly wrapped response guard. The returned context starts with
    /// an empty scratch map, empty params, cursor before first, and committed
    /// false.
    pub fn acquire(
        &self,
        request: Request,
        sink: Box<dyn ResponseSink + Send>,
    ) -> Box<RequestContext> {
        let recycled = self.with_idle(Vec::pop);
        match recycled {
            Some(mut ctx) => {
                self.metrics.record_reused();
                ctx.rebind(request, sink);
                ctx
            }
            None => {
                self.metrics.record_created();
                Box::new(RequestContext::new(Arc::clone(&self.chain), request, sink))
            }
        }
    }

    /// Clear every reference the context holds (request handle and body,
    /// response guard, params, scratch), reset cursor and committed state, and
    /// return the instance to the free list. Beyond `max_idle` the instance is
    /// dropped instead.
    pub fn release(&self, mut ctx: Box<RequestContext>) {
        ctx.clear();
        let kept = self.with_idle(|idle| {
            if idle.len() < self.config.max_idle {
                idle.push(ctx);
                true
            } else {
                false
            }
        });
        if kept {
            self.metrics.record_released_idle();
        } else {
            self.metrics.record_released_discarded();
        }
    }

    pub fn metrics(&self) -> &Arc<PoolMetrics> {
        &self.metrics
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Number of contexts currently idle in the free list.
    pub fn idle_len(&self) -> usize {
        self.with_idle(|idle| idle.len())
    }

    fn with_idle<R>(&self, f: impl FnOnce(&mut Vec<Box<RequestContext>>) -> R) -> R {
        match self.idle.lock() {
            Ok(mut guard) => f(&mut guard),
            // The critical section only pushes/pops a Vec; recover the list
            // rather than refusing every later request.
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }
}

impl std::fmt::Debug for ContextPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextPool")
            .field("max_idle", &self.config.max_idle)
            .field("idle", &self.idle_len())
            .finish_non_exhaustive()
    }
}
