//! Resolve engine
//!
//! This module contains the bounded multi-pass resolve and its helpers:
//! - `queue`: the pass loop, cache consultation and failure handling
//! - `limiter`: cancellable request delay and inter-pass cool-down
//! - `aggregator`: per-index outcomes in batch order
//! - `report`: the report and error returned to callers

pub mod aggregator;
pub mod limiter;
pub mod queue;
pub mod report;

pub use aggregator::{Aggregator, DispositionCounts, Outcome};
pub use limiter::{Pace, RateLimiter};
pub use queue::ResolveEngine;
pub use report::{ResolveError, ResolveReport, Termination};
