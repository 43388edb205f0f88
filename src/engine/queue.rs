//! Retry queue engine - bounded multi-pass resolve
//!
//! This module contains the main resolve loop, which:
//! - Answers items from the cache before touching the source
//! - Invokes the adapter for cache misses, one item at a time
//! - Persists fetched records as soon as they arrive
//! - Requeues transient failures for the next pass
//! - Stops on fatal failures, cancellation, or the pass bound

use crate::cache::{RecordCache, INDEX_FIELD, SOURCE_TITLE_FIELD};
use crate::config::EngineConfig;
use crate::engine::aggregator::Aggregator;
use crate::engine::limiter::RateLimiter;
use crate::engine::report::{ResolveError, ResolveReport, Termination};
use crate::source::{FailureKind, SourceAdapter};
use crate::state::{Batch, ItemIndex};
use tokio_util::sync::CancellationToken;

/// How a single pass ended
enum PassEnd {
    /// Every queued index was processed; these failed transiently
    Finished(Vec<ItemIndex>),

    /// Cancellation was observed mid-pass
    Cancelled,

    /// The adapter reported a fatal failure
    Fatal { index: ItemIndex, reason: String },
}

/// Drives a batch through bounded retry passes against one source
pub struct ResolveEngine {
    adapter: Box<dyn SourceAdapter>,
    limiter: RateLimiter,
    max_passes: u32,
}

impl ResolveEngine {
    /// Creates a new engine
    ///
    /// # Arguments
    ///
    /// * `adapter` - The source to fetch cache misses from
    /// * `limiter` - Pacing and cancellation for every wait
    /// * `max_passes` - Upper bound on passes over the batch
    pub fn new(adapter: Box<dyn SourceAdapter>, limiter: RateLimiter, max_passes: u32) -> Self {
        Self {
            adapter,
            limiter,
            max_passes,
        }
    }

    /// Creates an engine from the engine configuration
    pub fn from_config(
        config: &EngineConfig,
        adapter: Box<dyn SourceAdapter>,
        token: CancellationToken,
    ) -> Self {
        Self::new(
            adapter,
            RateLimiter::from_config(config, token),
            config.max_passes,
        )
    }

    pub fn adapter(&self) -> &dyn SourceAdapter {
        self.adapter.as_ref()
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn max_passes(&self) -> u32 {
        self.max_passes
    }

    /// Resolves every index of a batch
    ///
    /// Items are looked up in the cache by title first. Misses go to the
    /// adapter; successes are tagged with their index and input title and
    /// appended to the cache, NotFound items are dropped for good, and
    /// transient failures are retried on the next pass after a cool-down.
    ///
    /// Cancelling the limiter's token stops the run at the next wait or
    /// during the in-flight fetch and returns the partial report.
    ///
    /// # Arguments
    ///
    /// * `batch` - Items to resolve
    /// * `cache` - Cache consulted before, and written after, every fetch
    ///
    /// # Returns
    ///
    /// * `Ok(ResolveReport)` - One outcome per index; the run completed,
    ///   ran out of passes, or was cancelled
    /// * `Err(ResolveError::Fatal)` - The source signalled a fatal failure;
    ///   the error carries the partial report
    pub async fn resolve<C: RecordCache + ?Sized>(
        &self,
        batch: &Batch,
        cache: &mut C,
    ) -> Result<ResolveReport, ResolveError> {
        tracing::info!(
            "Resolving {} items against {} ({} cached records)",
            batch.len(),
            self.adapter.name(),
            cache.len()
        );

        let mut aggregator = Aggregator::new(batch);
        let mut active: Vec<ItemIndex> = batch.indices().cloned().collect();
        let mut passes = 0;
        let mut adapter_calls = 0;

        let termination = loop {
            if active.is_empty() {
                break Termination::Completed;
            }

            if passes >= self.max_passes {
                tracing::warn!(
                    "Giving up after {} passes with {} items unresolved",
                    passes,
                    active.len()
                );
                break Termination::Exhausted;
            }

            passes += 1;
            tracing::info!(
                "Starting pass {}/{} with {} items queued",
                passes,
                self.max_passes,
                active.len()
            );

            match self
                .run_pass(batch, &active, cache, &mut aggregator, &mut adapter_calls)
                .await
            {
                PassEnd::Finished(requeue) => {
                    tracing::info!(
                        "Pass {} finished: {} settled, {} to retry",
                        passes,
                        aggregator.settled_count(),
                        requeue.len()
                    );
                    active = requeue;

                    if !active.is_empty()
                        && passes < self.max_passes
                        && self.limiter.cooldown().await.is_cancelled()
                    {
                        break Termination::Cancelled;
                    }
                }
                PassEnd::Cancelled => break Termination::Cancelled,
                PassEnd::Fatal { index, reason } => {
                    let report = ResolveReport::new(
                        aggregator.finish(),
                        passes,
                        adapter_calls,
                        Termination::Aborted,
                    );
                    return Err(ResolveError::Fatal {
                        index,
                        reason,
                        report: Box::new(report),
                    });
                }
            }
        };

        let report = ResolveReport::new(aggregator.finish(), passes, adapter_calls, termination);

        tracing::info!(
            "Resolve {}: {} resolved, {} not found, {} pending after {} passes ({} adapter calls)",
            report.termination,
            report.counts.resolved(),
            report.counts.not_found,
            report.counts.pending(),
            report.passes,
            report.adapter_calls
        );

        Ok(report)
    }

    /// Processes every queued index once
    async fn run_pass<C: RecordCache + ?Sized>(
        &self,
        batch: &Batch,
        active: &[ItemIndex],
        cache: &mut C,
        aggregator: &mut Aggregator,
        adapter_calls: &mut u32,
    ) -> PassEnd {
        let mut requeue = Vec::new();
        let token = self.limiter.cancellation_token();

        for (position, index) in active.iter().enumerate() {
            if token.is_cancelled() {
                tracing::info!(
                    "Cancelled with {} items left in this pass",
                    active.len() - position
                );
                return PassEnd::Cancelled;
            }

            let Some(item) = batch.get(index) else {
                continue;
            };

            if let Some(cached) = cache.get(&item.title) {
                let mut record = cached.clone();
                record.set(INDEX_FIELD, index.as_str());
                tracing::debug!("Cache hit for '{}' (index {})", item.title, index);
                aggregator.record_cache_hit(index, record);
                continue;
            }

            *adapter_calls += 1;
            let result = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    tracing::info!("Cancelled while fetching '{}'", item.title);
                    aggregator.record_attempt(index);
                    return PassEnd::Cancelled;
                }
                result = self.adapter.fetch(&item.title, item.primary_author()) => result,
            };

            match result {
                Ok(record) => {
                    let record = record
                        .with(INDEX_FIELD, index.as_str())
                        .with(SOURCE_TITLE_FIELD, item.title.as_str());

                    if let Err(e) = cache.append(record.clone()) {
                        tracing::warn!("Failed to cache record for '{}': {}", item.title, e);
                    }

                    tracing::info!("Fetched '{}' (index {})", item.title, index);
                    aggregator.record_fetched(index, record);
                }
                Err(e) => match e.kind() {
                    FailureKind::NotFound => {
                        tracing::warn!("'{}' not found: {}", item.title, e.reason());
                        aggregator.record_not_found(index);
                    }
                    FailureKind::Fatal => {
                        tracing::error!(
                            "Fatal failure for '{}' (index {}): {}",
                            item.title,
                            index,
                            e.reason()
                        );
                        aggregator.record_attempt(index);
                        return PassEnd::Fatal {
                            index: index.clone(),
                            reason: e.reason().to_string(),
                        };
                    }
                    FailureKind::Transient => {
                        tracing::warn!(
                            "Transient failure for '{}', will retry: {}",
                            item.title,
                            e.reason()
                        );
                        aggregator.record_attempt(index);
                        requeue.push(index.clone());
                    }
                },
            }

            if self.limiter.after_request().await.is_cancelled() {
                tracing::info!(
                    "Cancelled with {} items left in this pass",
                    active.len() - position - 1
                );
                return PassEnd::Cancelled;
            }
        }

        PassEnd::Finished(requeue)
    }
}
