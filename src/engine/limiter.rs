//! Request pacing and inter-pass cool-down
//!
//! This module handles:
//! - The mandatory delay after every adapter invocation
//! - The longer cool-down between passes that left work behind
//! - Cancellation of either wait through a shared token

use crate::config::EngineConfig;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Result of a cancellable wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pace {
    /// The wait ran to completion
    Continue,

    /// Cancellation was requested before or during the wait
    Cancelled,
}

impl Pace {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Rate limiter for a single sequential worker
///
/// Every wait races against the cancellation token, so an interrupt ends a
/// fifteen minute cool-down as promptly as a five second request delay.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    request_delay: Duration,
    cooldown: Duration,
    token: CancellationToken,
}

impl RateLimiter {
    /// Creates a new rate limiter
    ///
    /// # Arguments
    ///
    /// * `request_delay` - Pause after every adapter invocation
    /// * `cooldown` - Pause between passes
    /// * `token` - Token whose cancellation interrupts both waits
    pub fn new(request_delay: Duration, cooldown: Duration, token: CancellationToken) -> Self {
        Self {
            request_delay,
            cooldown,
            token,
        }
    }

    /// Creates a rate limiter from the engine configuration
    pub fn from_config(config: &EngineConfig, token: CancellationToken) -> Self {
        Self::new(config.request_delay(), config.cooldown(), token)
    }

    /// Creates a limiter that never waits
    ///
    /// Cancellation is still honoured, which makes this the limiter of
    /// choice for tests that count passes rather than wall-clock time.
    pub fn immediate() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO, CancellationToken::new())
    }

    /// Returns a handle that cancels this limiter's waits
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn request_delay(&self) -> Duration {
        self.request_delay
    }

    pub fn cooldown_duration(&self) -> Duration {
        self.cooldown
    }

    /// Waits out the post-request delay
    pub async fn after_request(&self) -> Pace {
        self.wait(self.request_delay).await
    }

    /// Waits out the inter-pass cool-down
    pub async fn cooldown(&self) -> Pace {
        if !self.cooldown.is_zero() {
            tracing::info!("Cooling down for {:?} before the next pass", self.cooldown);
        }

        let pace = self.wait(self.cooldown).await;
        if pace.is_cancelled() {
            tracing::info!("Cool-down interrupted");
        }
        pace
    }

    async fn wait(&self, duration: Duration) -> Pace {
        if self.token.is_cancelled() {
            return Pace::Cancelled;
        }

        if duration.is_zero() {
            return Pace::Continue;
        }

        tokio::select! {
            _ = self.token.cancelled() => Pace::Cancelled,
            _ = tokio::time::sleep(duration) => Pace::Continue,
        }
    }
}
