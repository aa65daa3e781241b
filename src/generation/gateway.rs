//! Generation gateway: a provider behind a bounded retry loop.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::GenerationError;
use crate::database::Coordinates;

/// Input to a generator: what to produce, and for which situation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Dish name, search query or mood context.
    pub subject: String,
    pub context: Option<String>,
    pub origin: Option<Coordinates>,
}

impl GenerationRequest {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            context: None,
            origin: None,
        }
    }

    #[must_use]
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    #[must_use]
    pub fn origin(mut self, origin: Coordinates) -> Self {
        self.origin = Some(origin);
        self
    }
}

/// The expensive capability of last resort.
#[async_trait]
pub trait Generator<V>: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<V, GenerationError>;
}

/// Injectable delay between retries.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real delay on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Exponential backoff with a fixed retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based): `base * 2^retry`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(retry))
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// A generator wrapped in the retry policy.
pub struct GenerationGateway<V> {
    generator: Arc<dyn Generator<V>>,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl<V> Clone for GenerationGateway<V> {
    fn clone(&self) -> Self {
        Self {
            generator: Arc::clone(&self.generator),
            policy: self.policy,
            sleeper: Arc::clone(&self.sleeper),
        }
    }
}

impl<V> GenerationGateway<V> {
    pub fn new(generator: Arc<dyn Generator<V>>, policy: RetryPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            generator,
            policy,
            sleeper,
        }
    }

    /// Gateway sleeping on the tokio timer.
    pub fn with_policy(generator: Arc<dyn Generator<V>>, policy: RetryPolicy) -> Self {
        Self::new(generator, policy, Arc::new(TokioSleeper))
    }

    /// Produce a value, retrying rate-limit failures with backoff.
    ///
    /// Non-transient failures return immediately. When the budget runs out
    /// the last failure is wrapped in `RetriesExhausted`.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<V, GenerationError> {
        let mut attempt: u32 = 1;
        loop {
            debug!("Generation attempt {} for '{}'", attempt, request.subject);

            let err = match self.generator.generate(request).await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if !err.is_transient() {
                return Err(err);
            }

            if attempt >= self.policy.max_attempts() {
                return Err(GenerationError::RetriesExhausted {
                    attempts: attempt,
                    last: Box::new(err),
                });
            }

            let delay = self.policy.delay_for(attempt);
            warn!(
                "Generation for '{}' throttled (attempt {}), retrying in {:?}: {}",
                request.subject, attempt, delay, err
            );
            self.sleeper.sleep(delay).await;
            attempt += 1;
        }
    }
}
