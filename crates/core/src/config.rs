use std::num::NonZeroUsize;
use std::time::Duration;

use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};

const DEFAULT_MAX_STEPS: NonZeroUsize = NonZeroUsize::new(10).unwrap();

/// How failed oracle requests are retried.
///
/// Only transient failures (rate limiting) are retried. Retries back off
/// exponentially starting at `initial_interval`, and stop once
/// `max_elapsed` has passed since the first attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RetryPolicy {
    initial_interval: Duration,
    max_elapsed: Duration,
}

impl RetryPolicy {
    /// Creates a new retry policy.
    #[inline]
    pub fn new(initial_interval: Duration, max_elapsed: Duration) -> Self {
        Self {
            initial_interval,
            max_elapsed,
        }
    }

    /// A policy that never retries.
    #[inline]
    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub(crate) fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_interval)
            .with_max_elapsed_time(Some(self.max_elapsed))
            .build()
    }
}

impl Default for RetryPolicy {
    #[inline]
    fn default() -> Self {
        Self::new(Duration::from_millis(500), Duration::from_secs(30))
    }
}

/// Configuration of an [`Agent`](crate::Agent).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AgentConfig {
    max_steps: NonZeroUsize,
    tool_timeout: Duration,
    oracle_timeout: Duration,
    oracle_retry: RetryPolicy,
    target_language: Option<String>,
}

impl AgentConfig {
    /// Sets how many tool rounds a turn may run before it's abandoned.
    #[inline]
    pub fn with_max_steps(mut self, max_steps: NonZeroUsize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Sets the time limit of each tool invocation.
    #[inline]
    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    /// Sets the time limit of each oracle request attempt.
    #[inline]
    pub fn with_oracle_timeout(mut self, timeout: Duration) -> Self {
        self.oracle_timeout = timeout;
        self
    }

    /// Sets the retry policy for oracle requests.
    #[inline]
    pub fn with_oracle_retry(mut self, policy: RetryPolicy) -> Self {
        self.oracle_retry = policy;
        self
    }

    /// Sets the language that emitted entries are translated to.
    ///
    /// Translation only happens when the agent also has a translator.
    #[inline]
    pub fn with_target_language<S: Into<String>>(mut self, lang: S) -> Self {
        self.target_language = Some(lang.into());
        self
    }

    /// Returns the step budget.
    #[inline]
    pub fn max_steps(&self) -> NonZeroUsize {
        self.max_steps
    }

    /// Returns the tool invocation time limit.
    #[inline]
    pub fn tool_timeout(&self) -> Duration {
        self.tool_timeout
    }

    /// Returns the oracle request time limit.
    #[inline]
    pub fn oracle_timeout(&self) -> Duration {
        self.oracle_timeout
    }

    /// Returns the oracle retry policy.
    #[inline]
    pub fn oracle_retry(&self) -> RetryPolicy {
        self.oracle_retry
    }

    /// Returns the target language, if any.
    #[inline]
    pub fn target_language(&self) -> Option<&str> {
        self.target_language.as_deref()
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            tool_timeout: Duration::from_secs(30),
            oracle_timeout: Duration::from_secs(120),
            oracle_retry: RetryPolicy::default(),
            target_language: None,
        }
    }
}
