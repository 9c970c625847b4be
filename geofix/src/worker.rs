//! Periodic location work step.
//!
//! One step is a bounded single fetch. A step that yields nothing asks to be
//! retried later; the delay before the retry follows a [`BackoffPolicy`].
//! Scheduling the step is up to the caller ([`LocationWorker::run`] is a
//! simple in-process loop used by the CLI).

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::location::{Location, LocationSource};

/// Upper bound for any retry delay.
pub const MAX_BACKOFF: Duration = Duration::from_secs(5 * 60 * 60);

/// Default base delay for retries.
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(60);

/// Outcome of one work step.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkResult {
    /// A location was obtained.
    Success(Location),
    /// Nothing was obtained; run again after a backoff delay.
    Retry,
}

/// Retry delay policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffPolicy {
    /// `base * 2^(attempt - 1)`.
    Exponential { base: Duration },
    /// `base * attempt`.
    Linear { base: Duration },
}

impl BackoffPolicy {
    pub fn exponential(base: Duration) -> Self {
        BackoffPolicy::Exponential { base }
    }

    pub fn linear(base: Duration) -> Self {
        BackoffPolicy::Linear { base }
    }

    /// Build a policy from its config name.
    pub fn from_name(name: &str, base: Duration) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "exponential" => Some(Self::exponential(base)),
            "linear" => Some(Self::linear(base)),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BackoffPolicy::Exponential { .. } => "exponential",
            BackoffPolicy::Linear { .. } => "linear",
        }
    }

    pub fn base(&self) -> Duration {
        match self {
            BackoffPolicy::Exponential { base } | BackoffPolicy::Linear { base } => *base,
        }
    }

    /// Delay before retry number `attempt` (1-based; 0 is treated as 1),
    /// capped at [`MAX_BACKOFF`].
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        let delay = match self {
            BackoffPolicy::Exponential { base } => {
                base.saturating_mul(2u32.saturating_pow(attempt - 1))
            }
            BackoffPolicy::Linear { base } => base.saturating_mul(attempt),
        };
        delay.min(MAX_BACKOFF)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::exponential(DEFAULT_BACKOFF_BASE)
    }
}

impl fmt::Display for BackoffPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}s base)", self.name(), self.base().as_secs())
    }
}

/// Runs single fetches as a retryable unit of work.
pub struct LocationWorker<S: LocationSource + ?Sized> {
    source: Arc<S>,
    interval: Duration,
    backoff: BackoffPolicy,
}

impl<S: LocationSource + ?Sized> LocationWorker<S> {
    pub fn new(source: Arc<S>, interval: Duration, backoff: BackoffPolicy) -> Self {
        Self {
            source,
            interval,
            backoff,
        }
    }

    pub fn backoff(&self) -> BackoffPolicy {
        self.backoff
    }

    /// Run one step.
    pub async fn run_once(&self) -> WorkResult {
        match self.source.fetch_once().await {
            Ok(Some(location)) => {
                info!(%location, "Location work step succeeded");
                WorkResult::Success(location)
            }
            Ok(None) => {
                warn!("Location work step found no location");
                WorkResult::Retry
            }
            Err(e) => {
                warn!(error = %e, "Location work step failed");
                WorkResult::Retry
            }
        }
    }

    /// Run steps until cancelled, waiting `interval` after a success and the
    /// backoff delay after a retry. `on_result` sees every step result.
    pub async fn run<F>(&self, cancel: CancellationToken, mut on_result: F)
    where
        F: FnMut(&WorkResult),
    {
        let mut attempt: u32 = 0;
        loop {
            let result = tokio::select! {
                _ = cancel.cancelled() => break,
                result = self.run_once() => result,
            };
            on_result(&result);

            let delay = match result {
                WorkResult::Success(_) => {
                    attempt = 0;
                    self.interval
                }
                WorkResult::Retry => {
                    attempt = attempt.saturating_add(1);
                    self.backoff.delay_for(attempt)
                }
            };
            debug!(attempt, delay_secs = delay.as_secs(), "Next location work step scheduled");

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }
        debug!("Location worker stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::{FusedLocationSource, LocationRequestProfile};
    use crate::platform::{SimulatedPlatform, SimulationConfig};
    use proptest::prelude::*;

    const MINUTE: Duration = Duration::from_secs(60);

    fn worker(has_last_known: bool) -> LocationWorker<FusedLocationSource> {
        let platform = SimulatedPlatform::new(SimulationConfig {
            start: Location::new(10.0, 20.0),
            has_last_known,
            ..SimulationConfig::default()
        });
        let source = FusedLocationSource::new(
            Arc::new(platform),
            LocationRequestProfile::HIGH_ACCURACY,
            Duration::from_secs(10),
        );
        LocationWorker::new(Arc::new(source), Duration::from_secs(900), BackoffPolicy::default())
    }

    #[test]
    fn test_exponential_backoff() {
        let policy = BackoffPolicy::exponential(MINUTE);
        assert_eq!(policy.delay_for(0), MINUTE);
        assert_eq!(policy.delay_for(1), MINUTE);
        assert_eq!(policy.delay_for(2), 2 * MINUTE);
        assert_eq!(policy.delay_for(4), 8 * MINUTE);
        assert_eq!(policy.delay_for(20), MAX_BACKOFF);
    }

    #[test]
    fn test_linear_backoff() {
        let policy = BackoffPolicy::linear(MINUTE);
        assert_eq!(policy.delay_for(3), 3 * MINUTE);
        assert_eq!(policy.delay_for(10_000), MAX_BACKOFF);
    }

    #[test]
    fn test_from_name() {
        assert_eq!(
            BackoffPolicy::from_name("Linear", MINUTE),
            Some(BackoffPolicy::linear(MINUTE))
        );
        assert_eq!(BackoffPolicy::from_name("random", MINUTE), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_once_success() {
        let result = worker(true).run_once().await;
        assert!(matches!(result, WorkResult::Success(l) if l.coordinates() == (10.0, 20.0)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_once_retry_without_location() {
        assert_eq!(worker(false).run_once().await, WorkResult::Retry);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_cancel() {
        let worker = worker(true);
        let cancel = CancellationToken::new();
        let mut results = Vec::new();

        let stopper = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1500)).await;
            stopper.cancel();
        });
        worker.run(cancel, |r| results.push(r.clone())).await;

        // Steps finish at 10s and 920s; cancelled while waiting for the third.
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| matches!(r, WorkResult::Success(_))));
    }

    proptest! {
        /// Delays never decrease with the attempt number and never exceed the cap
        #[test]
        fn prop_backoff_monotonic_and_capped(
            base_secs in 1u64..3600,
            attempt in 1u32..64,
            linear in any::<bool>()
        ) {
            let base = Duration::from_secs(base_secs);
            let policy = if linear { BackoffPolicy::linear(base) } else { BackoffPolicy::exponential(base) };
            let here = policy.delay_for(attempt);
            let next = policy.delay_for(attempt + 1);
            prop_assert!(here <= next);
            prop_assert!(next <= MAX_BACKOFF);
        }
    }
}
