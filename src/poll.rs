//! Condition poller: bounded predicate evaluation against the UI.
//!
//! The UI is eventually consistent: after a search is triggered, results
//! appear some unknown time later, or never. [`Poller::poll_classified`]
//! re-evaluates a probe at a fixed interval until it produces a value or the
//! time budget runs out, and on exhaustion performs one secondary check to
//! split the timeout into two very different failures:
//!
//! - the UI explicitly shows its "not available" notice, meaning the resource
//!   genuinely has nothing to offer right now ([`AttemptError::UnavailableConfirmed`]);
//! - no such notice, meaning the page may simply not have loaded yet
//!   ([`AttemptError::ObservationTimeout`]).
//!
//! Without the split, a slow page is misread as "no courts" and a confirmed
//! empty offer burns retries that cannot succeed.

use crate::clock::Sleeper;
use crate::error::{AttemptError, SurfaceError};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Default spacing between probe evaluations. Tuned to the target UI's
/// render latency; override through [`Poller::new`] if it misbehaves.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Fixed-interval poller. Probe evaluations are spaced by `interval` using
/// the injected [`Sleeper`], so tests run in simulated time.
#[derive(Debug, Clone)]
pub struct Poller {
    interval: Duration,
    sleeper: Arc<dyn Sleeper>,
}

impl Poller {
    /// Create a poller. Panics if `interval` is zero.
    pub fn new(interval: Duration, sleeper: Arc<dyn Sleeper>) -> Self {
        assert!(interval > Duration::ZERO, "poll interval must be non-zero");
        Self { interval, sleeper }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Evaluate `probe` until it yields a value or `timeout` elapses, then
    /// classify the timeout via `unavailable`.
    ///
    /// Returns within `timeout + interval` of invocation (probe latency
    /// aside). Probe errors are fatal and propagate immediately.
    pub async fn poll_classified<T, P, PF, C, CF>(
        &self,
        timeout: Duration,
        mut probe: P,
        unavailable: C,
    ) -> Result<T, AttemptError>
    where
        P: FnMut() -> PF,
        PF: Future<Output = Result<Option<T>, SurfaceError>>,
        C: FnOnce() -> CF,
        CF: Future<Output = Result<bool, SurfaceError>>,
    {
        let budget = self.evaluations(timeout);
        for remaining in (0..budget).rev() {
            if let Some(value) = probe().await? {
                return Ok(value);
            }
            if remaining > 0 {
                self.sleeper.sleep(self.interval).await;
            }
        }
        if unavailable().await? {
            Err(AttemptError::UnavailableConfirmed)
        } else {
            Err(AttemptError::ObservationTimeout { waited: timeout })
        }
    }

    /// Presence-only poll with no secondary classification. `None` means the
    /// probe never produced a value within `timeout`.
    pub async fn poll_simple<T, P, PF>(
        &self,
        timeout: Duration,
        mut probe: P,
    ) -> Result<Option<T>, SurfaceError>
    where
        P: FnMut() -> PF,
        PF: Future<Output = Result<Option<T>, SurfaceError>>,
    {
        let budget = self.evaluations(timeout);
        for remaining in (0..budget).rev() {
            if let Some(value) = probe().await? {
                return Ok(Some(value));
            }
            if remaining > 0 {
                self.sleeper.sleep(self.interval).await;
            }
        }
        Ok(None)
    }

    /// Number of probe evaluations that fit in `timeout`, at least one.
    fn evaluations(&self, timeout: Duration) -> u64 {
        let interval = self.interval.as_nanos().max(1);
        let mut fits = timeout.as_nanos() / interval;
        if timeout.as_nanos() % interval != 0 {
            fits += 1;
        }
        u64::try_from(fits).unwrap_or(u64::MAX).max(1)
    }
}
