//! Retry/timeout controller: the run-level state machine.
//!
//! Two nested bounded loops. The inner attempt loop burns through a fixed
//! attempt budget back-to-back (the executor's own waits already pace it).
//! The outer cycle loop repeats attempt bursts, sleeping a refresh interval
//! between them, until a booking lands or the wall-clock deadline passes.
//! Both budgets are enforced independently; whichever is hit first ends the
//! run.
//!
//! Every non-booked outcome is downgraded to a logged event at the cycle
//! boundary; mid-run failures are almost always transient contention, so
//! nothing short of the deadline (or a fatal surface failure) stops the run.

use crate::attempt::{AttemptOutcome, BookingDetails};
use crate::clock::{Clock, Sleeper, SystemClock, TokioSleeper};
use crate::error::{ConfigError, SurfaceError};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Attempts per cycle unless overridden.
pub const DEFAULT_MAX_ATTEMPTS: usize = 10;
/// Wall-clock budget for the whole run unless overridden.
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(30);
/// Pause between cycles unless overridden.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(500);

/// Terminal result of a booking run. Produced exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunResult {
    /// A booking was confirmed; details captured from the dialog.
    Success(BookingDetails),
    /// The attempt budget ran out with no booking (single-cycle mode).
    ExhaustedRetries,
    /// The wall-clock budget ran out with no booking.
    DeadlineExceeded,
}

impl RunResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn into_details(self) -> Option<BookingDetails> {
        match self {
            Self::Success(details) => Some(details),
            _ => None,
        }
    }
}

/// Result of one attempt burst.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Booked(BookingDetails),
    /// Every attempt in the budget failed.
    Exhausted,
}

/// Run-level retry controller. Built once, immutable for the run.
#[derive(Debug, Clone)]
pub struct RetryController {
    max_attempts: usize,
    run_timeout: Duration,
    refresh_interval: Duration,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
}

impl RetryController {
    pub fn builder() -> RetryControllerBuilder {
        RetryControllerBuilder::new()
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    pub fn run_timeout(&self) -> Duration {
        self.run_timeout
    }

    /// Repeat attempt cycles until one books or the deadline passes.
    ///
    /// `attempt` is invoked once per attempt and must run one full
    /// search, select, confirm pass. Fatal surface failures propagate and
    /// abort the run; everything else is logged and retried.
    pub async fn run<Op, Fut>(&self, mut attempt: Op) -> Result<RunResult, SurfaceError>
    where
        Op: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<AttemptOutcome, SurfaceError>> + Send,
    {
        let deadline = self.clock.now() + self.run_timeout;
        let mut cycle = 0usize;
        while self.clock.now() < deadline {
            cycle += 1;
            match self.run_cycle(&mut attempt).await? {
                CycleOutcome::Booked(details) => {
                    tracing::info!(cycle, "booking confirmed");
                    return Ok(RunResult::Success(details));
                }
                CycleOutcome::Exhausted => {
                    tracing::warn!(cycle, attempts = self.max_attempts, "cycle exhausted");
                }
            }
            // The refresh pause never extends past the deadline itself.
            let remaining = deadline
                .duration_since(self.clock.now())
                .unwrap_or(Duration::ZERO);
            self.sleeper.sleep(self.refresh_interval.min(remaining)).await;
        }
        tracing::error!(cycles = cycle, timeout = ?self.run_timeout, "deadline exceeded");
        Ok(RunResult::DeadlineExceeded)
    }

    /// One bounded attempt burst: up to `max_attempts`, no pause between
    /// attempts, stopping at the first booking.
    pub async fn run_cycle<Op, Fut>(&self, attempt: &mut Op) -> Result<CycleOutcome, SurfaceError>
    where
        Op: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<AttemptOutcome, SurfaceError>> + Send,
    {
        for attempt_no in 1..=self.max_attempts {
            match attempt().await? {
                AttemptOutcome::Booked(details) => return Ok(CycleOutcome::Booked(details)),
                outcome => {
                    tracing::warn!(attempt = attempt_no, %outcome, "attempt failed");
                }
            }
        }
        Ok(CycleOutcome::Exhausted)
    }

    /// Single-cycle mode: one attempt burst with no outer loop, reporting
    /// budget exhaustion distinctly instead of cycling to the deadline.
    pub async fn run_once<Op, Fut>(&self, mut attempt: Op) -> Result<RunResult, SurfaceError>
    where
        Op: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<AttemptOutcome, SurfaceError>> + Send,
    {
        match self.run_cycle(&mut attempt).await? {
            CycleOutcome::Booked(details) => Ok(RunResult::Success(details)),
            CycleOutcome::Exhausted => Ok(RunResult::ExhaustedRetries),
        }
    }
}

/// Builder for [`RetryController`].
#[derive(Debug)]
pub struct RetryControllerBuilder {
    max_attempts: usize,
    run_timeout: Duration,
    refresh_interval: Duration,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
}

impl RetryControllerBuilder {
    pub fn new() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            run_timeout: DEFAULT_RUN_TIMEOUT,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            clock: Arc::new(SystemClock),
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Attempts per cycle. Must be > 0.
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Wall-clock budget for the run. Must be non-zero.
    pub fn run_timeout(mut self, timeout: Duration) -> Self {
        self.run_timeout = timeout;
        self
    }

    /// Pause between cycles.
    pub fn refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn with_sleeper<S: Sleeper + 'static>(mut self, sleeper: S) -> Self {
        self.sleeper = Arc::new(sleeper);
        self
    }

    pub fn build(self) -> Result<RetryController, ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidMaxAttempts(0));
        }
        if self.run_timeout == Duration::ZERO {
            return Err(ConfigError::InvalidRunTimeout);
        }
        Ok(RetryController {
            max_attempts: self.max_attempts,
            run_timeout: self.run_timeout,
            refresh_interval: self.refresh_interval,
            clock: self.clock,
            sleeper: self.sleeper,
        })
    }
}

impl Default for RetryControllerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
