//! Orchestration entry point: configure the page, wait for the release
//! instant, run the retry controller.

use crate::attempt::{AttemptExecutor, AttemptTimings};
use crate::clock::{wait_until, Clock, Sleeper, SystemClock, TokioSleeper};
use crate::controller::{RetryController, RunResult};
use crate::error::{AttemptError, SurfaceError};
use crate::page::CourtPage;
use crate::poll::{Poller, DEFAULT_POLL_INTERVAL};
use crate::surface::UiSurface;
use chrono::{DateTime, Days, Local, NaiveDate, NaiveTime, TimeZone};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// The court durations the reservation UI offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CourtDuration {
    Min30,
    Min45,
    Min60,
    Min90,
}

impl CourtDuration {
    pub fn from_minutes(minutes: u32) -> Option<Self> {
        match minutes {
            30 => Some(Self::Min30),
            45 => Some(Self::Min45),
            60 => Some(Self::Min60),
            90 => Some(Self::Min90),
            _ => None,
        }
    }

    pub fn minutes(self) -> u32 {
        match self {
            Self::Min30 => 30,
            Self::Min45 => 45,
            Self::Min60 => 60,
            Self::Min90 => 90,
        }
    }

    /// The duration radio button on the reservation page.
    pub(crate) fn selector(self) -> &'static str {
        match self {
            Self::Min30 => "#interval-30",
            Self::Min45 => "#interval-45",
            Self::Min60 => "#interval-60",
            Self::Min90 => "#interval-90",
        }
    }
}

/// Fixed parameters of one booking run. Constructed once, immutable.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub duration: CourtDuration,
    /// Matched verbatim against the results column headers.
    pub sport: String,
    pub target_date: NaiveDate,
    /// Time-of-day labels, highest priority first, as the UI renders them.
    pub preferred_times: Vec<String>,
    /// Absolute instant at which the slots are expected to be released.
    pub target_start: SystemTime,
}

impl BookingRequest {
    /// Request for a date `days_ahead` of today, released at `release`
    /// (local time-of-day) today.
    pub fn days_ahead(
        clock: &dyn Clock,
        duration: CourtDuration,
        sport: impl Into<String>,
        days_ahead: u64,
        preferred_times: Vec<String>,
        release: NaiveTime,
    ) -> Result<Self, SurfaceError> {
        Ok(Self {
            duration,
            sport: sport.into(),
            target_date: days_from_today(clock, days_ahead),
            preferred_times,
            target_start: release_instant(clock, release)?,
        })
    }
}

/// Calendar date `days` after today, in local time.
pub fn days_from_today(clock: &dyn Clock, days: u64) -> NaiveDate {
    let now: DateTime<Local> = clock.now().into();
    now.date_naive() + Days::new(days)
}

/// Today's local instant at `time`. Fails when the wall clock skips the
/// requested time (DST gap).
pub fn release_instant(clock: &dyn Clock, time: NaiveTime) -> Result<SystemTime, SurfaceError> {
    let today = days_from_today(clock, 0);
    Local
        .from_local_datetime(&today.and_time(time))
        .earliest()
        .map(SystemTime::from)
        .ok_or_else(|| SurfaceError::InvalidReleaseTime { time: time.to_string() })
}

/// Availability observed for one date by [`BookingSession::dates_available`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayAvailability {
    pub date: NaiveDate,
    /// Offered time labels, sorted; empty when nothing was observable.
    pub times: Vec<String>,
}

/// One booking run against a UI surface.
///
/// Owns the run's clock, sleeper, and wait bounds. Inject the same fake
/// clock/sleeper pair here and in the controller to drive a run in
/// simulated time.
pub struct BookingSession<S> {
    surface: S,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
    controller: RetryController,
    timings: AttemptTimings,
    poll_interval: Duration,
}

impl<S: UiSurface> BookingSession<S> {
    /// Session with production clock/sleeper and default bounds.
    pub fn new(surface: S) -> Result<Self, crate::error::ConfigError> {
        Ok(Self {
            surface,
            clock: Arc::new(SystemClock),
            sleeper: Arc::new(TokioSleeper),
            controller: RetryController::builder().build()?,
            timings: AttemptTimings::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn with_sleeper<Sl: Sleeper + 'static>(mut self, sleeper: Sl) -> Self {
        self.sleeper = Arc::new(sleeper);
        self
    }

    pub fn with_controller(mut self, controller: RetryController) -> Self {
        self.controller = controller;
        self
    }

    pub fn with_timings(mut self, timings: AttemptTimings) -> Self {
        self.timings = timings;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Configure the page, sleep until the release instant, then book.
    pub async fn book(&self, request: &BookingRequest) -> Result<RunResult, SurfaceError> {
        let page = CourtPage::new(&self.surface);
        page.select_duration(request.duration).await?;
        page.select_date(request.target_date).await?;
        tracing::info!(
            sport = %request.sport,
            date = %request.target_date,
            "page configured, waiting for release instant"
        );
        wait_until(self.clock.as_ref(), self.sleeper.as_ref(), request.target_start).await;

        let executor = self.executor();
        let result = self
            .controller
            .run(|| executor.run(&request.sport, &request.preferred_times))
            .await?;

        match &result {
            RunResult::Success(details) => {
                tracing::info!("successfully booked");
                for row in &details.rows {
                    tracing::info!(row = %row, "booking detail");
                }
            }
            RunResult::ExhaustedRetries => {
                tracing::error!("failed to book: attempt budget exhausted");
            }
            RunResult::DeadlineExceeded => {
                tracing::error!("failed to book: deadline exceeded");
            }
        }
        Ok(result)
    }

    /// Read-only sweep of the next `window_days` dates, reporting the
    /// offered times for `sport` on each. Diagnostic; performs no booking
    /// clicks.
    pub async fn dates_available(
        &self,
        duration: CourtDuration,
        sport: &str,
        window_days: u32,
    ) -> Result<Vec<DayAvailability>, SurfaceError> {
        let page = CourtPage::new(&self.surface);
        page.select_duration(duration).await?;

        let executor = self.executor();
        let mut report = Vec::with_capacity(window_days as usize);
        for offset in 0..window_days {
            let date = days_from_today(self.clock.as_ref(), u64::from(offset));
            page.select_date(date).await?;
            page.run_search().await?;
            self.sleeper.sleep(self.timings.settle_delay).await;

            let times = match executor.observe_offer(sport).await {
                Ok(offer) => {
                    let mut labels: Vec<String> =
                        offer.labels().map(str::to_string).collect();
                    labels.sort();
                    labels
                }
                Err(AttemptError::Surface(e)) => return Err(e),
                Err(_) => Vec::new(),
            };
            tracing::debug!(date = %date, offered = times.len(), "availability observed");
            report.push(DayAvailability { date, times });
        }
        Ok(report)
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Tear down the session, handing back the surface.
    pub fn into_surface(self) -> S {
        self.surface
    }

    fn executor(&self) -> AttemptExecutor<'_, S> {
        AttemptExecutor::new(
            &self.surface,
            Poller::new(self.poll_interval, self.sleeper.clone()),
            self.sleeper.clone(),
            self.timings,
        )
    }
}
