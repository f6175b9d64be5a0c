//! One end-to-end booking attempt against the UI.
//!
//! An attempt walks a fixed state machine: trigger the search, wait for the
//! sport's results column, pick the best offered time, click it, and wait
//! for the confirmation control. Every attempt starts from a fresh query;
//! handles never survive an attempt boundary, because the search rebuilds
//! the results region underneath them.
//!
//! This module is the only place that performs UI writes during a run.

use crate::clock::Sleeper;
use crate::error::{AttemptError, SurfaceError};
use crate::poll::Poller;
use crate::slot::{select_best_slot, SlotOffer};
use crate::surface::{selectors, ElementHandle, UiSurface};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Pause after triggering a search, letting the loading overlay come and go.
/// A deliberate fixed sleep, not a poll: the overlay's own visibility signal
/// is unreliable on the target UI.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);
/// How long the results column gets to appear before the timeout is
/// classified.
pub const DEFAULT_OFFER_TIMEOUT: Duration = Duration::from_millis(1000);
/// How long the confirmation control gets to appear after a slot click.
pub const DEFAULT_CONFIRM_TIMEOUT: Duration = Duration::from_millis(5000);
/// How long to look for the acknowledgment button when a slot was lost.
pub const DEFAULT_DISMISS_TIMEOUT: Duration = Duration::from_millis(500);

/// Wait bounds for one attempt. Defaults are tuned to the target UI's
/// latency; override when driving something slower.
#[derive(Debug, Clone, Copy)]
pub struct AttemptTimings {
    pub settle_delay: Duration,
    pub offer_timeout: Duration,
    pub confirm_timeout: Duration,
    pub dismiss_timeout: Duration,
}

impl Default for AttemptTimings {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
            offer_timeout: DEFAULT_OFFER_TIMEOUT,
            confirm_timeout: DEFAULT_CONFIRM_TIMEOUT,
            dismiss_timeout: DEFAULT_DISMISS_TIMEOUT,
        }
    }
}

/// Confirmation-dialog display rows captured on a successful booking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingDetails {
    /// Label/value lines exactly as the dialog rendered them.
    pub rows: Vec<String>,
}

/// Terminal state of one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The confirmation dialog was accepted; booking details captured.
    Booked(BookingDetails),
    /// An offer appeared but held none of the preferred times.
    NoSlotMatched,
    /// The UI explicitly reported nothing available.
    UnavailableConfirmed,
    /// The results column never appeared and the UI gave no signal.
    ObservationTimeout,
    /// The slot was clicked but confirmation never appeared (lost race).
    ConfirmationTimeout,
}

impl AttemptOutcome {
    pub fn is_booked(&self) -> bool {
        matches!(self, Self::Booked(_))
    }

    /// Booking details, if this outcome carries them.
    pub fn into_details(self) -> Option<BookingDetails> {
        match self {
            Self::Booked(details) => Some(details),
            _ => None,
        }
    }
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Booked(_) => "booked",
            Self::NoSlotMatched => "no preferred time offered",
            Self::UnavailableConfirmed => "no availability",
            Self::ObservationTimeout => "results never appeared",
            Self::ConfirmationTimeout => "slot lost before confirmation",
        };
        f.write_str(label)
    }
}

/// Executes single booking attempts. Cheap to construct; borrows the surface
/// for the lifetime of the run.
pub struct AttemptExecutor<'a, S: UiSurface> {
    surface: &'a S,
    poller: Poller,
    sleeper: Arc<dyn Sleeper>,
    timings: AttemptTimings,
}

impl<'a, S: UiSurface> AttemptExecutor<'a, S> {
    pub fn new(
        surface: &'a S,
        poller: Poller,
        sleeper: Arc<dyn Sleeper>,
        timings: AttemptTimings,
    ) -> Self {
        Self { surface, poller, sleeper, timings }
    }

    /// Run one attempt. Transient failures become non-booked outcomes;
    /// surface failures propagate as the fatal channel.
    pub async fn run<P: AsRef<str>>(
        &self,
        sport: &str,
        preferred: &[P],
    ) -> Result<AttemptOutcome, SurfaceError> {
        match self.try_book(sport, preferred).await {
            Ok(details) => Ok(AttemptOutcome::Booked(details)),
            Err(AttemptError::Surface(e)) => Err(e),
            Err(AttemptError::NoSlotMatched) => Ok(AttemptOutcome::NoSlotMatched),
            Err(AttemptError::UnavailableConfirmed) => Ok(AttemptOutcome::UnavailableConfirmed),
            Err(AttemptError::ObservationTimeout { .. }) => Ok(AttemptOutcome::ObservationTimeout),
            Err(AttemptError::ConfirmationTimeout { .. }) => {
                Ok(AttemptOutcome::ConfirmationTimeout)
            }
        }
    }

    async fn try_book<P: AsRef<str>>(
        &self,
        sport: &str,
        preferred: &[P],
    ) -> Result<BookingDetails, AttemptError> {
        self.surface.click(selectors::SEARCH_BUTTON).await?;
        self.sleeper.sleep(self.timings.settle_delay).await;

        let column = self
            .poller
            .poll_classified(
                self.timings.offer_timeout,
                || self.find_sport_column(sport),
                || self.unavailable_signal(),
            )
            .await?;

        let offer = self.collect_offer(&column).await?;
        tracing::debug!(slots = offer.len(), "offer extracted");
        let slot = *select_best_slot(&offer, preferred)?;
        self.surface.click_handle(&slot).await?;

        match self
            .poller
            .poll_simple(self.timings.confirm_timeout, || {
                self.surface.query_one(selectors::CONFIRM_BUTTON)
            })
            .await?
        {
            Some(confirm) => {
                // Capture the dialog rows before the click tears it down.
                let details = self.confirmation_details().await?;
                self.surface.click_handle(&confirm).await?;
                Ok(details)
            }
            None => {
                self.dismiss_lost_slot_dialog().await?;
                Err(AttemptError::ConfirmationTimeout { waited: self.timings.confirm_timeout })
            }
        }
    }

    /// Read-only observation of the current offer for `sport`, for
    /// diagnostic scans. Performs no clicks; the caller triggers the search.
    pub async fn observe_offer(&self, sport: &str) -> Result<SlotOffer, AttemptError> {
        let column = self
            .poller
            .poll_classified(
                self.timings.offer_timeout,
                || self.find_sport_column(sport),
                || self.unavailable_signal(),
            )
            .await?;
        Ok(self.collect_offer(&column).await?)
    }

    /// The results column whose header matches `sport`, once present.
    async fn find_sport_column(
        &self,
        sport: &str,
    ) -> Result<Option<ElementHandle>, SurfaceError> {
        let columns = self.surface.query_all(selectors::RESULT_COLUMNS).await?;
        for column in columns {
            let labels =
                self.surface.query_within(&column, selectors::COLUMN_SPORT_LABEL).await?;
            if let Some(label) = labels.first() {
                if self.surface.text_of(label).await? == sport {
                    return Ok(Some(column));
                }
            }
        }
        Ok(None)
    }

    /// Does the UI currently show its explicit "not available" notice?
    async fn unavailable_signal(&self) -> Result<bool, SurfaceError> {
        Ok(self.surface.query_one(selectors::NOT_AVAILABLE_TEXT).await?.is_some())
    }

    async fn collect_offer(&self, column: &ElementHandle) -> Result<SlotOffer, SurfaceError> {
        let links = self.surface.query_within(column, selectors::SLOT_LINKS).await?;
        let mut offer = SlotOffer::new();
        for link in links {
            let label = self.surface.text_of(&link).await?;
            offer.insert(label.trim(), link);
        }
        Ok(offer)
    }

    /// When the confirmation never shows, the UI is sitting on a "slot no
    /// longer available" dialog; acknowledge it so the next attempt starts
    /// from a clean page.
    async fn dismiss_lost_slot_dialog(&self) -> Result<(), SurfaceError> {
        if let Some(ok) = self
            .poller
            .poll_simple(self.timings.dismiss_timeout, || {
                self.surface.query_one(selectors::ACKNOWLEDGE_BUTTON)
            })
            .await?
        {
            self.surface.click_handle(&ok).await?;
        }
        Ok(())
    }

    async fn confirmation_details(&self) -> Result<BookingDetails, AttemptError> {
        let cells = self.surface.query_all(selectors::CONFIRMATION_ROWS).await?;
        let mut rows = Vec::with_capacity(cells.len());
        for cell in &cells {
            rows.push(self.surface.text_of(cell).await?.trim().to_string());
        }
        Ok(BookingDetails { rows })
    }
}
