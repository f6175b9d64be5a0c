//! Reservation page setup: duration, date, search trigger.
//!
//! These are the one-shot configuration actions performed before the timed
//! booking loop starts. They run over the same [`UiSurface`] seam as the
//! attempt executor but are not part of the retry core: a failure here is a
//! fatal setup error, not transient contention.

use crate::error::SurfaceError;
use crate::session::CourtDuration;
use crate::surface::{selectors, UiSurface};
use chrono::{Datelike, NaiveDate};

/// How many forward steps the month navigation may take before giving up.
/// Bookings open at most a handful of weeks out; anything farther is a
/// navigation bug, not a real request.
const MAX_MONTH_STEPS: usize = 3;

/// Thin wrapper over the reservation page's setup controls.
pub struct CourtPage<'a, S: UiSurface> {
    surface: &'a S,
}

impl<'a, S: UiSurface> CourtPage<'a, S> {
    pub fn new(surface: &'a S) -> Self {
        Self { surface }
    }

    /// Select one of the fixed court durations.
    pub async fn select_duration(&self, duration: CourtDuration) -> Result<(), SurfaceError> {
        self.surface.click(duration.selector()).await
    }

    /// Navigate the date picker to `date` and select it.
    pub async fn select_date(&self, date: NaiveDate) -> Result<(), SurfaceError> {
        self.open_date_picker().await?;
        self.navigate_to_month(date).await?;
        self.select_day(date.day()).await
    }

    /// Trigger a court search for the configured duration and date.
    pub async fn run_search(&self) -> Result<(), SurfaceError> {
        self.surface.click(selectors::SEARCH_BUTTON).await
    }

    async fn open_date_picker(&self) -> Result<(), SurfaceError> {
        self.surface.click(selectors::DATE_PICKER_FIELD).await
    }

    /// Does the picker currently display `month_name`? The widget renders a
    /// strip of month links; the visible month is the third.
    async fn showing_month(&self, month_name: &str) -> Result<bool, SurfaceError> {
        let months = self.surface.query_all(selectors::DATE_PICKER_MONTHS).await?;
        match months.get(2) {
            Some(label) => Ok(self.surface.text_of(label).await?.contains(month_name)),
            None => Ok(false),
        }
    }

    /// Bring the requested month into view: reset to today, then page
    /// forward a bounded number of months, re-checking after each step.
    async fn navigate_to_month(&self, date: NaiveDate) -> Result<(), SurfaceError> {
        let month_name = date.format("%B").to_string();
        if self.showing_month(&month_name).await? {
            return Ok(());
        }
        self.surface.click(selectors::DATE_PICKER_TODAY).await?;
        // Selecting "today" closes the picker; reopen it.
        self.open_date_picker().await?;
        for _ in 0..MAX_MONTH_STEPS {
            if self.showing_month(&month_name).await? {
                return Ok(());
            }
            self.surface.click(selectors::DATE_PICKER_NEXT).await?;
        }
        if self.showing_month(&month_name).await? {
            return Ok(());
        }
        Err(SurfaceError::MonthNotReachable { month: month_name })
    }

    /// Click the day cell matching `day` in the visible month grid.
    async fn select_day(&self, day: u32) -> Result<(), SurfaceError> {
        let panel = self
            .surface
            .query_one(selectors::DATE_PICKER_VISIBLE)
            .await?
            .ok_or_else(|| SurfaceError::ElementNotFound {
                selector: selectors::DATE_PICKER_VISIBLE.to_string(),
            })?;
        let cells = self.surface.query_within(&panel, selectors::DATE_PICKER_DAYS).await?;
        for cell in cells {
            if self.surface.text_of(&cell).await?.trim() == day.to_string() {
                let links = self.surface.query_within(&cell, "a").await?;
                let link = links.first().ok_or(SurfaceError::DayNotSelectable { day })?;
                return self.surface.click_handle(link).await;
            }
        }
        Err(SurfaceError::DayNotSelectable { day })
    }
}
