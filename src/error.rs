//! Error taxonomy for the booking run.
//!
//! Two channels, deliberately separate:
//! - [`AttemptError`] covers everything that can go wrong inside one booking
//!   attempt for reasons that may not hold next attempt (slow UI, lost race,
//!   nothing offered). These are caught at the cycle boundary and retried.
//! - [`SurfaceError`] covers hard failures of the UI surface itself (element
//!   that must exist is gone, backend unreachable). These abort the run.
//!
//! Expected conditions are values, not panics: "no courts" and "no matching
//! time" are ordinary variants here, never control-flow exceptions.

use std::time::Duration;

/// Fatal failures of the UI automation surface. Not retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
    /// A structurally required element was absent.
    #[error("element not found: {selector}")]
    ElementNotFound { selector: String },

    /// An element handle outlived the UI state it referred to.
    #[error("stale element handle")]
    StaleHandle,

    /// The date picker could not be navigated to the requested month.
    #[error("date picker never reached month {month}")]
    MonthNotReachable { month: String },

    /// The requested day is not selectable in the visible month grid.
    #[error("day {day} is not selectable in the visible month")]
    DayNotSelectable { day: u32 },

    /// The configured release time does not exist as a local instant.
    #[error("release time {time} is not a valid local instant")]
    InvalidReleaseTime { time: String },

    /// The underlying automation backend failed.
    #[error("ui backend failure: {0}")]
    Backend(String),
}

/// Per-attempt failures. All variants except `Surface` are transient
/// contention, retried at the cycle level.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttemptError {
    /// The expected UI state never appeared and the UI gave no explicit
    /// signal either way. Ambiguous: the page may simply be slow.
    #[error("results did not appear within {waited:?}")]
    ObservationTimeout { waited: Duration },

    /// The UI explicitly reports that nothing is offered.
    #[error("court reports no availability")]
    UnavailableConfirmed,

    /// An offer was presented but none of the preferred times were in it.
    #[error("none of the preferred times were offered")]
    NoSlotMatched,

    /// The slot was clicked but the confirmation control never appeared;
    /// the slot was most likely taken between offer and click.
    #[error("confirmation did not appear within {waited:?}")]
    ConfirmationTimeout { waited: Duration },

    /// Fatal surface failure observed mid-attempt. Re-split at the attempt
    /// boundary and propagated instead of retried.
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

impl AttemptError {
    /// Whether a fresh attempt could plausibly end differently.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Surface(_))
    }
}

/// Errors produced while building a controller or session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// `max_attempts` must be > 0.
    #[error("max_attempts must be > 0 (got {0})")]
    InvalidMaxAttempts(usize),

    /// The run timeout must be non-zero.
    #[error("run timeout must be greater than zero")]
    InvalidRunTimeout,

    /// The poll interval must be non-zero.
    #[error("poll interval must be greater than zero")]
    InvalidPollInterval,
}
