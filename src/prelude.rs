//! Convenient re-exports for common prebook types.
pub use crate::{
    attempt::{AttemptOutcome, AttemptTimings, BookingDetails},
    clock::{Clock, Sleeper, SystemClock, TokioSleeper},
    controller::{RetryController, RunResult},
    error::{AttemptError, ConfigError, SurfaceError},
    session::{BookingRequest, BookingSession, CourtDuration, DayAvailability},
    slot::{select_best_slot, SlotOffer},
    surface::{ElementHandle, UiSurface},
};
