#![forbid(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::all))]

//! # prebook
//!
//! Deadline-bounded retry orchestration for reserving a high-contention
//! sports court the instant its slots are released.
//!
//! The hard part is not clicking buttons; it is timing and retry
//! discipline: wake at the release instant, attempt repeatedly against an
//! eventually-consistent UI, tell "the page is slow" apart from "there is
//! genuinely nothing", and give up cleanly at a wall-clock deadline instead
//! of looping forever.
//!
//! ## Layers
//!
//! - [`clock`]: injectable wall clock and sleeper, plus [`clock::wait_until`]
//! - [`poll`]: bounded condition polling with two-tier timeout classification
//! - [`slot`]: preference-ordered slot selection
//! - [`attempt`]: one search, select, confirm pass against the UI
//! - [`controller`]: the dual-loop attempt/deadline state machine
//! - [`session`]: entry point wiring page setup, release wait, and the run
//!
//! The UI itself sits behind [`surface::UiSurface`]; supply a backend
//! (webdriver, CDP, an in-page bridge) to drive a real page.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use prebook::prelude::*;
//! use chrono::NaiveTime;
//!
//! # async fn run(surface: impl UiSurface) -> Result<(), Box<dyn std::error::Error>> {
//! let session = BookingSession::new(surface)?;
//! let request = BookingRequest::days_ahead(
//!     &SystemClock,
//!     CourtDuration::Min90,
//!     "Pickleball / Mini Tennis",
//!     8,
//!     vec!["8:00pm".into(), "8:30pm".into(), "7:30pm".into()],
//!     NaiveTime::from_hms_opt(12, 29, 45).unwrap(),
//! )?;
//! match session.book(&request).await? {
//!     RunResult::Success(details) => println!("booked: {:?}", details.rows),
//!     other => eprintln!("not booked: {other:?}"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod attempt;
pub mod clock;
pub mod controller;
pub mod error;
pub mod page;
pub mod poll;
pub mod prelude;
pub mod session;
pub mod slot;
pub mod surface;

// Re-exports
pub use attempt::{AttemptExecutor, AttemptOutcome, AttemptTimings, BookingDetails};
pub use clock::{
    wait_until, Clock, InstantSleeper, ManualClock, SimulatedSleeper, Sleeper, SystemClock,
    TokioSleeper, TrackingSleeper,
};
pub use controller::{CycleOutcome, RetryController, RetryControllerBuilder, RunResult};
pub use error::{AttemptError, ConfigError, SurfaceError};
pub use page::CourtPage;
pub use poll::{Poller, DEFAULT_POLL_INTERVAL};
pub use session::{BookingRequest, BookingSession, CourtDuration, DayAvailability};
pub use slot::{select_best_slot, SlotOffer};
pub use surface::{ElementHandle, UiSurface};
