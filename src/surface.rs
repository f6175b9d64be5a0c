//! The UI automation surface the booking core drives.
//!
//! The core never talks to a browser directly; it consumes this trait and a
//! concrete backend (CDP session, webdriver, in-page script bridge) supplies
//! the implementation. Keeping the seam this narrow is what makes the whole
//! orchestrator testable against a scripted fake.

use crate::error::SurfaceError;
use async_trait::async_trait;

/// Opaque reference into the UI's current state.
///
/// Handles are only valid until the next action that rebuilds the page
/// region they point into (a search, a navigation). The booking loops
/// re-query from scratch on every attempt and never carry a handle across
/// attempt boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(u64);

impl ElementHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Minimal DOM-ish capability set the booking core needs.
#[async_trait]
pub trait UiSurface: Send + Sync {
    /// Click the first element matching `selector`.
    async fn click(&self, selector: &str) -> Result<(), SurfaceError>;

    /// Click a previously returned element.
    async fn click_handle(&self, handle: &ElementHandle) -> Result<(), SurfaceError>;

    /// First match for `selector`, if any.
    async fn query_one(&self, selector: &str) -> Result<Option<ElementHandle>, SurfaceError>;

    /// All matches for `selector`, in document order.
    async fn query_all(&self, selector: &str) -> Result<Vec<ElementHandle>, SurfaceError>;

    /// All matches for `selector` inside `scope`, in document order.
    async fn query_within(
        &self,
        scope: &ElementHandle,
        selector: &str,
    ) -> Result<Vec<ElementHandle>, SurfaceError>;

    /// Text content of an element.
    async fn text_of(&self, handle: &ElementHandle) -> Result<String, SurfaceError>;
}

/// DOM selectors of the reservation page.
pub mod selectors {
    /// Button that triggers a court search for the configured date/duration.
    pub const SEARCH_BUTTON: &str = "#reserve-court-search";
    /// One column per sport in the search results.
    pub const RESULT_COLUMNS: &str = "#times-to-reserve td";
    /// Sport name header inside a result column.
    pub const COLUMN_SPORT_LABEL: &str = "b";
    /// Clickable time slots inside a result column.
    pub const SLOT_LINKS: &str = "a";
    /// Explicit "nothing available" notice.
    pub const NOT_AVAILABLE_TEXT: &str = ".court-not-available-text";
    /// Final confirmation button in the reservation dialog.
    pub const CONFIRM_BUTTON: &str = "#confirm";
    /// Acknowledgment button on the "slot taken" dialog.
    pub const ACKNOWLEDGE_BUTTON: &str = "#button-ok";
    /// Detail rows of the confirmation dialog.
    pub const CONFIRMATION_ROWS: &str = "#confirm-reservation-popup .left td";

    /// Field that opens the date picker.
    pub const DATE_PICKER_FIELD: &str = ".reserve-court-new .ca-date-picker-field a";
    /// Month labels across the picker header (the visible month is third).
    pub const DATE_PICKER_MONTHS: &str = ".datepickerMonth a";
    /// "Today" shortcut.
    pub const DATE_PICKER_TODAY: &str = ".datepickerToday a";
    /// Advance one month.
    pub const DATE_PICKER_NEXT: &str = ".datepickerGoNext a";
    /// The currently displayed picker panel.
    pub const DATE_PICKER_VISIBLE: &str = r#"div[style*="display: block"].datepicker"#;
    /// Day cells of the visible month, excluding adjacent-month overflow.
    pub const DATE_PICKER_DAYS: &str = ".datepickerDays td:not(.datepickerNotInMonth)";
}
