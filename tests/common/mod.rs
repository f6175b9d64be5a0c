//! Scripted reservation page used by the integration tests.
//!
//! Models just enough of the real page: a duration selector, the date
//! picker (month strip, today/next controls, day grid), the search button,
//! per-date slot offers for one sport, the confirmation dialog, and the
//! "slot taken" acknowledgment dialog.

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use prebook::surface::selectors;
use prebook::{ElementHandle, SurfaceError, UiSurface};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;

/// Capturing log writer, for asserting on the diagnostics a run emits.
#[derive(Clone)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogGuard;
    fn make_writer(&'a self) -> Self::Writer {
        LogGuard(self.0.clone())
    }
}

pub struct LogGuard(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for LogGuard {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut guard = self.0.lock().unwrap();
        guard.extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Install a capturing subscriber for the current test. Keep the guard
/// alive for as long as logs should be collected.
pub fn capture_logs() -> (LogCapture, tracing::subscriber::DefaultGuard) {
    let capture = LogCapture(Arc::new(Mutex::new(Vec::new())));
    let subscriber = tracing_subscriber::fmt()
        .with_writer(BoxMakeWriter::new(capture.clone()))
        .with_target(true)
        .without_time()
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (capture, guard)
}

#[derive(Debug, Clone)]
enum Node {
    MonthLabel(i32, u32),
    PickerPanel,
    DayCell(u32),
    DayLink(u32),
    Column,
    SportLabel,
    Slot(usize),
    Confirm,
    Acknowledge,
    Notice,
    Row(usize),
}

#[derive(Debug)]
struct State {
    today: NaiveDate,
    visible: (i32, u32),
    picker_open: bool,
    selected_date: Option<NaiveDate>,
    searched: bool,
    slot_clicked: bool,
    chosen_slot: Option<String>,
    booked: bool,
    acknowledged: usize,
    sport: String,
    offers: HashMap<NaiveDate, Vec<String>>,
    notice_when_empty: bool,
    confirm_appears: bool,
    confirmation_rows: Vec<String>,
    clicks: Vec<String>,
    nodes: HashMap<u64, Node>,
    next_id: u64,
}

impl State {
    fn alloc(&mut self, node: Node) -> ElementHandle {
        self.next_id += 1;
        self.nodes.insert(self.next_id, node);
        ElementHandle::new(self.next_id)
    }

    fn current_offer(&self) -> Vec<String> {
        self.selected_date
            .and_then(|date| self.offers.get(&date))
            .cloned()
            .unwrap_or_default()
    }

    fn advance_month(&mut self) {
        let (y, m) = self.visible;
        self.visible = if m == 12 { (y + 1, 1) } else { (y, m + 1) };
    }
}

pub struct FakeSurface {
    state: Mutex<State>,
}

impl FakeSurface {
    pub fn new(today: NaiveDate, sport: &str) -> Self {
        Self {
            state: Mutex::new(State {
                today,
                visible: (today.year(), today.month()),
                picker_open: false,
                selected_date: None,
                searched: false,
                slot_clicked: false,
                chosen_slot: None,
                booked: false,
                acknowledged: 0,
                sport: sport.to_string(),
                offers: HashMap::new(),
                notice_when_empty: false,
                confirm_appears: true,
                confirmation_rows: vec![
                    "Court: 4".to_string(),
                    "Duration: 90 min".to_string(),
                ],
                clicks: Vec::new(),
                nodes: HashMap::new(),
                next_id: 0,
            }),
        }
    }

    pub fn with_offer(self, date: NaiveDate, times: &[&str]) -> Self {
        self.state
            .lock()
            .unwrap()
            .offers
            .insert(date, times.iter().map(|t| t.to_string()).collect());
        self
    }

    /// Show the "no courts available" notice whenever the offer is empty.
    pub fn with_notice_when_empty(self) -> Self {
        self.state.lock().unwrap().notice_when_empty = true;
        self
    }

    /// Simulate the lost race: the confirmation dialog never appears.
    pub fn without_confirmation(self) -> Self {
        self.state.lock().unwrap().confirm_appears = false;
        self
    }

    pub fn booked_slot(&self) -> Option<String> {
        let state = self.state.lock().unwrap();
        state.booked.then(|| state.chosen_slot.clone()).flatten()
    }

    pub fn selected_date(&self) -> Option<NaiveDate> {
        self.state.lock().unwrap().selected_date
    }

    pub fn acknowledged_dialogs(&self) -> usize {
        self.state.lock().unwrap().acknowledged
    }

    pub fn selector_clicks(&self) -> Vec<String> {
        self.state.lock().unwrap().clicks.clone()
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (ny, nm) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(ny, nm, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}

fn month_name(year: i32, month: u32) -> String {
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|d| d.format("%B").to_string())
        .unwrap_or_default()
}

#[async_trait]
impl UiSurface for FakeSurface {
    async fn click(&self, selector: &str) -> Result<(), SurfaceError> {
        let mut state = self.state.lock().unwrap();
        state.clicks.push(selector.to_string());
        match selector {
            selectors::DATE_PICKER_FIELD => state.picker_open = true,
            selectors::DATE_PICKER_TODAY => {
                state.visible = (state.today.year(), state.today.month());
                state.selected_date = Some(state.today);
                state.picker_open = false;
            }
            selectors::DATE_PICKER_NEXT => state.advance_month(),
            selectors::SEARCH_BUTTON => {
                state.searched = true;
                state.slot_clicked = false;
            }
            _ => {}
        }
        Ok(())
    }

    async fn click_handle(&self, handle: &ElementHandle) -> Result<(), SurfaceError> {
        let mut state = self.state.lock().unwrap();
        let node = state
            .nodes
            .get(&handle.id())
            .cloned()
            .ok_or(SurfaceError::StaleHandle)?;
        match node {
            Node::DayLink(day) => {
                let (y, m) = state.visible;
                state.selected_date = NaiveDate::from_ymd_opt(y, m, day);
                state.picker_open = false;
            }
            Node::Slot(i) => {
                let offer = state.current_offer();
                state.chosen_slot = offer.get(i).cloned();
                state.slot_clicked = true;
            }
            Node::Confirm => state.booked = true,
            Node::Acknowledge => {
                state.acknowledged += 1;
                state.slot_clicked = false;
            }
            _ => {}
        }
        Ok(())
    }

    async fn query_one(&self, selector: &str) -> Result<Option<ElementHandle>, SurfaceError> {
        let mut state = self.state.lock().unwrap();
        Ok(match selector {
            selectors::DATE_PICKER_VISIBLE if state.picker_open => {
                Some(state.alloc(Node::PickerPanel))
            }
            selectors::NOT_AVAILABLE_TEXT
                if state.searched
                    && state.notice_when_empty
                    && state.current_offer().is_empty() =>
            {
                Some(state.alloc(Node::Notice))
            }
            selectors::CONFIRM_BUTTON if state.slot_clicked && state.confirm_appears => {
                Some(state.alloc(Node::Confirm))
            }
            selectors::ACKNOWLEDGE_BUTTON if state.slot_clicked && !state.confirm_appears => {
                Some(state.alloc(Node::Acknowledge))
            }
            _ => None,
        })
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<ElementHandle>, SurfaceError> {
        let mut state = self.state.lock().unwrap();
        Ok(match selector {
            selectors::DATE_PICKER_MONTHS => {
                let (y, m) = state.visible;
                let (py, pm) = if m == 1 { (y - 1, 12) } else { (y, m - 1) };
                vec![
                    state.alloc(Node::MonthLabel(py, pm)),
                    state.alloc(Node::MonthLabel(py, pm)),
                    state.alloc(Node::MonthLabel(y, m)),
                ]
            }
            selectors::RESULT_COLUMNS if state.searched && !state.current_offer().is_empty() => {
                vec![state.alloc(Node::Column)]
            }
            selectors::CONFIRMATION_ROWS if state.slot_clicked && state.confirm_appears => {
                (0..state.confirmation_rows.len()).map(|i| state.alloc(Node::Row(i))).collect()
            }
            _ => Vec::new(),
        })
    }

    async fn query_within(
        &self,
        scope: &ElementHandle,
        selector: &str,
    ) -> Result<Vec<ElementHandle>, SurfaceError> {
        let mut state = self.state.lock().unwrap();
        let node = state
            .nodes
            .get(&scope.id())
            .cloned()
            .ok_or(SurfaceError::StaleHandle)?;
        Ok(match (node, selector) {
            (Node::PickerPanel, selectors::DATE_PICKER_DAYS) => {
                let (y, m) = state.visible;
                (1..=days_in_month(y, m)).map(|d| state.alloc(Node::DayCell(d))).collect()
            }
            (Node::DayCell(day), "a") => vec![state.alloc(Node::DayLink(day))],
            (Node::Column, sel) if sel == selectors::COLUMN_SPORT_LABEL => {
                vec![state.alloc(Node::SportLabel)]
            }
            (Node::Column, sel) if sel == selectors::SLOT_LINKS => {
                let count = state.current_offer().len();
                (0..count).map(|i| state.alloc(Node::Slot(i))).collect()
            }
            _ => Vec::new(),
        })
    }

    async fn text_of(&self, handle: &ElementHandle) -> Result<String, SurfaceError> {
        let state = self.state.lock().unwrap();
        let node = state.nodes.get(&handle.id()).ok_or(SurfaceError::StaleHandle)?;
        Ok(match node {
            Node::MonthLabel(y, m) => month_name(*y, *m),
            Node::DayCell(day) | Node::DayLink(day) => day.to_string(),
            Node::SportLabel => state.sport.clone(),
            Node::Slot(i) => state.current_offer().get(*i).cloned().unwrap_or_default(),
            Node::Row(i) => state.confirmation_rows.get(*i).cloned().unwrap_or_default(),
            Node::Notice => "No courts available".to_string(),
            Node::PickerPanel | Node::Column | Node::Confirm | Node::Acknowledge => String::new(),
        })
    }
}
