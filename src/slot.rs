//! Slot offer extraction and preference-ordered selection.

use crate::error::AttemptError;
use crate::surface::ElementHandle;
use std::collections::HashMap;

/// The time slots currently presented as selectable for one sport column.
///
/// Keys are the time-of-day labels exactly as the UI renders them (trimmed).
/// Handles are attempt-scoped: the offer is rebuilt from a fresh query every
/// attempt and discarded at attempt end, whatever the outcome.
#[derive(Debug, Default, Clone)]
pub struct SlotOffer {
    slots: HashMap<String, ElementHandle>,
}

impl SlotOffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a slot. Later duplicates of a label are ignored; the UI keys
    /// slots uniquely by label, so a duplicate means a stale read.
    pub fn insert(&mut self, label: impl Into<String>, handle: ElementHandle) {
        self.slots.entry(label.into()).or_insert(handle);
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn get(&self, label: &str) -> Option<&ElementHandle> {
        self.slots.get(label)
    }

    /// Offered labels, in no particular order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }
}

impl<L: Into<String>> FromIterator<(L, ElementHandle)> for SlotOffer {
    fn from_iter<I: IntoIterator<Item = (L, ElementHandle)>>(iter: I) -> Self {
        let mut offer = Self::new();
        for (label, handle) in iter {
            offer.insert(label, handle);
        }
        offer
    }
}

/// Pick the highest-priority preferred time present in the offer.
///
/// `preferred` is scanned in order; the first label that is a key of the
/// offer wins. [`AttemptError::NoSlotMatched`] if none are. Whether a fresh
/// attempt might yield a different offer is the caller's call, not this
/// layer's.
pub fn select_best_slot<'a, S: AsRef<str>>(
    offer: &'a SlotOffer,
    preferred: &[S],
) -> Result<&'a ElementHandle, AttemptError> {
    preferred
        .iter()
        .find_map(|label| offer.get(label.as_ref()))
        .ok_or(AttemptError::NoSlotMatched)
}
