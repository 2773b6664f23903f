use super::types::{AppointmentSlotDraft, LedgerEntryDraft, TaskDraft};
use serde::{Deserialize, Serialize};

/// An entry that can say whether its required domain fields are filled in.
///
/// Incomplete entries are flagged, never excluded: the user completes them
/// before confirming.
pub trait BatchEntry {
    fn is_complete(&self) -> bool;
}

/// Multiple domain records extracted from one utterance, as an editable list.
///
/// Entries are positionally indexed, not id-keyed; they have no persisted
/// identity yet, so removal shifts subsequent entries down.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchDraft<T> {
    pub entries: Vec<T>,

    /// Index of the entry currently open for inline editing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_entry: Option<usize>,
}

impl<T> BatchDraft<T> {
    pub fn new(entries: Vec<T>) -> Self {
        Self {
            entries,
            active_entry: None,
        }
    }

    pub fn total_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a blank entry with domain defaults and mark it as the active
    /// edit target. Returns its index.
    pub fn add_entry(&mut self) -> usize
    where
        T: Default,
    {
        self.entries.push(T::default());
        let index = self.entries.len() - 1;
        self.active_entry = Some(index);
        index
    }

    /// Remove by position; subsequent entries shift down. Out-of-range
    /// indices are ignored.
    pub fn remove_entry(&mut self, index: usize) -> Option<T> {
        if index >= self.entries.len() {
            return None;
        }

        let removed = self.entries.remove(index);

        self.active_entry = match self.active_entry {
            Some(active) if active == index => None,
            Some(active) if active > index => Some(active - 1),
            other => other,
        };

        Some(removed)
    }

    /// Replace the whole list atomically (used after inline edits).
    pub fn set_entries(&mut self, entries: Vec<T>) {
        self.entries = entries;
        if let Some(active) = self.active_entry {
            if active >= self.entries.len() {
                self.active_entry = None;
            }
        }
    }

    /// Concatenate entries from another batch (explicit append action only;
    /// a normal refinement replaces lists wholesale).
    pub fn extend(&mut self, more: Vec<T>) {
        self.entries.extend(more);
    }

    /// Positions of entries still missing required fields.
    pub fn incomplete_indices(&self) -> Vec<usize>
    where
        T: BatchEntry,
    {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| !entry.is_complete())
            .map(|(index, _)| index)
            .collect()
    }
}

impl BatchEntry for LedgerEntryDraft {
    fn is_complete(&self) -> bool {
        self.date.is_some() && self.description.is_some() && self.amount.is_some()
    }
}

impl BatchEntry for TaskDraft {
    fn is_complete(&self) -> bool {
        self.title.is_some() && self.due_date.is_some()
    }
}

impl BatchEntry for AppointmentSlotDraft {
    fn is_complete(&self) -> bool {
        self.date.is_some() && self.time.is_some() && self.patient_name.is_some()
    }
}
