use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use super::Document;
use crate::entity::{DayIndex, Record, RecordId, MAX_RECORD_ID};

/// Day-scoped, insertion-ordered collection of records.
///
/// Every mutation returns a new ledger; each day's sequence sits behind an
/// `Arc`, so only the touched day is copied and older snapshots stay valid.
/// Serializes as `{ "<day>": [record, ...] }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Ledger<T> {
    days: BTreeMap<DayIndex, Arc<Vec<T>>>,
}

impl<T> Default for Ledger<T> {
    fn default() -> Self {
        Self {
            days: BTreeMap::new(),
        }
    }
}

impl<T: Record> Ledger<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of one day's records. Absent days are empty.
    pub fn day(&self, day: DayIndex) -> Arc<Vec<T>> {
        self.days.get(&day).cloned().unwrap_or_default()
    }

    pub fn get(&self, day: DayIndex, id: RecordId) -> Option<&T> {
        self.days.get(&day)?.iter().find(|r| r.id() == id)
    }

    pub fn contains(&self, day: DayIndex, id: RecordId) -> bool {
        self.get(day, id).is_some()
    }

    pub fn append(&self, day: DayIndex, record: T) -> Self {
        let mut records = (*self.day(day)).clone();
        records.push(record);
        self.with_day(day, records)
    }

    /// Replace the record with `id` by `f(record)`. `None` if it is not on
    /// that day.
    pub fn replace<F>(&self, day: DayIndex, id: RecordId, f: F) -> Option<Self>
    where
        F: FnOnce(&T) -> T,
    {
        let current = self.days.get(&day)?;
        let pos = current.iter().position(|r| r.id() == id)?;
        let mut records = (**current).clone();
        records[pos] = f(&current[pos]);
        Some(self.with_day(day, records))
    }

    /// Remove the record with `id`. `None` if it is not on that day.
    pub fn remove(&self, day: DayIndex, id: RecordId) -> Option<Self> {
        let current = self.days.get(&day)?;
        let pos = current.iter().position(|r| r.id() == id)?;
        let mut records = (**current).clone();
        records.remove(pos);
        Some(self.with_day(day, records))
    }

    /// All records, days in ascending index order, creation order within a day.
    pub fn records(&self) -> impl Iterator<Item = &T> {
        self.days.values().flat_map(|records| records.iter())
    }

    pub fn days(&self) -> impl Iterator<Item = (DayIndex, &[T])> {
        self.days
            .iter()
            .map(|(day, records)| (*day, records.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.days.values().map(|records| records.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_id(&self) -> Option<RecordId> {
        self.records().map(|r| r.id()).max()
    }

    fn with_day(&self, day: DayIndex, records: Vec<T>) -> Self {
        let mut days = self.days.clone();
        days.insert(day, Arc::new(records));
        Self { days }
    }
}

impl<T: Record + DeserializeOwned> Ledger<T> {
    /// Rebuild a ledger from a loaded document.
    ///
    /// Entries that cannot belong to a valid ledger are dropped with a
    /// warning: non-numeric day keys, non-array day values, records that fail
    /// to deserialize or validate, ids past [`MAX_RECORD_ID`] and repeated
    /// ids. Keys naming the same day (`"7"`, `"007"`) are merged in order.
    pub fn from_document(document: &Document) -> Self {
        let mut days: BTreeMap<DayIndex, Vec<T>> = BTreeMap::new();
        let mut seen = HashSet::new();

        for (key, value) in document {
            let Ok(day) = key.parse::<DayIndex>() else {
                warn!(kind = T::KIND, key = %key, "skipping non-numeric day key");
                continue;
            };
            let Value::Array(items) = value else {
                warn!(kind = T::KIND, day, "skipping day that is not a list");
                continue;
            };

            let mut records = Vec::with_capacity(items.len());
            for item in items {
                match serde_json::from_value::<T>(item.clone()) {
                    Ok(record) if !record.is_valid() => {
                        warn!(kind = T::KIND, day, id = record.id(), "dropping invalid record");
                    }
                    Ok(record) if record.id() > MAX_RECORD_ID => {
                        warn!(kind = T::KIND, day, id = record.id(), "dropping out-of-range id");
                    }
                    Ok(record) if !seen.insert(record.id()) => {
                        warn!(kind = T::KIND, day, id = record.id(), "dropping duplicate id");
                    }
                    Ok(record) => records.push(record),
                    Err(e) => {
                        warn!(kind = T::KIND, day, error = %e, "dropping unreadable record");
                    }
                }
            }
            match days.entry(day) {
                Entry::Vacant(slot) => {
                    slot.insert(records);
                }
                Entry::Occupied(mut slot) => {
                    warn!(kind = T::KIND, day, key = %key, "merging repeated day key");
                    slot.get_mut().extend(records);
                }
            }
        }

        Self {
            days: days
                .into_iter()
                .map(|(day, records)| (day, Arc::new(records)))
                .collect(),
        }
    }
}
