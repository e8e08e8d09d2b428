//! Calibration range table
//!
//! The meter only reports a function code and a single range digit. What
//! that digit means (label, unit, bounds) comes from a per-variant range
//! table shipped alongside the app. This module holds the in-memory table
//! and the lookup rule; loading documents into it lives in `dmm-calibration`.

use std::collections::HashMap;

/// One resolved range: `[label, unit, max, min]` in the calibration document
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RangeEntry {
    /// Range label shown next to the reading (e.g. "220mV")
    pub label: String,
    /// Unit of the displayed reading (e.g. "mV")
    pub unit: String,
    /// Upper bound of the range
    pub max: f64,
    /// Lower bound of the range
    pub min: f64,
}

impl RangeEntry {
    /// Create a range entry
    pub fn new(label: impl Into<String>, unit: impl Into<String>, max: f64, min: f64) -> Self {
        Self {
            label: label.into(),
            unit: unit.into(),
            max,
            min,
        }
    }
}

/// Value stored under a range index key
#[derive(Debug, Clone, PartialEq)]
pub enum RangeSlot {
    /// A well-formed four element entry
    Entry(RangeEntry),
    /// A list, but not of four elements. Resolves to nothing without falling back.
    Malformed { len: usize },
    /// Some other value. Counts as a key but never resolves.
    NotARange,
}

/// Ranges for a single function, keyed by range index string ("0", "1", ...)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FunctionRanges {
    slots: HashMap<String, RangeSlot>,
}

impl FunctionRanges {
    /// Create an empty set of ranges
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the slot under `key`
    pub fn insert(&mut self, key: impl Into<String>, slot: RangeSlot) {
        self.slots.insert(key.into(), slot);
    }

    /// Convenience for inserting a well-formed entry
    pub fn insert_entry(&mut self, key: impl Into<String>, entry: RangeEntry) {
        self.insert(key, RangeSlot::Entry(entry));
    }

    /// Get the raw slot stored under `key`
    pub fn get(&self, key: &str) -> Option<&RangeSlot> {
        self.slots.get(key)
    }

    /// Number of keys, including slots that are not ranges
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if there are no keys
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Resolve a range index to an entry
    ///
    /// If `index` is missing (or holds something that is not a list), the
    /// key `len - 1` is used instead. Calibration documents store the ranges
    /// as a dense run `"0".."N-1"`, and the last one doubles as the auto
    /// range, so the fallback picks that up.
    pub fn resolve(&self, index: &str) -> Option<&RangeEntry> {
        let slot = match self.slots.get(index) {
            Some(slot @ (RangeSlot::Entry(_) | RangeSlot::Malformed { .. })) => slot,
            _ => {
                let last = self.slots.len().checked_sub(1)?;
                self.slots.get(&last.to_string())?
            }
        };

        match slot {
            RangeSlot::Entry(entry) => Some(entry),
            RangeSlot::Malformed { .. } | RangeSlot::NotARange => None,
        }
    }
}

/// Range table for one device variant, keyed by function display name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RangeTable {
    functions: HashMap<String, FunctionRanges>,
}

impl RangeTable {
    /// Create an empty table (every lookup resolves to nothing)
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the ranges for a function
    pub fn insert_function(&mut self, name: impl Into<String>, ranges: FunctionRanges) {
        self.functions.insert(name.into(), ranges);
    }

    /// Ranges for a function display name
    pub fn function(&self, name: &str) -> Option<&FunctionRanges> {
        self.functions.get(name)
    }

    /// Names of all functions present in the table
    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    /// Number of functions in the table
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Returns true if the table holds no functions
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Resolve `(function, range index)` to an entry
    pub fn resolve(&self, function: &str, index: i32) -> Option<&RangeEntry> {
        self.functions.get(function)?.resolve(&index.to_string())
    }
}
