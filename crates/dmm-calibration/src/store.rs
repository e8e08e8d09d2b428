//! Shared, swappable range table
//!
//! The store owns the table every decode call reads. Selecting a variant
//! loads a new table and swaps it in with a single write; readers hold an
//! `Arc` to whichever table was current when they started, so they never see
//! a half-loaded one. Loading is best effort: on any failure the previous
//! table stays in place.

use std::sync::{Arc, PoisonError, RwLock};

use dmm_protocol::{FrameError, RangeTable, Snapshot};
use serde_json::Value;

use crate::document::{parse_json, table_from_document, variant_document, DEFAULT_DOCUMENT};
use crate::error::CalibrationError;
use crate::source::CalibrationSource;

/// What a load attempt did to the store
#[derive(Debug)]
pub enum LoadOutcome {
    /// A new table was swapped in
    Loaded {
        /// Document the table came from
        document: String,
        /// Number of functions in the new table
        functions: usize,
    },
    /// The previous table was kept
    Kept {
        /// Why nothing was loaded
        reason: CalibrationError,
    },
}

impl LoadOutcome {
    /// Returns true if a new table was swapped in
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadOutcome::Loaded { .. })
    }
}

/// Cloneable handle to the current range table
///
/// Clones share the same table; a variant switch through any handle is seen
/// by all of them.
#[derive(Clone)]
pub struct RangeTableStore {
    source: Arc<dyn CalibrationSource>,
    current: Arc<RwLock<Arc<RangeTable>>>,
}

impl RangeTableStore {
    /// Create a store holding an empty table
    pub fn new(source: impl CalibrationSource + 'static) -> Self {
        Self {
            source: Arc::new(source),
            current: Arc::new(RwLock::new(Arc::new(RangeTable::new()))),
        }
    }

    /// Create a store and eagerly load the default document
    pub fn with_default(source: impl CalibrationSource + 'static) -> Self {
        let store = Self::new(source);
        store.load_default();
        store
    }

    /// Table to decode against
    pub fn current(&self) -> Arc<RangeTable> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the current table, returning the previous one
    pub fn swap(&self, table: RangeTable) -> Arc<RangeTable> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(table))
    }

    /// Load the default document
    pub fn load_default(&self) -> LoadOutcome {
        let outcome = match self.load_document(DEFAULT_DOCUMENT) {
            Ok(doc) => self.install(DEFAULT_DOCUMENT, &doc),
            Err(reason) => LoadOutcome::Kept { reason },
        };
        self.log_outcome(&outcome);
        outcome
    }

    /// Load the table for a device variant
    ///
    /// Uses `funOl_<type_name>` if it exists and parses, otherwise the default
    /// document. A document without an `"OL"` table leaves the current table
    /// in place.
    pub fn select_variant(&self, type_name: &str) -> LoadOutcome {
        let variant = variant_document(type_name);
        let outcome = match self.load_document(&variant) {
            Ok(doc) => self.install(&variant, &doc),
            Err(e) => {
                tracing::debug!("No usable calibration for {:?} ({}), using default", type_name, e);
                match self.load_document(DEFAULT_DOCUMENT) {
                    Ok(doc) => self.install(DEFAULT_DOCUMENT, &doc),
                    Err(reason) => LoadOutcome::Kept { reason },
                }
            }
        };
        self.log_outcome(&outcome);
        outcome
    }

    /// Decode a frame against the current table
    pub fn decode(&self, bytes: &[u8]) -> Result<Snapshot, FrameError> {
        dmm_protocol::decode(bytes, &self.current())
    }

    /// Decode a frame into an existing snapshot against the current table
    pub fn apply_frame(&self, snapshot: &mut Snapshot, bytes: &[u8]) -> Result<(), FrameError> {
        snapshot.apply_frame(bytes, &self.current())
    }

    fn load_document(&self, name: &str) -> Result<Value, CalibrationError> {
        let text = self
            .source
            .load(name)
            .ok_or_else(|| CalibrationError::NotFound(name.to_string()))?;
        parse_json(name, &text)
    }

    fn install(&self, name: &str, doc: &Value) -> LoadOutcome {
        match table_from_document(name, doc) {
            Ok(table) => {
                let functions = table.len();
                self.swap(table);
                LoadOutcome::Loaded {
                    document: name.to_string(),
                    functions,
                }
            }
            Err(reason) => LoadOutcome::Kept { reason },
        }
    }

    fn log_outcome(&self, outcome: &LoadOutcome) {
        match outcome {
            LoadOutcome::Loaded {
                document,
                functions,
            } => tracing::info!("Loaded calibration {} ({} functions)", document, functions),
            LoadOutcome::Kept { reason } => {
                tracing::warn!("Keeping previous calibration table: {}", reason)
            }
        }
    }
}

impl std::fmt::Debug for RangeTableStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RangeTableStore")
            .field("functions", &self.current().len())
            .finish_non_exhaustive()
    }
}
