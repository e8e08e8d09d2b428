//! Multimeter Calibration Library
//!
//! This crate turns the vendor's calibration documents into the
//! [`RangeTable`](dmm_protocol::RangeTable) the decoder resolves range digits
//! against, and holds the table currently in use.
//!
//! - **Documents**: `funOl.json` for the default table, `funOl_<type>.json`
//!   for a specific meter variant
//! - **Sources**: a directory on disk, the documents built into this crate,
//!   or both layered
//! - **Store**: a cloneable handle whose table can be swapped while decoders
//!   keep reading
//!
//! # Example
//!
//! ```rust
//! use dmm_calibration::{BuiltinSource, RangeTableStore};
//!
//! let store = RangeTableStore::with_default(BuiltinSource);
//! assert!(store.select_variant("UT61D+").is_loaded());
//!
//! let aca = store.current().resolve("ACA", 0).map(|e| e.label.clone());
//! assert_eq!(aca.as_deref(), Some("6A"));
//! ```

pub mod document;
pub mod error;
pub mod source;
pub mod store;

pub use document::{parse_document, variant_document, DEFAULT_DOCUMENT, TABLE_KEY};
pub use error::CalibrationError;
pub use source::{AssetDir, BuiltinSource, CalibrationSource, LayeredSource, MemorySource};
pub use store::{LoadOutcome, RangeTableStore};
