//! Calibration document parsing
//!
//! # Document Format
//! ```text
//! { "OL": { "<function>": { "<range index>": [label, unit, max, min], ... }, ... } }
//! ```
//!
//! Values are coerced the way the vendor app reads them: labels and units
//! may be any scalar, bounds may be numbers or numeric strings (anything else
//! becomes NaN), and a list that is not exactly four long is kept but never
//! resolves.

use dmm_protocol::{FunctionRanges, RangeEntry, RangeSlot, RangeTable};
use serde_json::{Map, Value};

use crate::error::CalibrationError;

/// Top-level key holding the range table
pub const TABLE_KEY: &str = "OL";
/// Name of the document used when no variant-specific one exists
pub const DEFAULT_DOCUMENT: &str = "funOl";

/// Name of the variant-specific document for `type_name`
pub fn variant_document(type_name: &str) -> String {
    format!("{}_{}", DEFAULT_DOCUMENT, type_name)
}

/// Parse document text into JSON
pub fn parse_json(name: &str, text: &str) -> Result<Value, CalibrationError> {
    serde_json::from_str(text).map_err(|source| CalibrationError::Json {
        name: name.to_string(),
        source,
    })
}

/// Extract the range table from a parsed document
pub fn table_from_document(name: &str, doc: &Value) -> Result<RangeTable, CalibrationError> {
    let ol = doc
        .get(TABLE_KEY)
        .and_then(Value::as_object)
        .ok_or_else(|| CalibrationError::MissingTable(name.to_string()))?;
    Ok(table_from_map(ol))
}

/// Parse document text straight into a range table
pub fn parse_document(name: &str, text: &str) -> Result<RangeTable, CalibrationError> {
    table_from_document(name, &parse_json(name, text)?)
}

fn table_from_map(ol: &Map<String, Value>) -> RangeTable {
    let mut table = RangeTable::new();
    for (function, ranges) in ol {
        let Some(ranges) = ranges.as_object() else {
            tracing::debug!("Skipping non-object ranges for function {:?}", function);
            continue;
        };

        let mut slots = FunctionRanges::new();
        for (index, value) in ranges {
            slots.insert(index.clone(), slot_from_value(value));
        }
        table.insert_function(function.clone(), slots);
    }
    table
}

fn slot_from_value(value: &Value) -> RangeSlot {
    match value {
        Value::Array(items) if items.len() == 4 => RangeSlot::Entry(RangeEntry::new(
            text(&items[0]),
            text(&items[1]),
            number(&items[2]),
            number(&items[3]),
        )),
        Value::Array(items) => RangeSlot::Malformed { len: items.len() },
        _ => RangeSlot::NotARange,
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}
