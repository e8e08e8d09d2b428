//! Seven-character display reading
//!
//! Bytes 5..=11 of a frame mirror the LCD digits: right-aligned, padded with
//! spaces, optionally signed, and replaced by `OL` patterns on overload.
//! Bytes are mapped one-to-one onto characters and never validated as UTF-8.

use std::fmt;

/// Width of the reading field in a frame
pub const READING_LEN: usize = 7;

const MAX_OL: [&str; 4] = [".OL", "O.L", "OL.", "OL"];
const MIN_OL: [&str; 4] = ["-.OL", "-O.L", "-OL.", "-OL"];

/// The display reading exactly as sent, plus its space-stripped text
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reading {
    raw: [u8; READING_LEN],
    text: String,
}

impl Reading {
    /// Build a reading from the raw display bytes
    pub fn from_bytes(raw: [u8; READING_LEN]) -> Self {
        let text = raw
            .iter()
            .map(|&b| char::from(b))
            .filter(|&c| c != ' ')
            .collect();
        Self { raw, text }
    }

    /// Build a reading from display text, right-aligned and space padded
    ///
    /// Text longer than the field keeps its first seven bytes.
    pub fn from_text(text: &str) -> Self {
        let mut raw = [b' '; READING_LEN];
        let bytes = text.as_bytes();
        let len = bytes.len().min(READING_LEN);
        raw[READING_LEN - len..].copy_from_slice(&bytes[..len]);
        Self::from_bytes(raw)
    }

    /// Raw display bytes
    pub fn raw(&self) -> &[u8; READING_LEN] {
        &self.raw
    }

    /// Display text with spaces removed
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Returns whether the reading is a positive over-limit pattern
    pub fn is_max_ol(&self) -> bool {
        MAX_OL.contains(&self.text.as_str())
    }

    /// Returns whether the reading is a negative over-limit pattern
    pub fn is_min_ol(&self) -> bool {
        self.text.contains('-') && MIN_OL.contains(&self.text.as_str())
    }

    /// Parse the reading as a number, yielding `0.0` on anything unparsable
    pub fn as_number(&self) -> f64 {
        self.text.trim().parse().unwrap_or(0.0)
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
