//! Decoding session: calibration store, current snapshot, and output format

use anyhow::{Context, Result};
use dmm_calibration::{AssetDir, BuiltinSource, LayeredSource, LoadOutcome, RangeTableStore};
use dmm_protocol::{
    display::annotate, frame::verify_trailer, FrameError, ScaledReading, Snapshot, StatusFlags,
};
use serde::Serialize;

use crate::settings::Settings;

/// How decoded frames are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Snapshot summary line
    Text,
    /// Segment-by-segment hex dump
    Annotated,
    /// One JSON object per frame
    Json,
}

/// One decoded frame as printed with `--json`
#[derive(Debug, Serialize)]
struct Report<'a> {
    meter: &'a str,
    function: Option<&'static str>,
    reading: Option<&'a str>,
    value: f64,
    unit: Option<&'a str>,
    range: Option<&'a str>,
    scaled: Option<ScaledReading>,
    overload: bool,
    icon: Option<&'static str>,
    range_key: Option<String>,
    bar_progress: i16,
    flags: StatusFlags,
    checksum_ok: Option<bool>,
}

/// Decodes frames against the configured calibration and renders them
pub struct Session {
    store: RangeTableStore,
    snapshot: Snapshot,
    format: OutputFormat,
}

impl Session {
    /// Build the calibration store from settings and select the variant
    pub fn new(settings: &Settings, format: OutputFormat) -> Self {
        let mut source = LayeredSource::new();
        if let Some(dir) = &settings.calibration_dir {
            source = source.with_layer(AssetDir::new(dir));
        }
        let store = RangeTableStore::new(source.with_layer(BuiltinSource));

        if let LoadOutcome::Loaded { document, .. } = store.select_variant(&settings.variant) {
            tracing::debug!("Variant {} uses {}", settings.variant, document);
        }

        let snapshot =
            Snapshot::new(settings.pair_name.clone(), "").with_type_name(settings.variant.clone());

        Self {
            store,
            snapshot,
            format,
        }
    }

    /// Latest decoded state
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Decode one frame into the snapshot and render it
    ///
    /// A frame that fails validation leaves the snapshot as it was.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<String, FrameError> {
        self.store.apply_frame(&mut self.snapshot, bytes)?;

        let checksum_ok = verify_trailer(bytes);
        if checksum_ok == Some(false) {
            tracing::warn!("Checksum mismatch in frame {}", hex::encode_upper(bytes));
        }

        Ok(match self.format {
            OutputFormat::Text => self.snapshot.to_string(),
            OutputFormat::Annotated => {
                let annotated = annotate(bytes)?;
                format!("{}\n{}", annotated.summary, annotated.hex_dump())
            }
            OutputFormat::Json => self.to_json(checksum_ok),
        })
    }

    /// Decode a hex line; blank lines and `#` comments yield `None`
    pub fn feed_hex(&mut self, line: &str) -> Result<Option<String>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        let bytes = parse_hex(line)?;
        let rendered = self
            .feed(&bytes)
            .with_context(|| format!("dropped frame {}", hex::encode_upper(&bytes)))?;
        Ok(Some(rendered))
    }

    fn to_json(&self, checksum_ok: Option<bool>) -> String {
        let s = &self.snapshot;
        let report = Report {
            meter: s.resolved_display_name(),
            function: s.function_name(),
            reading: s.raw_value(),
            value: s.value_as_number(),
            unit: s.unit(),
            range: s.range_label(),
            scaled: s.scaled_reading(),
            overload: s.is_overload(),
            icon: s.max_min_bar_icon().map(|icon| icon.label()),
            range_key: s.peak_display_key(),
            bar_progress: s.bar_progress,
            flags: s.flags,
            checksum_ok,
        };
        serde_json::to_string(&report).unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e))
    }
}

/// Parse hex bytes, ignoring whitespace and `:`/`-` separators
pub fn parse_hex(text: &str) -> Result<Vec<u8>> {
    let digits: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':' && *c != '-')
        .collect();
    let digits = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
        .unwrap_or(&digits);
    hex::decode(digits).with_context(|| format!("invalid hex frame {:?}", text))
}
