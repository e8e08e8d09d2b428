//! Display helpers for decoded frames
//!
//! This module provides the range indicator asset key used by the UI, and
//! byte-level annotation of frames for hex dumps.

use std::ops::Range;

use crate::error::FrameError;
use crate::frame::{verify_trailer, Frame, DATA_LEN};
use crate::function::FunctionMode;

/// Range labels that have a dedicated artwork variant on E-series meters
const E_SERIES_PEAK_LABELS: [&str; 2] = ["1000V", "20A"];

/// Asset key for the range indicator
///
/// Peak readings on AC functions use their own artwork, keyed
/// `<function>_peak_<range>`. E-series meters (variant name contains `E`)
/// have separate artwork for the 1000V and 20A ranges, keyed with an `e_`
/// prefix. Everything else just uses the range label.
pub fn peak_display_key(
    function: FunctionMode,
    range_label: &str,
    type_name: &str,
    peak: bool,
) -> String {
    if !peak || !function.has_ac_peak() {
        return range_label.to_string();
    }

    let key = format!("{}_peak_{}", function.name().to_lowercase(), range_label);
    let key = if E_SERIES_PEAK_LABELS.contains(&range_label) && type_name.contains('E') {
        format!("e_{}", key)
    } else {
        key
    };
    tracing::trace!("Peak display key: {}", key);
    key
}

/// Type of segment for UI coloring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentType {
    /// Magic bytes
    Magic,
    /// Declared length
    Length,
    /// Function code
    Function,
    /// Range digit
    Range,
    /// LCD reading characters
    Reading,
    /// Bar graph bytes
    Bar,
    /// Status bit bytes
    Status,
    /// Bytes the decoder does not interpret
    Reserved,
    /// Trailing checksum
    Checksum,
}

/// A segment of a decoded frame with annotation
#[derive(Debug, Clone)]
pub struct FrameSegment {
    /// Byte range in the original data
    pub range: Range<usize>,
    /// Label for this segment (e.g. "magic", "func")
    pub label: &'static str,
    /// Decoded value as a string
    pub value: String,
    /// Type of segment (UI maps this to colors)
    pub segment_type: SegmentType,
}

impl FrameSegment {
    fn new(
        range: Range<usize>,
        label: &'static str,
        value: impl Into<String>,
        segment_type: SegmentType,
    ) -> Self {
        Self {
            range,
            label,
            value: value.into(),
            segment_type,
        }
    }
}

/// Annotated frame ready for display
#[derive(Debug, Clone)]
pub struct AnnotatedFrame {
    /// One-line decoded summary
    pub summary: String,
    /// Annotated byte segments, in order
    pub segments: Vec<FrameSegment>,
    /// The annotated bytes
    pub bytes: Vec<u8>,
}

impl AnnotatedFrame {
    /// Render as a hex dump, one segment per line
    pub fn hex_dump(&self) -> String {
        let mut out = String::new();
        for seg in &self.segments {
            let Some(data) = self.bytes.get(seg.range.clone()) else {
                continue;
            };
            let hex: Vec<String> = data
                .iter()
                .map(|b| format!("{:02X}", b))
                .collect();
            out.push_str(&format!("{:<8} {:<21} {}\n", seg.label, hex.join(" "), seg.value));
        }
        out
    }
}

/// Annotate a measurement frame byte by byte
pub fn annotate(bytes: &[u8]) -> Result<AnnotatedFrame, FrameError> {
    let frame = Frame::parse(bytes)?;

    let flag_names = |pairs: &[(bool, &str)]| -> String {
        let on: Vec<&str> = pairs.iter().filter(|(on, _)| *on).map(|(_, n)| *n).collect();
        if on.is_empty() {
            "-".to_string()
        } else {
            on.join(",")
        }
    };
    let f = &frame.flags;

    let mut segments = vec![
        FrameSegment::new(0..2, "magic", "", SegmentType::Magic),
        FrameSegment::new(2..3, "len", (bytes[2] as i8).to_string(), SegmentType::Length),
        FrameSegment::new(3..4, "func", frame.function.name(), SegmentType::Function),
        FrameSegment::new(4..5, "range", frame.range_index.to_string(), SegmentType::Range),
        FrameSegment::new(
            5..12,
            "reading",
            format!("\"{}\"", frame.reading),
            SegmentType::Reading,
        ),
        FrameSegment::new(12..14, "bar", frame.bar_progress.to_string(), SegmentType::Bar),
        FrameSegment::new(
            14..15,
            "s14",
            flag_names(&[(f.max, "MAX"), (f.min, "MIN"), (f.hold, "HOLD"), (f.rel, "REL")]),
            SegmentType::Status,
        ),
        FrameSegment::new(
            15..16,
            "s15",
            flag_names(&[(f.auto, "AUTO"), (f.battery, "BAT"), (f.hv_warning, "HV")]),
            SegmentType::Status,
        ),
        FrameSegment::new(
            16..17,
            "s16",
            flag_names(&[
                (f.dc, "DC"),
                (f.peak_max, "P-MAX"),
                (f.peak_min, "P-MIN"),
                (f.bar_polarity_negative, "BAR-"),
            ]),
            SegmentType::Status,
        ),
    ];

    let len = bytes.len();
    let trailer = verify_trailer(bytes).map(|ok| {
        FrameSegment::new(
            len - 2..len,
            "sum",
            if ok { "ok" } else { "mismatch" },
            SegmentType::Checksum,
        )
    });
    let reserved_end = if trailer.is_some() { len - 2 } else { len };
    if reserved_end > DATA_LEN {
        segments.push(FrameSegment::new(
            DATA_LEN..reserved_end,
            "rsvd",
            "",
            SegmentType::Reserved,
        ));
    }
    segments.extend(trailer);

    let summary = format!(
        "{} range {} reading \"{}\" bar {}",
        frame.function.name(),
        frame.range_index,
        frame.reading,
        frame.bar_progress
    );

    Ok(AnnotatedFrame {
        summary,
        segments,
        bytes: bytes.to_vec(),
    })
}
