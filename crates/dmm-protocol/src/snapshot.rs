//! Measurement snapshot
//!
//! A [`Snapshot`] is what the UI renders: the decoded fields of the latest
//! frame, the range resolved from the calibration table, and the identity of
//! the meter it came from. Decoding never fails loudly. A frame that does not
//! validate leaves the snapshot exactly as it was.

use std::fmt;

use crate::display::peak_display_key;
use crate::error::FrameError;
use crate::frame::{Frame, StatusFlags};
use crate::function::FunctionMode;
use crate::range::{RangeEntry, RangeTable};
use crate::reading::Reading;
use crate::units::{to_base_unit, ScaledReading};

/// Which MAX/MIN indicator to show next to the bar graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MaxMinIcon {
    Max,
    Min,
    PeakMax,
    PeakMin,
}

impl MaxMinIcon {
    /// Short label as printed on the LCD
    pub fn label(&self) -> &'static str {
        match self {
            MaxMinIcon::Max => "MAX",
            MaxMinIcon::Min => "MIN",
            MaxMinIcon::PeakMax => "P-MAX",
            MaxMinIcon::PeakMin => "P-MIN",
        }
    }
}

/// Decoded state of one meter
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Snapshot {
    /// Measurement function, unset until a frame decodes
    pub function: Option<FunctionMode>,
    /// Range resolved from the calibration table
    pub range: Option<RangeEntry>,
    /// LCD reading
    pub reading: Option<Reading>,
    /// Bar graph fill
    pub bar_progress: i16,
    /// Status bits. Callers may override these between frames.
    pub flags: StatusFlags,
    /// Display name of the paired meter
    pub pair_name: String,
    /// Hardware address of the meter
    pub device_mac: String,
    /// Hardware variant (e.g. "UT61E+"), selects the calibration table
    pub type_name: String,
    /// Opaque key the UI uses to correlate snapshots
    pub display_id: String,
    /// Caller-assigned session state
    pub status: i32,
}

impl Snapshot {
    /// Create an empty snapshot for a paired meter
    pub fn new(pair_name: impl Into<String>, device_mac: impl Into<String>) -> Self {
        Self {
            pair_name: pair_name.into(),
            device_mac: device_mac.into(),
            ..Default::default()
        }
    }

    /// Set the hardware variant
    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = type_name.into();
        self
    }

    /// Decode `bytes` into this snapshot
    ///
    /// On error nothing is modified; the caller should wait for the next frame.
    pub fn apply_frame(&mut self, bytes: &[u8], table: &RangeTable) -> Result<(), FrameError> {
        match Frame::parse(bytes) {
            Ok(frame) => {
                self.apply(frame, table);
                Ok(())
            }
            Err(e) => {
                tracing::debug!("Dropping frame ({} bytes): {}", bytes.len(), e);
                Err(e)
            }
        }
    }

    /// Copy the fields of an already validated frame into this snapshot
    ///
    /// The range is cleared when the table has no entry for the frame.
    pub fn apply(&mut self, frame: Frame, table: &RangeTable) {
        self.range = table
            .resolve(frame.function.name(), frame.range_index)
            .cloned();
        self.function = Some(frame.function);
        self.reading = Some(frame.reading);
        self.bar_progress = frame.bar_progress;
        self.flags = frame.flags;
    }

    /// Display name of the function, if a frame has been decoded
    pub fn function_name(&self) -> Option<&'static str> {
        self.function.map(FunctionMode::name)
    }

    /// Range label (e.g. "220mV")
    pub fn range_label(&self) -> Option<&str> {
        self.range.as_ref().map(|r| r.label.as_str())
    }

    /// Unit of the reading
    pub fn unit(&self) -> Option<&str> {
        self.range.as_ref().map(|r| r.unit.as_str())
    }

    /// Upper bound of the current range
    pub fn max_value(&self) -> Option<f64> {
        self.range.as_ref().map(|r| r.max)
    }

    /// Lower bound of the current range
    pub fn min_value(&self) -> Option<f64> {
        self.range.as_ref().map(|r| r.min)
    }

    /// Reading text with spaces removed
    pub fn raw_value(&self) -> Option<&str> {
        self.reading.as_ref().map(Reading::as_str)
    }

    /// Returns whether the reading shows a positive over-limit
    pub fn is_max_ol_value(&self) -> bool {
        self.reading.as_ref().is_some_and(Reading::is_max_ol)
    }

    /// Returns whether the reading shows a negative over-limit
    pub fn is_min_ol_value(&self) -> bool {
        self.reading.as_ref().is_some_and(Reading::is_min_ol)
    }

    /// Returns whether the reading shows any over-limit
    pub fn is_overload(&self) -> bool {
        self.is_max_ol_value() || self.is_min_ol_value()
    }

    /// Reading as a number, `0.0` when unset or unparsable
    pub fn value_as_number(&self) -> f64 {
        self.reading.as_ref().map_or(0.0, Reading::as_number)
    }

    /// Reading converted to its base unit (e.g. 200 mV as 0.2 V)
    ///
    /// `None` when there is no range, the meter shows OL, or the reading is
    /// not a number.
    pub fn scaled_reading(&self) -> Option<ScaledReading> {
        let unit = self.unit()?;
        if self.is_overload() {
            return None;
        }
        let value: f64 = self.raw_value()?.trim().parse().ok()?;
        Some(to_base_unit(value, unit))
    }

    /// Returns whether the meter is measuring duty cycle
    pub fn is_percent(&self) -> bool {
        self.function.is_some_and(FunctionMode::is_percent)
    }

    /// Indicator to draw next to the bar graph, in MAX, MIN, P-MAX, P-MIN priority
    pub fn max_min_bar_icon(&self) -> Option<MaxMinIcon> {
        if self.flags.max {
            Some(MaxMinIcon::Max)
        } else if self.flags.min {
            Some(MaxMinIcon::Min)
        } else if self.flags.peak_max {
            Some(MaxMinIcon::PeakMax)
        } else if self.flags.peak_min {
            Some(MaxMinIcon::PeakMin)
        } else {
            None
        }
    }

    /// Name to label the meter with: the variant if known, else the pair name
    pub fn resolved_display_name(&self) -> &str {
        if self.type_name.is_empty() {
            &self.pair_name
        } else {
            &self.type_name
        }
    }

    /// Asset key for the range indicator
    ///
    /// Plain range label, except for peak readings on AC functions. See
    /// [`peak_display_key`].
    pub fn peak_display_key(&self) -> Option<String> {
        let function = self.function?;
        Some(peak_display_key(
            function,
            self.range_label()?,
            &self.type_name,
            self.flags.peak_max || self.flags.peak_min,
        ))
    }

    /// Returns whether MAX hold is active
    pub fn is_max(&self) -> bool {
        self.flags.max
    }

    /// Returns whether MIN hold is active
    pub fn is_min(&self) -> bool {
        self.flags.min
    }

    /// Returns whether HOLD is active
    pub fn is_hold(&self) -> bool {
        self.flags.hold
    }

    /// Returns whether relative mode is active
    pub fn is_rel(&self) -> bool {
        self.flags.rel
    }

    /// Returns whether auto ranging is active
    pub fn is_auto(&self) -> bool {
        self.flags.auto
    }

    /// Returns whether the battery is low
    pub fn is_battery(&self) -> bool {
        self.flags.battery
    }

    /// Returns whether the high voltage warning is lit
    pub fn is_hv_warning(&self) -> bool {
        self.flags.hv_warning
    }

    /// Returns whether the meter is coupled to DC
    pub fn is_dc(&self) -> bool {
        self.flags.dc
    }

    /// Returns whether peak MAX hold is active
    pub fn is_peak_max(&self) -> bool {
        self.flags.peak_max
    }

    /// Returns whether peak MIN hold is active
    pub fn is_peak_min(&self) -> bool {
        self.flags.peak_min
    }

    /// Returns whether the bar graph is drawn on the negative side
    pub fn is_bar_polarity_negative(&self) -> bool {
        self.flags.bar_polarity_negative
    }
}

/// Decode one frame into a fresh snapshot
pub fn decode(bytes: &[u8], table: &RangeTable) -> Result<Snapshot, FrameError> {
    let mut snapshot = Snapshot::default();
    snapshot.apply_frame(bytes, table)?;
    Ok(snapshot)
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(function) = self.function else {
            return write!(f, "{}: ---", self.resolved_display_name());
        };

        write!(
            f,
            "{}: {} {}",
            self.resolved_display_name(),
            if function.name().is_empty() { "?" } else { function.name() },
            self.raw_value().unwrap_or("---")
        )?;
        if let Some(unit) = self.unit() {
            write!(f, " {}", unit)?;
        }
        if let Some(label) = self.range_label() {
            write!(f, " [{}]", label)?;
        }
        write!(f, " bar={}", self.bar_progress)?;

        let flags = [
            (self.flags.auto, "AUTO"),
            (self.flags.dc, "DC"),
            (self.flags.hold, "HOLD"),
            (self.flags.rel, "REL"),
            (self.flags.max, "MAX"),
            (self.flags.min, "MIN"),
            (self.flags.peak_max, "P-MAX"),
            (self.flags.peak_min, "P-MIN"),
            (self.flags.battery, "BAT"),
            (self.flags.hv_warning, "HV"),
        ];
        for (_, name) in flags.iter().filter(|(on, _)| *on) {
            write!(f, " {}", name)?;
        }
        Ok(())
    }
}
