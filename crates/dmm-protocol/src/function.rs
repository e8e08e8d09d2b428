//! Measurement function modes
//!
//! Byte 3 of every frame selects what the rotary switch (plus the SELECT
//! button) currently measures. The meter reports 31 real functions; code 31
//! and anything above it is an unknown sentinel with an empty display name.

use std::fmt;

/// Measurement function reported by the meter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum FunctionMode {
    /// AC volts
    AcV = 0,
    /// AC millivolts
    AcMv = 1,
    /// DC volts
    DcV = 2,
    /// DC millivolts
    DcMv = 3,
    /// Frequency
    Frequency = 4,
    /// Duty cycle
    DutyCycle = 5,
    /// Resistance
    Resistance = 6,
    /// Continuity
    Continuity = 7,
    /// Diode test
    Diode = 8,
    /// Capacitance
    Capacitance = 9,
    /// Temperature, Celsius
    TempC = 10,
    /// Temperature, Fahrenheit
    TempF = 11,
    /// DC microamps
    DcUa = 12,
    /// AC microamps
    AcUa = 13,
    /// DC milliamps
    DcMa = 14,
    /// AC milliamps
    AcMa = 15,
    /// DC amps
    DcA = 16,
    /// AC amps
    AcA = 17,
    /// Transistor hFE
    Hfe = 18,
    /// Live line detection
    Live = 19,
    /// Non-contact voltage
    Ncv = 20,
    /// Low-impedance voltage
    LozV = 21,
    /// AC amps (clamp input)
    AcA2 = 22,
    /// DC amps (clamp input)
    DcA2 = 23,
    /// Low-pass filtered voltage
    Lpf = 24,
    /// AC/DC voltage
    AcDc = 25,
    /// Low-pass filtered current
    Lpf2 = 26,
    /// AC+DC current
    AcPlusDc = 27,
    /// Low-pass filtered current (clamp input)
    Lpf3 = 28,
    /// AC+DC current (clamp input)
    AcPlusDc2 = 29,
    /// Inrush current
    Inrush = 30,
    /// Unknown or out-of-range function code
    Unknown = 31,
}

impl FunctionMode {
    /// Every function, indexed by wire code
    pub const ALL: [FunctionMode; 32] = [
        Self::AcV,
        Self::AcMv,
        Self::DcV,
        Self::DcMv,
        Self::Frequency,
        Self::DutyCycle,
        Self::Resistance,
        Self::Continuity,
        Self::Diode,
        Self::Capacitance,
        Self::TempC,
        Self::TempF,
        Self::DcUa,
        Self::AcUa,
        Self::DcMa,
        Self::AcMa,
        Self::DcA,
        Self::AcA,
        Self::Hfe,
        Self::Live,
        Self::Ncv,
        Self::LozV,
        Self::AcA2,
        Self::DcA2,
        Self::Lpf,
        Self::AcDc,
        Self::Lpf2,
        Self::AcPlusDc,
        Self::Lpf3,
        Self::AcPlusDc2,
        Self::Inrush,
        Self::Unknown,
    ];

    /// Decode a function byte, clamping anything outside `0..=31` to [`FunctionMode::Unknown`]
    pub fn from_code(code: u8) -> Self {
        Self::ALL
            .get(code as usize)
            .copied()
            .unwrap_or(Self::Unknown)
    }

    /// Wire code for this function
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Display name, which is also the key into the calibration range table
    ///
    /// Several codes share a name (both `AcA` and `AcA2` are `"ACA"`), so
    /// they also share range table entries.
    pub fn name(self) -> &'static str {
        match self {
            Self::AcV => "ACV",
            Self::AcMv => "ACmV",
            Self::DcV => "DCV",
            Self::DcMv => "DCmV",
            Self::Frequency => "Hz",
            Self::DutyCycle => "%",
            Self::Resistance => "OHM",
            Self::Continuity => "CONT",
            Self::Diode => "DIDOE",
            Self::Capacitance => "CAP",
            Self::TempC => "°C",
            Self::TempF => "°F",
            Self::DcUa => "DCuA",
            Self::AcUa => "ACuA",
            Self::DcMa => "DCmA",
            Self::AcMa => "ACmA",
            Self::DcA | Self::DcA2 => "DCA",
            Self::AcA | Self::AcA2 => "ACA",
            Self::Hfe => "HFE",
            Self::Live => "Live",
            Self::Ncv => "NCV",
            Self::LozV => "LozV",
            Self::Lpf | Self::Lpf2 | Self::Lpf3 => "LPF",
            Self::AcDc => "AC/DC",
            Self::AcPlusDc => "AC+DC",
            Self::AcPlusDc2 => "AC+DC2",
            Self::Inrush => "INRUSH",
            Self::Unknown => "",
        }
    }

    /// Returns whether this is one of the AC functions that can show a peak reading
    pub fn has_ac_peak(self) -> bool {
        matches!(self.name(), "ACmV" | "ACV" | "ACA" | "ACuA" | "ACmA")
    }

    /// Returns whether this is the duty cycle function
    pub fn is_percent(self) -> bool {
        self.name() == "%"
    }
}

impl fmt::Display for FunctionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
