//! SI prefix handling for display units

/// Split a unit into its SI prefix exponent and base unit
///
/// `"mV"` becomes `(-3, "V")`, `"kΩ"` becomes `(3, "Ω")`. Units without a
/// known prefix (or consisting of the prefix letter alone) come back with
/// exponent 0.
pub fn split_prefix(unit: &str) -> (i32, &str) {
    let mut chars = unit.chars();
    let exponent = match chars.next() {
        Some('M') => 6,
        Some('k') => 3,
        Some('m') => -3,
        Some('u') | Some('µ') => -6,
        Some('n') => -9,
        _ => return (0, unit),
    };
    let base = chars.as_str();
    if base.is_empty() {
        (0, unit)
    } else {
        (exponent, base)
    }
}

/// A reading converted to its base unit
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScaledReading {
    /// Value in the base unit
    pub value: f64,
    /// Base unit (e.g. "V" for a millivolt range)
    pub unit: String,
}

/// Convert a displayed value and unit to the base unit
pub fn to_base_unit(value: f64, unit: &str) -> ScaledReading {
    let (exponent, base) = split_prefix(unit);
    ScaledReading {
        value: value * 10f64.powi(exponent),
        unit: base.to_string(),
    }
}
