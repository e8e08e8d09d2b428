//! Host-to-meter commands
//!
//! Every command is a six byte frame:
//!
//! ```text
//! AB CD 03 [code] [sum_hi] [sum_lo]
//! ```
//!
//! where the trailer is the 16-bit sum of the four preceding bytes. Since the
//! header is fixed, the trailer always equals `code + 379`.

use crate::error::CommandError;
use crate::frame::{append_checksum, checksum, MAGIC};

/// Length of an encoded command frame
pub const COMMAND_LEN: usize = 6;

/// Commands understood by the meter (button presses plus two requests)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeviceCommand {
    /// Enter MAX/MIN recording, or step between MAX and MIN
    MinMax,
    /// Leave MAX/MIN recording
    ExitMinMax,
    /// Step to the next manual range
    Range,
    /// Return to auto ranging
    Auto,
    /// Toggle relative mode
    Rel,
    /// Second SELECT button (Hz/USB)
    Select2,
    /// Toggle display hold
    Hold,
    /// Toggle the backlight
    Lamp,
    /// First SELECT button (orange)
    Select1,
    /// Enter peak recording, or step between P-MAX and P-MIN
    PeakMinMax,
    /// Leave peak recording
    ExitPeak,
    /// Ask for one measurement frame
    RequestMeasurement,
    /// Ask for the meter's name
    RequestName,
}

impl DeviceCommand {
    /// Every command, in code order
    pub const ALL: [DeviceCommand; 13] = [
        Self::MinMax,
        Self::ExitMinMax,
        Self::Range,
        Self::Auto,
        Self::Rel,
        Self::Select2,
        Self::Hold,
        Self::Lamp,
        Self::Select1,
        Self::PeakMinMax,
        Self::ExitPeak,
        Self::RequestMeasurement,
        Self::RequestName,
    ];

    /// Wire code
    pub fn code(self) -> u8 {
        match self {
            Self::MinMax => 65,
            Self::ExitMinMax => 66,
            Self::Range => 70,
            Self::Auto => 71,
            Self::Rel => 72,
            Self::Select2 => 73,
            Self::Hold => 74,
            Self::Lamp => 75,
            Self::Select1 => 76,
            Self::PeakMinMax => 77,
            Self::ExitPeak => 78,
            Self::RequestMeasurement => 0x5E,
            Self::RequestName => 0x5F,
        }
    }

    /// Name used on the command line and in scripts
    pub fn name(self) -> &'static str {
        match self {
            Self::MinMax => "min_max",
            Self::ExitMinMax => "not_min_max",
            Self::Range => "range",
            Self::Auto => "auto",
            Self::Rel => "rel",
            Self::Select2 => "select2",
            Self::Hold => "hold",
            Self::Lamp => "lamp",
            Self::Select1 => "select1",
            Self::PeakMinMax => "p_min_max",
            Self::ExitPeak => "not_peak",
            Self::RequestMeasurement => "send_data",
            Self::RequestName => "get_name",
        }
    }

    /// Look up a command by wire code
    pub fn from_code(code: u8) -> Result<Self, CommandError> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.code() == code)
            .ok_or(CommandError::UnknownCode(code))
    }

    /// Look up a command by name
    pub fn from_name(name: &str) -> Result<Self, CommandError> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.name() == name)
            .ok_or_else(|| CommandError::UnknownName(name.to_string()))
    }

    /// Encode as a command frame
    pub fn encode(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(COMMAND_LEN);
        out.extend_from_slice(&MAGIC);
        out.push(0x03);
        out.push(self.code());
        append_checksum(&mut out);
        out
    }
}

/// Parse a command frame sent by the host
pub fn parse_command_frame(bytes: &[u8]) -> Result<DeviceCommand, CommandError> {
    if bytes.len() != COMMAND_LEN {
        return Err(CommandError::InvalidFrame(format!(
            "expected {} bytes, got {}",
            COMMAND_LEN,
            bytes.len()
        )));
    }
    if bytes[..2] != MAGIC || bytes[2] != 0x03 {
        return Err(CommandError::InvalidFrame(format!(
            "bad header {:02X?}",
            &bytes[..3]
        )));
    }

    let expected = checksum(&bytes[..4]);
    let actual = u16::from_be_bytes([bytes[4], bytes[5]]);
    if expected != actual {
        return Err(CommandError::ChecksumMismatch { expected, actual });
    }

    DeviceCommand::from_code(bytes[3])
}

#[cfg(test)]
mod tests {
    use super::{parse_command_frame, DeviceCommand};
    use crate::error::CommandError;

    #[test]
    fn test_known_sequences() {
        assert_eq!(
            DeviceCommand::RequestMeasurement.encode(),
            vec![0xAB, 0xCD, 0x03, 0x5E, 0x01, 0xD9]
        );
        assert_eq!(
            DeviceCommand::RequestName.encode(),
            vec![0xAB, 0xCD, 0x03, 0x5F, 0x01, 0xDA]
        );
    }

    #[test]
    fn test_trailer_is_code_plus_379() {
        for cmd in DeviceCommand::ALL {
            let bytes = cmd.encode();
            let trailer = u16::from_be_bytes([bytes[4], bytes[5]]);
            assert_eq!(trailer, u16::from(cmd.code()) + 379, "{:?}", cmd);
        }
    }

    #[test]
    fn test_lookup_by_name_and_code() {
        assert_eq!(DeviceCommand::from_name("lamp"), Ok(DeviceCommand::Lamp));
        assert_eq!(DeviceCommand::from_code(74), Ok(DeviceCommand::Hold));
        assert_eq!(
            DeviceCommand::from_name("blink"),
            Err(CommandError::UnknownName("blink".into()))
        );
        assert_eq!(DeviceCommand::from_code(0), Err(CommandError::UnknownCode(0)));
    }

    #[test]
    fn test_parse_command_frame() {
        let bytes = DeviceCommand::Rel.encode();
        assert_eq!(parse_command_frame(&bytes), Ok(DeviceCommand::Rel));

        let mut corrupted = bytes.clone();
        corrupted[5] ^= 0x01;
        assert!(matches!(
            parse_command_frame(&corrupted),
            Err(CommandError::ChecksumMismatch { .. })
        ));
        assert!(parse_command_frame(&bytes[..5]).is_err());
    }
}
