//! Measurement frame format
//!
//! # Frame Format
//! ```text
//! AB CD [len] [func] [range] [d0 d1 d2 d3 d4 d5 d6] [bar1] [bar0] [s14] [s15] [s16] [sum_hi sum_lo]
//! ```
//!
//! - `AB CD`: magic
//! - `len`: number of bytes that follow (signed, must equal `frame.len() - 3`)
//! - `func`: function code, see [`FunctionMode`]
//! - `range`: ASCII range digit (`'0'` = range 0)
//! - `d0..d6`: LCD reading as seven characters, right-aligned
//! - `bar1 bar0`: bar graph, `bar1 * 10 + bar0`
//! - `s14`: MAX, MIN, HOLD, REL (bits 3..0)
//! - `s15`: !AUTO, battery, HV warning (bits 2..0)
//! - `s16`: !DC, peak max, peak min, bar polarity (bits 3..0)
//! - `sum_hi sum_lo`: 16-bit sum of every preceding byte, big-endian
//!
//! Everything past `s16` is ignored by the decoder. The checksum is exposed
//! separately through [`verify_trailer`].

use crate::error::FrameError;
use crate::function::FunctionMode;
use crate::reading::{Reading, READING_LEN};

/// Frame magic bytes
pub const MAGIC: [u8; 2] = [0xAB, 0xCD];
/// Bytes preceding the payload (magic + length)
pub const HEADER_LEN: usize = 3;
/// Shortest buffer worth looking at
pub const MIN_LEN: usize = 4;
/// Bytes up to and including the last status byte
pub const DATA_LEN: usize = 17;
/// Length of a full frame as sent by the meter, including checksum
pub const FULL_FRAME_LEN: usize = DATA_LEN + 2;

/// ASCII offset of the range digit
const RANGE_DIGIT_BASE: i32 = b'0' as i32;

/// Status bits carried in bytes 14..=16
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusFlags {
    pub max: bool,
    pub min: bool,
    pub hold: bool,
    pub rel: bool,
    /// Auto ranging. Sent inverted (bit clear = auto).
    pub auto: bool,
    pub battery: bool,
    pub hv_warning: bool,
    /// DC coupling. Sent inverted (bit clear = DC).
    pub dc: bool,
    pub peak_max: bool,
    pub peak_min: bool,
    pub bar_polarity_negative: bool,
}

impl StatusFlags {
    /// Decode the three status bytes
    pub fn from_bytes(s14: u8, s15: u8, s16: u8) -> Self {
        Self {
            max: s14 & 0x08 != 0,
            min: s14 & 0x04 != 0,
            hold: s14 & 0x02 != 0,
            rel: s14 & 0x01 != 0,
            auto: s15 & 0x04 == 0,
            battery: s15 & 0x02 != 0,
            hv_warning: s15 & 0x01 != 0,
            dc: s16 & 0x08 == 0,
            peak_max: s16 & 0x04 != 0,
            peak_min: s16 & 0x02 != 0,
            bar_polarity_negative: s16 & 0x01 != 0,
        }
    }

    /// Encode into the three status bytes
    ///
    /// The meter sets `0x30` in the high nibble of each status byte, so the
    /// bytes read as ASCII digits on a terminal.
    pub fn to_bytes(&self) -> [u8; 3] {
        let bit = |on: bool, mask: u8| if on { mask } else { 0 };
        [
            0x30 | bit(self.max, 0x08)
                | bit(self.min, 0x04)
                | bit(self.hold, 0x02)
                | bit(self.rel, 0x01),
            0x30 | bit(!self.auto, 0x04) | bit(self.battery, 0x02) | bit(self.hv_warning, 0x01),
            0x30 | bit(!self.dc, 0x08)
                | bit(self.peak_max, 0x04)
                | bit(self.peak_min, 0x02)
                | bit(self.bar_polarity_negative, 0x01),
        ]
    }
}

/// Fields of one validated measurement frame
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Frame {
    /// Measurement function
    pub function: FunctionMode,
    /// Range index (`range byte - '0'`), used as the range table key
    pub range_index: i32,
    /// LCD reading
    pub reading: Reading,
    /// Bar graph fill
    pub bar_progress: i16,
    /// Status bits
    pub flags: StatusFlags,
}

impl Frame {
    /// Validate a candidate frame and extract its fields
    pub fn parse(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() < MIN_LEN {
            return Err(FrameError::TooShort { len: bytes.len() });
        }

        if bytes[..2] != MAGIC {
            return Err(FrameError::BadMagic {
                first: bytes[0],
                second: bytes[1],
            });
        }

        // Length byte is signed on the wire; frames longer than 130 bytes
        // can never match.
        let declared = bytes[2] as i8;
        if i64::from(declared) != bytes.len() as i64 - HEADER_LEN as i64 {
            return Err(FrameError::LengthMismatch {
                declared,
                actual: bytes.len() - HEADER_LEN,
            });
        }

        if bytes.len() < DATA_LEN {
            return Err(FrameError::Truncated {
                len: bytes.len(),
                needed: DATA_LEN,
            });
        }

        let mut raw = [0u8; READING_LEN];
        raw.copy_from_slice(&bytes[5..5 + READING_LEN]);

        Ok(Self {
            function: FunctionMode::from_code(bytes[3]),
            range_index: i32::from(bytes[4] as i8) - RANGE_DIGIT_BASE,
            reading: Reading::from_bytes(raw),
            bar_progress: i16::from(bytes[12] as i8) * 10 + i16::from(bytes[13] as i8),
            flags: StatusFlags::from_bytes(bytes[14], bytes[15], bytes[16]),
        })
    }

    /// Encode as a full frame, checksum included
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(FULL_FRAME_LEN);
        out.extend_from_slice(&MAGIC);
        out.push((FULL_FRAME_LEN - HEADER_LEN) as u8);
        out.push(self.function.code());
        out.push((self.range_index + RANGE_DIGIT_BASE) as u8);
        out.extend_from_slice(self.reading.raw());
        out.push((self.bar_progress / 10) as u8);
        out.push((self.bar_progress % 10) as u8);
        out.extend_from_slice(&self.flags.to_bytes());
        append_checksum(&mut out);
        out
    }
}

/// 16-bit wrapping sum of `bytes`
pub fn checksum(bytes: &[u8]) -> u16 {
    bytes
        .iter()
        .fold(0u16, |sum, &b| sum.wrapping_add(u16::from(b)))
}

/// Append the big-endian checksum of everything already in `buf`
pub fn append_checksum(buf: &mut Vec<u8>) {
    let sum = checksum(buf);
    buf.extend_from_slice(&sum.to_be_bytes());
}

/// Check the trailing checksum of a full frame
///
/// Returns `None` when the buffer is too short to carry a trailer.
pub fn verify_trailer(bytes: &[u8]) -> Option<bool> {
    if bytes.len() < FULL_FRAME_LEN {
        return None;
    }
    let (body, trailer) = bytes.split_at(bytes.len() - 2);
    Some(checksum(body) == u16::from_be_bytes([trailer[0], trailer[1]]))
}

#[cfg(test)]
mod tests {
    use super::{checksum, verify_trailer, Frame, StatusFlags, FULL_FRAME_LEN};
    use crate::error::FrameError;
    use crate::function::FunctionMode;

    // mV AC reading "53.54" captured from a UT61E+ over USB
    const CAPTURED: [u8; 19] = [
        0xAB, 0xCD, 0x10, 0x01, 0x30, 0x20, 0x20, 0x35, 0x33, 0x2E, 0x35, 0x34, 0x01, 0x00,
        0x30, 0x34, 0x30, 0x03, 0x8D,
    ];

    #[test]
    fn test_parse_captured_frame() {
        let frame = Frame::parse(&CAPTURED).unwrap();
        assert_eq!(frame.function, FunctionMode::AcMv);
        assert_eq!(frame.range_index, 0);
        assert_eq!(frame.reading.as_str(), "53.54");
        assert_eq!(frame.bar_progress, 10);
        assert!(!frame.flags.auto);
        assert!(frame.flags.dc);
        assert!(!frame.flags.max);
    }

    #[test]
    fn test_captured_checksum() {
        assert_eq!(verify_trailer(&CAPTURED), Some(true));
        assert_eq!(checksum(&CAPTURED[..17]), 0x038D);

        let mut corrupted = CAPTURED;
        corrupted[7] = b'6';
        assert_eq!(verify_trailer(&corrupted), Some(false));
        assert_eq!(verify_trailer(&CAPTURED[..17]), None);
    }

    #[test]
    fn test_short_frames() {
        assert_eq!(Frame::parse(&[]), Err(FrameError::TooShort { len: 0 }));
        assert_eq!(
            Frame::parse(&[0xAB, 0xCD, 0x00]),
            Err(FrameError::TooShort { len: 3 })
        );
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = CAPTURED;
        bytes[1] = 0xCE;
        assert!(matches!(
            Frame::parse(&bytes),
            Err(FrameError::BadMagic { first: 0xAB, second: 0xCE })
        ));
    }

    #[test]
    fn test_length_mismatch() {
        let mut bytes = CAPTURED;
        bytes[2] = 0x0F;
        assert_eq!(
            Frame::parse(&bytes),
            Err(FrameError::LengthMismatch {
                declared: 15,
                actual: 16
            })
        );
        // a declared length with the sign bit set never matches
        let mut long = vec![0u8; 0x83];
        long[..3].copy_from_slice(&[0xAB, 0xCD, 0x80]);
        assert!(matches!(
            Frame::parse(&long),
            Err(FrameError::LengthMismatch { declared: -128, .. })
        ));
    }

    #[test]
    fn test_consistent_but_truncated() {
        assert_eq!(
            Frame::parse(&[0xAB, 0xCD, 0x01, 0x03]),
            Err(FrameError::Truncated { len: 4, needed: 17 })
        );
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let mut bytes = CAPTURED.to_vec();
        bytes.extend_from_slice(&[0xEE; 10]);
        bytes[2] = (bytes.len() - 3) as u8;
        let frame = Frame::parse(&bytes).unwrap();
        assert_eq!(frame.reading.as_str(), "53.54");
    }

    #[test]
    fn test_status_bits() {
        let flags = StatusFlags::from_bytes(0b1010, 0b0100, 0b1001);
        assert!(flags.max && !flags.min && flags.hold && !flags.rel);
        assert!(!flags.auto && !flags.battery && !flags.hv_warning);
        assert!(!flags.dc && !flags.peak_max && !flags.peak_min && flags.bar_polarity_negative);
    }

    #[test]
    fn test_encode_matches_capture() {
        let frame = Frame::parse(&CAPTURED).unwrap();
        let encoded = frame.encode();
        assert_eq!(encoded.len(), FULL_FRAME_LEN);
        assert_eq!(encoded, CAPTURED.to_vec());
    }

    #[test]
    fn test_negative_bar_bytes_are_signed() {
        let mut bytes = CAPTURED;
        bytes[12] = 0xFF;
        bytes[13] = 0x02;
        assert_eq!(Frame::parse(&bytes).unwrap().bar_progress, -8);
    }
}
