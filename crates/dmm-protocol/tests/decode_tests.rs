//! Integration tests for frame decoding
//!
//! These tests exercise the public decoding surface end to end:
//! - Frame validation (magic, declared length, truncation)
//! - Status bit mapping, including the inverted AUTO and DC bits
//! - Range resolution against a calibration table
//! - Robustness against arbitrary input

use dmm_protocol::{
    decode, frame, DeviceCommand, FrameError, FunctionMode, FunctionRanges, RangeEntry,
    RangeTable, Snapshot,
};

// ============================================================================
// Helper Functions
// ============================================================================

mod helpers {
    use super::*;

    /// Build a 17-byte frame with the given fields
    pub fn frame(func: u8, range: u8, reading: &[u8; 7], status: [u8; 3]) -> Vec<u8> {
        let mut bytes = vec![0xAB, 0xCD, 14, func, range];
        bytes.extend_from_slice(reading);
        bytes.extend_from_slice(&[0, 5]);
        bytes.extend_from_slice(&status);
        bytes
    }

    /// Table with three DCV ranges
    pub fn dcv_table() -> RangeTable {
        let mut dcv = FunctionRanges::new();
        dcv.insert_entry("0", RangeEntry::new("2.2V", "V", 2.2, -2.2));
        dcv.insert_entry("1", RangeEntry::new("22V", "V", 22.0, -22.0));
        dcv.insert_entry("2", RangeEntry::new("220V", "V", 220.0, -220.0));
        let mut table = RangeTable::new();
        table.insert_function("DCV", dcv);
        table
    }
}

// ============================================================================
// Validation
// ============================================================================

mod validation {
    use super::*;

    #[test]
    fn short_inputs_are_no_ops() {
        let table = RangeTable::new();
        for len in 0..4 {
            let bytes = vec![0xAB; len];
            assert_eq!(decode(&bytes, &table), Err(FrameError::TooShort { len }));
        }
    }

    #[test]
    fn magic_and_length_are_checked() {
        let table = RangeTable::new();
        let good = helpers::frame(2, b'0', b"  1.000", [0; 3]);
        assert!(decode(&good, &table).is_ok());

        let mut bad = good.clone();
        bad[0] = 0xBA;
        assert!(matches!(decode(&bad, &table), Err(FrameError::BadMagic { .. })));

        let mut bad = good.clone();
        bad.push(0x00);
        assert!(matches!(
            decode(&bad, &table),
            Err(FrameError::LengthMismatch { declared: 14, actual: 15 })
        ));
    }

    #[test]
    fn longer_frames_with_matching_length_decode() {
        let mut bytes = helpers::frame(2, b'0', b"  1.000", [0; 3]);
        bytes.extend_from_slice(&[0x12, 0x34, 0x56]);
        bytes[2] = (bytes.len() - 3) as u8;
        let snapshot = decode(&bytes, &RangeTable::new()).unwrap();
        assert_eq!(snapshot.raw_value(), Some("1.000"));
    }

    #[test]
    fn command_frames_are_not_measurements() {
        // a command frame has a consistent header but no fields
        let bytes = DeviceCommand::Hold.encode();
        assert!(matches!(
            decode(&bytes, &RangeTable::new()),
            Err(FrameError::Truncated { len: 6, .. })
        ));
    }
}

// ============================================================================
// Field Extraction
// ============================================================================

mod fields {
    use super::*;

    #[test]
    fn reference_frame_decodes() {
        let bytes = [
            0xAB, 0xCD, 14, 3, 0x31, b'1', b'.', b'2', b'3', b'4', b' ', b' ', 0, 5, 0b0000_1010,
            0b0000_0000, 0b0000_1000,
        ];
        let snapshot = decode(&bytes, &RangeTable::new()).unwrap();
        assert_eq!(snapshot.function, Some(FunctionMode::DcMv));
        assert_eq!(snapshot.raw_value(), Some("1.234"));
        assert_eq!(snapshot.value_as_number(), 1.234);
        assert_eq!(snapshot.bar_progress, 5);
        assert!(snapshot.is_max());
        assert!(snapshot.is_hold());
        assert!(snapshot.is_auto());
    }

    #[test]
    fn range_resolves_and_falls_back() {
        let table = helpers::dcv_table();
        let snapshot = decode(&helpers::frame(2, b'1', b" 12.345", [0; 3]), &table).unwrap();
        assert_eq!(snapshot.range_label(), Some("22V"));

        let snapshot = decode(&helpers::frame(2, b'5', b" 123.45", [0; 3]), &table).unwrap();
        assert_eq!(snapshot.range_label(), Some("220V"));
        assert_eq!(snapshot.max_value(), Some(220.0));
    }

    #[test]
    fn unknown_function_has_no_range() {
        let table = helpers::dcv_table();
        let snapshot = decode(&helpers::frame(200, b'0', b"   0.00", [0; 3]), &table).unwrap();
        assert_eq!(snapshot.function_name(), Some(""));
        assert!(snapshot.range.is_none());
    }

    #[test]
    fn frame_encoding_round_trips_through_snapshot() {
        let parsed = frame::Frame::parse(&helpers::frame(9, b'2', b" 4.700 ", [0x31, 0x30, 0x38]))
            .unwrap();
        let snapshot = decode(&parsed.encode(), &RangeTable::new()).unwrap();
        assert_eq!(snapshot.function, Some(FunctionMode::Capacitance));
        assert_eq!(snapshot.raw_value(), Some("4.700"));
        assert!(snapshot.is_rel());
        assert!(!snapshot.is_dc());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
            let mut snapshot = Snapshot::new("meter", "");
            let before = snapshot.clone();
            if snapshot.apply_frame(&bytes, &helpers::dcv_table()).is_err() {
                prop_assert_eq!(snapshot, before);
            }
        }

        #[test]
        fn status_bits_map_exactly(s14 in 0u8..16, s15 in 0u8..8, s16 in 0u8..16) {
            let bytes = helpers::frame(2, b'0', b"  1.000", [s14, s15, s16]);
            let snapshot = decode(&bytes, &RangeTable::new()).unwrap();

            prop_assert_eq!(snapshot.is_max(), s14 & 8 != 0);
            prop_assert_eq!(snapshot.is_min(), s14 & 4 != 0);
            prop_assert_eq!(snapshot.is_hold(), s14 & 2 != 0);
            prop_assert_eq!(snapshot.is_rel(), s14 & 1 != 0);
            prop_assert_eq!(snapshot.is_auto(), s15 & 4 == 0);
            prop_assert_eq!(snapshot.is_battery(), s15 & 2 != 0);
            prop_assert_eq!(snapshot.is_hv_warning(), s15 & 1 != 0);
            prop_assert_eq!(snapshot.is_dc(), s16 & 8 == 0);
            prop_assert_eq!(snapshot.is_peak_max(), s16 & 4 != 0);
            prop_assert_eq!(snapshot.is_peak_min(), s16 & 2 != 0);
            prop_assert_eq!(snapshot.is_bar_polarity_negative(), s16 & 1 != 0);
        }

        #[test]
        fn function_code_always_resolves(code: u8) {
            let bytes = helpers::frame(code, b'0', b"   0.00", [0; 3]);
            let snapshot = decode(&bytes, &RangeTable::new()).unwrap();
            let expected = if code < 31 { FunctionMode::ALL[code as usize] } else { FunctionMode::Unknown };
            prop_assert_eq!(snapshot.function, Some(expected));
        }

        #[test]
        fn declared_length_must_match(extra in 0usize..40, declared: u8) {
            let mut bytes = helpers::frame(2, b'0', b"  1.000", [0; 3]);
            bytes.extend(std::iter::repeat(0u8).take(extra));
            bytes[2] = declared;
            let matches = declared as i8 as i64 == bytes.len() as i64 - 3;
            prop_assert_eq!(decode(&bytes, &RangeTable::new()).is_ok(), matches);
        }
    }
}
