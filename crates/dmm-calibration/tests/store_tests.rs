//! Integration tests for calibration loading
//!
//! These tests exercise:
//! - Decoding against the built-in UT61E+ and UT61D+ tables
//! - Variant fallback and keeping the previous table on failure
//! - Reading documents from an asset directory
//! - Readers decoding while the table is being switched

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use dmm_calibration::{
    AssetDir, BuiltinSource, CalibrationError, CalibrationSource, LayeredSource, LoadOutcome,
    MemorySource, RangeTableStore,
};

// ============================================================================
// Helper Functions
// ============================================================================

mod helpers {
    use super::*;

    /// Build a 17-byte measurement frame
    pub fn frame(func: u8, range: u8, reading: &[u8; 7]) -> Vec<u8> {
        let mut bytes = vec![0xAB, 0xCD, 14, func, range];
        bytes.extend_from_slice(reading);
        bytes.extend_from_slice(&[0, 0, 0, 0, 0]);
        bytes
    }

    /// Fresh directory under the system temp dir
    pub fn temp_dir(tag: &str) -> PathBuf {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let dir = std::env::temp_dir().join(format!(
            "dmm-calibration-{}-{}-{}",
            tag,
            std::process::id(),
            n
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
}

// ============================================================================
// Built-in Tables
// ============================================================================

mod builtin {
    use super::*;

    #[test]
    fn default_table_resolves_dcv_ranges() {
        let store = RangeTableStore::with_default(BuiltinSource);
        let snapshot = store.decode(&helpers::frame(2, b'1', b" 12.345")).unwrap();
        assert_eq!(snapshot.range_label(), Some("22V"));
        assert_eq!(snapshot.unit(), Some("V"));
        assert_eq!(snapshot.max_value(), Some(22.0));
    }

    #[test]
    fn out_of_range_digit_uses_last_range() {
        let store = RangeTableStore::with_default(BuiltinSource);
        let snapshot = store.decode(&helpers::frame(2, b'9', b" 999.9 ")).unwrap();
        assert_eq!(snapshot.range_label(), Some("1000V"));
    }

    #[test]
    fn variant_switch_changes_current_ranges() {
        let store = RangeTableStore::with_default(BuiltinSource);
        let aca = helpers::frame(17, b'0', b"  1.234");
        assert_eq!(store.decode(&aca).unwrap().range_label(), Some("20A"));

        let outcome = store.select_variant("UT61D+");
        assert!(matches!(outcome, LoadOutcome::Loaded { ref document, .. } if document == "funOl_UT61D+"));
        assert_eq!(store.decode(&aca).unwrap().range_label(), Some("6A"));

        let aca_high = helpers::frame(17, b'1', b" 12.34 ");
        assert_eq!(store.decode(&aca_high).unwrap().range_label(), Some("20A"));
    }

    #[test]
    fn function_without_ranges_clears_the_previous_range() {
        let store = RangeTableStore::new(BuiltinSource);
        store.select_variant("UT61D+");

        let mut snapshot = dmm_protocol::Snapshot::new("bench", "").with_type_name("UT61D+");
        store
            .apply_frame(&mut snapshot, &helpers::frame(3, b'0', b"  1.234"))
            .unwrap();
        assert_eq!(snapshot.unit(), Some("mV"));

        // UT61D+ has no CONT table
        store
            .apply_frame(&mut snapshot, &helpers::frame(7, b'0', b"   12.3"))
            .unwrap();
        assert_eq!(snapshot.function_name(), Some("CONT"));
        assert!(snapshot.range.is_none());
        assert!(snapshot.scaled_reading().is_none());
        assert_eq!(snapshot.to_string(), "UT61D+: CONT 12.3 bar=0 AUTO DC");
    }

    #[test]
    fn unknown_variant_uses_default() {
        let store = RangeTableStore::new(BuiltinSource);
        let outcome = store.select_variant("UT61B+");
        assert!(matches!(outcome, LoadOutcome::Loaded { ref document, .. } if document == "funOl"));
        assert!(store.current().function("HFE").is_some());
    }
}

// ============================================================================
// Failure Handling
// ============================================================================

mod failures {
    use super::*;

    #[test]
    fn missing_documents_keep_previous_table() {
        let store = RangeTableStore::new(MemorySource::new());
        assert!(matches!(
            store.select_variant("UT61E+"),
            LoadOutcome::Kept { reason: CalibrationError::NotFound(_) }
        ));
        assert!(store.current().is_empty());

        let loaded = dmm_calibration::parse_document(
            "funOl",
            r#"{"OL": {"DCV": {"0": ["2.2V", "V", 2.2, -2.2]}}}"#,
        )
        .unwrap();
        store.swap(loaded);
        let before = store.current();

        let outcome = store.load_default();
        assert!(!outcome.is_loaded());
        assert!(std::sync::Arc::ptr_eq(&before, &store.current()));
    }

    #[test]
    fn document_without_table_is_kept_out() {
        let source = LayeredSource::new()
            .with_layer(MemorySource::new().with("funOl_UT61E+", r#"{"OL": "nope"}"#))
            .with_layer(BuiltinSource);
        let store = RangeTableStore::with_default(source);
        let before = store.current();

        let outcome = store.select_variant("UT61E+");
        assert!(matches!(
            outcome,
            LoadOutcome::Kept { reason: CalibrationError::MissingTable(_) }
        ));
        assert!(std::sync::Arc::ptr_eq(&before, &store.current()));
    }

    #[test]
    fn malformed_entries_do_not_resolve() {
        let source = MemorySource::new().with(
            "funOl",
            r#"{"OL": {"DCV": {"0": ["2.2V", "V"], "1": ["22V", "V", 22, -22]}}}"#,
        );
        let store = RangeTableStore::with_default(source);

        let snapshot = store.decode(&helpers::frame(2, b'0', b"  1.000")).unwrap();
        assert!(snapshot.range.is_none());
        assert_eq!(snapshot.raw_value(), Some("1.000"));

        let snapshot = store.decode(&helpers::frame(2, b'1', b" 12.000")).unwrap();
        assert_eq!(snapshot.range_label(), Some("22V"));
    }
}

// ============================================================================
// Asset Directory
// ============================================================================

mod asset_dir {
    use super::*;

    #[test]
    fn reads_documents_by_name() {
        let dir = helpers::temp_dir("read");
        std::fs::write(
            dir.join("funOl_UT61E+.json"),
            r#"{"OL": {"DCV": {"0": ["custom", "V", 1, -1]}}}"#,
        )
        .unwrap();

        let assets = AssetDir::new(&dir);
        assert_eq!(assets.path_for("funOl"), dir.join("funOl.json"));
        assert!(assets.load("funOl_UT61E+").is_some());
        assert!(assets.load("funOl").is_none());
        assert!(matches!(assets.read("funOl"), Ok(None)));

        let store = RangeTableStore::with_default(
            LayeredSource::new().with_layer(assets).with_layer(BuiltinSource),
        );
        assert!(store.select_variant("UT61E+").is_loaded());
        let snapshot = store.decode(&helpers::frame(2, b'0', b"  0.500")).unwrap();
        assert_eq!(snapshot.range_label(), Some("custom"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn directory_overrides_builtin() {
        let dir = helpers::temp_dir("override");
        std::fs::write(dir.join("funOl.json"), r#"{"OL": {"Hz": {"0": ["99Hz", "Hz", 99, 0]}}}"#)
            .unwrap();

        let store = RangeTableStore::with_default(
            LayeredSource::new().with_layer(AssetDir::new(&dir)).with_layer(BuiltinSource),
        );
        assert_eq!(store.current().len(), 1);

        let _ = std::fs::remove_dir_all(&dir);
    }
}

// ============================================================================
// Concurrent Access
// ============================================================================

mod concurrency {
    use super::*;

    #[test]
    fn readers_see_whole_tables_during_switches() {
        let store = RangeTableStore::with_default(BuiltinSource);
        let frame = helpers::frame(17, b'0', b"  1.234");

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                let frame = frame.clone();
                thread::spawn(move || {
                    for _ in 0..500 {
                        let table = store.current();
                        let label = table.resolve("ACA", 0).map(|e| e.label.clone());
                        let functions = table.len();
                        // a table is either the full default or the UT61D+ one
                        match label.as_deref() {
                            Some("20A") => assert!(functions > 20),
                            Some("6A") => assert!(functions < 20),
                            other => panic!("unexpected label {:?}", other),
                        }
                        assert!(store.decode(&frame).unwrap().range.is_some());
                    }
                })
            })
            .collect();

        for i in 0..200 {
            if i % 2 == 0 {
                store.select_variant("UT61D+");
            } else {
                store.load_default();
            }
        }

        for reader in readers {
            reader.join().unwrap();
        }
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
        fn any_variant_name_loads_a_table(type_name in "[A-Za-z0-9+_-]{0,12}") {
            let store = RangeTableStore::new(BuiltinSource);
            let outcome = store.select_variant(&type_name);
            prop_assert!(outcome.is_loaded());
            prop_assert!(store.current().function("DCV").is_some());
        }

        #[test]
        fn garbage_variant_documents_are_contained(text in ".{0,64}") {
            let source = LayeredSource::new()
                .with_layer(MemorySource::new().with("funOl_UT61E+", text))
                .with_layer(BuiltinSource);
            let store = RangeTableStore::with_default(source);
            let before = store.current();

            match store.select_variant("UT61E+") {
                // unparsable text falls back to the full default table
                LoadOutcome::Loaded { document, .. } => {
                    if document == "funOl" {
                        prop_assert!(store.current().function("DCV").is_some());
                    }
                }
                LoadOutcome::Kept { .. } => {
                    prop_assert!(std::sync::Arc::ptr_eq(&before, &store.current()));
                }
            }
        }
    }
}
