//! Save/load round trips through the on-disk artifacts.

use std::fs;

use pretty_assertions::assert_eq;

use e2e_tests::TestHarness;
use searchme_indexing::NoOpProgressCallback;
use searchme_vector::{RecordStore, StoreError, MAPPING_FILE};

fn indexed_harness() -> (TestHarness, RecordStore) {
    let harness = TestHarness::new();
    harness.write_text("budget.txt", "Q3 budget spreadsheet with revenue figures");
    harness.write_text("trip.txt", "Itinerary for the summer trip to Lisbon");
    harness.write_text("recipe.txt", "Tomato soup recipe with basil");
    harness.write_pdf("manual.pdf", "Dishwasher manual", Some("Dishwasher Manual"));

    let mut engine = harness.engine();
    engine
        .index_directory(&harness.corpus_dir, &NoOpProgressCallback)
        .unwrap();
    let store = engine.into_store();
    (harness, store)
}

#[test]
fn test_round_trip_preserves_search_results() {
    let (harness, store) = indexed_harness();
    let saved = store.save().expect("Save failed");
    assert_eq!(saved, 4);

    let loaded = harness.load_store();
    assert_eq!(loaded.len(), store.len());
    assert_eq!(loaded.distinct_files(), store.distinct_files());
    assert_eq!(loaded.dimension(), store.dimension());

    for query in ["budget spreadsheet", "summer trip", "dishwasher"] {
        let before = harness.search(&store, query, 4);
        let after = harness.search(&loaded, query, 4);

        assert_eq!(after.len(), before.len());
        assert_eq!(after[0].path, before[0].path, "top hit changed for {query:?}");

        // files sharing no words with the query tie, so compare per path
        for a in &after {
            let b = before
                .iter()
                .find(|b| b.path == a.path)
                .expect("hit missing before save");
            assert!((a.distance - b.distance).abs() < 1e-5);
            assert_eq!(a.record, b.record);
        }
    }
}

#[test]
fn test_append_after_reload() {
    let (harness, store) = indexed_harness();
    store.save().unwrap();

    let mut engine = harness.engine_with(harness.load_store());
    let extra = harness.write_text("later.txt", "Added after the first save");
    engine.index_file(&extra).unwrap();
    let store = engine.into_store();
    assert_eq!(store.len(), 5);
    store.save().unwrap();

    let reloaded = harness.load_store();
    assert_eq!(reloaded.len(), 5);
    assert!(reloaded.record(&extra).is_some());
}

/// A name that cannot be written to the JSON artifacts is skipped, so the
/// next save still succeeds and the earlier index survives.
#[cfg(target_os = "linux")]
#[test]
fn test_non_utf8_file_name_is_skipped_and_saving_still_works() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let harness = TestHarness::new();
    harness.write_text("first.txt", "First saved file");
    let mut engine = harness.engine();
    engine
        .index_directory(&harness.corpus_dir, &NoOpProgressCallback)
        .unwrap();
    assert_eq!(engine.into_store().save().unwrap(), 1);

    let odd_name = harness.corpus_dir.join(OsStr::from_bytes(b"caf\xe9.txt"));
    fs::write(&odd_name, "Coffee tasting notes").unwrap();

    let mut engine = harness.engine_with(harness.load_store());
    let stats = engine
        .index_directory(&harness.corpus_dir, &NoOpProgressCallback)
        .unwrap();
    assert_eq!(stats.indexed, 1);
    assert_eq!(stats.unsupported, 1);
    assert_eq!(stats.errors, 0);

    let store = engine.into_store();
    assert!(store.record(&odd_name).is_none());
    assert_eq!(store.save().expect("Save failed"), 2);

    let reloaded = harness.load_store();
    assert_eq!(reloaded.len(), 2);
    assert_eq!(reloaded.distinct_files(), 1);
}

#[test]
fn test_corrupt_mapping_leaves_no_index() {
    let (harness, store) = indexed_harness();
    store.save().unwrap();
    fs::write(harness.index_dir.join(MAPPING_FILE), b"{ not json").unwrap();

    let mut store: RecordStore = RecordStore::new(harness.store_config());
    let err = store.load().unwrap_err();

    assert!(matches!(err, StoreError::Corrupt(_)));
    assert!(!store.has_index());
    assert!(store.is_empty());
}

#[test]
fn test_missing_artifacts_reported() {
    let harness = TestHarness::new();
    let mut store: RecordStore = RecordStore::new(harness.store_config());

    match store.load() {
        Err(StoreError::MissingArtifacts(paths)) => assert_eq!(paths.len(), 3),
        other => panic!("Expected MissingArtifacts, got {other:?}"),
    }
}

#[test]
fn test_saving_an_empty_store_is_refused() {
    let harness = TestHarness::new();
    let store: RecordStore = RecordStore::new(harness.store_config());
    assert!(matches!(store.save(), Err(StoreError::Empty)));
    assert_eq!(fs::read_dir(&harness.index_dir).unwrap().count(), 0);
}
