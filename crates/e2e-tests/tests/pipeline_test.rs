//! End-to-end indexing pipeline tests.
//!
//! Walks a small mixed corpus through extraction, embedding and the
//! record store with the stub embedder standing in for the model.

use std::sync::atomic::Ordering;

use pretty_assertions::assert_eq;

use e2e_tests::{TestHarness, STUB_DIMENSION};
use searchme_indexing::{FileOutcome, NoOpProgressCallback, SkipReason};

/// txt, svg, unreadable, pdf and jpg: three make it in, two are skipped.
#[cfg(unix)]
#[test]
fn test_mixed_corpus_walk() {
    let harness = TestHarness::new();
    harness.write_text("notes.txt", "Meeting notes about the product launch");
    harness.write_text("logo.svg", "<svg xmlns=\"http://www.w3.org/2000/svg\"/>");
    harness.write_unreadable("secret.txt");
    harness.write_pdf("report.pdf", "Annual report", Some("Annual Report 2024"));
    harness.write_jpg("photo.jpg", 8, 8);

    let mut engine = harness.engine();
    let stats = engine
        .index_directory(&harness.corpus_dir, &NoOpProgressCallback)
        .expect("Walk failed");

    assert_eq!(stats.indexed, 3);
    assert_eq!(stats.skipped(), 2);
    assert_eq!(stats.unsupported, 1);
    assert_eq!(stats.unreadable, 1);
    assert_eq!(stats.errors, 0);
    assert!(!stats.cancelled);

    let store = engine.store();
    assert_eq!(store.len(), 3);
    assert_eq!(store.distinct_files(), 3);
    assert_eq!(store.dimension(), Some(STUB_DIMENSION));

    let pdf = store
        .record(&harness.corpus_dir.join("report.pdf"))
        .expect("PDF record missing");
    assert_eq!(pdf.mime_type, "application/pdf");
    assert_eq!(pdf.page_count, Some(1));
    assert_eq!(pdf.title.as_deref(), Some("Annual Report 2024"));

    let jpg = store
        .record(&harness.corpus_dir.join("photo.jpg"))
        .expect("JPG record missing");
    assert_eq!(jpg.dimensions.map(|d| (d.width, d.height)), Some((8, 8)));

    let txt = store
        .record(&harness.corpus_dir.join("notes.txt"))
        .expect("Text record missing");
    assert_eq!(
        txt.content.as_deref(),
        Some("Meeting notes about the product launch")
    );
}

#[test]
fn test_svg_never_enters_the_store() {
    let harness = TestHarness::new();
    harness.write_text("a.svg", "<svg/>");
    harness.write_text("nested/B.SVG", "<svg/>");
    harness.write_text("keep.txt", "kept");

    let mut engine = harness.engine();
    let stats = engine
        .index_directory(&harness.corpus_dir, &NoOpProgressCallback)
        .unwrap();

    assert_eq!(stats.indexed, 1);
    assert_eq!(stats.unsupported, 2);
    assert!(engine.store().records().all(|r| r.extension != ".svg"));
}

#[test]
fn test_reindexing_a_file_appends_a_vector() {
    let harness = TestHarness::new();
    let path = harness.write_text("todo.txt", "buy milk");

    let mut engine = harness.engine();
    let first = engine.index_file(&path).unwrap();
    std::fs::write(&path, "buy oat milk").unwrap();
    let second = engine.index_file(&path).unwrap();

    let (FileOutcome::Indexed { position: p1, .. }, FileOutcome::Indexed { position: p2, .. }) =
        (first, second)
    else {
        panic!("Both attempts should index the file");
    };
    assert_eq!(p2, p1.next());
    assert_eq!(engine.store().len(), 2);
    assert_eq!(engine.store().distinct_files(), 1);

    // both positions resolve to the latest extraction
    let latest = engine.store().record(&path).unwrap();
    assert_eq!(latest.content.as_deref(), Some("buy oat milk"));
    assert_eq!(engine.store().lookup(p1).unwrap().1, latest);
}

#[test]
fn test_missing_file_is_skipped_as_unreadable() {
    let harness = TestHarness::new();
    let mut engine = harness.engine();

    let outcome = engine
        .index_file(&harness.corpus_dir.join("vanished.txt"))
        .unwrap();

    assert_eq!(outcome, FileOutcome::Skipped(SkipReason::Unreadable));
    assert!(engine.store().is_empty());
}

#[test]
fn test_multiple_bases_and_missing_base() {
    let harness = TestHarness::new();
    let single = harness.write_text("single.txt", "one file base");
    harness.write_text("tree/a.txt", "a");
    harness.write_text("tree/b.txt", "b");
    let missing = harness.corpus_dir.join("nowhere");

    let mut engine = harness.engine();
    let stats = engine
        .index_paths(
            &[single, missing, harness.corpus_dir.join("tree")],
            &NoOpProgressCallback,
        )
        .unwrap();

    assert_eq!(stats.indexed, 3);
    assert_eq!(stats.errors, 1);
}

#[test]
fn test_cancelled_walk_keeps_nothing_new() {
    let harness = TestHarness::new();
    harness.write_text("a.txt", "a");
    harness.write_text("b.txt", "b");

    let mut engine = harness.engine();
    engine.cancel_flag().store(true, Ordering::Relaxed);
    let stats = engine
        .index_directory(&harness.corpus_dir, &NoOpProgressCallback)
        .unwrap();

    assert!(stats.cancelled);
    assert_eq!(stats.indexed, 0);
    assert!(engine.store().is_empty());
}
