//! End-to-end media directory layout through a running server state.

mod support;

use std::time::Duration;

use fieldstore_server::*;
use fieldstore_test_utils::assertions::*;
use fieldstore_test_utils::*;
use support::{list, start, store_file};

#[tokio::test]
async fn document_uploads_fill_leaves_in_order() {
    let base = fixtures::shard_root();
    let harness = start(base.path(), 2, 3, 1);
    let root = base.path().join("document");

    for name in ["f1", "f2", "f3"] {
        let dir = harness
            .state
            .directories
            .directory_for(MediaKind::Document)
            .unwrap();
        store_file(&dir, name);
    }

    assert_eq!(list(&root), vec!["0", "1"]);
    assert_eq!(list(&root.join("0")), vec!["f1", "f2"]);
    assert_eq!(list(&root.join("1")), vec!["f3"]);

    // Both top-level slots are used and "1" has one free entry left.
    let dir = harness
        .state
        .directories
        .directory_for(MediaKind::Document)
        .unwrap();
    assert_eq!(dir, root.join("1"));
    store_file(&dir, "f4");
    assert_structure_exhausted(&harness.state.directories.directory_for(MediaKind::Document));

    harness.state.shutdown().await;
}

#[tokio::test]
async fn other_kinds_use_the_file_hierarchy_depth() {
    let base = fixtures::shard_root();
    let harness = start(base.path(), 10, 2, 1);

    let image_dir = harness
        .state
        .directories
        .directory_for(MediaKind::Image)
        .unwrap();
    assert_eq!(image_dir, base.path().join("image").join("0").join("0"));

    let document_dir = harness
        .state
        .directories
        .directory_for(MediaKind::Document)
        .unwrap();
    assert_eq!(document_dir, base.path().join("document").join("0"));

    harness.state.shutdown().await;
}

#[tokio::test]
async fn restart_resumes_existing_tree() {
    let base = fixtures::shard_root();
    let root = base.path().join("audio");

    {
        let harness = start(base.path(), 3, 1, 1);
        for i in 0..4 {
            let dir = harness
                .state
                .directories
                .directory_for(MediaKind::Audio)
                .unwrap();
            store_file(&dir, &format!("clip{}", i));
        }
        harness.state.shutdown().await;
    }

    let harness = start(base.path(), 3, 1, 1);
    let dir = harness
        .state
        .directories
        .directory_for(MediaKind::Audio)
        .unwrap();
    assert_eq!(dir, root.join("1"));
    assert_eq!(list(&root.join("1")), vec!["clip3"]);

    harness.state.shutdown().await;
}

#[tokio::test]
async fn missing_media_root_is_a_config_error() {
    let base = fixtures::shard_root();
    let harness = start(base.path(), 2, 1, 1);
    harness.preferences.set(
        keys::VIDEO_DIRECTORY,
        base.path().join("nowhere").display().to_string(),
    );
    harness.clock.advance(Duration::from_secs(61));

    assert_config_error(&harness.state.directories.directory_for(MediaKind::Video));

    harness.state.shutdown().await;
}

#[tokio::test]
async fn foreign_numeric_entry_breaks_allocation() {
    let base = fixtures::shard_root();
    let harness = start(base.path(), 10, 1, 1);
    std::fs::create_dir(base.path().join("image").join("99999999999999999999999")).unwrap();

    assert_integrity_violation(&harness.state.directories.directory_for(MediaKind::Image));
    assert!(harness.state.directories.current_leaf(MediaKind::Image).is_none());

    harness.state.shutdown().await;
}
