// tests/relocation.rs

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use lanekeeper::error_log::{ErrorLog, MemorySink};
use lanekeeper::files::{Relocator, TargetFiles};
use lanekeeper::fs::FileSystem;
use lanekeeper::fs::mock::MockFileSystem;
use lanekeeper::retry::RetryPolicy;
use lanekeeper_test_utils::init_tracing;

fn relocator(fs: &MockFileSystem, max_retries: u32) -> (Relocator, MemorySink) {
    let sink = MemorySink::new();
    let errors = ErrorLog::new(Arc::new(sink.clone()));
    let policy = RetryPolicy::new(max_retries, Duration::from_millis(1));
    (Relocator::new(Arc::new(fs.clone()), policy, errors), sink)
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn missing_file_is_skipped_and_present_file_is_moved() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/in/a.mp4", "a");
    fs.add_dir("/work");
    let (relocator, sink) = relocator(&fs, 2);

    let report = relocator
        .move_files(&names(&["gone.mp4", "a.mp4"]), Path::new("/in"), Path::new("/work"))
        .await;

    assert_eq!(report.moved, names(&["a.mp4"]));
    assert_eq!(report.missing, names(&["gone.mp4"]));
    assert!(report.failed.is_empty());
    assert_eq!(fs.file_names("/work"), names(&["a.mp4"]));
    assert!(fs.file_names("/in").is_empty());
    // A missing file is a warning, not a terminal failure.
    assert!(sink.records().is_empty());
}

#[tokio::test]
async fn cross_device_move_falls_back_to_copy_and_delete() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.mount_foreign("/mnt/usb");
    fs.add_file("/mnt/usb/clip.mp4", "payload");
    fs.add_dir("/work");
    let (relocator, _sink) = relocator(&fs, 0);

    let report = relocator
        .move_files(&names(&["clip.mp4"]), Path::new("/mnt/usb"), Path::new("/work"))
        .await;

    assert_eq!(report.moved, names(&["clip.mp4"]));
    assert!(!fs.exists(Path::new("/mnt/usb/clip.mp4")));
    assert_eq!(
        fs.read_to_string(Path::new("/work/clip.mp4")).unwrap(),
        "payload"
    );
}

#[tokio::test]
async fn transient_failure_is_retried_then_succeeds() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/in/busy.mp4", "b");
    fs.add_dir("/work");
    fs.fail_next("/in/busy.mp4", 2, ErrorKind::PermissionDenied);
    let (relocator, sink) = relocator(&fs, 3);

    let report = relocator
        .move_files(&names(&["busy.mp4"]), Path::new("/in"), Path::new("/work"))
        .await;

    assert_eq!(report.moved, names(&["busy.mp4"]));
    assert!(sink.records().is_empty());
}

#[tokio::test]
async fn exhausted_retries_record_failure_and_batch_continues() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/in/locked.mp4", "l");
    fs.add_file("/in/ok.mp4", "o");
    fs.add_dir("/work");
    fs.fail_next("/in/locked.mp4", 10, ErrorKind::PermissionDenied);
    let (relocator, sink) = relocator(&fs, 1);

    let report = relocator
        .move_files(
            &names(&["locked.mp4", "ok.mp4"]),
            Path::new("/in"),
            Path::new("/work"),
        )
        .await;

    assert_eq!(report.failed, names(&["locked.mp4"]));
    assert_eq!(report.moved, names(&["ok.mp4"]));

    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert!(records[0].context.contains("move_file"));
    assert!(records[0].message.contains("2 attempts"));
}

#[tokio::test]
async fn move_targets_pulls_from_every_source_folder() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/a/1.mp4", "1");
    fs.add_file("/b/2.mp4", "2");
    fs.add_dir("/work");
    let (relocator, _sink) = relocator(&fs, 0);

    let mut targets = TargetFiles::new();
    targets.insert(PathBuf::from("/a"), names(&["1.mp4"]));
    targets.insert(PathBuf::from("/b"), names(&["2.mp4"]));

    let report = relocator.move_targets(&targets, Path::new("/work")).await;

    assert_eq!(report.moved, names(&["1.mp4", "2.mp4"]));
    assert_eq!(fs.file_names("/work"), names(&["1.mp4", "2.mp4"]));
}

#[test]
fn delete_is_idempotent_for_absent_files() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/work/a.mp4", "a");
    let (relocator, sink) = relocator(&fs, 0);
    let paths = vec![PathBuf::from("/work/a.mp4"), PathBuf::from("/work/b.mp4")];

    let first = relocator.delete_files(&paths);
    assert_eq!(first.deleted, vec![PathBuf::from("/work/a.mp4")]);
    assert_eq!(first.missing, vec![PathBuf::from("/work/b.mp4")]);

    let second = relocator.delete_files(&paths);
    assert!(second.deleted.is_empty());
    assert_eq!(second.missing.len(), 2);
    assert!(sink.records().is_empty());
}

#[test]
fn delete_failure_is_recorded_not_propagated() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/work/a.mp4", "a");
    fs.add_file("/work/b.mp4", "b");
    fs.fail_next("/work/a.mp4", 1, ErrorKind::PermissionDenied);
    let (relocator, sink) = relocator(&fs, 0);

    let report = relocator.delete_files(&[PathBuf::from("/work/a.mp4"), PathBuf::from("/work/b.mp4")]);

    assert_eq!(report.failed, vec![PathBuf::from("/work/a.mp4")]);
    assert_eq!(report.deleted, vec![PathBuf::from("/work/b.mp4")]);
    assert_eq!(sink.records().len(), 1);
    assert_eq!(sink.records()[0].context, "delete_file");
}
