// tests/dispatcher.rs

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use lanekeeper::config::{ConfigSource, ExecutableTime, MemoryConfigSource, TimeOfDay};
use lanekeeper::error_log::{ErrorLog, MemorySink};
use lanekeeper::errors::LanekeeperError;
use lanekeeper::exec::{DispatchOutcome, Dispatcher, JobDescriptor, JobSettings};
use lanekeeper::fs::mock::MockFileSystem;
use lanekeeper::types::WorkerKind;
use lanekeeper_test_utils::builders::{ConfigFileBuilder, TaskBuilder};
use lanekeeper_test_utils::fake_worker::FakeWorker;
use lanekeeper_test_utils::init_tracing;

struct Fixture {
    fs: MockFileSystem,
    worker: FakeWorker,
    sink: MemorySink,
    dispatcher: Dispatcher,
}

fn fixture(source: &MemoryConfigSource) -> Fixture {
    init_tracing();
    let fs = MockFileSystem::new();
    let worker = FakeWorker::new();
    let sink = MemorySink::new();
    let dispatcher = Dispatcher::new(
        Arc::new(fs.clone()),
        Arc::new(worker.clone()),
        Arc::new(source.clone()),
        ErrorLog::new(Arc::new(sink.clone())),
    );
    Fixture {
        fs,
        worker,
        sink,
        dispatcher,
    }
}

fn window(from: u32, to: u32) -> ExecutableTime {
    ExecutableTime {
        from: TimeOfDay { hour: from, min: 0 },
        to: TimeOfDay { hour: to, min: 0 },
        utc_offset_hours: 0,
    }
}

#[tokio::test]
async fn skipped_task_is_not_touched() {
    let source = ConfigFileBuilder::new()
        .with_all_workers()
        .with_task(TaskBuilder::transform("/work").source("/in").ext("mp4").skip().build())
        .source();
    let f = fixture(&source);
    f.fs.add_file("/in/a.mp4", "a");
    let cfg = source.load().unwrap();

    let outcome = f.dispatcher.dispatch(&cfg, 0, &cfg.task[0]).await.unwrap();

    assert_eq!(outcome, DispatchOutcome::Skipped);
    assert_eq!(f.fs.file_names("/in"), vec!["a.mp4".to_string()]);
    assert!(f.worker.jobs().is_empty());
}

#[tokio::test]
async fn empty_working_folder_means_nothing_to_do() {
    let source = ConfigFileBuilder::new()
        .with_all_workers()
        .with_task(TaskBuilder::merge("/work").source("/in").ext("mp4").build())
        .source();
    let f = fixture(&source);
    f.fs.add_file("/in/readme.txt", "r");
    let cfg = source.load().unwrap();

    let outcome = f.dispatcher.dispatch(&cfg, 0, &cfg.task[0]).await.unwrap();

    assert_eq!(outcome, DispatchOutcome::NothingToDo);
    assert!(f.worker.jobs().is_empty());
    // Working folder is created even when there is nothing to do.
    assert!(f.fs.file_names("/work").is_empty());
    assert!(f.sink.records().is_empty());
}

#[tokio::test]
async fn missing_source_folder_only_warns() {
    let source = ConfigFileBuilder::new()
        .with_all_workers()
        .with_task(
            TaskBuilder::transform("/work")
                .source("/gone")
                .source("/in")
                .ext("mp4")
                .build(),
        )
        .source();
    let f = fixture(&source);
    f.fs.add_file("/in/a.mp4", "a");
    let cfg = source.load().unwrap();

    let outcome = f.dispatcher.dispatch(&cfg, 0, &cfg.task[0]).await.unwrap();

    assert_eq!(outcome, DispatchOutcome::Completed { files: 1 });
}

#[tokio::test]
async fn descriptor_carries_task_files_and_kind_settings() {
    let source = ConfigFileBuilder::new()
        .with_all_workers()
        .with_task(
            TaskBuilder::transform("/work")
                .source("/in")
                .ext("mp4")
                .exclude("_tmp")
                .build(),
        )
        .source();
    let f = fixture(&source);
    f.fs.add_file("/in/b.mp4", "b");
    f.fs.add_file("/in/a_tmp.mp4", "t");
    f.fs.add_file("/work/a.mp4", "a");
    let cfg = source.load().unwrap();

    let outcome = f.dispatcher.dispatch(&cfg, 0, &cfg.task[0]).await.unwrap();
    assert_eq!(outcome, DispatchOutcome::Completed { files: 2 });

    let jobs = f.worker.jobs();
    assert_eq!(jobs.len(), 1);
    let job = &jobs[0].job;
    assert_eq!(jobs[0].cmd, "transform-worker");
    assert_eq!(job.files, vec!["a.mp4".to_string(), "b.mp4".to_string()]);
    assert_eq!(job.task, cfg.task[0]);
    match &job.settings {
        JobSettings::Transform { transform, .. } => assert_eq!(transform.ext, "mp4"),
        other => panic!("Expected transform settings, got: {:?}", other),
    }

    // The descriptor survives the JSON boundary intact.
    let json = job.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["kind"], "transform");
    assert_eq!(value["task"]["type"], "transform");
    assert_eq!(JobDescriptor::from_json(&json).unwrap(), *job);
}

#[tokio::test]
async fn upload_outside_window_is_not_dispatched() {
    let source = ConfigFileBuilder::new()
        .with_all_workers()
        .upload_window(window(22, 6))
        .with_task(TaskBuilder::upload("/up").source("/in").ext("mp4").build())
        .source();
    let mut f = fixture(&source);
    f.fs.add_file("/in/v.mp4", "v");
    let cfg = source.load().unwrap();

    let noon = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    f.dispatcher = f.dispatcher.with_clock(Arc::new(move || noon));
    let outcome = f.dispatcher.dispatch(&cfg, 0, &cfg.task[0]).await.unwrap();
    assert_eq!(outcome, DispatchOutcome::OutsideWindow);
    assert!(f.worker.jobs().is_empty());
    assert_eq!(f.fs.file_names("/in"), vec!["v.mp4".to_string()]);

    // Window spans midnight: 23:30 is inside.
    let late = Utc.with_ymd_and_hms(2024, 5, 1, 23, 30, 0).unwrap();
    f.dispatcher = f.dispatcher.with_clock(Arc::new(move || late));
    let outcome = f.dispatcher.dispatch(&cfg, 0, &cfg.task[0]).await.unwrap();
    assert_eq!(outcome, DispatchOutcome::Completed { files: 1 });
}

#[test]
fn executable_time_applies_utc_offset() {
    let mut w = window(9, 17);
    w.utc_offset_hours = 8;

    // 02:00 UTC is 10:00 at UTC+8.
    assert!(w.contains(Utc.with_ymd_and_hms(2024, 5, 1, 2, 0, 0).unwrap()));
    // 12:00 UTC is 20:00 at UTC+8.
    assert!(!w.contains(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()));
    // Both ends are inclusive: 01:00 and 09:00 UTC are 09:00 and 17:00 local.
    assert!(w.contains(Utc.with_ymd_and_hms(2024, 5, 1, 1, 0, 0).unwrap()));
    assert!(w.contains(Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()));
    assert!(!w.contains(Utc.with_ymd_and_hms(2024, 5, 1, 9, 1, 0).unwrap()));
}

#[tokio::test]
async fn relocation_moves_matching_files_into_target() {
    let source = ConfigFileBuilder::new()
        .with_task(
            TaskBuilder::relocate("/archive")
                .source("/cam")
                .ext("mov")
                .include("clip")
                .build(),
        )
        .source();
    let f = fixture(&source);
    f.fs.add_file("/cam/clip1.mov", "1");
    f.fs.add_file("/cam/other.mov", "o");
    f.fs.add_file("/cam/clip2.jpg", "j");
    let cfg = source.load().unwrap();

    let outcome = f.dispatcher.dispatch(&cfg, 0, &cfg.task[0]).await.unwrap();

    match outcome {
        DispatchOutcome::Relocated(report) => {
            assert_eq!(report.moved, vec!["clip1.mov".to_string()]);
        }
        other => panic!("Expected Relocated, got: {:?}", other),
    }
    assert_eq!(f.fs.file_names("/archive"), vec!["clip1.mov".to_string()]);
    assert_eq!(
        f.fs.file_names("/cam"),
        vec!["clip2.jpg".to_string(), "other.mov".to_string()]
    );
    assert!(f.worker.jobs().is_empty());
}

#[tokio::test]
async fn worker_kind_must_match_task_category() {
    let source = ConfigFileBuilder::new()
        .with_all_workers()
        .with_task(TaskBuilder::merge("/work").ext("mp4").build())
        .source();
    let f = fixture(&source);
    let cfg = source.load().unwrap();

    let err = f
        .dispatcher
        .dispatch_worker(&cfg, 0, &cfg.task[0], WorkerKind::Upload)
        .await
        .unwrap_err();

    assert!(matches!(err, LanekeeperError::ConfigError(_)));
    assert!(f.worker.jobs().is_empty());
}

#[tokio::test]
async fn spawn_failure_is_recorded_with_category() {
    let source = ConfigFileBuilder::new()
        .with_all_workers()
        .with_task(TaskBuilder::upload("/up").ext("mp4").build())
        .source();
    let f = fixture(&source);
    f.fs.add_file("/up/v.mp4", "v");
    f.worker.fail_spawn(WorkerKind::Upload);
    let cfg = source.load().unwrap();

    let err = f.dispatcher.dispatch(&cfg, 0, &cfg.task[0]).await.unwrap_err();

    assert!(matches!(err, LanekeeperError::WorkerSpawn { .. }));
    let records = f.sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].context, "dispatch:upload");
    // Without disable_on_failure the task stays enabled.
    assert!(!source.snapshot().task[0].is_skipped());
}
