// tests/targets.rs

use std::fs;
use std::path::PathBuf;

use lanekeeper::files::{TargetFilter, enumerate_targets};
use lanekeeper::fs::RealFileSystem;
use lanekeeper::fs::mock::MockFileSystem;
use proptest::prelude::*;
use tempfile::TempDir;

fn filter(exts: &[&str], includes: &[&str], excludes: &[&str]) -> TargetFilter {
    TargetFilter {
        include_ext: exts.iter().map(|s| s.to_string()).collect(),
        includes: includes.iter().map(|s| s.to_string()).collect(),
        excludes: excludes.iter().map(|s| s.to_string()).collect(),
    }
}

#[test]
fn empty_extension_list_rejects_everything() {
    let f = filter(&[], &[], &[]);
    assert!(!f.matches("a.mp4"));
    assert!(!f.matches("README"));
}

#[test]
fn extension_match_is_case_sensitive_and_dotless() {
    let f = filter(&["mp4"], &[], &[]);
    assert!(f.matches("clip.mp4"));
    assert!(!f.matches("clip.MP4"));
    assert!(!f.matches("clip.mp4.part"));
    assert!(!f.matches("mp4"));
}

#[test]
fn includes_and_excludes_are_substring_checks() {
    let f = filter(&["mp4"], &["live", "stream"], &["_tmp"]);
    assert!(f.matches("live-2024.mp4"));
    assert!(f.matches("my_stream.mp4"));
    assert!(!f.matches("other.mp4"));
    assert!(!f.matches("live_tmp.mp4"));
}

#[test]
fn enumerate_lists_only_matching_regular_files() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    fs::write(root.join("b.mp4"), b"b").unwrap();
    fs::write(root.join("a.mp4"), b"a").unwrap();
    fs::write(root.join("notes.txt"), b"n").unwrap();
    fs::create_dir(root.join("nested.mp4")).unwrap();

    let result = enumerate_targets(
        &RealFileSystem,
        &[root.to_path_buf()],
        &filter(&["mp4"], &[], &[]),
    )
    .unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result[root], vec!["a.mp4".to_string(), "b.mp4".to_string()]);
}

#[test]
fn directories_without_matches_are_omitted() {
    let fs = MockFileSystem::new();
    fs.add_file("/in/a.mp4", "a");
    fs.add_file("/other/readme.txt", "r");
    fs.add_dir("/empty");

    let dirs = vec![
        PathBuf::from("/in"),
        PathBuf::from("/other"),
        PathBuf::from("/empty"),
    ];
    let result = enumerate_targets(&fs, &dirs, &filter(&["mp4"], &[], &[])).unwrap();

    assert_eq!(result.keys().collect::<Vec<_>>(), vec![&PathBuf::from("/in")]);
}

#[test]
fn missing_directory_is_an_error() {
    let fs = MockFileSystem::new();
    let result = enumerate_targets(&fs, &[PathBuf::from("/nope")], &filter(&["mp4"], &[], &[]));
    assert!(result.is_err());
}

fn name_strategy() -> impl Strategy<Value = String> {
    ("[a-c_]{1,6}", prop::sample::select(vec!["mp4", "mkv", "MP4", "txt"]))
        .prop_map(|(stem, ext)| format!("{stem}.{ext}"))
}

proptest! {
    #[test]
    fn enumerate_is_deterministic_and_never_lists_empty_dirs(
        names_a in prop::collection::vec(name_strategy(), 0..8),
        names_b in prop::collection::vec(name_strategy(), 0..8),
        exts in prop::collection::vec(prop::sample::select(vec!["mp4", "mkv", "txt"]), 0..3),
        excludes in prop::collection::vec("[a-c_]{1,2}", 0..2),
    ) {
        let fs = MockFileSystem::new();
        fs.add_dir("/a");
        fs.add_dir("/b");
        for n in &names_a {
            fs.add_file(format!("/a/{n}"), "x");
        }
        for n in &names_b {
            fs.add_file(format!("/b/{n}"), "x");
        }

        let f = TargetFilter {
            include_ext: exts.iter().map(|s| s.to_string()).collect(),
            includes: Vec::new(),
            excludes,
        };
        let dirs = vec![PathBuf::from("/a"), PathBuf::from("/b")];

        let first = enumerate_targets(&fs, &dirs, &f).unwrap();
        let second = enumerate_targets(&fs, &dirs, &f).unwrap();

        prop_assert_eq!(&first, &second);
        for (dir, files) in &first {
            prop_assert!(!files.is_empty(), "{:?} listed with no files", dir);
            for name in files {
                prop_assert!(f.matches(name));
            }
        }
    }
}
