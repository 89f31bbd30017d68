use dupsweep::actions::ResolveMode;
use dupsweep::sweep::{run, SweepOptions};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_delete_keeps_first_discovered() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"hello").unwrap();
    fs::write(dir.path().join("b.txt"), b"hello").unwrap();
    fs::write(dir.path().join("c.txt"), b"world").unwrap();

    let report = run(&SweepOptions::new(dir.path(), ResolveMode::Delete)).unwrap();
    let summary = report.summary();

    assert_eq!(summary.files_scanned, 3);
    assert_eq!(summary.duplicate_groups, 1);
    assert_eq!(summary.files_deleted, 1);
    assert_eq!(summary.bytes_reclaimed, 5);
    assert_eq!(summary.errors, 0);
    assert!(dir.path().join("a.txt").exists());
    assert!(!dir.path().join("b.txt").exists());
    assert_eq!(fs::read(dir.path().join("c.txt")).unwrap(), b"world");
}

#[test]
fn test_delete_twice_is_idempotent() {
    let dir = tempdir().unwrap();
    for name in ["one", "two", "three"] {
        fs::write(dir.path().join(name), b"triplicate").unwrap();
    }

    let first = run(&SweepOptions::new(dir.path(), ResolveMode::Delete)).unwrap();
    assert_eq!(first.resolution.files_deleted, 2);

    let second = run(&SweepOptions::new(dir.path(), ResolveMode::Delete)).unwrap();
    assert_eq!(second.error_count(), 0);
    assert_eq!(second.resolution.files_deleted, 0);
    assert!(second.scan.groups.is_empty());

    let remaining: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(remaining.len(), 1);
}

#[test]
fn test_delete_empty_directory() {
    let dir = tempdir().unwrap();

    let report = run(&SweepOptions::new(dir.path(), ResolveMode::Delete)).unwrap();

    assert!(report.scan.groups.is_empty());
    assert_eq!(report.resolution.files_acted(), 0);
    assert_eq!(report.error_count(), 0);
}

#[test]
fn test_dry_run_touches_nothing() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"same").unwrap();
    fs::write(dir.path().join("b"), b"same").unwrap();
    fs::write(dir.path().join("c"), b"same").unwrap();

    let report = run(&SweepOptions::new(dir.path(), ResolveMode::DryRun)).unwrap();

    assert_eq!(report.resolution.planned.len(), 2);
    assert_eq!(report.resolution.files_acted(), 0);
    assert_eq!(report.summary().bytes_reclaimable, 8);
    for name in ["a", "b", "c"] {
        assert!(dir.path().join(name).exists());
    }
}

#[test]
fn test_delete_result_same_for_every_worker_count() {
    for workers in [1, 2, 8] {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("nested");
        fs::create_dir(&sub).unwrap();
        for i in 0..20 {
            fs::write(dir.path().join(format!("f{:02}", i)), format!("c{}", i % 4)).unwrap();
            fs::write(sub.join(format!("g{:02}", i)), format!("c{}", i % 4)).unwrap();
        }

        let mut options = SweepOptions::new(dir.path(), ResolveMode::Delete);
        options.concurrency = workers;
        let report = run(&options).unwrap();

        assert_eq!(report.scan.duplicate_groups(), 4, "workers={}", workers);
        assert_eq!(report.resolution.files_deleted, 36, "workers={}", workers);
        for i in 0..4 {
            assert!(
                dir.path().join(format!("f{:02}", i)).exists(),
                "workers={} kept f{:02}",
                workers,
                i
            );
        }
    }
}

#[test]
fn test_delete_large_group_keeps_one() {
    let dir = tempdir().unwrap();
    for i in 0..50 {
        fs::write(dir.path().join(format!("copy{:03}", i)), b"payload").unwrap();
    }

    let report = run(&SweepOptions::new(dir.path(), ResolveMode::Delete)).unwrap();

    assert_eq!(report.resolution.files_deleted, 49);
    assert!(dir.path().join("copy000").exists());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}
