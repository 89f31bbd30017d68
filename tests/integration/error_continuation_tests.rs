use dupsweep::actions::{ActionKind, ResolveConfig, ResolveMode, Resolver};
use dupsweep::duplicates::{DuplicateIndex, FileRecord, ScanStats};
use dupsweep::error::ExitCode;
use dupsweep::scanner::{HashError, ScanError};
use dupsweep::sweep::{run, SweepOptions};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_excluded_and_run_completes() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"same").unwrap();
    fs::write(dir.path().join("b"), b"same").unwrap();
    let locked = dir.path().join("c");
    fs::write(&locked, b"same").unwrap();
    set_mode(&locked, 0o000);

    // Privileged users can read anyway; nothing to assert then.
    if fs::read(&locked).is_ok() {
        set_mode(&locked, 0o644);
        return;
    }

    let report = run(&SweepOptions::new(dir.path(), ResolveMode::DryRun)).unwrap();
    set_mode(&locked, 0o644);

    assert_eq!(report.scan.files_scanned, 2);
    assert_eq!(report.scan.errors.len(), 1);
    assert!(matches!(
        report.scan.errors[0],
        ScanError::Hash(HashError::PermissionDenied(_))
    ));
    assert_eq!(report.scan.groups.len(), 1);
    assert!(report.scan.groups[0]
        .records
        .iter()
        .all(|r| r.path.file_name().unwrap() != "c"));
    assert_eq!(report.error_count(), 1);
    assert_eq!(ExitCode::from_report(&report), ExitCode::PartialSuccess);
}

#[cfg(unix)]
#[test]
fn test_undeletable_duplicate_is_retried_and_recorded() {
    let dir = tempdir().unwrap();
    let locked = dir.path().join("locked");
    fs::create_dir(&locked).unwrap();
    fs::write(dir.path().join("a"), b"dup").unwrap();
    fs::write(locked.join("b"), b"dup").unwrap();
    fs::write(dir.path().join("c"), b"other").unwrap();
    fs::write(dir.path().join("d"), b"other").unwrap();
    set_mode(&locked, 0o555);

    if fs::write(locked.join("canary"), b"").is_ok() {
        set_mode(&locked, 0o755);
        return;
    }

    let mut options = SweepOptions::new(dir.path(), ResolveMode::Delete);
    options.max_retries = 4;
    let report = run(&options).unwrap();
    set_mode(&locked, 0o755);

    // The other group is still resolved.
    assert_eq!(report.resolution.files_deleted, 1);
    assert!(!dir.path().join("d").exists());

    assert_eq!(report.resolution.failures.len(), 1);
    let failure = &report.resolution.failures[0];
    assert_eq!(failure.action, ActionKind::Delete);
    assert_eq!(failure.attempts, 4);
    assert!(locked.join("b").exists());
    assert_eq!(ExitCode::from_report(&report), ExitCode::PartialSuccess);
}

#[test]
fn test_vanished_duplicate_counts_as_absent() {
    let dir = tempdir().unwrap();
    let kept = dir.path().join("kept");
    let gone = dir.path().join("gone");
    fs::write(&kept, b"x").unwrap();

    let digest = *blake3::hash(b"x").as_bytes();
    let index = DuplicateIndex::new();
    index.insert(FileRecord::new(kept.clone(), 1, digest, 0));
    index.insert(FileRecord::new(gone, 1, digest, 1));
    let scan = index.finalize(ScanStats::default());

    let outcome = Resolver::new(ResolveConfig::new(ResolveMode::Delete)).resolve(&scan);

    assert_eq!(outcome.already_absent, 1);
    assert_eq!(outcome.files_deleted, 0);
    assert!(outcome.failures.is_empty());
    assert!(kept.exists());
}

#[test]
fn test_missing_kept_copy_protects_group() {
    let dir = tempdir().unwrap();
    let kept = dir.path().join("kept");
    let dup = dir.path().join("dup");
    fs::write(&dup, b"x").unwrap();

    let digest = *blake3::hash(b"x").as_bytes();
    let index = DuplicateIndex::new();
    index.insert(FileRecord::new(kept, 1, digest, 0));
    index.insert(FileRecord::new(dup.clone(), 1, digest, 1));
    let scan = index.finalize(ScanStats::default());

    let outcome = Resolver::new(ResolveConfig::new(ResolveMode::Delete)).resolve(&scan);

    assert!(dup.exists());
    assert_eq!(outcome.groups_skipped, 1);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].action, ActionKind::Verify);
}

#[test]
fn test_missing_source_is_fatal() {
    let dir = tempdir().unwrap();
    let options = SweepOptions::new(dir.path().join("absent"), ResolveMode::Delete);

    let err = run(&options).unwrap_err();
    let err = anyhow::Error::new(err);
    assert_eq!(ExitCode::from_error(&err), ExitCode::GeneralError);
}
