use dupsweep::duplicates::{DuplicateFinder, FinderConfig};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn names(paths: impl IntoIterator<Item = impl AsRef<Path>>) -> BTreeSet<String> {
    paths
        .into_iter()
        .map(|p| {
            p.as_ref()
                .file_name()
                .unwrap()
                .to_string_lossy()
                .into_owned()
        })
        .collect()
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let finder = DuplicateFinder::with_defaults();

    let result = finder.find_duplicates(dir.path()).unwrap();

    assert!(result.groups.is_empty());
    assert_eq!(result.files_scanned, 0);
    assert_eq!(result.duplicate_groups(), 0);
}

#[test]
fn test_scan_single_file() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("only.txt"), b"alone").unwrap();

    let result = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert!(result.groups.is_empty());
    assert_eq!(result.files_scanned, 1);
}

#[test]
fn test_scan_unique_files() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"content a").unwrap();
    fs::write(dir.path().join("b.txt"), b"content b").unwrap();
    fs::write(dir.path().join("c.txt"), b"content c").unwrap();

    let result = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert!(result.groups.is_empty());
    assert_eq!(result.files_scanned, 3);
}

#[test]
fn test_scan_hello_world() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"hello").unwrap();
    fs::write(dir.path().join("b.txt"), b"hello").unwrap();
    fs::write(dir.path().join("c.txt"), b"world").unwrap();

    let result = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(result.files_scanned, 3);
    assert_eq!(result.duplicate_groups(), 1);

    let group = &result.groups[0];
    assert_eq!(group.len(), 2);
    assert_eq!(group.size, 5);
    assert_eq!(group.canonical().path.file_name().unwrap(), "a.txt");
    assert_eq!(group.duplicates()[0].path.file_name().unwrap(), "b.txt");
    assert_eq!(group.digest, *blake3::hash(b"hello").as_bytes());
}

#[test]
fn test_scan_duplicates_across_subdirectories() {
    let dir = tempdir().unwrap();
    let deep = dir.path().join("x").join("y").join("z");
    fs::create_dir_all(&deep).unwrap();
    fs::write(dir.path().join("top.bin"), b"same bytes").unwrap();
    fs::write(deep.join("bottom.bin"), b"same bytes").unwrap();
    fs::write(dir.path().join("x").join("mid.bin"), b"same bytes").unwrap();

    let result = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(result.duplicate_groups(), 1);
    assert_eq!(result.groups[0].len(), 3);
    assert_eq!(
        names(result.groups[0].records.iter().map(|r| &r.path)),
        names(["top.bin", "bottom.bin", "mid.bin"])
    );
}

#[test]
fn test_scan_empty_files_are_duplicates() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("e1"), b"").unwrap();
    fs::write(dir.path().join("e2"), b"").unwrap();
    fs::write(dir.path().join("e3"), b"").unwrap();

    let result = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(result.duplicate_groups(), 1);
    assert_eq!(result.groups[0].len(), 3);
    assert_eq!(result.groups[0].size, 0);
    assert_eq!(result.reclaimable_space(), 0);
}

#[test]
fn test_scan_groups_sorted_by_member_count() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("s1"), b"ab").unwrap();
    fs::write(dir.path().join("s2"), b"ab").unwrap();
    fs::write(dir.path().join("s3"), b"ab").unwrap();
    fs::write(dir.path().join("l1"), vec![7u8; 4096]).unwrap();
    fs::write(dir.path().join("l2"), vec![7u8; 4096]).unwrap();

    let result = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(result.duplicate_groups(), 2);
    assert_eq!(result.groups[0].len(), 3);
    assert_eq!(result.groups[0].size, 2);
    assert_eq!(result.groups[1].len(), 2);
    assert_eq!(result.groups[1].size, 4096);
    assert_eq!(result.duplicate_files(), 3);
    assert_eq!(result.reclaimable_space(), 4100);
}

#[test]
fn test_scan_equal_member_count_ordered_by_digest() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a1"), b"first pair").unwrap();
    fs::write(dir.path().join("a2"), b"first pair").unwrap();
    fs::write(dir.path().join("b1"), vec![9u8; 2048]).unwrap();
    fs::write(dir.path().join("b2"), vec![9u8; 2048]).unwrap();

    let result = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(result.duplicate_groups(), 2);
    assert_eq!(result.groups[0].len(), 2);
    assert_eq!(result.groups[1].len(), 2);
    assert!(result.groups[0].digest < result.groups[1].digest);
}

#[test]
fn test_scan_same_size_different_content() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"aaaa").unwrap();
    fs::write(dir.path().join("b"), b"bbbb").unwrap();

    let result = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert!(result.groups.is_empty());
}

#[test]
fn test_scan_mmap_matches_streaming() {
    let dir = tempdir().unwrap();
    let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
    fs::write(dir.path().join("big1"), &data).unwrap();
    fs::write(dir.path().join("big2"), &data).unwrap();

    let streamed = DuplicateFinder::new(FinderConfig::default().with_mmap(false))
        .find_duplicates(dir.path())
        .unwrap();
    let mapped = DuplicateFinder::new(FinderConfig::default().with_mmap(true))
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(streamed.groups.len(), 1);
    assert_eq!(mapped.groups.len(), 1);
    assert_eq!(streamed.groups[0].digest, mapped.groups[0].digest);
}

#[cfg(unix)]
#[test]
fn test_scan_hardlinks_counted_once() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("orig"), b"linked content").unwrap();
    fs::hard_link(dir.path().join("orig"), dir.path().join("link")).unwrap();

    let result = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(result.files_scanned, 1);
    assert!(result.groups.is_empty());
}

#[cfg(unix)]
#[test]
fn test_scan_symlinks_not_followed_by_default() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("real"), b"target").unwrap();
    std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("alias")).unwrap();

    let result = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(result.files_scanned, 1);
    assert!(result.groups.is_empty());
    assert!(result.files_skipped >= 1);
}

#[cfg(unix)]
#[test]
fn test_scan_symlink_cycle_terminates() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).unwrap();
    fs::write(sub.join("f1"), b"dup").unwrap();
    fs::write(dir.path().join("f2"), b"dup").unwrap();
    std::os::unix::fs::symlink(dir.path(), sub.join("loop")).unwrap();

    let result = DuplicateFinder::new(FinderConfig::default().with_follow_symlinks(true))
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(result.duplicate_groups(), 1);
    assert_eq!(result.groups[0].len(), 2);
}
