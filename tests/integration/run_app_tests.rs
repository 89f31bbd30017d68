use clap::Parser;
use dupsweep::cli::Cli;
use dupsweep::error::ExitCode;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

/// Parse a quiet invocation with an empty config file so a user config
/// on the test machine cannot change the outcome.
fn cli(source: &Path, extra: &[&str]) -> (Cli, TempDir) {
    let config_dir = tempdir().unwrap();
    let config = config_dir.path().join("config.toml");
    fs::write(&config, "").unwrap();

    let mut argv = vec![
        "dupsweep".to_string(),
        "-q".to_string(),
        "--config".to_string(),
        config.display().to_string(),
        source.display().to_string(),
    ];
    argv.extend(extra.iter().map(|s| s.to_string()));
    (Cli::try_parse_from(argv).unwrap(), config_dir)
}

#[test]
fn test_run_app_dry_run_by_default() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"same").unwrap();
    fs::write(dir.path().join("b"), b"same").unwrap();

    let (cli, _config) = cli(dir.path(), &[]);
    let code = dupsweep::run_app(cli).unwrap();

    assert_eq!(code, ExitCode::Success);
    assert!(dir.path().join("a").exists());
    assert!(dir.path().join("b").exists());
}

#[test]
fn test_run_app_delete_mode() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"same").unwrap();
    fs::write(dir.path().join("b"), b"same").unwrap();

    let (cli, _config) = cli(dir.path(), &["--mode", "delete", "-j", "2"]);
    let code = dupsweep::run_app(cli).unwrap();

    assert_eq!(code, ExitCode::Success);
    assert!(dir.path().join("a").exists());
    assert!(!dir.path().join("b").exists());
}

#[test]
fn test_run_app_no_duplicates() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"one").unwrap();
    fs::write(dir.path().join("b"), b"two").unwrap();

    let (cli, _config) = cli(dir.path(), &["--output", "json"]);
    assert_eq!(dupsweep::run_app(cli).unwrap(), ExitCode::NoDuplicates);
}

#[test]
fn test_run_app_quarantine() {
    let root = tempdir().unwrap();
    let source = root.path().join("src");
    let review = root.path().join("review");
    fs::create_dir(&source).unwrap();
    fs::write(source.join("a"), b"same").unwrap();
    fs::write(source.join("b"), b"same").unwrap();

    let review_arg = review.display().to_string();
    let (cli, _config) = cli(&source, &["-m", "quarantine", "--dest", &review_arg]);
    let code = dupsweep::run_app(cli).unwrap();

    assert_eq!(code, ExitCode::Success);
    assert!(review.join("b").exists());
}

#[test]
fn test_run_app_missing_source_is_general_error() {
    let dir = tempdir().unwrap();
    let (cli, _config) = cli(&dir.path().join("missing"), &[]);

    let err = dupsweep::run_app(cli).unwrap_err();
    assert_eq!(ExitCode::from_error(&err), ExitCode::GeneralError);
    assert!(format!("{:#}", err).contains("missing"));
}

#[test]
fn test_run_app_quarantine_requires_destination() {
    let dir = tempdir().unwrap();
    let (cli, _config) = cli(dir.path(), &["--mode", "quarantine"]);

    let err = dupsweep::run_app(cli).unwrap_err();
    assert_eq!(ExitCode::from_error(&err), ExitCode::GeneralError);
}

#[test]
fn test_run_app_destination_inside_source() {
    let dir = tempdir().unwrap();
    let review = dir.path().join("review").display().to_string();
    let (cli, _config) = cli(dir.path(), &["--mode", "quarantine", "--dest", &review]);

    let err = dupsweep::run_app(cli).unwrap_err();
    assert_eq!(ExitCode::from_error(&err), ExitCode::GeneralError);
}

#[test]
fn test_run_app_rejects_oversized_buffer() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"same").unwrap();
    fs::write(dir.path().join("b"), b"same").unwrap();

    let (cli, _config) = cli(dir.path(), &["--mode", "delete", "--buffer-size", "1TiB"]);

    let err = dupsweep::run_app(cli).unwrap_err();
    assert_eq!(ExitCode::from_error(&err), ExitCode::GeneralError);
    assert!(format!("{:#}", err).contains("buffer_size"));
    assert!(dir.path().join("b").exists());
}
