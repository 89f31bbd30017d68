use clap::Parser;
use dupsweep::actions::{CollisionPolicy, ResolveMode};
use dupsweep::cli::{Cli, ModeArg};
use dupsweep::config::{CliOverrides, Config, ConfigError};
use figment::providers::Serialized;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn overrides(args: &[&str]) -> CliOverrides {
    let mut argv = vec!["dupsweep", "/src"];
    argv.extend_from_slice(args);
    CliOverrides::from(&Cli::try_parse_from(argv).unwrap())
}

#[test]
fn test_config_load_defaults() {
    // Use figment directly without Env to avoid interference from other tests
    let figment = figment::Figment::from(Serialized::defaults(Config::default()));
    let config: Config = figment.extract().unwrap();
    assert_eq!(config.mode, ModeArg::DryRun);
    assert_eq!(config.max_retries, 3);
    assert_eq!(config.collision, CollisionPolicy::Rename);
    assert!(!config.follow_symlinks);
}

#[test]
fn test_config_load_from_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
mode = "quarantine"
destination = "/srv/review"
concurrency = 3
max_retries = 5
collision = "overwrite"
follow_symlinks = true
buffer_size = 4096
"#,
    )
    .unwrap();

    let config =
        Config::load_layers(Some(&config_path), "DUPSWEEP_TEST_TOML_", &overrides(&[])).unwrap();

    assert_eq!(config.mode, ModeArg::Quarantine);
    assert_eq!(config.destination, Some(PathBuf::from("/srv/review")));
    assert_eq!(config.concurrency, 3);
    assert_eq!(config.max_retries, 5);
    assert_eq!(config.collision, CollisionPolicy::Overwrite);
    assert!(config.follow_symlinks);
    assert_eq!(config.buffer_size, 4096);
    assert_eq!(
        config.resolve_mode(),
        ResolveMode::Quarantine {
            destination: PathBuf::from("/srv/review")
        }
    );
}

#[test]
fn test_config_load_from_env() {
    std::env::set_var("DUPSWEEP_TEST_ENV_CONCURRENCY", "16");
    std::env::set_var("DUPSWEEP_TEST_ENV_MODE", "delete");
    std::env::set_var("DUPSWEEP_TEST_ENV_UNRELATED", "ignored");

    let config = Config::load_layers(None, "DUPSWEEP_TEST_ENV_", &overrides(&[]));

    std::env::remove_var("DUPSWEEP_TEST_ENV_CONCURRENCY");
    std::env::remove_var("DUPSWEEP_TEST_ENV_MODE");
    std::env::remove_var("DUPSWEEP_TEST_ENV_UNRELATED");

    let config = config.unwrap();
    assert_eq!(config.concurrency, 16);
    assert_eq!(config.mode, ModeArg::Delete);
}

#[test]
fn test_config_precedence_cli_over_env_over_file() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "concurrency = 2\nmax_retries = 7\nbuffer_size = 1024\n").unwrap();

    std::env::set_var("DUPSWEEP_TEST_PREC_CONCURRENCY", "4");
    std::env::set_var("DUPSWEEP_TEST_PREC_MAX_RETRIES", "9");

    let config = Config::load_layers(
        Some(&config_path),
        "DUPSWEEP_TEST_PREC_",
        &overrides(&["-j", "6"]),
    );

    std::env::remove_var("DUPSWEEP_TEST_PREC_CONCURRENCY");
    std::env::remove_var("DUPSWEEP_TEST_PREC_MAX_RETRIES");

    let config = config.unwrap();
    assert_eq!(config.concurrency, 6);
    assert_eq!(config.max_retries, 9);
    assert_eq!(config.buffer_size, 1024);
}

#[test]
fn test_unset_cli_flags_do_not_mask_file() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "follow_symlinks = true\ncollision = \"overwrite\"\n").unwrap();

    let config =
        Config::load_layers(Some(&config_path), "DUPSWEEP_TEST_MASK_", &overrides(&[])).unwrap();

    assert!(config.follow_symlinks);
    assert_eq!(config.collision, CollisionPolicy::Overwrite);
}

#[test]
fn test_unknown_key_suggests_closest() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "concurency = 4\n").unwrap();

    let err = Config::load_layers(Some(&config_path), "DUPSWEEP_TEST_UNK_", &overrides(&[]))
        .unwrap_err();

    match err {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => {
            assert_eq!(key, "concurency");
            assert_eq!(suggestion.as_deref(), Some("concurrency"));
        }
        other => panic!("Expected UnknownKey, got: {:?}", other),
    }
}

#[test]
fn test_invalid_toml_is_an_error() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "mode = [unterminated").unwrap();

    let result = Config::load_layers(Some(&config_path), "DUPSWEEP_TEST_BAD_", &overrides(&[]));
    assert!(matches!(result, Err(ConfigError::Load(_))));
}

#[test]
fn test_invalid_value_type_is_an_error() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "collision = \"shred\"\n").unwrap();

    let result = Config::load_layers(Some(&config_path), "DUPSWEEP_TEST_TYPE_", &overrides(&[]));
    assert!(matches!(result, Err(ConfigError::Load(_))));
}

#[test]
fn test_zero_concurrency_rejected() {
    let result = Config::load_layers(None, "DUPSWEEP_TEST_ZERO_", &overrides(&["-j", "0"]));
    assert!(matches!(
        result,
        Err(ConfigError::InvalidValue {
            key: "concurrency",
            ..
        })
    ));
}

#[test]
fn test_quarantine_without_destination_rejected() {
    let result = Config::load_layers(
        None,
        "DUPSWEEP_TEST_QDEST_",
        &overrides(&["--mode", "quarantine"]),
    );
    assert!(matches!(result, Err(ConfigError::MissingDestination)));
}

#[test]
fn test_explicit_missing_config_file() {
    let cli = Cli::try_parse_from([
        "dupsweep",
        "/src",
        "--config",
        "/nonexistent/dupsweep.toml",
    ])
    .unwrap();

    assert!(matches!(
        Config::load(&cli),
        Err(ConfigError::FileNotFound(_))
    ));
}
