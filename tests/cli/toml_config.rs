//! TOML configuration tests
//!
//! Config files are loaded from temporary directories through the same
//! discovery path startup uses.

use clap::Parser;
use pipeline_queue::app::cli::args::Args;
use pipeline_queue::app::cli::config::{ConfigError, FileConfig, Settings};
use std::path::PathBuf;
use tempfile::TempDir;

fn write_config(contents: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pipeline-queue.toml");
    std::fs::write(&path, contents).unwrap();
    (dir, path)
}

#[tokio::test]
async fn test_file_values_fill_unset_arguments() {
    let (_dir, path) = write_config(
        r#"
        [queue]
        capacity = 5

        [drill]
        producers = 6
        control_every = 0
        "#,
    );
    let args = Args::try_parse_from([
        "pipeline-queue",
        "--config-file",
        path.to_str().unwrap(),
        "--producers",
        "2",
    ])
    .unwrap();

    let (_, config) = FileConfig::discover(args.config_file.clone())
        .await
        .unwrap()
        .unwrap();
    let settings = Settings::resolve(&args, &config).unwrap();

    assert_eq!(settings.drill.capacity, 5);
    assert_eq!(settings.drill.producers, 2);
    assert_eq!(settings.drill.control_every, 0);
}

#[tokio::test]
async fn test_malformed_file_reports_path() {
    let (_dir, path) = write_config("[queue\ncapacity = 5\n");

    let err = FileConfig::discover(Some(path.clone())).await.unwrap_err();

    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains(&path.display().to_string()));
}

#[tokio::test]
async fn test_wrong_value_type_rejected() {
    let (_dir, path) = write_config("[drill]\nworkers = \"four\"\n");

    let result = FileConfig::discover(Some(path)).await;

    assert!(matches!(result, Err(ConfigError::Parse { .. })));
}

#[tokio::test]
async fn test_unknown_section_rejected() {
    let (_dir, path) = write_config("[plugins]\nenabled = true\n");

    let result = FileConfig::discover(Some(path)).await;

    assert!(matches!(result, Err(ConfigError::Parse { .. })));
}
