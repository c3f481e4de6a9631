//! Command line parsing tests

use clap::Parser;
use pipeline_queue::app::cli::args::Args;
use pipeline_queue::app::cli::config::{FileConfig, Settings};
use pipeline_queue::core::logging::LogFormat;
use std::time::Duration;

#[test]
fn test_long_and_short_forms_agree() {
    let long = Args::try_parse_from([
        "pipeline-queue",
        "--capacity",
        "8",
        "--producers",
        "2",
        "--workers",
        "3",
        "--messages",
        "40",
    ])
    .unwrap();
    let short = Args::try_parse_from([
        "pipeline-queue", "-b", "8", "-p", "2", "-w", "3", "-n", "40",
    ])
    .unwrap();

    assert_eq!(long, short);
}

#[test]
fn test_command_line_only_settings() {
    let args = Args::try_parse_from([
        "pipeline-queue",
        "--capacity",
        "0",
        "--work-delay-ms",
        "3",
        "--log-format",
        "ext",
        "--color",
    ])
    .unwrap();

    let settings = Settings::resolve(&args, &FileConfig::default()).unwrap();

    assert_eq!(settings.drill.capacity, 0);
    assert_eq!(settings.drill.work_delay, Duration::from_millis(3));
    assert_eq!(settings.log.format, LogFormat::Ext);
    assert!(settings.log.color);
}

#[test]
fn test_invalid_values_are_rejected() {
    for argv in [
        vec!["pipeline-queue", "--producers", "0"],
        vec!["pipeline-queue", "--workers", "many"],
        vec!["pipeline-queue", "--capacity", "-3"],
        vec!["pipeline-queue", "--log-level", "chatty"],
        vec!["pipeline-queue", "--unknown-flag"],
    ] {
        assert!(
            Args::try_parse_from(&argv).is_err(),
            "expected {:?} to be rejected",
            argv
        );
    }
}

#[test]
fn test_version_flag_exits_early() {
    let err = Args::try_parse_from(["pipeline-queue", "--version"]).unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
}
