//! Command line arguments for the pipeline drill
//!
//! Every option is optional so that unset values can fall back to the
//! configuration file and then to built-in defaults.

use crate::core::validation::{validate_capacity, validate_log_level, validate_positive_int};
use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone, Default, PartialEq)]
#[command(name = "pipeline-queue")]
#[command(about = "Drive message readers and dispatch workers through a bounded priority queue")]
#[command(version)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long = "config-file", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Queue capacity (0 = direct hand-off only)
    #[arg(short = 'b', long = "capacity", value_name = "ITEMS", value_parser = validate_capacity)]
    pub capacity: Option<usize>,

    /// Number of producer (reader) tasks
    #[arg(short = 'p', long = "producers", value_name = "COUNT", value_parser = validate_positive_int)]
    pub producers: Option<usize>,

    /// Number of dispatch worker tasks
    #[arg(short = 'w', long = "workers", value_name = "COUNT", value_parser = validate_positive_int)]
    pub workers: Option<usize>,

    /// Messages each producer emits
    #[arg(short = 'n', long = "messages", value_name = "COUNT")]
    pub messages_per_producer: Option<usize>,

    /// Every Nth message is a high-priority control message (0 = none)
    #[arg(long = "control-every", value_name = "N")]
    pub control_every: Option<usize>,

    /// Simulated handling time per message in milliseconds
    #[arg(long = "work-delay-ms", value_name = "MS")]
    pub work_delay_ms: Option<u64>,

    /// Log level
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL", value_parser = validate_log_level)]
    pub log_level: Option<String>,

    /// Log file path
    #[arg(short = 'f', long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log output format
    #[arg(short = 'o', long = "log-format", value_name = "FORMAT", value_parser = ["text", "ext", "json"])]
    pub log_format: Option<String>,

    /// Force colored output
    #[arg(long = "color", action = ArgAction::SetTrue, conflicts_with = "no_color")]
    pub color: bool,

    /// Disable colored output
    #[arg(long = "no-color", action = ArgAction::SetTrue)]
    pub no_color: bool,
}

impl Args {
    /// Explicit color preference, `None` when left to auto-detection
    pub fn color_override(&self) -> Option<bool> {
        match (self.color, self.no_color) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}
