//! Tests for CLI argument parsing and configuration resolution
