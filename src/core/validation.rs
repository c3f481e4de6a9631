//! Validation utilities for CLI arguments and configuration values

/// Validate positive integer value
pub fn validate_positive_int(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("Value must be greater than 0".to_string()),
        Ok(n) => Ok(n),
        Err(_) => Err(format!("'{}' is not a valid positive integer", value)),
    }
}

/// Validate a queue capacity (0 is allowed and means rendezvous hand-off)
pub fn validate_capacity(value: &str) -> Result<usize, String> {
    value
        .parse::<usize>()
        .map_err(|_| format!("'{}' is not a valid queue capacity", value))
}

/// Validate a log level name
pub fn validate_log_level(value: &str) -> Result<String, String> {
    match value.to_lowercase().as_str() {
        level @ ("trace" | "debug" | "info" | "warn" | "error" | "off") => Ok(level.to_string()),
        _ => Err(format!(
            "Invalid log level '{}' (expected trace, debug, info, warn, error or off)",
            value
        )),
    }
}
