// Error handling utilities for consistent error messages and exit codes

use std::process;
use crate::report::MAX_WINDOW_HOURS;

/// Exit with a user error (exit code 1)
/// User errors are for invalid input, missing resources, etc.
pub fn user_error(message: &str) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

/// Validate that a client ID is a positive integer
pub fn validate_client_id(id_str: &str) -> Result<i64, String> {
    id_str.parse::<i64>()
        .map_err(|_| format!("Invalid client ID: '{}'. Client ID must be a number.", id_str))
        .and_then(|id| {
            if id > 0 {
                Ok(id)
            } else {
                Err(format!("Invalid client ID: {}. Client ID must be positive.", id))
            }
        })
}

/// Validate that a stage code is one of the pipeline stages (1-9)
pub fn validate_stage_code(code: i64) -> Result<i64, String> {
    if (1..=9).contains(&code) {
        Ok(code)
    } else {
        Err(format!("Invalid stage: {}. Stages run from 1 to 9.", code))
    }
}

/// Validate a window length in hours
pub fn validate_window_hours(hours: i64) -> Result<i64, String> {
    if hours <= 0 {
        Err(format!("Invalid window: {} hours. The window must be at least 1 hour.", hours))
    } else if hours > MAX_WINDOW_HOURS {
        Err(format!(
            "Invalid window: {} hours. The window can be at most {} hours.",
            hours, MAX_WINDOW_HOURS
        ))
    } else {
        Ok(hours)
    }
}
