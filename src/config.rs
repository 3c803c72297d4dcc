// Configuration file (~/.pipedash/rc)
//
// Plain `key=value` lines. Blank lines and `#` comments are skipped.

use std::path::{Path, PathBuf};
use crate::error::{ReportError, Result};
use crate::models::DEFAULT_TERMINAL_STAGE;
use crate::report::MAX_WINDOW_HOURS;

pub const DEFAULT_PROFILE_LINK_PREFIX: &str = "https://services.followupboss.com/2/people/view/";
pub const DEFAULT_WINDOW_HOURS: i64 = 24;

/// Resolved dashboard configuration
#[derive(Debug, Clone, PartialEq)]
pub struct DashConfig {
    pub data_location: PathBuf,
    pub terminal_stage: i64,
    pub window_hours: i64,
    pub employee_allowlist: Vec<i64>,
    pub profile_link_prefix: String,
}

impl DashConfig {
    /// Directory holding the rc file and the default database
    pub fn config_dir() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|home| home.join(".pipedash"))
            .ok_or_else(|| ReportError::Config("cannot determine home directory".to_string()))
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("rc"))
    }

    /// Defaults with the database placed in `base_dir`
    pub fn with_defaults(base_dir: &Path) -> Self {
        DashConfig {
            data_location: base_dir.join("pipeline.db"),
            terminal_stage: DEFAULT_TERMINAL_STAGE,
            window_hours: DEFAULT_WINDOW_HOURS,
            employee_allowlist: Vec::new(),
            profile_link_prefix: DEFAULT_PROFILE_LINK_PREFIX.to_string(),
        }
    }

    /// Load configuration from the rc file, or defaults when it does not exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        let base_dir = Self::config_dir()?;

        if !config_path.exists() {
            log::debug!("No config at {}, using defaults", config_path.display());
            return Ok(Self::with_defaults(&base_dir));
        }

        let contents = std::fs::read_to_string(&config_path).map_err(|e| {
            ReportError::Config(format!("failed to read {}: {}", config_path.display(), e))
        })?;
        Self::parse(&contents, &base_dir)
    }

    /// Parse rc contents. Relative `data.location` resolves against `base_dir`.
    pub fn parse(contents: &str, base_dir: &Path) -> Result<Self> {
        let mut config = Self::with_defaults(base_dir);

        for (line_no, raw) in contents.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(ReportError::Config(format!(
                    "line {}: expected key=value, got '{}'",
                    line_no + 1,
                    line
                )));
            };
            let key = key.trim();
            let value = value.trim();

            match key {
                "data.location" => {
                    let path = PathBuf::from(value);
                    config.data_location = if path.is_relative() {
                        base_dir.join(path)
                    } else {
                        path
                    };
                }
                "report.terminal_stage" => {
                    config.terminal_stage = parse_int(key, value)?;
                }
                "report.window_hours" => {
                    let hours = parse_int(key, value)?;
                    if hours <= 0 || hours > MAX_WINDOW_HOURS {
                        return Err(ReportError::Config(format!(
                            "{} must be between 1 and {}, got {}",
                            key, MAX_WINDOW_HOURS, hours
                        )));
                    }
                    config.window_hours = hours;
                }
                "report.employee_allowlist" => {
                    config.employee_allowlist = parse_id_list(key, value)?;
                }
                "report.profile_link_prefix" => {
                    config.profile_link_prefix = value.to_string();
                }
                other => {
                    log::warn!("Ignoring unknown config key '{}' on line {}", other, line_no + 1);
                }
            }
        }

        Ok(config)
    }
}

fn parse_int(key: &str, value: &str) -> Result<i64> {
    value
        .parse::<i64>()
        .map_err(|_| ReportError::Config(format!("{} must be an integer, got '{}'", key, value)))
}

fn parse_id_list(key: &str, value: &str) -> Result<Vec<i64>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| parse_int(key, part))
        .collect()
}
