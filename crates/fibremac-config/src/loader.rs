// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Two-tier loading:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)

use crate::types::OverflowPolicy;
use crate::{ConfigError, ConfigResult, FibremacConfig};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// File name searched for when no explicit path is given
pub const CONFIG_FILE_NAME: &str = "fibremac_configuration.toml";

/// How far up the directory tree discovery walks (cwd plus five parents,
/// enough to reach a workspace root from any member crate)
const MAX_SEARCH_DEPTH: usize = 6;

/// Find the FIBREMAC configuration file
///
/// `FIBREMAC_CONFIG_PATH` wins when set; otherwise discovery walks from the
/// current directory up through its ancestors looking for
/// [`CONFIG_FILE_NAME`].
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if the override points at a missing
/// file or the walk finds nothing.
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("FIBREMAC_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        return if path.exists() {
            Ok(path)
        } else {
            Err(ConfigError::FileNotFound(format!(
                "FIBREMAC_CONFIG_PATH points at a missing file: {}",
                path.display()
            )))
        };
    }

    let cwd = env::current_dir()?;
    for dir in cwd.ancestors().take(MAX_SEARCH_DEPTH) {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    Err(ConfigError::FileNotFound(format!(
        "no {CONFIG_FILE_NAME} in {} or its parents; set FIBREMAC_CONFIG_PATH to point at one",
        cwd.display()
    )))
}

/// Load configuration from TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, searches for one.
///
/// # Errors
///
/// Returns an error if the config file is not found, contains invalid TOML,
/// or fails validation.
pub fn load_config(config_path: Option<&Path>) -> ConfigResult<FibremacConfig> {
    let config_file = if let Some(path) = config_path {
        path.to_path_buf()
    } else {
        find_config_file()?
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: FibremacConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config)?;
    crate::validation::validate_config(&config)?;

    Ok(config)
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `FIBREMAC_THRESHOLD` -> `engine.threshold`
/// - `FIBREMAC_OVERFLOW_POLICY` -> `engine.overflow_policy` ("stall" | "drop")
/// - `FIBREMAC_STALL_WINDOW_TICKS` -> `engine.stall_window_ticks`
/// - `FIBREMAC_MEMORY_LATENCY_TICKS` -> `memory.latency_ticks`
pub fn apply_environment_overrides(config: &mut FibremacConfig) -> ConfigResult<()> {
    if let Ok(value) = env::var("FIBREMAC_THRESHOLD") {
        config.engine.threshold = value.parse().map_err(|_| {
            ConfigError::InvalidValue(format!("FIBREMAC_THRESHOLD: {value}"))
        })?;
    }

    if let Ok(value) = env::var("FIBREMAC_OVERFLOW_POLICY") {
        config.engine.overflow_policy = match value.to_lowercase().as_str() {
            "stall" => OverflowPolicy::Stall,
            "drop" => OverflowPolicy::Drop,
            _ => {
                return Err(ConfigError::InvalidValue(format!(
                    "FIBREMAC_OVERFLOW_POLICY must be 'stall' or 'drop', got: {value}"
                )))
            }
        };
    }

    if let Ok(value) = env::var("FIBREMAC_STALL_WINDOW_TICKS") {
        config.engine.stall_window_ticks = value.parse().map_err(|_| {
            ConfigError::InvalidValue(format!("FIBREMAC_STALL_WINDOW_TICKS: {value}"))
        })?;
    }

    if let Ok(value) = env::var("FIBREMAC_MEMORY_LATENCY_TICKS") {
        config.memory.latency_ticks = value.parse().map_err(|_| {
            ConfigError::InvalidValue(format!("FIBREMAC_MEMORY_LATENCY_TICKS: {value}"))
        })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_config_from_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [engine]
            threshold = 7
            overflow_policy = "drop"

            [memory]
            latency_ticks = 5
            "#
        )
        .unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.engine.threshold, 7);
        assert_eq!(config.engine.overflow_policy, OverflowPolicy::Drop);
        assert_eq!(config.memory.latency_ticks, 5);
    }

    #[test]
    fn test_load_config_rejects_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "engine = not-a-table").unwrap();
        assert!(matches!(
            load_config(Some(file.path())),
            Err(ConfigError::ParseError(_))
        ));
    }
}
