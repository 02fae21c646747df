// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation

use crate::{ConfigError, ConfigResult, FibremacConfig};

/// Validate a loaded configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` describing the first invalid field.
pub fn validate_config(config: &FibremacConfig) -> ConfigResult<()> {
    if config.engine.stall_window_ticks == 0 {
        return Err(ConfigError::ValidationError(
            "engine.stall_window_ticks must be nonzero (stall detection would trip immediately)"
                .to_string(),
        ));
    }

    if config.memory.latency_ticks == 0 {
        return Err(ConfigError::ValidationError(
            "memory.latency_ticks must be at least 1 (responses arrive after the request tick)"
                .to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&FibremacConfig::default()).is_ok());
    }

    #[test]
    fn test_zero_stall_window_rejected() {
        let mut config = FibremacConfig::default();
        config.engine.stall_window_ticks = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_zero_memory_latency_rejected() {
        let mut config = FibremacConfig::default();
        config.memory.latency_ticks = 0;
        assert!(validate_config(&config).is_err());
    }
}
