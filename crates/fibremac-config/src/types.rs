// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines the configuration structs that map to sections in
//! `fibremac_configuration.toml`.

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct FibremacConfig {
    pub engine: EngineConfig,
    pub memory: MemoryConfig,
}

/// Behavior of the extractor when the decoupling match queue is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Hold the extractor in PrefixSum until the queue can accept (no loss)
    Stall,
    /// Refuse the write and lose the match, counting and tracing the drop
    Drop,
}

/// Pipeline engine configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Integrate-and-fire threshold; a spike requires potential > threshold
    pub threshold: u16,

    /// What the extractor does when the match queue is full
    pub overflow_policy: OverflowPolicy,

    /// Ticks without pipeline progress before `run_to_completion` reports a stall
    pub stall_window_ticks: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            threshold: 3,
            overflow_policy: OverflowPolicy::Stall,
            stall_window_ticks: 10_000,
        }
    }
}

/// Activity-memory model configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Fixed response latency of the modeled activity memory, in ticks
    pub latency_ticks: u8,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self { latency_ticks: 2 }
    }
}
