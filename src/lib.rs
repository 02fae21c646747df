// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # FIBREMAC - Sparse-Fibre Matched Multiply-Accumulate Engine
//!
//! A cycle-accurate model of a pipelined sparse-vector matched
//! multiply-accumulate engine feeding a spiking integrate-and-fire neuron.
//! For two index-aligned sparse bit-vectors ("fibres") of a tensor
//! dimension, the engine computes the per-timestep weighted contribution of
//! their common nonzero positions and converts the per-timestep partial
//! sums into a binary spike train.
//!
//! ## Quick Start
//!
//! ```rust
//! use fibremac::prelude::*;
//!
//! // Single matched position: A = B = bit 0, weight 4, always active.
//! let mut weights = [0u8; FIBRE_WIDTH];
//! weights[0] = 4;
//! let op = Operation {
//!     mask_a: SparsityMask::from_bits(0x1),
//!     mask_b: SparsityMask::from_bits(0x1),
//!     weights: WeightTable::new(weights),
//! };
//!
//! let memory = ModelActivityMemory::uniform(0xFF, 2);
//! let mut engine = Engine::with_model_memory(memory, EngineParams::default());
//! engine.accept(op)?;
//! let report = engine.run_to_completion()?;
//! assert_eq!(report.accumulator, 4);
//! # Ok::<(), fibremac::engine::EngineError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Foundation: fibremac-core                              │
//! │  (SparsityMask, WeightTable, rank algorithms, RIF)      │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Pipeline: fibremac-engine                              │
//! │  (extractor, match queue, rank counter, correction,     │
//! │   neuron runner, engine harness)                        │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Infrastructure: fibremac-config                        │
//! │  (TOML configuration + overrides + validation)          │
//! └─────────────────────────────────────────────────────────┘
//! ```

/// Core fibre types, rank algorithms, and the neuron model
pub use fibremac_core as core;

/// The cycle-accurate pipeline and engine harness
pub use fibremac_engine as engine;

/// Configuration loading
pub use fibremac_config as config;

use fibremac_engine::{Engine, EngineParams, ModelActivityMemory, OverflowPolicy};

/// Build engine parameters from a loaded configuration
pub fn engine_params_from_config(config: &fibremac_config::FibremacConfig) -> EngineParams {
    EngineParams {
        threshold: config.engine.threshold,
        overflow_policy: match config.engine.overflow_policy {
            fibremac_config::OverflowPolicy::Stall => OverflowPolicy::Stall,
            fibremac_config::OverflowPolicy::Drop => OverflowPolicy::Drop,
        },
        stall_window_ticks: config.engine.stall_window_ticks,
    }
}

/// Build an engine over the software memory model from a loaded configuration
pub fn engine_from_config(
    config: &fibremac_config::FibremacConfig,
    patterns: Vec<u8>,
) -> Engine<ModelActivityMemory> {
    let memory = ModelActivityMemory::new(patterns, config.memory.latency_ticks);
    Engine::with_model_memory(memory, engine_params_from_config(config))
}

/// Convenience re-exports for typical use
pub mod prelude {
    pub use fibremac_config::{load_config, FibremacConfig};
    pub use fibremac_core::{
        ActivityPattern, MatchedElement, RifModel, RifParameters, SparsityMask, WeightTable,
        FIBRE_WIDTH, MATCH_QUEUE_CAPACITY, TIMESTEPS,
    };
    pub use fibremac_engine::{
        ActivityMemory, Engine, EngineParams, EngineReport, ModelActivityMemory, Operation,
        OverflowPolicy,
    };

    pub use crate::{engine_from_config, engine_params_from_config};
}
