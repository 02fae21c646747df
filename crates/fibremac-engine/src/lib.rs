// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # FIBREMAC Engine
//!
//! Cycle-accurate model of the matched multiply-accumulate pipeline:
//!
//! ```text
//! intersection mask ──► extractor (fast path) ──┬──► match queue ──► rank counter (laggy path)
//!                                               └──► accumulator              │
//!                                                                             ▼
//!                 spike train ◄── neuron ◄── correction stage ◄──► activity memory
//! ```
//!
//! Every component is a synchronous state machine advanced exactly once per
//! logical clock tick. There is no thread-level concurrency: the stages are
//! coupled only through the decoupling match queue and single-tick
//! valid/ready pulses, and ordering is defined by tick order. The [`Engine`]
//! harness owns the components and drives one tick of each per call.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod correction;
pub mod engine;
pub mod error;
pub mod extractor;
pub mod memory;
pub mod neuron;
pub mod queue;
pub mod rank_counter;

pub use correction::{CorrectionOutput, CorrectionStage, CorrectionState, MemoryRequest};
pub use engine::{Engine, EngineParams, EngineReport, Operation, OverflowPolicy};
pub use error::{EngineError, Result};
pub use extractor::{ExtractorOutput, ExtractorState, MatchExtractor};
pub use memory::{ActivityMemory, ModelActivityMemory};
pub use neuron::{NeuronOutput, NeuronRunner, NeuronState};
pub use queue::{BoundedQueue, MatchQueue};
pub use rank_counter::{RankCounter, RankCounterState, RankResult};
