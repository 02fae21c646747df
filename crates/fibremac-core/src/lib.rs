// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # FIBREMAC Core (Platform-Agnostic)
//!
//! ALL fibre computation in one place:
//! - **Types**: Core type definitions (SparsityMask, WeightTable, MatchedElement, etc.)
//! - **Rank**: Prefix-sum rank algorithms (fast-path scan, chunked laggy-path count)
//! - **Models**: The reset-on-fire integrate-and-fire neuron model
//!
//! The pipeline state machines that drive these algorithms live in
//! `fibremac-engine`; this crate holds only the pure, cycle-free parts.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Core type definitions
pub mod types;

// Rank / prefix-sum algorithms
pub mod rank;

// Neuron models
pub mod models;

// Re-export types
pub use types::{
    ActivityPattern,
    Error,
    FibreError,
    MatchedElement,
    Result,
    SparsityMask,
    WeightTable,
    FIBRE_WIDTH,
    MATCH_QUEUE_CAPACITY,
    RANK_CHUNKS,
    RANK_CHUNK_WIDTH,
    TIMESTEPS,
};

// Re-export rank algorithms
pub use rank::{chunk_counts_through, rank_below, rank_through, reduce_pair_level};

// Re-export neuron models
pub use models::{ModelParameters, RifModel, RifParameters};
