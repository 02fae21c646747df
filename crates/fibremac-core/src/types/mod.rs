// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Core type definitions for fibre computation

pub mod error;
pub mod fibre;

pub use error::{Error, FibreError, Result};
pub use fibre::{
    ActivityPattern, MatchedElement, SparsityMask, WeightTable, FIBRE_WIDTH,
    MATCH_QUEUE_CAPACITY, RANK_CHUNKS, RANK_CHUNK_WIDTH, TIMESTEPS,
};
