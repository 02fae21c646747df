// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for fibre operations

/// Error types for fibre operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum FibreError {
    /// A position index fell outside the 128-wide fibre space
    #[error("Invalid fibre position: {0} (fibre width is 128)")]
    InvalidPosition(u16),

    /// A rank exceeded the number of nonzero entries backing a weight table
    #[error("Invalid rank: {0} (weight table holds {1} entries)")]
    InvalidRank(u16, usize),

    /// A weight table was built from a slice of the wrong length
    #[error("Weight table size mismatch: expected {expected}, got {actual}")]
    WeightTableSize { expected: usize, actual: usize },
}

pub type Result<T> = core::result::Result<T, FibreError>;
pub type Error = FibreError;
