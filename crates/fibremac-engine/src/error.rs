// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for engine operations

use fibremac_core::FibreError;

/// Error types for engine operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    /// No pipeline progress within the stall-detection window
    ///
    /// The design has no timeout: a stalled activity memory blocks the
    /// correction stage, and transitively the queue and the extractor,
    /// indefinitely. The harness surfaces that as this error instead of
    /// hanging the caller.
    #[error("Pipeline stalled: no progress for {window} ticks (tick {tick})")]
    Stalled { tick: u64, window: u64 },

    /// An operation was presented while the extractor was not ready
    #[error("Operation rejected: extractor busy draining a pending mask")]
    NotReady,

    /// Error from the core fibre types
    #[error(transparent)]
    Fibre(#[from] FibreError),
}

pub type Result<T> = core::result::Result<T, EngineError>;
