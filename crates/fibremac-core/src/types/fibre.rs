// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! Fibre structures: sparsity masks, weight tables, matched elements
//!
//! A *fibre* is a sparse bit-vector over a fixed 128-wide index range,
//! optionally paired with a dense weight table for its nonzero entries.

use super::error::{FibreError, Result};

/// Width of the fibre index space (bits per sparsity mask)
pub const FIBRE_WIDTH: usize = 128;

/// Number of timesteps per correction cycle / spike train
pub const TIMESTEPS: usize = 8;

/// Number of chunks the laggy-path rank counter partitions a mask into
pub const RANK_CHUNKS: usize = 16;

/// Width of each rank-counter chunk (FIBRE_WIDTH / RANK_CHUNKS)
pub const RANK_CHUNK_WIDTH: usize = FIBRE_WIDTH / RANK_CHUNKS;

/// Capacity of the decoupling match queue between fast and laggy paths
pub const MATCH_QUEUE_CAPACITY: usize = 8;

/// Fixed-width sparsity mask: bit *i* set means index *i* is structurally nonzero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SparsityMask(pub u128);

impl SparsityMask {
    /// Empty mask (no nonzero positions)
    pub const EMPTY: SparsityMask = SparsityMask(0);

    /// Create a mask from raw bits
    #[inline]
    pub const fn from_bits(bits: u128) -> Self {
        Self(bits)
    }

    /// Raw bits of the mask
    #[inline]
    pub const fn bits(&self) -> u128 {
        self.0
    }

    /// Number of nonzero positions
    #[inline]
    pub const fn popcount(&self) -> u32 {
        self.0.count_ones()
    }

    /// True if no position is set
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// True if bit `position` is set
    #[inline]
    pub fn test(&self, position: u8) -> bool {
        debug_assert!((position as usize) < FIBRE_WIDTH);
        self.0 & (1u128 << position) != 0
    }

    /// Lowest set-bit position, if any (the priority encoder primitive)
    #[inline]
    pub fn lowest_set(&self) -> Option<u8> {
        if self.0 == 0 {
            None
        } else {
            Some(self.0.trailing_zeros() as u8)
        }
    }

    /// Clear bit `position`
    #[inline]
    pub fn clear(&mut self, position: u8) {
        debug_assert!((position as usize) < FIBRE_WIDTH);
        self.0 &= !(1u128 << position);
    }

    /// Bitwise AND with another mask — the set of matched positions
    #[inline]
    pub fn intersect(&self, other: &SparsityMask) -> SparsityMask {
        SparsityMask(self.0 & other.0)
    }

    /// Bits at indices strictly below `position`
    #[inline]
    pub fn below(&self, position: u8) -> SparsityMask {
        debug_assert!((position as usize) < FIBRE_WIDTH);
        SparsityMask(self.0 & ((1u128 << position) - 1))
    }
}

/// Dense ordered weight table, one entry per nonzero of a mask, indexed by rank
///
/// Immutable for the duration of one operation. The table is always
/// FIBRE_WIDTH entries long (the hardware flattens it to 128 × weight-width);
/// only the first popcount(B) entries are meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightTable([u8; FIBRE_WIDTH]);

impl WeightTable {
    /// Create a table from a full 128-entry array
    pub const fn new(weights: [u8; FIBRE_WIDTH]) -> Self {
        Self(weights)
    }

    /// Create a table from a slice; entries beyond the slice are zero
    ///
    /// # Errors
    /// Returns `WeightTableSize` if the slice is longer than FIBRE_WIDTH.
    pub fn from_slice(weights: &[u8]) -> Result<Self> {
        if weights.len() > FIBRE_WIDTH {
            return Err(FibreError::WeightTableSize {
                expected: FIBRE_WIDTH,
                actual: weights.len(),
            });
        }
        let mut table = [0u8; FIBRE_WIDTH];
        table[..weights.len()].copy_from_slice(weights);
        Ok(Self(table))
    }

    /// Weight at `rank` (count of set bits in B strictly below the position)
    #[inline]
    pub fn get(&self, rank: u8) -> u8 {
        self.0[rank as usize]
    }
}

impl Default for WeightTable {
    fn default() -> Self {
        Self([0u8; FIBRE_WIDTH])
    }
}

/// One matched position with its weight, as emitted by the fast path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchedElement {
    /// Index into the 128-wide fibre space
    pub position: u8,
    /// Weight looked up from the weight table at B's rank for this position
    pub weight: u8,
}

/// Per-position timestep-activity bitmap fetched from activity memory
///
/// Bit *t* set means the position is active at timestep *t*.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActivityPattern(pub u8);

impl ActivityPattern {
    /// Pattern with every timestep active (no correction required)
    pub const ALL_ACTIVE: ActivityPattern = ActivityPattern(0xFF);

    /// True if the position is active at timestep `t`
    #[inline]
    pub fn is_active(&self, t: usize) -> bool {
        debug_assert!(t < TIMESTEPS);
        self.0 & (1 << t) != 0
    }

    /// True if every timestep is active
    #[inline]
    pub const fn is_all_active(&self) -> bool {
        self.0 == 0xFF
    }
}
