// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Rank / Prefix-Sum Algorithms
//!
//! The rank of a position within a fibre is the count of set bits at (or
//! strictly below) that position. Ranks index the dense weight table aligned
//! to a fibre's nonzero entries and address the per-position activity memory.
//!
//! Two rank computations exist in the pipeline, and they are deliberately
//! different algorithms:
//!
//! - **Fast path** (`rank_below`): a log₂(128)-stage Hillis–Steele inclusive
//!   scan over single-bit lanes. Combinational in hardware; the extractor
//!   evaluates it in a single PrefixSum cycle.
//! - **Laggy path** (`rank_through`): the mask is partitioned into 16 chunks,
//!   each chunk contributes a partial count, and the partial counts are
//!   reduced by a pairwise binary tree (16→8→4→2→1). The engine schedules
//!   one tree level per cycle over a fixed 8-cycle window.

use crate::types::{SparsityMask, FIBRE_WIDTH, RANK_CHUNKS, RANK_CHUNK_WIDTH};

/// Rank of `position` within `mask`: count of set bits strictly below it
///
/// Position 0 always has rank 0. Implemented as the classic inclusive scan
/// the hardware uses: log₂(width) stages, each adding the lane value at a
/// fixed stride offset.
///
/// # Example
/// ```
/// use fibremac_core::{rank_below, SparsityMask};
///
/// let mask = SparsityMask::from_bits(0b1011);
/// assert_eq!(rank_below(mask, 0), 0);
/// assert_eq!(rank_below(mask, 1), 1);
/// assert_eq!(rank_below(mask, 3), 2);
/// ```
pub fn rank_below(mask: SparsityMask, position: u8) -> u8 {
    debug_assert!((position as usize) < FIBRE_WIDTH);

    // Lane i starts as bit i of the mask.
    let mut lanes = [0u8; FIBRE_WIDTH];
    for (i, lane) in lanes.iter_mut().enumerate() {
        *lane = ((mask.bits() >> i) & 1) as u8;
    }

    // Inclusive scan: after all stages, lanes[i] holds popcount of bits [0, i].
    // Downward iteration keeps the in-place update stage-correct.
    let mut stride = 1;
    while stride < FIBRE_WIDTH {
        for i in (stride..FIBRE_WIDTH).rev() {
            lanes[i] += lanes[i - stride];
        }
        stride <<= 1;
    }

    if position == 0 {
        0
    } else {
        lanes[position as usize - 1]
    }
}

/// Per-chunk partial counts of set bits at or before `position`
///
/// Chunk *c* covers bit indices `[c·8, c·8+7]`:
/// - chunks entirely before (or ending at) the position contribute their
///   full in-range count;
/// - the chunk containing the position counts only bits at or before it;
/// - chunks entirely after the position contribute zero.
pub fn chunk_counts_through(mask: SparsityMask, position: u8) -> [u8; RANK_CHUNKS] {
    debug_assert!((position as usize) < FIBRE_WIDTH);

    let position_chunk = position as usize / RANK_CHUNK_WIDTH;
    let mut counts = [0u8; RANK_CHUNKS];

    for (chunk, count) in counts.iter_mut().enumerate() {
        if chunk > position_chunk {
            break; // Chunks after the position stay zero
        }
        let base = chunk * RANK_CHUNK_WIDTH;
        let chunk_bits = ((mask.bits() >> base) & 0xFF) as u8;
        *count = if chunk < position_chunk {
            chunk_bits.count_ones() as u8
        } else {
            // Chunk containing the position: bits at or before it only
            let in_chunk = position as usize - base;
            let keep = if in_chunk == RANK_CHUNK_WIDTH - 1 {
                0xFF
            } else {
                (1u8 << (in_chunk + 1)) - 1
            };
            (chunk_bits & keep).count_ones() as u8
        };
    }
    counts
}

/// One level of the pairwise binary-tree reduction
///
/// Sums adjacent pairs of the first `live` elements in place and returns the
/// new live count. `live` must be even (the tree starts from 16).
pub fn reduce_pair_level(values: &mut [u8; RANK_CHUNKS], live: usize) -> usize {
    debug_assert!(live >= 2 && live % 2 == 0 && live <= RANK_CHUNKS);
    for i in 0..live / 2 {
        values[i] = values[2 * i] + values[2 * i + 1];
    }
    live / 2
}

/// Rank-through of `position` within `mask`: count of set bits at or before it
///
/// Reference form of the laggy-path computation: chunk partial counts
/// followed by the full 16→8→4→2→1 tree. The engine's rank counter runs the
/// same tree one level per cycle.
pub fn rank_through(mask: SparsityMask, position: u8) -> u8 {
    let mut values = chunk_counts_through(mask, position);
    let mut live = RANK_CHUNKS;
    while live > 1 {
        live = reduce_pair_level(&mut values, live);
    }
    values[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic pseudo-random masks for property checks (xorshift)
    fn test_masks() -> Vec<u128> {
        let mut masks = vec![0u128, u128::MAX, 1, 1u128 << 127];
        let mut state = 0x2545F4914F6CDD1Du64;
        for _ in 0..32 {
            let mut bits = 0u128;
            for _ in 0..2 {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                bits = (bits << 64) | state as u128;
            }
            masks.push(bits);
        }
        masks
    }

    #[test]
    fn test_rank_below_matches_popcount_identity() {
        for bits in test_masks() {
            let mask = SparsityMask::from_bits(bits);
            for position in [0u8, 1, 7, 8, 63, 64, 100, 127] {
                let expected = mask.below(position).popcount() as u8;
                assert_eq!(
                    rank_below(mask, position),
                    expected,
                    "mask {bits:#x} position {position}"
                );
            }
        }
    }

    #[test]
    fn test_rank_through_matches_popcount_identity() {
        for bits in test_masks() {
            let mask = SparsityMask::from_bits(bits);
            for position in [0u8, 1, 7, 8, 63, 64, 100, 127] {
                let below = mask.below(position).popcount() as u8;
                let expected = below + u8::from(mask.test(position));
                assert_eq!(
                    rank_through(mask, position),
                    expected,
                    "mask {bits:#x} position {position}"
                );
            }
        }
    }

    #[test]
    fn test_chunk_counts_boundaries() {
        let mask = SparsityMask::from_bits(u128::MAX);

        // Position at the end of chunk 0: full count for chunk 0, rest zero.
        let counts = chunk_counts_through(mask, 7);
        assert_eq!(counts[0], 8);
        assert!(counts[1..].iter().all(|&c| c == 0));

        // Position at the start of chunk 1: chunk 0 full, chunk 1 one bit.
        let counts = chunk_counts_through(mask, 8);
        assert_eq!(counts[0], 8);
        assert_eq!(counts[1], 1);
        assert!(counts[2..].iter().all(|&c| c == 0));

        // Last position: every chunk full.
        let counts = chunk_counts_through(mask, 127);
        assert!(counts.iter().all(|&c| c == 8));
    }

    #[test]
    fn test_reduce_pair_level_halves() {
        let mut values = [1u8; RANK_CHUNKS];
        let mut live = RANK_CHUNKS;
        live = reduce_pair_level(&mut values, live);
        assert_eq!(live, 8);
        assert!(values[..8].iter().all(|&v| v == 2));
        live = reduce_pair_level(&mut values, live);
        live = reduce_pair_level(&mut values, live);
        live = reduce_pair_level(&mut values, live);
        assert_eq!(live, 1);
        assert_eq!(values[0], 16);
    }

    #[test]
    fn test_rank_below_position_zero_is_zero() {
        for bits in test_masks() {
            assert_eq!(rank_below(SparsityMask::from_bits(bits), 0), 0);
        }
    }
}
