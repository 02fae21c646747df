// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Chunked Rank Counter (laggy path)
//!
//! For a popped pending match, computes the number of set bits in mask A at
//! or before the matched position: mask A is partitioned into 16 contiguous
//! 8-bit chunks, each chunk contributes a partial count (the chunk holding
//! the position counts only bits at or before it, later chunks contribute
//! zero), and the partial counts are summed by a pairwise binary tree,
//! halving the live element count each cycle (16→8→4→2→1).
//!
//! ## Fixed 8-cycle schedule
//!
//! The reduction is driven by a wall-clock counter 0..7 rather than
//! data-dependent completion: partial counts latch on the dispatch cycle,
//! tree levels run on cycles 1–4, and cycles 5–7 are idle wait states. The
//! result-valid pulse fires when the counter reaches 7. This fixed-length
//! schedule is what throttles the laggy path to one result per 8 cycles
//! regardless of reduction complexity.

use fibremac_core::{chunk_counts_through, reduce_pair_level, MatchedElement, SparsityMask, RANK_CHUNKS};
use tracing::trace;

/// Rank counter state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankCounterState {
    #[default]
    Idle,
    Reducing,
}

/// Completed rank computation with the carried-through match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankResult {
    pub position: u8,
    pub weight: u8,
    /// Count of set bits in mask A at positions [0, position] inclusive
    pub rank_offset: u8,
}

/// The laggy-path chunked rank counter
#[derive(Debug, Clone, Default)]
pub struct RankCounter {
    state: RankCounterState,
    /// Partial-count vector being reduced in place
    values: [u8; RANK_CHUNKS],
    live: usize,
    /// Wall-clock schedule counter, 0..7
    cycle: u8,
    position: u8,
    weight: u8,
}

impl RankCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ready for a new calculation (the 8-cycle schedule has run out)
    pub fn ready(&self) -> bool {
        self.state == RankCounterState::Idle
    }

    pub fn state(&self) -> RankCounterState {
        self.state
    }

    /// Begin a rank computation for one pending match (dispatch cycle)
    ///
    /// Latches the per-chunk partial counts of `mask_a` through the matched
    /// position and carries the position and weight to the output. Must only
    /// be called while `ready()`.
    pub fn dispatch(&mut self, pending: MatchedElement, mask_a: SparsityMask) {
        debug_assert!(self.ready());
        self.values = chunk_counts_through(mask_a, pending.position);
        self.live = RANK_CHUNKS;
        self.cycle = 0;
        self.position = pending.position;
        self.weight = pending.weight;
        self.state = RankCounterState::Reducing;
        trace!(position = pending.position, "rank counter: dispatched");
    }

    /// Force the state machine to Idle and zero its registers (slow reset line)
    ///
    /// Abandons any in-flight rank computation; matches already sitting in
    /// the queue are untouched.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Advance one clock tick; the result pulses for exactly one tick
    pub fn tick(&mut self) -> Option<RankResult> {
        if self.state != RankCounterState::Reducing {
            return None;
        }

        self.cycle += 1;
        if (1..=4).contains(&self.cycle) {
            self.live = reduce_pair_level(&mut self.values, self.live);
        }
        // Cycles 5 and 6 are idle wait states.
        if self.cycle == 7 {
            // Result pulses here; the stage frees up one tick later so
            // dispatches stay exactly 8 cycles apart.
            let result = RankResult {
                position: self.position,
                weight: self.weight,
                rank_offset: self.values[0],
            };
            trace!(
                position = result.position,
                rank_offset = result.rank_offset,
                "rank counter: result valid"
            );
            return Some(result);
        }
        if self.cycle >= 8 {
            self.state = RankCounterState::Idle;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fibremac_core::rank_through;

    fn run_to_result(counter: &mut RankCounter) -> (RankResult, u32) {
        let mut ticks = 0;
        loop {
            ticks += 1;
            if let Some(result) = counter.tick() {
                return (result, ticks);
            }
            assert!(ticks < 100, "rank counter never completed");
        }
    }

    #[test]
    fn test_fixed_eight_cycle_latency() {
        let mut counter = RankCounter::new();
        let mask_a = SparsityMask::from_bits(0b1);
        counter.dispatch(
            MatchedElement {
                position: 0,
                weight: 4,
            },
            mask_a,
        );
        // Dispatch is cycle 0; the result pulses 7 ticks later.
        let (result, ticks) = run_to_result(&mut counter);
        assert_eq!(ticks, 7);
        assert_eq!(result.rank_offset, 1);
        // Still occupied on the result tick; free on cycle 8.
        assert!(!counter.ready());
        counter.tick();
        assert!(counter.ready());
    }

    #[test]
    fn test_latency_is_data_independent() {
        // A dense mask and a single-bit mask take identical schedules.
        for bits in [u128::MAX, 1u128 << 127] {
            let mut counter = RankCounter::new();
            counter.dispatch(
                MatchedElement {
                    position: 127,
                    weight: 0,
                },
                SparsityMask::from_bits(bits),
            );
            let (_, ticks) = run_to_result(&mut counter);
            assert_eq!(ticks, 7);
        }
    }

    #[test]
    fn test_rank_offset_matches_reference() {
        let mask_a = SparsityMask::from_bits(0xDEAD_BEEF_0123_4567_89AB_CDEF);
        for position in [0u8, 3, 31, 64, 95, 127] {
            let mut counter = RankCounter::new();
            counter.dispatch(
                MatchedElement {
                    position,
                    weight: 1,
                },
                mask_a,
            );
            let (result, _) = run_to_result(&mut counter);
            assert_eq!(result.rank_offset, rank_through(mask_a, position));
            assert_eq!(result.position, position);
            assert_eq!(result.weight, 1);
        }
    }

    #[test]
    fn test_reset_abandons_in_flight_calculation() {
        let mut counter = RankCounter::new();
        counter.dispatch(
            MatchedElement {
                position: 5,
                weight: 9,
            },
            SparsityMask::from_bits(0xFF),
        );
        counter.tick();
        counter.reset();
        assert!(counter.ready());
        assert_eq!(counter.tick(), None);
    }
}
