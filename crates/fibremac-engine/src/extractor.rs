// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Matched-Position Extractor (fast path)
//!
//! Drains the intersection mask lowest-position-first, one matched element
//! every 3 cycles:
//!
//! ```text
//! Idle ──accept──► PriorityEncode ──► PrefixSum ──► ClearBit ─┐
//!   ▲                    ▲  │ mask empty: done                │
//!   └────────────────────┼──┘                                 │
//!                        └────────────────────────────────────┘
//! ```
//!
//! - **PriorityEncode**: lowest set bit of the latched mask (no ties — one
//!   lowest position exists), or `done` when the mask is exhausted.
//! - **PrefixSum**: rank of the position within mask B via the log-stage
//!   inclusive scan, weight lookup, one-cycle match-valid pulse.
//! - **ClearBit**: clears the found bit and loops.
//!
//! The number of emissions per operation equals the popcount of the
//! intersection mask, and positions are strictly increasing.

use fibremac_core::{rank_below, MatchedElement, SparsityMask, WeightTable};
use tracing::trace;

/// Behavior when the decoupling match queue cannot accept a produced match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Hold in PrefixSum until the queue can accept; no match is lost
    #[default]
    Stall,
    /// Emit anyway; the refused write loses the match (counted by the engine)
    Drop,
}

/// Extractor state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractorState {
    #[default]
    Idle,
    PriorityEncode,
    PrefixSum,
    ClearBit,
}

/// Single-tick outputs of the extractor
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractorOutput {
    /// Match-valid pulse: one element, asserted for exactly one tick
    pub matched: Option<MatchedElement>,
    /// Done pulse: the latched mask is exhausted
    pub done: bool,
}

/// The fast-path matched-position extractor
#[derive(Debug, Clone, Default)]
pub struct MatchExtractor {
    state: ExtractorState,
    /// Latched intersection mask, drained bit by bit
    mask: SparsityMask,
    /// Latched mask B (rank source for weight lookup)
    mask_b: SparsityMask,
    weights: WeightTable,
    /// Position found by the last PriorityEncode
    current_position: u8,
    policy: OverflowPolicy,
}

impl MatchExtractor {
    pub fn new(policy: OverflowPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Ready signal for the operation-intake handshake
    pub fn ready(&self) -> bool {
        self.state == ExtractorState::Idle
    }

    pub fn state(&self) -> ExtractorState {
        self.state
    }

    /// Accept handshake: latch the intersection mask, mask B, and weights
    ///
    /// Returns `false` (input not consumed) unless idle.
    pub fn accept(
        &mut self,
        intersection: SparsityMask,
        mask_b: SparsityMask,
        weights: WeightTable,
    ) -> bool {
        if !self.ready() {
            return false;
        }
        self.mask = intersection;
        self.mask_b = mask_b;
        self.weights = weights;
        self.state = ExtractorState::PriorityEncode;
        trace!(
            mask = %format_args!("{:#x}", intersection.bits()),
            popcount = intersection.popcount(),
            "extractor: operation accepted"
        );
        true
    }

    /// Force the state machine to Idle and zero its registers (fast reset line)
    ///
    /// Does not flush the match queue or any other component's state; a
    /// partial reset can abandon queued matches (see the engine's reset
    /// composition notes).
    pub fn reset(&mut self) {
        let policy = self.policy;
        *self = Self::new(policy);
    }

    /// Advance one clock tick
    ///
    /// `queue_can_accept` is the AND of both queue lanes' non-full flags,
    /// sampled by the engine at the start of the tick. Under the `Stall`
    /// policy it gates the match-valid pulse.
    pub fn tick(&mut self, queue_can_accept: bool) -> ExtractorOutput {
        let mut output = ExtractorOutput::default();

        match self.state {
            ExtractorState::Idle => {}

            ExtractorState::PriorityEncode => match self.mask.lowest_set() {
                Some(position) => {
                    self.current_position = position;
                    self.state = ExtractorState::PrefixSum;
                }
                None => {
                    self.state = ExtractorState::Idle;
                    output.done = true;
                    trace!("extractor: mask exhausted, done");
                }
            },

            ExtractorState::PrefixSum => {
                if self.policy == OverflowPolicy::Stall && !queue_can_accept {
                    // Hold the match until the queue drains. Match-valid
                    // stays deasserted so nothing is produced or lost.
                } else {
                    let rank = rank_below(self.mask_b, self.current_position);
                    let element = MatchedElement {
                        position: self.current_position,
                        weight: self.weights.get(rank),
                    };
                    trace!(
                        position = element.position,
                        weight = element.weight,
                        rank,
                        "extractor: match emitted"
                    );
                    output.matched = Some(element);
                    self.state = ExtractorState::ClearBit;
                }
            }

            ExtractorState::ClearBit => {
                self.mask.clear(self.current_position);
                self.state = ExtractorState::PriorityEncode;
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fibremac_core::FIBRE_WIDTH;

    fn identity_weights() -> WeightTable {
        // weight[rank] = rank + 1, so emitted weights identify their rank
        let mut table = [0u8; FIBRE_WIDTH];
        for (rank, entry) in table.iter_mut().enumerate() {
            *entry = rank as u8 + 1;
        }
        WeightTable::new(table)
    }

    fn drain(extractor: &mut MatchExtractor) -> (Vec<MatchedElement>, u32) {
        let mut matches = Vec::new();
        let mut ticks = 0;
        loop {
            let out = extractor.tick(true);
            ticks += 1;
            if let Some(element) = out.matched {
                matches.push(element);
            }
            if out.done {
                return (matches, ticks);
            }
            assert!(ticks < 1000, "extractor never finished");
        }
    }

    #[test]
    fn test_emission_count_equals_popcount_and_positions_increase() {
        let intersection = SparsityMask::from_bits(0x8000_0000_0000_0001_0040_2001);
        let mask_b = SparsityMask::from_bits(u128::MAX);
        let mut extractor = MatchExtractor::new(OverflowPolicy::Stall);
        assert!(extractor.accept(intersection, mask_b, identity_weights()));

        let (matches, _) = drain(&mut extractor);
        assert_eq!(matches.len(), intersection.popcount() as usize);
        for pair in matches.windows(2) {
            assert!(pair[0].position < pair[1].position);
        }
        assert!(extractor.ready());
    }

    #[test]
    fn test_weight_lookup_uses_rank_within_b() {
        // B has bits 4, 9, 20 set; intersection selects 9 and 20.
        let mask_b = SparsityMask::from_bits((1 << 4) | (1 << 9) | (1 << 20));
        let intersection = SparsityMask::from_bits((1 << 9) | (1 << 20));
        let mut extractor = MatchExtractor::new(OverflowPolicy::Stall);
        extractor.accept(intersection, mask_b, identity_weights());

        let (matches, _) = drain(&mut extractor);
        // Position 9 has rank 1 in B (bit 4 below it); position 20 has rank 2.
        assert_eq!(matches[0].position, 9);
        assert_eq!(matches[0].weight, 2);
        assert_eq!(matches[1].position, 20);
        assert_eq!(matches[1].weight, 3);
    }

    #[test]
    fn test_all_zero_mask_done_next_cycle() {
        let mut extractor = MatchExtractor::new(OverflowPolicy::Stall);
        extractor.accept(SparsityMask::EMPTY, SparsityMask::EMPTY, WeightTable::default());

        let out = extractor.tick(true);
        assert!(out.done);
        assert!(out.matched.is_none());
        assert!(extractor.ready());
    }

    #[test]
    fn test_three_cycles_per_element() {
        let intersection = SparsityMask::from_bits(0b111);
        let mut extractor = MatchExtractor::new(OverflowPolicy::Stall);
        extractor.accept(intersection, SparsityMask::from_bits(0b111), identity_weights());

        // 3 elements × 3 cycles each + 1 final PriorityEncode for done.
        let (matches, ticks) = drain(&mut extractor);
        assert_eq!(matches.len(), 3);
        assert_eq!(ticks, 10);
    }

    #[test]
    fn test_stall_policy_holds_in_prefix_sum() {
        let intersection = SparsityMask::from_bits(0b1);
        let mut extractor = MatchExtractor::new(OverflowPolicy::Stall);
        extractor.accept(intersection, SparsityMask::from_bits(0b1), identity_weights());

        assert!(extractor.tick(false).matched.is_none()); // PriorityEncode
        // Queue full: held in PrefixSum, no emission, nothing lost.
        for _ in 0..5 {
            assert!(extractor.tick(false).matched.is_none());
            assert_eq!(extractor.state(), ExtractorState::PrefixSum);
        }
        // Queue drains: the held match is emitted.
        assert!(extractor.tick(true).matched.is_some());
    }

    #[test]
    fn test_drop_policy_emits_regardless() {
        let intersection = SparsityMask::from_bits(0b1);
        let mut extractor = MatchExtractor::new(OverflowPolicy::Drop);
        extractor.accept(intersection, SparsityMask::from_bits(0b1), identity_weights());

        extractor.tick(false); // PriorityEncode
        assert!(extractor.tick(false).matched.is_some()); // Emitted; the engine counts the loss
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let mut extractor = MatchExtractor::new(OverflowPolicy::Stall);
        extractor.accept(
            SparsityMask::from_bits(0xFF),
            SparsityMask::from_bits(0xFF),
            identity_weights(),
        );
        extractor.tick(true);
        extractor.reset();
        assert!(extractor.ready());
    }
}
