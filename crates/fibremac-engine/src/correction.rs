// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Accumulation/Correction Stage
//!
//! Two independent always-running behaviors share this stage:
//!
//! 1. **Accumulation**: every tick the extractor pulses match-valid, the
//!    matched weight is added into the pseudo-accumulator. This runs ahead
//!    of the correction pipeline: at any instant the accumulator reflects
//!    the sum of *all* matches produced so far, not just the one currently
//!    being corrected.
//! 2. **Correction FSM**: consumes one rank-counter result at a time,
//!    fetches the position's activity pattern from external memory, and
//!    derives eight per-timestep sums from the accumulator.
//!
//! ## Ordering hazard (mandatory behavior)
//!
//! Because accumulation continues while a correction is in flight, the
//! subtraction in `Correcting` is evaluated against whatever accumulator
//! value holds on that later tick — not the value at the time the weight
//! was matched. This is a real property of the pipeline, reproduced
//! exactly; the snapshot is taken when `Correcting` executes.

use fibremac_core::{ActivityPattern, TIMESTEPS};
use tracing::trace;

use crate::rank_counter::RankResult;

/// Correction state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorrectionState {
    #[default]
    Idle,
    WaitingForQueue,
    WaitingForMemory,
    Correcting,
    Complete,
}

/// Activity-memory read request: address plus an implied read-enable pulse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRequest {
    /// Rank offset of the position being corrected
    pub address: u8,
}

/// Single-tick outputs of the correction stage
#[derive(Debug, Clone, Copy, Default)]
pub struct CorrectionOutput {
    /// Read-request pulse toward the activity memory
    pub request: Option<MemoryRequest>,
    /// Result-valid pulse: the eight per-timestep sums are final
    pub result_valid: bool,
}

/// The accumulation/correction stage
#[derive(Debug, Clone, Default)]
pub struct CorrectionStage {
    state: CorrectionState,
    /// Running sum of every matched weight since the last accum reset
    accumulator: u16,
    /// Weight latched for the position currently being corrected
    weight: u8,
    rank_offset: u8,
    pattern: ActivityPattern,
    results: [u16; TIMESTEPS],
}

impl CorrectionStage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CorrectionState {
        self.state
    }

    /// Current pseudo-accumulator value
    pub fn accumulator(&self) -> u16 {
        self.accumulator
    }

    /// The eight corrected per-timestep sums
    ///
    /// Only valid once the result-valid pulse has fired for the position
    /// whose processing produced them.
    pub fn results(&self) -> [u16; TIMESTEPS] {
        self.results
    }

    /// Accumulation behavior: add one matched weight
    ///
    /// The engine calls this on every extractor match-valid pulse, before
    /// ticking the correction FSM, so a correction executing on the same
    /// tick observes the updated sum.
    pub fn accumulate(&mut self, weight: u8) {
        self.accumulator = self.accumulator.saturating_add(weight as u16);
    }

    /// Ready-for-slow condition gating reads out of the decoupling queue
    ///
    /// True in Idle/Complete; a dispatch admitted while this holds is
    /// guaranteed a free FSM by the time its rank result arrives.
    pub fn ready_for_slow(&self) -> bool {
        matches!(self.state, CorrectionState::Idle | CorrectionState::Complete)
    }

    /// True only in Idle
    ///
    /// Complete still holds a result whose valid pulse has not fired yet;
    /// drain checks must use this, not [`ready_for_slow`](Self::ready_for_slow).
    pub fn is_idle(&self) -> bool {
        self.state == CorrectionState::Idle
    }

    /// Force the FSM to Idle and zero all registers, accumulator included
    /// (accum reset line)
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Advance one clock tick
    ///
    /// `rank_result` is the rank counter's valid pulse; `mem_response` is
    /// the activity memory's valid pulse. Both are single-tick signals.
    pub fn tick(
        &mut self,
        rank_result: Option<RankResult>,
        mem_response: Option<ActivityPattern>,
    ) -> CorrectionOutput {
        let mut output = CorrectionOutput::default();

        match self.state {
            CorrectionState::Idle => {
                if let Some(result) = rank_result {
                    self.weight = result.weight;
                    self.rank_offset = result.rank_offset;
                    self.state = CorrectionState::WaitingForQueue;
                }
            }

            CorrectionState::WaitingForQueue => {
                // Weight and rank offset are latched; issue the pattern read.
                output.request = Some(MemoryRequest {
                    address: self.rank_offset,
                });
                self.state = CorrectionState::WaitingForMemory;
                trace!(address = self.rank_offset, "correction: memory read issued");
            }

            CorrectionState::WaitingForMemory => {
                // No timeout: a stalled memory holds the stage here forever.
                if let Some(pattern) = mem_response {
                    self.pattern = pattern;
                    self.state = CorrectionState::Correcting;
                }
            }

            CorrectionState::Correcting => {
                // Snapshot taken NOW, not at match time.
                let snapshot = self.accumulator;
                if self.pattern.is_all_active() {
                    self.results = [snapshot; TIMESTEPS];
                } else {
                    for (t, result) in self.results.iter_mut().enumerate() {
                        *result = if self.pattern.is_active(t) {
                            snapshot
                        } else {
                            snapshot - self.weight as u16
                        };
                    }
                }
                self.state = CorrectionState::Complete;
                trace!(
                    snapshot,
                    pattern = self.pattern.0,
                    weight = self.weight,
                    "correction: sums derived"
                );
            }

            CorrectionState::Complete => {
                output.result_valid = true;
                self.state = CorrectionState::Idle;
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rank_result(weight: u8, rank_offset: u8) -> Option<RankResult> {
        Some(RankResult {
            position: 0,
            weight,
            rank_offset,
        })
    }

    /// Walk the FSM through one full correction (latch to result-valid)
    fn run_correction(
        stage: &mut CorrectionStage,
        weight: u8,
        rank_offset: u8,
        pattern: ActivityPattern,
    ) {
        stage.tick(rank_result(weight, rank_offset), None); // Idle -> WaitingForQueue
        let out = stage.tick(None, None); // -> WaitingForMemory, request pulses
        assert_eq!(out.request, Some(MemoryRequest { address: rank_offset }));
        stage.tick(None, Some(pattern)); // -> Correcting
        stage.tick(None, None); // -> Complete
        let out = stage.tick(None, None); // result-valid pulse, -> Idle
        assert!(out.result_valid);
    }

    #[test]
    fn test_accumulator_sums_all_matches() {
        let mut stage = CorrectionStage::new();
        for weight in [4u8, 10, 255] {
            stage.accumulate(weight);
        }
        assert_eq!(stage.accumulator(), 269);
    }

    #[test]
    fn test_all_ones_pattern_applies_no_correction() {
        let mut stage = CorrectionStage::new();
        stage.accumulate(4);
        run_correction(&mut stage, 4, 1, ActivityPattern::ALL_ACTIVE);
        assert_eq!(stage.results(), [4u16; TIMESTEPS]);
    }

    #[test]
    fn test_clear_bits_subtract_the_stored_weight() {
        let mut stage = CorrectionStage::new();
        stage.accumulate(10);
        stage.accumulate(7);
        // Pattern 0b0000_0101: timesteps 0 and 2 active.
        run_correction(&mut stage, 7, 2, ActivityPattern(0b0000_0101));
        let results = stage.results();
        assert_eq!(results[0], 17);
        assert_eq!(results[1], 10);
        assert_eq!(results[2], 17);
        for &r in &results[3..] {
            assert_eq!(r, 10);
        }
    }

    #[test]
    fn test_snapshot_reflects_correction_time_not_match_time() {
        let mut stage = CorrectionStage::new();
        stage.accumulate(4); // The match being corrected

        stage.tick(rank_result(4, 1), None); // latch
        stage.tick(None, None); // request issued

        // A later match lands while this correction is in flight.
        stage.accumulate(9);

        stage.tick(None, Some(ActivityPattern(0b1111_1110))); // -> Correcting
        stage.tick(None, None); // Correcting executes with accumulator = 13
        let out = stage.tick(None, None);
        assert!(out.result_valid);

        let results = stage.results();
        assert_eq!(results[0], 13 - 4); // Inactive timestep: later snapshot minus weight
        for &r in &results[1..] {
            assert_eq!(r, 13); // Active timesteps: the later snapshot itself
        }
    }

    #[test]
    fn test_ready_for_slow_only_in_idle_and_complete() {
        let mut stage = CorrectionStage::new();
        assert!(stage.ready_for_slow());
        stage.tick(rank_result(1, 1), None);
        assert!(!stage.ready_for_slow()); // WaitingForQueue
        stage.tick(None, None);
        assert!(!stage.ready_for_slow()); // WaitingForMemory
        stage.tick(None, Some(ActivityPattern::ALL_ACTIVE));
        assert!(!stage.ready_for_slow()); // Correcting
        stage.tick(None, None);
        assert!(stage.ready_for_slow()); // Complete
        // The result pulse has not fired yet in Complete.
        assert!(!stage.is_idle());
        let out = stage.tick(None, None);
        assert!(out.result_valid);
        assert!(stage.is_idle());
    }

    #[test]
    fn test_stalled_memory_blocks_indefinitely() {
        let mut stage = CorrectionStage::new();
        stage.tick(rank_result(1, 1), None);
        stage.tick(None, None);
        for _ in 0..100 {
            let out = stage.tick(None, None);
            assert!(!out.result_valid);
            assert_eq!(stage.state(), CorrectionState::WaitingForMemory);
        }
    }

    #[test]
    fn test_reset_zeroes_accumulator_and_results() {
        let mut stage = CorrectionStage::new();
        stage.accumulate(50);
        run_correction(&mut stage, 50, 1, ActivityPattern::ALL_ACTIVE);
        stage.reset();
        assert_eq!(stage.accumulator(), 0);
        assert_eq!(stage.results(), [0u16; TIMESTEPS]);
        assert_eq!(stage.state(), CorrectionState::Idle);
    }
}
