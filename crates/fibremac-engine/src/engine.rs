// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Engine Harness
//!
//! Owns every pipeline component plus the external activity memory and
//! advances each exactly once per [`Engine::tick`], in a fixed order that
//! models registered hardware signals:
//!
//! 1. sample the queue's full flag (registered backpressure),
//! 2. rank counter reduction tick,
//! 3. laggy-path dispatch (queue pop, uses previous-tick queue state),
//! 4. extractor tick, accumulation, and queue write,
//! 5. activity-memory tick (responses for earlier requests),
//! 6. correction tick (latches rank results and memory responses),
//! 7. neuron tick.
//!
//! Accumulation runs before the correction tick, so a correction executing
//! on a given tick observes every match produced up to and including that
//! tick — the accumulator-snapshot ordering the pipeline requires.
//!
//! ## Reset composition
//!
//! The four reset lines are independent and each forces only its owning
//! state machine to its initial state. A partial-reset sequence can leave a
//! match in the queue whose rank computation was abandoned; only the
//! composed [`Engine::reset`] flushes the queue and yields a coherent empty
//! pipeline. See the per-line methods for what each one owns.

use fibremac_core::{RifParameters, SparsityMask, WeightTable, TIMESTEPS};
use tracing::{debug, trace, warn};

use crate::correction::CorrectionStage;
use crate::error::{EngineError, Result};
use crate::extractor::MatchExtractor;
pub use crate::extractor::OverflowPolicy;
use crate::memory::{ActivityMemory, ModelActivityMemory};
use crate::neuron::NeuronRunner;
use crate::queue::MatchQueue;
use crate::rank_counter::RankCounter;

/// One operation presented on the intake handshake
#[derive(Debug, Clone, Copy)]
pub struct Operation {
    pub mask_a: SparsityMask,
    pub mask_b: SparsityMask,
    pub weights: WeightTable,
}

/// Engine construction parameters
#[derive(Debug, Clone, Copy)]
pub struct EngineParams {
    /// Integrate-and-fire threshold
    pub threshold: u16,
    /// What the extractor does when the match queue is full
    pub overflow_policy: OverflowPolicy,
    /// Ticks without pipeline progress before a stall is reported
    pub stall_window_ticks: u64,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            threshold: 3,
            overflow_policy: OverflowPolicy::Stall,
            stall_window_ticks: 10_000,
        }
    }
}

/// Final observable state of a completed operation
#[derive(Debug, Clone, Copy)]
pub struct EngineReport {
    /// Total ticks elapsed on this engine
    pub ticks: u64,
    /// Pseudo-accumulator at completion (sum of all matched weights)
    pub accumulator: u16,
    /// Corrected sums from the last completed correction, if any match flowed
    pub results: Option<[u16; TIMESTEPS]>,
    /// Spike train from the last completed neuron run, if any
    pub spike_train: Option<u8>,
    /// Matches lost to queue overflow (Drop policy only)
    pub dropped_matches: u64,
}

/// The assembled matched multiply-accumulate pipeline
pub struct Engine<M: ActivityMemory> {
    extractor: MatchExtractor,
    queue: MatchQueue,
    rank_counter: RankCounter,
    correction: CorrectionStage,
    neuron: NeuronRunner,
    memory: M,

    /// Mask A latched for the whole operation (rank offsets never change
    /// once latched)
    mask_a: SparsityMask,
    stall_window_ticks: u64,

    tick_count: u64,
    last_progress_tick: u64,
    op_accepted: bool,
    extractor_done: bool,
    dropped_matches: u64,
    last_results: Option<[u16; TIMESTEPS]>,
    last_spike_train: Option<u8>,
}

impl Engine<ModelActivityMemory> {
    /// Engine over the software memory model
    pub fn with_model_memory(memory: ModelActivityMemory, params: EngineParams) -> Self {
        Self::new(memory, params)
    }
}

impl<M: ActivityMemory> Engine<M> {
    pub fn new(memory: M, params: EngineParams) -> Self {
        Self {
            extractor: MatchExtractor::new(params.overflow_policy),
            queue: MatchQueue::new(),
            rank_counter: RankCounter::new(),
            correction: CorrectionStage::new(),
            neuron: NeuronRunner::new(RifParameters::with_threshold(params.threshold)),
            memory,
            mask_a: SparsityMask::EMPTY,
            stall_window_ticks: params.stall_window_ticks,
            tick_count: 0,
            last_progress_tick: 0,
            op_accepted: false,
            extractor_done: false,
            dropped_matches: 0,
            last_results: None,
            last_spike_train: None,
        }
    }

    /// Ready signal of the operation-intake handshake
    pub fn ready(&self) -> bool {
        self.extractor.ready()
    }

    /// Present an operation on the intake handshake (single-cycle valid)
    ///
    /// # Errors
    /// Returns `NotReady` if the extractor is still draining a pending mask.
    pub fn accept(&mut self, op: Operation) -> Result<()> {
        let intersection = op.mask_a.intersect(&op.mask_b);
        if !self.extractor.accept(intersection, op.mask_b, op.weights) {
            return Err(EngineError::NotReady);
        }
        self.mask_a = op.mask_a;
        self.op_accepted = true;
        self.extractor_done = false;
        self.last_results = None;
        self.last_spike_train = None;
        self.last_progress_tick = self.tick_count;
        debug!(
            matches = intersection.popcount(),
            "engine: operation accepted"
        );
        Ok(())
    }

    /// Advance every component one clock tick
    pub fn tick(&mut self) {
        self.tick_count += 1;
        let mut progressed = false;

        // Registered backpressure: the extractor sees the full flag as it
        // stood at the start of the tick.
        let queue_can_accept = !self.queue.is_full();

        // Laggy path: one reduction level (or idle wait state).
        let rank_result = self.rank_counter.tick();
        if rank_result.is_some() {
            progressed = true;
        }

        // Laggy-path dispatch (cycle 0 of the 8-cycle schedule). Gated on
        // the correction stage's ready-for-slow so its result pulse is
        // never dropped.
        if self.rank_counter.ready() && self.correction.ready_for_slow() {
            if let Some(pending) = self.queue.pop() {
                self.rank_counter.dispatch(pending, self.mask_a);
                progressed = true;
            }
        }

        // Fast path: extraction, accumulation, queue write.
        let ext_out = self.extractor.tick(queue_can_accept);
        if let Some(element) = ext_out.matched {
            progressed = true;
            // Accumulation fires on match-valid whether or not the queue
            // accepts the element.
            self.correction.accumulate(element.weight);
            if !self.queue.write(element) {
                self.dropped_matches += 1;
                warn!(
                    position = element.position,
                    weight = element.weight,
                    "engine: match dropped, queue full"
                );
            }
        }
        if ext_out.done {
            self.extractor_done = true;
            progressed = true;
        }

        // External memory: responses for requests issued on earlier ticks.
        let mem_response = self.memory.tick();
        if mem_response.is_some() {
            progressed = true;
        }

        // Correction stage.
        let corr_out = self.correction.tick(rank_result, mem_response);
        if let Some(request) = corr_out.request {
            self.memory.request(request.address);
            progressed = true;
        }
        if corr_out.result_valid {
            progressed = true;
            let results = self.correction.results();
            self.last_results = Some(results);
            if !self.neuron.start(results) {
                trace!("engine: neuron busy, correction result not latched");
            }
        }

        // Output stage.
        let neuron_out = self.neuron.tick();
        if !self.neuron.is_idle() || neuron_out.done {
            progressed = true;
        }
        if let Some(train) = neuron_out.spike_train {
            self.last_spike_train = Some(train);
        }

        if progressed {
            self.last_progress_tick = self.tick_count;
        }
    }

    /// True once the accepted operation has fully drained the pipeline
    pub fn is_complete(&self) -> bool {
        self.op_accepted
            && self.extractor_done
            && self.extractor.ready()
            && self.queue.is_empty()
            && self.rank_counter.ready()
            // Idle, not ready-for-slow: Complete still holds a result whose
            // valid pulse (and neuron start) is one tick away.
            && self.correction.is_idle()
            && self.neuron.is_idle()
    }

    /// Tick until the operation completes or the pipeline stalls
    ///
    /// # Errors
    /// Returns `Stalled` when no component makes progress for the configured
    /// window — the detectable-deadlock surface for a stalled external
    /// memory.
    pub fn run_to_completion(&mut self) -> Result<EngineReport> {
        while !self.is_complete() {
            self.tick();
            if self.tick_count - self.last_progress_tick >= self.stall_window_ticks {
                return Err(EngineError::Stalled {
                    tick: self.tick_count,
                    window: self.stall_window_ticks,
                });
            }
        }
        Ok(self.report())
    }

    /// Snapshot of the observable outputs
    pub fn report(&self) -> EngineReport {
        EngineReport {
            ticks: self.tick_count,
            accumulator: self.correction.accumulator(),
            results: self.last_results,
            spike_train: self.last_spike_train,
            dropped_matches: self.dropped_matches,
        }
    }

    /// Current pseudo-accumulator value
    pub fn accumulator(&self) -> u16 {
        self.correction.accumulator()
    }

    /// Matches lost to queue overflow so far
    pub fn dropped_matches(&self) -> u64 {
        self.dropped_matches
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Mutable access to the activity memory (test probes)
    pub fn memory_mut(&mut self) -> &mut M {
        &mut self.memory
    }

    /// Fast reset line: extractor only
    ///
    /// Matches already queued stay queued; see the module notes on reset
    /// composition.
    pub fn reset_fast(&mut self) {
        self.extractor.reset();
        self.extractor_done = false;
    }

    /// Slow reset line: rank counter only (abandons any in-flight rank)
    pub fn reset_slow(&mut self) {
        self.rank_counter.reset();
    }

    /// Accum reset line: correction FSM and pseudo-accumulator
    pub fn reset_accum(&mut self) {
        self.correction.reset();
        self.last_results = None;
    }

    /// Neuron reset line
    pub fn reset_neuron(&mut self) {
        self.neuron.reset();
        self.last_spike_train = None;
    }

    /// Composed reset: all four lines plus the queue and memory request
    ///
    /// The only reset that guarantees a coherent empty pipeline.
    pub fn reset(&mut self) {
        self.reset_fast();
        self.reset_slow();
        self.reset_accum();
        self.reset_neuron();
        self.queue.clear();
        self.memory.reset();
        self.op_accepted = false;
        self.dropped_matches = 0;
        self.last_progress_tick = self.tick_count;
    }
}
