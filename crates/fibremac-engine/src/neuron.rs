// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Integrate-and-Fire Neuron Runner
//!
//! Consumes the correction stage's eight per-timestep sums as an input
//! sequence, one timestep per tick, and emits the spike train:
//!
//! ```text
//! Idle ──start (result-valid while idle)──► Calculating ──8 timesteps──► Done ──► Idle
//! ```
//!
//! The per-timestep dynamics live in `fibremac_core::RifModel`; this runner
//! owns the timestep counter, membrane register, and fired-previous flag,
//! all cleared on the return to Idle.

use fibremac_core::models::NeuronModel;
use fibremac_core::{RifModel, RifParameters, TIMESTEPS};
use tracing::trace;

/// Neuron state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NeuronState {
    #[default]
    Idle,
    Calculating,
    Done,
}

/// Single-tick outputs of the neuron runner
#[derive(Debug, Clone, Copy, Default)]
pub struct NeuronOutput {
    /// Done pulse: the full train has been integrated
    pub done: bool,
    /// The 8-bit spike train, present with the done pulse
    pub spike_train: Option<u8>,
}

/// The integrate-and-fire output stage
#[derive(Debug, Clone)]
pub struct NeuronRunner {
    state: NeuronState,
    model: RifModel,
    params: RifParameters,
    inputs: [u16; TIMESTEPS],
    timestep: usize,
    membrane_potential: u16,
    fired_prev: bool,
    train: u8,
}

impl NeuronRunner {
    pub fn new(params: RifParameters) -> Self {
        Self {
            state: NeuronState::Idle,
            model: RifModel::new(),
            params,
            inputs: [0; TIMESTEPS],
            timestep: 0,
            membrane_potential: 0,
            fired_prev: false,
            train: 0,
        }
    }

    pub fn state(&self) -> NeuronState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == NeuronState::Idle
    }

    /// Start integrating a train of corrected sums
    ///
    /// The start condition is the correction stage's result-valid pulse
    /// while this runner is idle; a pulse arriving mid-train is ignored by
    /// the caller. Returns `false` if not idle.
    pub fn start(&mut self, inputs: [u16; TIMESTEPS]) -> bool {
        if self.state != NeuronState::Idle {
            return false;
        }
        self.inputs = inputs;
        self.timestep = 0;
        self.membrane_potential = 0;
        self.fired_prev = false;
        self.train = 0;
        self.state = NeuronState::Calculating;
        true
    }

    /// Force the state machine to Idle and zero its registers (neuron reset line)
    pub fn reset(&mut self) {
        let params = self.params;
        *self = Self::new(params);
    }

    /// Advance one clock tick
    pub fn tick(&mut self) -> NeuronOutput {
        let mut output = NeuronOutput::default();

        match self.state {
            NeuronState::Idle => {}

            NeuronState::Calculating => {
                let input = self.inputs[self.timestep];
                let (next, spiked) = self.model.step(
                    self.membrane_potential,
                    input,
                    self.fired_prev,
                    &self.params,
                );
                if spiked {
                    self.train |= 1 << self.timestep;
                }
                // Membrane updated regardless of firing.
                self.membrane_potential = next;
                self.fired_prev = spiked;
                self.timestep += 1;
                if self.timestep == TIMESTEPS {
                    self.state = NeuronState::Done;
                }
            }

            NeuronState::Done => {
                output.done = true;
                output.spike_train = Some(self.train);
                trace!(train = %format_args!("{:#010b}", self.train), "neuron: done");
                // Timestep counter and membrane cleared on the way out.
                self.timestep = 0;
                self.membrane_potential = 0;
                self.fired_prev = false;
                self.state = NeuronState::Idle;
            }
        }

        output
    }
}

impl Default for NeuronRunner {
    fn default() -> Self {
        Self::new(RifParameters::default())
    }
}
