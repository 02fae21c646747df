// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # RIF (Reset-on-fire Integrate-and-Fire) Neuron Model
//!
//! The model driven by the correction stage's eight per-timestep sums.
//!
//! ## Model Dynamics
//!
//! ```text
//! Membrane Potential Update (timestep t):
//!     V(t) = fired(t-1) ? input[t] : V(t-1) + input[t]
//!
//!     A firing event performs a hard reset: the membrane is REPLACED by
//!     the new input, not accumulated onto a reset baseline.
//!
//! Firing Check:
//!     spike[t] = V(t) > threshold        (strict comparison)
//!
//! The membrane is updated to V(t) regardless of whether it fired.
//! ```

use super::traits::{ModelParameters, NeuronModel};
use crate::types::TIMESTEPS;

/// RIF neuron model
#[derive(Debug, Clone, Copy, Default)]
pub struct RifModel;

impl RifModel {
    /// Create a new RIF model instance
    pub fn new() -> Self {
        Self
    }

    /// Integrate a full train of inputs from a zero membrane
    ///
    /// Convenience form of eight `step` calls; bit *t* of the result is the
    /// spike at timestep *t*.
    pub fn integrate_train(&self, inputs: &[u16; TIMESTEPS], params: &RifParameters) -> u8 {
        let mut potential = 0u16;
        let mut fired_prev = false;
        let mut train = 0u8;
        for (t, &input) in inputs.iter().enumerate() {
            let (next, spiked) = self.step(potential, input, fired_prev, params);
            if spiked {
                train |= 1 << t;
            }
            potential = next;
            fired_prev = spiked;
        }
        train
    }
}

impl NeuronModel for RifModel {
    type Parameters = RifParameters;

    fn model_name(&self) -> &'static str {
        "Reset-on-fire Integrate-and-Fire (RIF)"
    }

    #[inline(always)]
    fn step(
        &self,
        membrane_potential: u16,
        input: u16,
        fired_prev: bool,
        params: &RifParameters,
    ) -> (u16, bool) {
        let next = if fired_prev {
            input
        } else {
            membrane_potential.saturating_add(input)
        };
        (next, next > params.threshold)
    }
}

/// RIF model-specific parameters
#[derive(Debug, Clone, Copy)]
pub struct RifParameters {
    /// Firing threshold; a spike requires the potential to strictly exceed it
    pub threshold: u16,
}

impl RifParameters {
    /// Create parameters with a custom threshold
    pub fn with_threshold(threshold: u16) -> Self {
        Self { threshold }
    }
}

impl Default for RifParameters {
    fn default() -> Self {
        Self { threshold: 3 }
    }
}

impl ModelParameters for RifParameters {
    fn validate(&self) -> Result<(), &'static str> {
        // Any u16 threshold is representable in the comparator
        Ok(())
    }

    fn parameter_count() -> usize {
        1 // threshold
    }
}
