// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Traits implemented by neuron models

/// Model-specific parameter bundle
pub trait ModelParameters {
    /// Validate parameter ranges
    fn validate(&self) -> Result<(), &'static str>;

    /// Number of tunable parameters
    fn parameter_count() -> usize;
}

/// A spiking neuron model advanced one timestep at a time
pub trait NeuronModel {
    type Parameters: ModelParameters;

    /// Human-readable model name
    fn model_name(&self) -> &'static str;

    /// Advance one timestep
    ///
    /// Returns `(next_potential, spiked)`. The caller updates its membrane
    /// register to `next_potential` unconditionally and feeds `spiked` back
    /// as `fired_prev` on the following timestep.
    fn step(
        &self,
        membrane_potential: u16,
        input: u16,
        fired_prev: bool,
        params: &Self::Parameters,
    ) -> (u16, bool);
}
