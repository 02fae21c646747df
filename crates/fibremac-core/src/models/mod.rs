// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Neuron models
//!
//! The pipeline's output stage is a spiking neuron; the model here defines
//! its per-timestep dynamics. The engine's neuron runner owns the timestep
//! counter and membrane register and calls into the model once per tick.

mod rif;
mod traits;

pub use rif::{RifModel, RifParameters};
pub use traits::{ModelParameters, NeuronModel};
