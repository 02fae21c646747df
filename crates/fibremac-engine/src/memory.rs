// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! Activity-memory boundary
//!
//! The memory subsystem holding per-position timestep-activity bitmaps is
//! an external collaborator. The engine talks to it through the
//! [`ActivityMemory`] trait: a read request (address + implied read-enable
//! pulse) goes in, and an 8-bit pattern with a valid pulse comes back after
//! an unspecified but finite number of ticks. No direct dependency on any
//! concrete memory — the implementation is passed in at engine
//! construction.
//!
//! [`ModelActivityMemory`] is the provided software model: a backing table
//! with a configurable fixed latency, plus a `stalled` mode (never
//! responds) for deadlock-detection tests.

use fibremac_core::ActivityPattern;

/// External activity memory as seen by the correction stage
pub trait ActivityMemory {
    /// Latch a read request for the pattern at `address` (rank offset)
    fn request(&mut self, address: u8);

    /// Advance one tick; the response pulses as `Some` for exactly one tick
    fn tick(&mut self) -> Option<ActivityPattern>;

    /// Clear any in-flight request
    fn reset(&mut self);
}

/// Software model of the activity memory with a fixed response latency
#[derive(Debug, Clone)]
pub struct ModelActivityMemory {
    patterns: Vec<u8>,
    latency_ticks: u8,
    /// In-flight request: (address, ticks remaining)
    in_flight: Option<(u8, u8)>,
    stalled: bool,
}

impl ModelActivityMemory {
    /// Create a memory over `patterns`, responding after `latency_ticks`
    ///
    /// Addresses beyond the table read as all-active (no correction), so a
    /// short table behaves as if the missing positions were never inactive.
    pub fn new(patterns: Vec<u8>, latency_ticks: u8) -> Self {
        debug_assert!(latency_ticks >= 1);
        Self {
            patterns,
            latency_ticks,
            in_flight: None,
            stalled: false,
        }
    }

    /// Memory that answers every address with the same pattern
    pub fn uniform(pattern: u8, latency_ticks: u8) -> Self {
        Self::new(vec![pattern; 256], latency_ticks)
    }

    /// Put the memory into (or out of) the never-responding stalled mode
    pub fn set_stalled(&mut self, stalled: bool) {
        self.stalled = stalled;
    }
}

impl ActivityMemory for ModelActivityMemory {
    fn request(&mut self, address: u8) {
        self.in_flight = Some((address, self.latency_ticks));
    }

    fn tick(&mut self) -> Option<ActivityPattern> {
        if self.stalled {
            return None;
        }
        match self.in_flight.take() {
            Some((address, remaining)) if remaining <= 1 => {
                let bits = self
                    .patterns
                    .get(address as usize)
                    .copied()
                    .unwrap_or(ActivityPattern::ALL_ACTIVE.0);
                Some(ActivityPattern(bits))
            }
            Some((address, remaining)) => {
                self.in_flight = Some((address, remaining - 1));
                None
            }
            None => None,
        }
    }

    fn reset(&mut self) {
        self.in_flight = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_after_fixed_latency() {
        let mut memory = ModelActivityMemory::new(vec![0xAB, 0xCD], 3);
        memory.request(1);
        assert_eq!(memory.tick(), None);
        assert_eq!(memory.tick(), None);
        assert_eq!(memory.tick(), Some(ActivityPattern(0xCD)));
        assert_eq!(memory.tick(), None); // Valid pulses for exactly one tick
    }

    #[test]
    fn test_out_of_table_address_reads_all_active() {
        let mut memory = ModelActivityMemory::new(vec![0x00], 1);
        memory.request(7);
        assert_eq!(memory.tick(), Some(ActivityPattern::ALL_ACTIVE));
    }

    #[test]
    fn test_stalled_memory_never_responds() {
        let mut memory = ModelActivityMemory::uniform(0xFF, 1);
        memory.set_stalled(true);
        memory.request(0);
        for _ in 0..50 {
            assert_eq!(memory.tick(), None);
        }
    }
}
