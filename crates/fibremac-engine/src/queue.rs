// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! Decoupling queue between the fast and laggy paths
//!
//! The hardware uses two parallel fixed-capacity FIFOs (a position lane and
//! a weight lane) written together and drained in lockstep. Here the pair is
//! one logical queue of `MatchedElement` records, which makes lane
//! desynchronization structurally impossible: a single write gate admits or
//! refuses both halves atomically, and a single pop yields both halves of
//! the same logical entry.

use fibremac_core::{MatchedElement, MATCH_QUEUE_CAPACITY};

/// Generic bounded FIFO: a circular buffer with full/empty flags
///
/// Contract: writes are refused (returning `false`) while full; reads return
/// `None` while empty; accepted entries come out in write order.
#[derive(Debug, Clone)]
pub struct BoundedQueue<T> {
    slots: Vec<Option<T>>,
    head: usize,
    tail: usize,
    len: usize,
}

impl<T> BoundedQueue<T> {
    /// Create a queue with a fixed capacity
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            head: 0,
            tail: 0,
            len: 0,
        }
    }

    /// Fixed capacity
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of buffered entries
    pub fn len(&self) -> usize {
        self.len
    }

    /// Empty flag
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Full flag
    pub fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }

    /// Attempt a write; refused (returns `false`) while full
    pub fn push(&mut self, value: T) -> bool {
        if self.is_full() {
            return false;
        }
        self.slots[self.tail] = Some(value);
        self.tail = (self.tail + 1) % self.slots.len();
        self.len += 1;
        true
    }

    /// Pop the oldest entry, if any
    pub fn pop(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let value = self.slots[self.head].take();
        self.head = (self.head + 1) % self.slots.len();
        self.len -= 1;
        value
    }

    /// Drop all buffered entries and clear the pointers
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.head = 0;
        self.tail = 0;
        self.len = 0;
    }
}

/// The capacity-8 decoupling queue of pending matches
///
/// Absorbs the rate mismatch between fast-path production (one match per 3
/// cycles) and laggy-path consumption (one rank per 8 cycles).
#[derive(Debug, Clone)]
pub struct MatchQueue {
    inner: BoundedQueue<MatchedElement>,
}

impl MatchQueue {
    pub fn new() -> Self {
        Self {
            inner: BoundedQueue::new(MATCH_QUEUE_CAPACITY),
        }
    }

    /// Write gate for both lanes: refused atomically while full
    pub fn write(&mut self, element: MatchedElement) -> bool {
        self.inner.push(element)
    }

    /// Lockstep pop: position and weight of the same logical entry
    pub fn pop(&mut self) -> Option<MatchedElement> {
        self.inner.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.inner.is_full()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Flush all pending matches (composed engine reset only)
    pub fn clear(&mut self) {
        self.inner.clear();
    }
}

impl Default for MatchQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_queue_fifo_order() {
        let mut queue = BoundedQueue::new(4);
        assert!(queue.is_empty());
        for i in 0..4 {
            assert!(queue.push(i));
        }
        assert!(queue.is_full());
        assert!(!queue.push(99)); // Refused while full
        for i in 0..4 {
            assert_eq!(queue.pop(), Some(i));
        }
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_bounded_queue_wraparound() {
        let mut queue = BoundedQueue::new(2);
        for round in 0..5 {
            assert!(queue.push(round));
            assert!(queue.push(round + 100));
            assert_eq!(queue.pop(), Some(round));
            assert_eq!(queue.pop(), Some(round + 100));
        }
    }

    #[test]
    fn test_match_queue_lockstep_pairs() {
        // Whatever sequence of writes and pops respects the flags, the
        // position and weight read at the same pop always belong to the
        // same element as written.
        let mut queue = MatchQueue::new();
        let written: Vec<MatchedElement> = (0..MATCH_QUEUE_CAPACITY as u8)
            .map(|i| MatchedElement {
                position: i * 3,
                weight: 200 - i,
            })
            .collect();

        for &element in &written {
            assert!(queue.write(element));
        }
        assert!(queue.is_full());
        assert!(!queue.write(MatchedElement {
            position: 99,
            weight: 99
        }));

        for &element in &written {
            let popped = queue.pop().unwrap();
            assert_eq!(popped.position, element.position);
            assert_eq!(popped.weight, element.weight);
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn test_match_queue_clear() {
        let mut queue = MatchQueue::new();
        queue.write(MatchedElement {
            position: 1,
            weight: 2,
        });
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.pop(), None);
    }
}
