//! Event queue with deterministic ordering.

use crate::simulation::{SimulationError, SimulationResult};
use crate::types::{EntityId, EventKind};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A scheduled state change
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    /// Simulated time at which the event fires
    pub time: f64,
    /// What happens
    pub kind: EventKind,
    /// Patient the event belongs to
    pub entity_id: EntityId,
}

impl Event {
    /// Create a new event
    pub fn new(time: f64, kind: EventKind, entity_id: EntityId) -> Self {
        Self { time, kind, entity_id }
    }
}

/// Heap entry ordered by time, then by insertion sequence (FIFO for ties).
#[derive(Debug)]
struct Scheduled {
    event: Event,
    sequence: u64,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap, so both keys are reversed
        match self.event.time.total_cmp(&other.event.time) {
            Ordering::Equal => {}
            ord => return ord.reverse(),
        }
        self.sequence.cmp(&other.sequence).reverse()
    }
}

/// Time-ordered queue of pending events
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<Scheduled>,
    next_sequence: u64,
}

impl EventQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an event in O(log n)
    ///
    /// Events must carry a finite, non-negative time.
    pub fn schedule(&mut self, event: Event) -> SimulationResult<()> {
        if !event.time.is_finite() || event.time < 0.0 {
            return Err(SimulationError::invariant_violation(format!(
                "cannot schedule {} for {} at time {}",
                event.kind, event.entity_id, event.time
            )));
        }
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.heap.push(Scheduled { event, sequence });
        Ok(())
    }

    /// Remove and return the earliest event
    ///
    /// Popping an empty queue is a logic error; callers check [`peek_time`](Self::peek_time)
    /// or [`is_empty`](Self::is_empty) first.
    pub fn pop_next(&mut self) -> SimulationResult<Event> {
        self.heap
            .pop()
            .map(|scheduled| scheduled.event)
            .ok_or_else(|| SimulationError::invariant_violation("pop from an empty event queue"))
    }

    /// Time of the earliest pending event, `f64::INFINITY` when empty
    pub fn peek_time(&self) -> f64 {
        self.heap.peek().map_or(f64::INFINITY, |scheduled| scheduled.event.time)
    }

    /// Whether no events are pending
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Number of pending events
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Total number of events ever scheduled
    pub fn scheduled_count(&self) -> u64 {
        self.next_sequence
    }
}
