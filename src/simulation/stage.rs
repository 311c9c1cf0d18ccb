//! Per-stage queueing state
//!
//! A stage owns a FIFO waiting line, the set of patients currently in service,
//! and the accumulators needed for time averages. Patients move between the
//! waiting line and service by value; a patient is never in both.

use crate::simulation::{Event, RandomStreams, SimulationError, SimulationResult};
use crate::types::{EntityId, EventKind, Stage, StageConfig, Stream};
use std::collections::{BTreeMap, VecDeque};
use tracing::trace;

/// A patient record at one stage
#[derive(Debug, PartialEq)]
pub struct Entity {
    /// Patient identifier
    pub id: EntityId,
    /// When the patient arrived at the stage it is currently in
    pub arrived_at: f64,
}

impl Entity {
    /// Create a patient record
    pub fn new(id: EntityId, arrived_at: f64) -> Self {
        Self { id, arrived_at }
    }
}

#[derive(Debug)]
struct InService {
    entity: Entity,
    wait: f64,
}

/// Result of a service completion
#[derive(Debug)]
pub struct Completion {
    /// The patient who finished service
    pub entity: Entity,
    /// Time that patient spent in this stage's waiting line
    pub wait: f64,
    /// Completion event of the next patient taken from the waiting line, if any
    pub next: Option<Event>,
}

/// State of one queueing stage
#[derive(Debug)]
pub struct StageState {
    stage: Stage,
    servers: usize,
    mean_service: f64,
    waiting_queue: VecDeque<Entity>,
    in_service: BTreeMap<EntityId, InService>,
    queue_length_area: f64,
    busy_time: f64,
    entered_count: u64,
    started_service: u64,
    discharged_count: u64,
    total_wait_time: f64,
    max_queue_length: usize,
}

impl StageState {
    /// Create an idle stage
    pub fn new(stage: Stage, config: &StageConfig) -> Self {
        Self {
            stage,
            servers: config.servers,
            mean_service: config.mean_service,
            waiting_queue: VecDeque::new(),
            in_service: BTreeMap::new(),
            queue_length_area: 0.0,
            busy_time: 0.0,
            entered_count: 0,
            started_service: 0,
            discharged_count: 0,
            total_wait_time: 0.0,
            max_queue_length: 0,
        }
    }

    /// Integrate queue length and busy servers over `elapsed` time units
    ///
    /// Must run for every stage before any state changes at a new event time.
    pub fn accumulate(&mut self, elapsed: f64) -> SimulationResult<()> {
        if elapsed < 0.0 || elapsed.is_nan() {
            return Err(SimulationError::invariant_violation(format!(
                "{} stage asked to integrate a negative interval {}",
                self.stage, elapsed
            )));
        }
        self.queue_length_area += self.waiting_queue.len() as f64 * elapsed;
        self.busy_time += self.in_service.len() as f64 * elapsed;
        Ok(())
    }

    /// A patient arrives at this stage
    ///
    /// Starts service immediately when a server is free and returns the
    /// completion event to schedule; otherwise the patient joins the waiting line.
    pub fn admit(
        &mut self,
        mut entity: Entity,
        now: f64,
        streams: &mut dyn RandomStreams,
    ) -> SimulationResult<Option<Event>> {
        entity.arrived_at = now;
        self.entered_count += 1;

        if self.in_service.len() < self.servers {
            return Ok(Some(self.start_service(entity, now, streams)));
        }

        trace!(stage = %self.stage, entity = %entity.id, queue_len = self.waiting_queue.len() + 1, "Patient waiting");
        self.waiting_queue.push_back(entity);
        self.max_queue_length = self.max_queue_length.max(self.waiting_queue.len());
        Ok(None)
    }

    /// A patient finishes service at this stage
    ///
    /// The head of the waiting line, if any, takes over the freed server.
    pub fn complete(
        &mut self,
        id: EntityId,
        now: f64,
        streams: &mut dyn RandomStreams,
    ) -> SimulationResult<Completion> {
        let finished = self.in_service.remove(&id).ok_or_else(|| {
            SimulationError::invariant_violation(format!(
                "{} completion for {} who is not in service (busy {}, waiting {})",
                self.stage,
                id,
                self.in_service.len(),
                self.waiting_queue.len()
            ))
        })?;

        self.discharged_count += 1;
        self.total_wait_time += finished.wait;

        let next = match self.waiting_queue.pop_front() {
            Some(head) => Some(self.start_service(head, now, streams)),
            None => None,
        };

        Ok(Completion { entity: finished.entity, wait: finished.wait, next })
    }

    fn start_service(
        &mut self,
        entity: Entity,
        now: f64,
        streams: &mut dyn RandomStreams,
    ) -> Event {
        let wait = now - entity.arrived_at;
        let service = streams.draw_exponential(Stream::Service(self.stage), self.mean_service);
        let event = Event::new(now + service, EventKind::StageComplete(self.stage), entity.id);

        trace!(stage = %self.stage, entity = %entity.id, wait, service, "Service started");
        self.started_service += 1;
        self.in_service.insert(entity.id, InService { entity, wait });
        event
    }

    /// Which stage this is
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Server capacity
    pub fn servers(&self) -> usize {
        self.servers
    }

    /// Servers currently occupied
    pub fn busy_count(&self) -> usize {
        self.in_service.len()
    }

    /// Patients in the waiting line
    pub fn queue_len(&self) -> usize {
        self.waiting_queue.len()
    }

    /// Identifiers in the waiting line, head first
    pub fn waiting_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.waiting_queue.iter().map(|entity| entity.id)
    }

    /// Whether the patient is being served here
    pub fn is_in_service(&self, id: EntityId) -> bool {
        self.in_service.contains_key(&id)
    }

    /// Time integral of the waiting line length
    pub fn queue_length_area(&self) -> f64 {
        self.queue_length_area
    }

    /// Time integral of the number of busy servers
    pub fn busy_time(&self) -> f64 {
        self.busy_time
    }

    /// Patients that ever arrived at this stage
    pub fn entered_count(&self) -> u64 {
        self.entered_count
    }

    /// Patients that ever entered service at this stage
    pub fn started_service(&self) -> u64 {
        self.started_service
    }

    /// Patients that finished service at this stage
    pub fn discharged_count(&self) -> u64 {
        self.discharged_count
    }

    /// Sum of waiting-line delays of patients that finished service
    pub fn total_wait_time(&self) -> f64 {
        self.total_wait_time
    }

    /// Longest waiting line observed
    pub fn max_queue_length(&self) -> usize {
        self.max_queue_length
    }
}
