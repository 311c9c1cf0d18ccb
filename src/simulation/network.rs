//! Network simulator
//!
//! This module contains the NetworkSimulator, which owns the event queue, the
//! clock, every stage, and the random streams, and runs the event loop.

use crate::simulation::{
    Entity, Event, EventQueue, NetworkReport, RandomStreams, RoutingCounts, SeededStreams,
    SimulationClock, SimulationError, SimulationResult, StageReport, StageState,
};
use crate::types::{EntityId, EventKind, NetworkConfig, Stage, Stream, TerminationMode};
use crate::{perf_span, sim_event};
use tracing::{debug, info, instrument, trace};

/// Pick the care area for a routing draw `r` in `[0, 1)`
///
/// Bands are `[0, trauma)`, `[trauma, trauma + acute)` and the remainder is prompt.
pub fn select_care_area(config: &NetworkConfig, r: f64) -> Stage {
    if r < config.trauma_prob {
        Stage::Trauma
    } else if r < config.trauma_prob + config.acute_prob {
        Stage::Acute
    } else {
        Stage::Prompt
    }
}

/// Discrete-event simulator of the triage → care area network
#[derive(Debug)]
pub struct NetworkSimulator<R = SeededStreams> {
    /// Validated configuration
    config: NetworkConfig,
    /// One state per stage, indexed by [`Stage::index`]
    stages: [StageState; 4],
    /// Pending events
    queue: EventQueue,
    /// Simulated time
    clock: SimulationClock,
    /// Random streams for arrivals, service, and routing
    streams: R,
    /// Identifier for the next patient to be scheduled
    next_entity: EntityId,
    /// Decisions made at triage completion
    routing: RoutingCounts,
    entities_created: u64,
    entities_exited: u64,
    events_processed: u64,
}

impl NetworkSimulator<SeededStreams> {
    /// Create a simulator whose streams are seeded from `config.seed`
    pub fn new(config: NetworkConfig) -> SimulationResult<Self> {
        let streams = SeededStreams::new(config.seed);
        Self::with_streams(config, streams)
    }
}

impl<R: RandomStreams> NetworkSimulator<R> {
    /// Create a simulator drawing from the given streams
    ///
    /// The configuration is validated before anything is scheduled, and the
    /// first arrival is scheduled unless it would fall at or past the end time.
    #[instrument(skip(config, streams), fields(end_time = config.end_time, seed = config.seed))]
    pub fn with_streams(config: NetworkConfig, streams: R) -> SimulationResult<Self> {
        config.validate()?;

        info!(
            "Initializing network: triage {}x, trauma {}x, acute {}x, prompt {}x servers",
            config.triage.servers, config.trauma.servers, config.acute.servers, config.prompt.servers
        );

        let stages = Stage::ALL.map(|stage| StageState::new(stage, config.stage(stage)));

        let mut simulator = Self {
            config,
            stages,
            queue: EventQueue::new(),
            clock: SimulationClock::new(),
            streams,
            next_entity: EntityId::new(1),
            routing: RoutingCounts::default(),
            entities_created: 0,
            entities_exited: 0,
            events_processed: 0,
        };
        simulator.schedule_next_arrival(0.0)?;
        Ok(simulator)
    }

    /// Run until the termination condition holds and return the final report
    pub fn run(&mut self) -> SimulationResult<NetworkReport> {
        let span = perf_span!(
            "network_run",
            end_time = self.config.end_time,
            termination = tracing::field::display(self.config.termination),
        );
        let _entered = span.enter();

        while self.should_continue() {
            self.step()?;
        }

        sim_event!(
            info,
            "Simulation finished",
            clock = self.clock.now(),
            events = self.events_processed,
            patients = self.entities_created,
        );
        Ok(self.report())
    }

    /// Whether the loop should pop another event
    pub fn should_continue(&self) -> bool {
        match self.config.termination {
            TerminationMode::Horizon => self.queue.peek_time() < self.config.end_time,
            TerminationMode::Drain => !self.queue.is_empty(),
            TerminationMode::Served(count) => {
                !self.queue.is_empty()
                    && self.stages[Stage::Triage.index()].started_service() < count
            }
        }
    }

    /// Process exactly one event and return it
    pub fn step(&mut self) -> SimulationResult<Event> {
        let event = self.queue.pop_next()?;
        self.clock.advance_to(event.time)?;
        self.integrate()?;

        trace!(time = event.time, kind = %event.kind, entity = %event.entity_id, "Dispatching event");
        match event.kind {
            EventKind::Arrival => self.handle_arrival(event)?,
            EventKind::StageComplete(Stage::Triage) => self.handle_triage_complete(event)?,
            EventKind::StageComplete(stage) => self.handle_care_complete(stage, event)?,
        }

        self.events_processed += 1;
        self.check_invariants()?;
        Ok(event)
    }

    /// Bring every stage's time-weighted areas up to the current time
    fn integrate(&mut self) -> SimulationResult<()> {
        let elapsed = self.clock.elapsed_since_update();
        for stage in &mut self.stages {
            stage.accumulate(elapsed)?;
        }
        self.clock.mark_updated();
        Ok(())
    }

    fn handle_arrival(&mut self, event: Event) -> SimulationResult<()> {
        let now = self.clock.now();
        self.entities_created += 1;
        self.schedule_next_arrival(now)?;

        let entity = Entity::new(event.entity_id, now);
        self.admit(Stage::Triage, entity)
    }

    fn handle_triage_complete(&mut self, event: Event) -> SimulationResult<()> {
        let now = self.clock.now();
        let completion = self.stages[Stage::Triage.index()].complete(
            event.entity_id,
            now,
            &mut self.streams,
        )?;
        if let Some(next) = completion.next {
            self.queue.schedule(next)?;
        }

        if self.streams.draw_uniform(Stream::Discharge) < self.config.triage_discharge_prob {
            debug!(entity = %completion.entity.id, wait = completion.wait, "Discharged from triage");
            self.routing.record(None);
            self.entities_exited += 1;
            return Ok(());
        }

        let destination = select_care_area(&self.config, self.streams.draw_uniform(Stream::Routing));
        debug!(entity = %completion.entity.id, wait = completion.wait, to = %destination, "Routed from triage");
        self.routing.record(Some(destination));
        self.admit(destination, completion.entity)
    }

    fn handle_care_complete(&mut self, stage: Stage, event: Event) -> SimulationResult<()> {
        let now = self.clock.now();
        let completion =
            self.stages[stage.index()].complete(event.entity_id, now, &mut self.streams)?;
        if let Some(next) = completion.next {
            self.queue.schedule(next)?;
        }

        debug!(entity = %completion.entity.id, stage = %stage, wait = completion.wait, "Patient left the network");
        self.entities_exited += 1;
        Ok(())
    }

    fn admit(&mut self, stage: Stage, entity: Entity) -> SimulationResult<()> {
        let now = self.clock.now();
        if let Some(completion) =
            self.stages[stage.index()].admit(entity, now, &mut self.streams)?
        {
            self.queue.schedule(completion)?;
        }
        Ok(())
    }

    /// Schedule the arrival after `from`, unless it would land at or past the end time
    fn schedule_next_arrival(&mut self, from: f64) -> SimulationResult<()> {
        let gap = self.streams.draw_exponential(Stream::Arrival, self.config.mean_inter_arrival);
        let at = from + gap;
        if at < self.config.end_time {
            let id = self.next_entity;
            self.next_entity = id.next();
            self.queue.schedule(Event::new(at, EventKind::Arrival, id))?;
        } else {
            debug!(from, at, end_time = self.config.end_time, "Arrival stream closed");
        }
        Ok(())
    }

    /// Verify capacity and conservation for every stage
    pub fn check_invariants(&self) -> SimulationResult<()> {
        for state in &self.stages {
            if state.busy_count() > state.servers() {
                return Err(SimulationError::invariant_violation(format!(
                    "{} has {} busy servers but only {} exist",
                    state.stage(),
                    state.busy_count(),
                    state.servers()
                )));
            }
            let accounted =
                state.discharged_count() + (state.queue_len() + state.busy_count()) as u64;
            if accounted != state.entered_count() {
                return Err(SimulationError::invariant_violation(format!(
                    "{} lost track of patients: {} entered, {} accounted for",
                    state.stage(),
                    state.entered_count(),
                    accounted
                )));
            }
        }
        Ok(())
    }

    /// Snapshot of all statistics at the current simulated time
    pub fn report(&self) -> NetworkReport {
        let now = self.clock.now();
        NetworkReport {
            clock: now,
            end_time: self.config.end_time,
            termination: self.config.termination,
            seed: self.config.seed,
            stages: self.stages.iter().map(|state| StageReport::from_stage(state, now)).collect(),
            routing: self.routing,
            entities_created: self.entities_created,
            entities_exited: self.entities_exited,
            events_processed: self.events_processed,
            events_pending: self.queue.len(),
        }
    }

    /// Configuration of this run
    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Simulated clock
    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    /// State of one stage
    pub fn stage(&self, stage: Stage) -> &StageState {
        &self.stages[stage.index()]
    }

    /// Number of events still pending
    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    /// Time of the next pending event, `f64::INFINITY` when none
    pub fn next_event_time(&self) -> f64 {
        self.queue.peek_time()
    }

    /// Patients that arrived so far
    pub fn entities_created(&self) -> u64 {
        self.entities_created
    }

    /// Patients that left the network so far
    pub fn entities_exited(&self) -> u64 {
        self.entities_exited
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StageConfig;
    use std::collections::{HashMap, VecDeque};

    /// Streams that replay scripted values; exhausted exponential streams return 1.0
    #[derive(Debug, Default)]
    struct ScriptedStreams {
        exponential: HashMap<Stream, VecDeque<f64>>,
        uniform: HashMap<Stream, VecDeque<f64>>,
    }

    impl ScriptedStreams {
        fn exp(mut self, stream: Stream, values: &[f64]) -> Self {
            self.exponential.entry(stream).or_default().extend(values);
            self
        }

        fn uni(mut self, stream: Stream, values: &[f64]) -> Self {
            self.uniform.entry(stream).or_default().extend(values);
            self
        }
    }

    impl RandomStreams for ScriptedStreams {
        fn draw_uniform(&mut self, stream: Stream) -> f64 {
            self.uniform.get_mut(&stream).and_then(VecDeque::pop_front).unwrap_or(0.0)
        }

        fn draw_exponential(&mut self, stream: Stream, _mean: f64) -> f64 {
            self.exponential.get_mut(&stream).and_then(VecDeque::pop_front).unwrap_or(1.0)
        }
    }

    fn single_server_config(end_time: f64) -> NetworkConfig {
        NetworkConfig {
            end_time,
            mean_inter_arrival: 1.0,
            triage: StageConfig::new(1, 1.0),
            trauma: StageConfig::new(1, 1.0),
            acute: StageConfig::new(1, 1.0),
            prompt: StageConfig::new(1, 1.0),
            triage_discharge_prob: 1.0,
            trauma_prob: 0.0,
            acute_prob: 0.0,
            ..NetworkConfig::default()
        }
    }

    #[test]
    fn test_select_care_area_bands() {
        let config = NetworkConfig { trauma_prob: 0.2, acute_prob: 0.3, ..Default::default() };
        assert_eq!(select_care_area(&config, 0.0), Stage::Trauma);
        assert_eq!(select_care_area(&config, 0.19), Stage::Trauma);
        assert_eq!(select_care_area(&config, 0.2), Stage::Acute);
        assert_eq!(select_care_area(&config, 0.49), Stage::Acute);
        assert_eq!(select_care_area(&config, 0.5), Stage::Prompt);
        assert_eq!(select_care_area(&config, 0.999), Stage::Prompt);
    }

    #[test]
    fn test_invalid_configuration_is_rejected_before_run() {
        let config = NetworkConfig { trauma_prob: 0.8, acute_prob: 0.8, ..Default::default() };
        assert!(matches!(
            NetworkSimulator::new(config),
            Err(SimulationError::ConfigurationError(_))
        ));

        let mut config = NetworkConfig::default();
        config.trauma.mean_service = -1.0;
        assert!(matches!(
            NetworkSimulator::new(config),
            Err(SimulationError::DistributionParameterError(_))
        ));
    }

    #[test]
    fn test_hand_checked_single_server_trace() {
        // Arrivals at 1, 2, 3 (next would be 10 >= end); services 2.5, 1.0, 1.0
        let streams = ScriptedStreams::default()
            .exp(Stream::Arrival, &[1.0, 1.0, 1.0, 7.0])
            .exp(Stream::Service(Stage::Triage), &[2.5, 1.0, 1.0]);
        let mut sim = NetworkSimulator::with_streams(single_server_config(10.0), streams).unwrap();

        let report = sim.run().unwrap();
        let triage = report.stage(Stage::Triage);

        // Patient 1 served 1.0-3.5, patient 2 waits 2.0-3.5 then 3.5-4.5,
        // patient 3 waits 3.0-4.5 then 4.5-5.5
        assert_eq!(report.clock, 5.5);
        assert_eq!(report.entities_created, 3);
        assert_eq!(report.entities_exited, 3);
        assert_eq!(triage.discharged, 3);
        assert!((triage.total_wait_time - 3.0).abs() < 1e-12);
        assert!((triage.average_wait - 1.0).abs() < 1e-12);
        // Queue length 1 on [2, 3), 2 on [3, 3.5), 1 on [3.5, 4.5)
        assert!((triage.queue_length_area - 3.0).abs() < 1e-12);
        assert!((triage.busy_time - 4.5).abs() < 1e-12);
        assert!((triage.utilization - 4.5 / 5.5).abs() < 1e-12);
        assert_eq!(report.routing.discharged, 3);
        assert_eq!(report.events_pending, 0);
    }

    #[test]
    fn test_horizon_leaves_late_events_unpopped() {
        let streams = ScriptedStreams::default()
            .exp(Stream::Arrival, &[1.0, 100.0])
            .exp(Stream::Service(Stage::Triage), &[50.0]);
        let mut sim = NetworkSimulator::with_streams(single_server_config(10.0), streams).unwrap();

        let report = sim.run().unwrap();
        assert_eq!(report.clock, 1.0);
        assert_eq!(report.events_pending, 1);
        assert_eq!(report.stage(Stage::Triage).in_service, 1);
        assert_eq!(report.stage(Stage::Triage).discharged, 0);
    }

    #[test]
    fn test_drain_mode_serves_patients_inside() {
        let streams = ScriptedStreams::default()
            .exp(Stream::Arrival, &[1.0, 100.0])
            .exp(Stream::Service(Stage::Triage), &[50.0]);
        let config = NetworkConfig {
            termination: TerminationMode::Drain,
            ..single_server_config(10.0)
        };
        let mut sim = NetworkSimulator::with_streams(config, streams).unwrap();

        let report = sim.run().unwrap();
        assert_eq!(report.clock, 51.0);
        assert_eq!(report.events_pending, 0);
        assert_eq!(report.stage(Stage::Triage).discharged, 1);
        assert_eq!(report.entities_exited, 1);
    }

    #[test]
    fn test_served_mode_stops_when_count_reached() {
        let streams = ScriptedStreams::default()
            .exp(Stream::Arrival, &[1.0, 1.0, 1.0, 7.0])
            .exp(Stream::Service(Stage::Triage), &[2.5, 1.0, 1.0]);
        let config = NetworkConfig {
            termination: TerminationMode::Served(2),
            ..single_server_config(10.0)
        };
        let mut sim = NetworkSimulator::with_streams(config, streams).unwrap();

        // Patient 2 starts service when patient 1 finishes at 3.5
        let report = sim.run().unwrap();
        let triage = report.stage(Stage::Triage);
        assert_eq!(report.clock, 3.5);
        assert_eq!(triage.started_service, 2);
        assert_eq!(triage.discharged, 1);
        assert_eq!(triage.in_service, 1);
        assert_eq!(triage.waiting, 1);
        assert_eq!(report.events_pending, 1);
    }

    #[test]
    fn test_served_mode_ends_early_when_queue_empties() {
        let streams = ScriptedStreams::default()
            .exp(Stream::Arrival, &[1.0, 100.0])
            .exp(Stream::Service(Stage::Triage), &[2.0]);
        let config = NetworkConfig {
            termination: TerminationMode::Served(5),
            ..single_server_config(10.0)
        };
        let mut sim = NetworkSimulator::with_streams(config, streams).unwrap();

        let report = sim.run().unwrap();
        assert_eq!(report.stage(Stage::Triage).started_service, 1);
        assert_eq!(report.clock, 3.0);
        assert_eq!(report.events_pending, 0);
    }

    #[test]
    fn test_routing_uses_discharge_then_routing_streams() {
        let mut config = single_server_config(10.0);
        config.triage_discharge_prob = 0.5;
        config.trauma_prob = 0.3;
        config.acute_prob = 0.3;

        // Three patients: kept → trauma, kept → prompt, discharged
        let streams = ScriptedStreams::default()
            .exp(Stream::Arrival, &[1.0, 1.0, 1.0, 20.0])
            .exp(Stream::Service(Stage::Triage), &[0.5, 0.5, 0.5])
            .uni(Stream::Discharge, &[0.9, 0.7, 0.1])
            .uni(Stream::Routing, &[0.1, 0.95]);
        let mut sim = NetworkSimulator::with_streams(config, streams).unwrap();

        let report = sim.run().unwrap();
        assert_eq!(report.routing.trauma, 1);
        assert_eq!(report.routing.acute, 0);
        assert_eq!(report.routing.prompt, 1);
        assert_eq!(report.routing.discharged, 1);
        assert_eq!(report.stage(Stage::Trauma).entered, 1);
        assert_eq!(report.stage(Stage::Prompt).entered, 1);
        assert_eq!(report.stage(Stage::Acute).entered, 0);
    }

    #[test]
    fn test_all_stages_integrate_on_every_event() {
        let streams = ScriptedStreams::default()
            .exp(Stream::Arrival, &[1.0, 1.0, 1.0, 20.0])
            .exp(Stream::Service(Stage::Triage), &[5.0, 1.0, 1.0]);
        let mut sim = NetworkSimulator::with_streams(single_server_config(10.0), streams).unwrap();

        sim.step().unwrap(); // arrival at 1
        sim.step().unwrap(); // arrival at 2, queued
        sim.step().unwrap(); // arrival at 3, queued

        // Trauma never saw a patient
        assert_eq!(sim.stage(Stage::Trauma).queue_length_area(), 0.0);
        assert_eq!(sim.clock().last_update(), 3.0);
        assert!((sim.stage(Stage::Triage).queue_length_area() - 1.0).abs() < 1e-12);
        assert!((sim.stage(Stage::Triage).busy_time() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_end_time_schedules_nothing() {
        let mut sim = NetworkSimulator::new(NetworkConfig { end_time: 0.0, ..Default::default() })
            .unwrap();
        assert_eq!(sim.pending_events(), 0);

        let report = sim.run().unwrap();
        assert_eq!(report.clock, 0.0);
        for stage in &report.stages {
            assert_eq!(stage.average_wait, 0.0);
            assert_eq!(stage.average_queue_length, 0.0);
            assert_eq!(stage.utilization, 0.0);
        }
    }

    #[test]
    fn test_step_on_empty_queue_is_fatal() {
        let mut sim = NetworkSimulator::new(NetworkConfig { end_time: 0.0, ..Default::default() })
            .unwrap();
        assert!(matches!(sim.step(), Err(SimulationError::InvariantViolation(_))));
    }
}
