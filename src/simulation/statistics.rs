//! Statistics collection and reporting
//!
//! Reports are read-only snapshots of the simulator's accumulators. They do not
//! feed back into the run, so printing or serializing them never changes results.

use crate::simulation::StageState;
use crate::types::{Stage, TerminationMode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Final statistics of one stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageReport {
    /// Which stage
    pub stage: Stage,
    /// Server capacity
    pub servers: usize,
    /// Mean waiting-line delay of patients that finished service
    pub average_wait: f64,
    /// Time-average waiting line length
    pub average_queue_length: f64,
    /// Fraction of server capacity in use over the run
    pub utilization: f64,
    /// Patients that arrived at the stage
    pub entered: u64,
    /// Patients that entered service at the stage
    pub started_service: u64,
    /// Patients that finished service at the stage
    pub discharged: u64,
    /// Patients still waiting at the end of the run
    pub waiting: usize,
    /// Patients still in service at the end of the run
    pub in_service: usize,
    /// Longest waiting line observed
    pub max_queue_length: usize,
    /// Sum of delays of patients that finished service
    pub total_wait_time: f64,
    /// Time integral of the waiting line length
    pub queue_length_area: f64,
    /// Time integral of busy servers
    pub busy_time: f64,
}

impl StageReport {
    /// Snapshot a stage at simulated time `now`
    pub fn from_stage(state: &StageState, now: f64) -> Self {
        let average_wait = if state.discharged_count() == 0 {
            0.0
        } else {
            state.total_wait_time() / state.discharged_count() as f64
        };

        let (average_queue_length, utilization) = if now > 0.0 {
            (
                state.queue_length_area() / now,
                state.busy_time() / (now * state.servers() as f64),
            )
        } else {
            (0.0, 0.0)
        };

        Self {
            stage: state.stage(),
            servers: state.servers(),
            average_wait,
            average_queue_length,
            utilization,
            entered: state.entered_count(),
            started_service: state.started_service(),
            discharged: state.discharged_count(),
            waiting: state.queue_len(),
            in_service: state.busy_count(),
            max_queue_length: state.max_queue_length(),
            total_wait_time: state.total_wait_time(),
            queue_length_area: state.queue_length_area(),
            busy_time: state.busy_time(),
        }
    }

    /// Patients still inside the stage
    pub fn in_flight(&self) -> u64 {
        (self.waiting + self.in_service) as u64
    }
}

/// Where patients went after triage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingCounts {
    /// Patients discharged straight from triage
    pub discharged: u64,
    /// Patients sent to trauma
    pub trauma: u64,
    /// Patients sent to acute care
    pub acute: u64,
    /// Patients sent to prompt care
    pub prompt: u64,
}

impl RoutingCounts {
    /// Record one routing decision
    ///
    /// # Panics
    ///
    /// Panics if the destination is triage.
    pub fn record(&mut self, destination: Option<Stage>) {
        match destination {
            None => self.discharged += 1,
            Some(Stage::Trauma) => self.trauma += 1,
            Some(Stage::Acute) => self.acute += 1,
            Some(Stage::Prompt) => self.prompt += 1,
            Some(Stage::Triage) => unreachable!("triage is not a routing destination"),
        }
    }

    /// Patients routed to a care area
    pub fn routed_to(&self, stage: Stage) -> u64 {
        match stage {
            Stage::Triage => 0,
            Stage::Trauma => self.trauma,
            Stage::Acute => self.acute,
            Stage::Prompt => self.prompt,
        }
    }

    /// Total routing decisions made
    pub fn total(&self) -> u64 {
        self.discharged + self.trauma + self.acute + self.prompt
    }
}

/// Final statistics of a whole run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkReport {
    /// Simulated time of the last processed event
    pub clock: f64,
    /// Configured end time
    pub end_time: f64,
    /// How the run terminated
    pub termination: TerminationMode,
    /// Base seed of the random streams
    pub seed: u64,
    /// Per-stage statistics, in network order
    pub stages: Vec<StageReport>,
    /// Routing decisions made at triage
    pub routing: RoutingCounts,
    /// Patients that arrived at the network
    pub entities_created: u64,
    /// Patients that left the network
    pub entities_exited: u64,
    /// Events popped from the queue
    pub events_processed: u64,
    /// Events still pending when the loop stopped
    pub events_pending: usize,
}

impl NetworkReport {
    /// Statistics of one stage
    pub fn stage(&self, stage: Stage) -> &StageReport {
        &self.stages[stage.index()]
    }

    /// Patients still inside the network
    pub fn entities_in_system(&self) -> u64 {
        self.stages.iter().map(StageReport::in_flight).sum()
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for NetworkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Final Report ===")?;
        writeln!(
            f,
            "Simulated time: {:.2} (end time {:.2}, {} termination, seed {})",
            self.clock, self.end_time, self.termination, self.seed
        )?;
        writeln!(
            f,
            "Patients: {} arrived, {} left, {} still inside",
            self.entities_created,
            self.entities_exited,
            self.entities_in_system()
        )?;
        writeln!(
            f,
            "Triage routing: {} discharged, {} trauma, {} acute, {} prompt",
            self.routing.discharged, self.routing.trauma, self.routing.acute, self.routing.prompt
        )?;
        writeln!(f)?;

        for report in &self.stages {
            writeln!(
                f,
                "Average delay in {} Queue: {:.2} time units",
                report.stage, report.average_wait
            )?;
        }
        for report in &self.stages {
            writeln!(
                f,
                "Average number of patients in {} Queue: {:.2}",
                report.stage, report.average_queue_length
            )?;
        }
        for report in &self.stages {
            writeln!(f, "Server utilization in {}: {:.2}", report.stage, report.utilization)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::{Entity, RandomStreams};
    use crate::types::{EntityId, StageConfig, Stream};

    struct FixedService(f64);

    impl RandomStreams for FixedService {
        fn draw_uniform(&mut self, _stream: Stream) -> f64 {
            0.0
        }

        fn draw_exponential(&mut self, _stream: Stream, _mean: f64) -> f64 {
            self.0
        }
    }

    #[test]
    fn test_zero_clock_yields_zero_statistics() {
        let state = StageState::new(Stage::Trauma, &StageConfig::new(1, 1.0));
        let report = StageReport::from_stage(&state, 0.0);

        assert_eq!(report.average_wait, 0.0);
        assert_eq!(report.average_queue_length, 0.0);
        assert_eq!(report.utilization, 0.0);
        assert_eq!(report.in_flight(), 0);
    }

    #[test]
    fn test_stage_report_averages() {
        let mut state = StageState::new(Stage::Triage, &StageConfig::new(2, 1.0));
        let mut streams = FixedService(4.0);

        state.admit(Entity::new(EntityId::new(1), 0.0), 0.0, &mut streams).unwrap();
        state.admit(Entity::new(EntityId::new(2), 0.0), 0.0, &mut streams).unwrap();
        state.admit(Entity::new(EntityId::new(3), 0.0), 0.0, &mut streams).unwrap();
        state.accumulate(4.0).unwrap();
        state.complete(EntityId::new(1), 4.0, &mut streams).unwrap();

        let report = StageReport::from_stage(&state, 4.0);
        // Both servers busy for the whole interval
        assert_eq!(report.utilization, 1.0);
        assert_eq!(report.average_queue_length, 1.0);
        assert_eq!(report.average_wait, 0.0);
        assert_eq!(report.discharged, 1);
        assert_eq!(report.in_service, 2);
        assert_eq!(report.waiting, 0);
    }

    #[test]
    fn test_routing_counts() {
        let mut routing = RoutingCounts::default();
        routing.record(None);
        routing.record(Some(Stage::Trauma));
        routing.record(Some(Stage::Prompt));
        routing.record(Some(Stage::Prompt));

        assert_eq!(routing.discharged, 1);
        assert_eq!(routing.routed_to(Stage::Prompt), 2);
        assert_eq!(routing.total(), 4);
    }

    #[test]
    #[should_panic(expected = "triage is not a routing destination")]
    fn test_routing_to_triage_panics() {
        RoutingCounts::default().record(Some(Stage::Triage));
    }
}
