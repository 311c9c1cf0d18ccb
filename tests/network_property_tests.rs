//! Properties that must hold at every step of any run
//!
//! Each test drives the simulator event by event over several seeds and
//! checks the state in between.

use ed_queue_sim::simulation::NetworkSimulator;
use ed_queue_sim::types::{EntityId, NetworkConfig, Stage, StageConfig, TerminationMode};

const SEEDS: [u64; 5] = [1, 2, 17, 4242, 987_654_321];

fn busy_config(seed: u64) -> NetworkConfig {
    // Arrivals faster than single-server triage so queues actually form
    NetworkConfig {
        end_time: 400.0,
        seed,
        mean_inter_arrival: 1.0,
        triage: StageConfig::new(1, 0.9),
        trauma: StageConfig::new(1, 6.0),
        acute: StageConfig::new(2, 4.0),
        prompt: StageConfig::new(3, 2.0),
        triage_discharge_prob: 0.2,
        trauma_prob: 0.2,
        acute_prob: 0.4,
        ..Default::default()
    }
}

#[test]
fn test_conservation_at_every_step() {
    for seed in SEEDS {
        let mut simulator = NetworkSimulator::new(busy_config(seed)).unwrap();

        while simulator.should_continue() {
            simulator.step().unwrap();

            let mut inside = 0;
            for stage in Stage::ALL {
                let state = simulator.stage(stage);
                let in_flight = (state.queue_len() + state.busy_count()) as u64;
                assert_eq!(state.entered_count(), state.discharged_count() + in_flight);
                assert!(state.busy_count() <= state.servers());
                inside += in_flight;
            }
            assert_eq!(simulator.entities_created(), simulator.entities_exited() + inside);
        }
    }
}

#[test]
fn test_accumulators_never_decrease() {
    for seed in SEEDS {
        let mut simulator = NetworkSimulator::new(busy_config(seed)).unwrap();
        let mut previous = [(0.0, 0.0, 0.0); 4];

        while simulator.should_continue() {
            simulator.step().unwrap();
            for stage in Stage::ALL {
                let state = simulator.stage(stage);
                let current =
                    (state.queue_length_area(), state.busy_time(), state.total_wait_time());
                let before = previous[stage.index()];

                assert!(current.0 >= before.0 && current.0 >= 0.0);
                assert!(current.1 >= before.1 && current.1 >= 0.0);
                assert!(current.2 >= before.2 && current.2 >= 0.0);
                previous[stage.index()] = current;
            }
        }
    }
}

#[test]
fn test_utilization_stays_within_bounds() {
    for seed in SEEDS {
        let mut simulator = NetworkSimulator::new(busy_config(seed)).unwrap();

        while simulator.should_continue() {
            simulator.step().unwrap();
            let report = simulator.report();
            for stage in &report.stages {
                assert!(stage.utilization >= 0.0);
                assert!(stage.utilization <= 1.0 + 1e-12, "{:?}", stage);
                assert!(stage.average_queue_length >= 0.0);
                assert!(stage.average_wait >= 0.0);
            }
        }
    }
}

#[test]
fn test_same_seed_same_report() {
    for seed in SEEDS {
        let first = NetworkSimulator::new(busy_config(seed)).unwrap().run().unwrap();
        let second = NetworkSimulator::new(busy_config(seed)).unwrap().run().unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn test_different_seeds_differ() {
    let first = NetworkSimulator::new(busy_config(1)).unwrap().run().unwrap();
    let second = NetworkSimulator::new(busy_config(2)).unwrap().run().unwrap();
    assert_ne!(first.stage(Stage::Triage).busy_time, second.stage(Stage::Triage).busy_time);
}

/// Heavier care areas so acute and prompt form queues behind two servers
fn care_queue_config(seed: u64) -> NetworkConfig {
    NetworkConfig {
        trauma: StageConfig::new(2, 4.0),
        acute: StageConfig::new(2, 5.0),
        prompt: StageConfig::new(2, 5.0),
        ..busy_config(seed)
    }
}

#[test]
fn test_every_stage_serves_in_entry_order() {
    let mut saw_queue = [false; 4];

    for seed in SEEDS {
        let mut simulator = NetworkSimulator::new(care_queue_config(seed)).unwrap();
        let mut entry_order: [Vec<EntityId>; 4] = Default::default();

        while simulator.should_continue() {
            let entered_before: Vec<u64> =
                Stage::ALL.iter().map(|stage| simulator.stage(*stage).entered_count()).collect();
            let event = simulator.step().unwrap();

            // An arrival enters triage; a triage completion enters one care area
            for stage in Stage::ALL {
                if simulator.stage(stage).entered_count() > entered_before[stage.index()] {
                    entry_order[stage.index()].push(event.entity_id);
                }
            }

            for stage in Stage::ALL {
                let state = simulator.stage(stage);
                let waiting: Vec<EntityId> = state.waiting_ids().collect();
                if let Some(head) = waiting.first() {
                    saw_queue[stage.index()] = true;
                    let order = &entry_order[stage.index()];
                    let position = order.iter().position(|id| id == head).unwrap();

                    // Everyone who entered after the head is still waiting behind it
                    assert_eq!(&order[position..], waiting.as_slice(), "{} seed {}", stage, seed);
                    for later in &order[position..] {
                        assert!(!state.is_in_service(*later), "{} overtook {} at {}", later, head, stage);
                    }
                }
            }
        }
    }

    for stage in [Stage::Triage, Stage::Acute, Stage::Prompt] {
        assert!(saw_queue[stage.index()], "{} never formed a queue", stage);
    }
}

#[test]
fn test_horizon_never_processes_events_past_end_time() {
    for seed in SEEDS {
        let config = busy_config(seed);
        let end_time = config.end_time;
        let report = NetworkSimulator::new(config).unwrap().run().unwrap();

        assert!(report.clock < end_time);
        assert_eq!(report.termination, TerminationMode::Horizon);
    }
}
