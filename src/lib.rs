//! Emergency Department Queueing Network Simulator
//!
//! A discrete-event simulation of patients flowing through an emergency
//! department: arrival, triage, then discharge or one of three care areas.
//!
//! # Overview
//!
//! Patients arrive at triage with exponential inter-arrival times. After
//! triage each patient is either discharged or routed with fixed
//! probabilities to trauma, acute, or prompt care, and leaves the network
//! after that stage. Every stage is a FIFO multi-server queue with
//! exponential service times.
//!
//! ## Key Features
//!
//! - **Priority event queue**: O(log n) scheduling with deterministic tie-breaking
//! - **Independent random streams**: arrivals, each stage's service, discharge, and routing
//! - **Time-weighted statistics**: average delay, queue length, and utilization per stage
//! - **Three termination modes**: stop at the horizon, drain the patients still inside, or stop
//!   once a given number of patients has entered triage service
//! - **Configuration files**: the five-line text format or JSON, with CLI overrides
//!
//! ## Quick Start
//!
//! ```rust
//! use ed_queue_sim::*;
//!
//! let config = NetworkConfig {
//!     end_time: 500.0,
//!     seed: 42,
//!     ..Default::default()
//! };
//!
//! let mut simulator = NetworkSimulator::new(config)?;
//! let report = simulator.run()?;
//!
//! println!("{}", report);
//! assert_eq!(report.stages.len(), 4);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Module Organization
//!
//! - [`types`]: identifiers, enums, and configuration
//! - [`simulation`]: event queue, stages, network simulator, statistics, logging
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐    ┌──────────────────┐    ┌─────────────┐
//! │   Types     │    │ NetworkSimulator │    │ Statistics  │
//! │             │    │                  │    │             │
//! │ Config      │───►│ EventQueue       │───►│ StageReport │
//! │ Enums       │    │ Clock            │    │ Network     │
//! │ Identifiers │    │ StageState × 4   │    │ Report      │
//! └─────────────┘    └──────────────────┘    └─────────────┘
//!                            ▲
//!                            │
//!                    ┌──────────────┐
//!                    │ RandomStreams│
//!                    └──────────────┘
//! ```
#![warn(missing_docs, missing_debug_implementations, unreachable_pub)]

// Module declarations
pub mod simulation;
pub mod types;

// Core types and identifiers
pub use types::{
    // Configuration
    CliArgs,
    ConfigError,
    ConfigValidationError,
    // Identifiers
    EntityId,
    // Enums
    EventKind,
    NetworkConfig,
    OutputFormat,
    Stage,
    StageConfig,
    Stream,
    TerminationMode,
};

// Simulation types and functionality
pub use simulation::{
    Event, EventQueue, LoggingConfig, NetworkReport, NetworkSimulator, RandomStreams,
    RoutingCounts, SeededStreams, SimulationClock, SimulationError, SimulationResult,
    StageReport, StageState,
};
