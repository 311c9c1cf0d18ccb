//! Discrete-event simulation kernel
//!
//! This module contains the event queue, the simulated clock, per-stage
//! queueing state, the network simulator that dispatches events, statistics
//! reporting, random streams, and error handling.
//!
//! # Overview
//!
//! - **NetworkSimulator**: owns every component and runs the event loop
//! - **EventQueue**: min-heap of pending events, ties broken in insertion order
//! - **StageState**: waiting line, servers, and time-weighted accumulators of one stage
//! - **RandomStreams**: one independent random sequence per named stream
//! - **NetworkReport**: read-only snapshot of the statistics
//! - **SimulationError**: error type of the kernel
//!
//! # Usage Example
//!
//! ```rust
//! use ed_queue_sim::simulation::*;
//! use ed_queue_sim::types::*;
//!
//! let config = NetworkConfig { end_time: 200.0, seed: 7, ..Default::default() };
//! let mut simulator = NetworkSimulator::new(config).unwrap();
//! let report = simulator.run().unwrap();
//!
//! for stage in &report.stages {
//!     assert!(stage.utilization >= 0.0 && stage.utilization <= 1.0);
//! }
//! ```

pub mod clock;
pub mod error;
pub mod event_queue;
pub mod logging;
pub mod network;
pub mod random;
pub mod stage;
pub mod statistics;

// Re-export all public types for convenience
pub use clock::*;
pub use error::*;
pub use event_queue::*;
pub use logging::*;
pub use network::*;
pub use random::*;
pub use stage::*;
pub use statistics::*;
