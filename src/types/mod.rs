//! Core types and identifiers for the queueing network simulator
//!
//! This module contains fundamental types, identifiers, and configuration structures
//! used throughout the simulation system.
//!
//! # Overview
//!
//! - **Identifiers**: sequential patient identifiers
//! - **Enums**: stages, event kinds, random stream names, termination modes
//! - **Configuration**: network configuration with file loading, CLI support, and validation
//!
//! # Usage Example
//!
//! ```rust
//! use ed_queue_sim::types::*;
//!
//! let config = NetworkConfig {
//!     end_time: 500.0,
//!     trauma_prob: 0.2,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! assert_eq!(config.stage(Stage::Trauma).servers, 1);
//! ```

pub mod config;
pub mod enums;
pub mod identifiers;

// Re-export all public types for convenience
pub use config::*;
pub use enums::*;
pub use identifiers::*;
