//! Error types and handling
//!
//! This module contains error types for the simulation. Every error is fatal:
//! the network is a closed deterministic system, so skipping or retrying an
//! event would corrupt the accumulated statistics.

use crate::types::{ConfigError, ConfigValidationError};
use thiserror::Error;

/// Errors that can occur during simulation
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ConfigurationError(String),

    /// Internal state became inconsistent; indicates a scheduling bug
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// A random draw was configured with an invalid parameter
    #[error("Invalid distribution parameter: {0}")]
    DistributionParameterError(String),

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl From<ConfigError> for SimulationError {
    fn from(error: ConfigError) -> Self {
        SimulationError::ConfigurationError(error.to_string())
    }
}

impl From<ConfigValidationError> for SimulationError {
    fn from(error: ConfigValidationError) -> Self {
        match error {
            ConfigValidationError::InvalidMean { .. } => {
                SimulationError::DistributionParameterError(error.to_string())
            }
            other => SimulationError::ConfigurationError(other.to_string()),
        }
    }
}

impl SimulationError {
    /// Create a configuration error
    pub fn configuration_error(msg: impl Into<String>) -> Self {
        Self::ConfigurationError(msg.into())
    }

    /// Create an invariant violation
    pub fn invariant_violation(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    /// Create a distribution parameter error
    pub fn distribution_parameter_error(msg: impl Into<String>) -> Self {
        Self::DistributionParameterError(msg.into())
    }

    /// Check if this is a recoverable error
    ///
    /// Always false. A run either completes or is abandoned.
    pub fn is_recoverable(&self) -> bool {
        false
    }

    /// Get the error category
    pub fn category(&self) -> &'static str {
        match self {
            SimulationError::ConfigurationError(_) => "Configuration",
            SimulationError::InvariantViolation(_) => "Invariant",
            SimulationError::DistributionParameterError(_) => "Distribution Parameter",
            SimulationError::IoError(_) => "IO",
            SimulationError::SerializationError(_) => "Serialization",
        }
    }
}

/// Result type for simulation operations
pub type SimulationResult<T> = Result<T, SimulationError>;
