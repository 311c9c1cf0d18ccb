//! Enumeration types for the queueing network simulator
//!
//! This module contains the enumeration types used throughout the simulation system,
//! including service stages, event kinds, random stream names, termination modes,
//! and report output formats.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Service stages of the emergency department network
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Entry stage; every arriving patient is triaged first
    Triage,
    /// Trauma care, terminal
    Trauma,
    /// Acute care, terminal
    Acute,
    /// Prompt care, terminal; receives the routing remainder
    Prompt,
}

impl Stage {
    /// All stages in network order
    pub const ALL: [Stage; 4] = [Stage::Triage, Stage::Trauma, Stage::Acute, Stage::Prompt];

    /// Stages a patient can be routed to after triage
    pub const CARE_AREAS: [Stage; 3] = [Stage::Trauma, Stage::Acute, Stage::Prompt];

    /// Position of this stage in [`Stage::ALL`]
    pub fn index(self) -> usize {
        match self {
            Stage::Triage => 0,
            Stage::Trauma => 1,
            Stage::Acute => 2,
            Stage::Prompt => 3,
        }
    }

    /// Whether patients leave the network after completing this stage
    pub fn is_terminal(self) -> bool {
        !matches!(self, Stage::Triage)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Triage => write!(f, "Triage"),
            Stage::Trauma => write!(f, "Trauma"),
            Stage::Acute => write!(f, "Acute"),
            Stage::Prompt => write!(f, "Prompt"),
        }
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "triage" => Ok(Stage::Triage),
            "trauma" => Ok(Stage::Trauma),
            "acute" => Ok(Stage::Acute),
            "prompt" => Ok(Stage::Prompt),
            _ => Err(format!("Unknown stage: {}", s)),
        }
    }
}

/// Kinds of scheduled events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// A new patient arrives at the network
    Arrival,
    /// A patient finishes service at the given stage
    StageComplete(Stage),
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Arrival => write!(f, "ARRIVAL"),
            EventKind::StageComplete(stage) => {
                write!(f, "{}_COMPLETE", stage.to_string().to_uppercase())
            }
        }
    }
}

/// Named random streams, each backed by an independent generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stream {
    /// Inter-arrival times at triage
    Arrival,
    /// Service times at one stage
    Service(Stage),
    /// Triage discharge decision
    Discharge,
    /// Care area selection after triage
    Routing,
}

impl Stream {
    /// Every stream the network draws from
    pub const ALL: [Stream; 7] = [
        Stream::Arrival,
        Stream::Service(Stage::Triage),
        Stream::Service(Stage::Trauma),
        Stream::Service(Stage::Acute),
        Stream::Service(Stage::Prompt),
        Stream::Discharge,
        Stream::Routing,
    ];

    /// Stable index used to derive this stream's seed
    pub fn index(self) -> usize {
        match self {
            Stream::Arrival => 0,
            Stream::Service(stage) => 1 + stage.index(),
            Stream::Discharge => 5,
            Stream::Routing => 6,
        }
    }
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stream::Arrival => write!(f, "arrival"),
            Stream::Service(stage) => write!(f, "{}-service", stage.to_string().to_lowercase()),
            Stream::Discharge => write!(f, "discharge"),
            Stream::Routing => write!(f, "routing"),
        }
    }
}

/// When the event loop stops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerminationMode {
    /// Stop once the next pending event lies at or past the end time
    #[default]
    Horizon,
    /// Stop arrivals at the end time, then serve everyone already inside
    Drain,
    /// Stop as soon as this many patients have entered service at triage
    ///
    /// Arrivals are still capped by the end time, so the run also ends when
    /// the event queue empties first.
    Served(u64),
}

impl fmt::Display for TerminationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationMode::Horizon => write!(f, "horizon"),
            TerminationMode::Drain => write!(f, "drain"),
            TerminationMode::Served(count) => write!(f, "served:{}", count),
        }
    }
}

impl FromStr for TerminationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "horizon" => Ok(TerminationMode::Horizon),
            "drain" => Ok(TerminationMode::Drain),
            other => match other.strip_prefix("served:") {
                Some(count) => count
                    .trim()
                    .parse::<u64>()
                    .map(TerminationMode::Served)
                    .map_err(|_| format!("Invalid served count in termination mode: {}", s)),
                None => Err(format!("Unknown termination mode: {}", s)),
            },
        }
    }
}

/// Output formats for the final report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text table
    Text,
    /// JSON document
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "TEXT"),
            OutputFormat::Json => write!(f, "JSON"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}
