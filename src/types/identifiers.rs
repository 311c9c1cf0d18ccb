//! Identifier types for the queueing network simulator
//!
//! Patients are numbered in arrival order, so identifiers are plain counters
//! rather than random values. This keeps every run reproducible.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Unique identifier for a patient moving through the network
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(pub u64);

impl EntityId {
    /// Wrap a raw counter value
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// The raw counter value
    pub fn value(self) -> u64 {
        self.0
    }

    /// The identifier issued after this one
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PATIENT_{}", self.0)
    }
}

impl Serialize for EntityId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let raw = s.strip_prefix("PATIENT_").unwrap_or(&s);
        raw.parse::<u64>().map(EntityId).map_err(serde::de::Error::custom)
    }
}
